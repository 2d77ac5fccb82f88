//! Genetic cross engine for companion-bird breeding.
//!
//! Given two parent genotypes, predicts the offspring genotype and phenotype
//! distribution under Mendelian inheritance, including linked loci with
//! recombination and Z-linked inheritance under the ZW system:
//!
//! - **Locus registry** — [`LocusRegistry`], [`Locus`], [`AlleleNotation`]
//! - **Allele parsing** — [`parse_alleles`], [`AllelePair`], [`Genotype`]
//! - **Punnett squares** — [`punnett`] for unlinked loci
//! - **Linked gametes** — [`gametes_for_linkage_group`] with [`RecombinationMap`]
//! - **Sex-linked crosses** — [`sex_linked_cross`]
//! - **Orchestration** — [`CrossEngine`], [`CrossOutcome`], [`merge_outcomes`]
//! - **Phenotypes** — [`RuleCascade`], [`MasterTable`], [`MasterTableInferencer`]
//!
//! # Example
//!
//! ```
//! use plumage_core::Sex;
//! use plumage_genetics::{CrossEngine, Genotype};
//!
//! let engine = CrossEngine::builtin().unwrap();
//! let registry = engine.registry();
//!
//! let sire = Genotype::parse(registry, Sex::Male, [("dark", "Dd")]);
//! let dam = Genotype::parse(registry, Sex::Female, [("dark", "Dd"), ("cin", "cinW")]);
//!
//! let outcomes = engine.cross(&sire, &dam).unwrap();
//! let top = &outcomes[0];
//! assert_eq!(top.phenotype, "Dark Green");
//! assert!((top.probability - 0.25).abs() < 1e-9);
//! ```

pub mod allele;
pub mod cross;
pub mod gamete;
pub mod genotype;
pub mod locus;
pub mod phenotype;
pub mod punnett;
pub mod recombination;
pub mod sexlinked;

pub use allele::{normalize, parse_alleles, parse_alleles_checked, parse_hemizygous, Allele, AllelePair};
pub use cross::{
    merge_outcomes, sort_outcomes, total_probability, CrossConfig, CrossEngine, CrossOutcome, MergeMode,
};
pub use gamete::{gametes_for_linkage_group, Gamete, Haplotype, DEFAULT_GAMETE_EPSILON};
pub use genotype::{Genotype, MalformedGenotype};
pub use locus::{AlleleNotation, AlleleOrder, Expression, Locus, LocusRegistry, LocusRole};
pub use phenotype::{
    MasterTable, MasterTableInferencer, PhenotypeEntry, PhenotypeInferencer, Requirement, RuleCascade,
};
pub use punnett::punnett;
pub use recombination::RecombinationMap;
pub use sexlinked::{sex_linked_cross, SexLinkedOffspring};
