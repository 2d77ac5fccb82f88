//! Gamete enumeration for loci that share a chromosome.
//!
//! For a linkage group the two chromosome copies of an individual are read
//! off the written allele order (`first` on chromosome 1, `second` on
//! chromosome 2), which fixes phase: `"ino+"` with `"cin+"` is cis, `"ino+"`
//! with `"+cin"` is trans. Meiosis is enumerated exactly over every pattern
//! of crossovers between adjacent loci, so double crossovers are counted.

use std::collections::BTreeMap;

use plumage_core::{PlumageError, ProbabilityMap, Result};
use tracing::trace;

use crate::allele::{Allele, AllelePair};
use crate::genotype::Genotype;
use crate::locus::Locus;
use crate::recombination::RecombinationMap;

/// Gametes below this probability are dropped by default.
pub const DEFAULT_GAMETE_EPSILON: f64 = 1e-4;

/// Longest linkage group the exhaustive enumeration accepts.
pub const MAX_LINKED_LOCI: usize = 20;

/// Alleles carried by one chromosome copy, in the group's locus order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Haplotype {
    alleles: Vec<Allele>,
}

impl Haplotype {
    pub fn new(alleles: Vec<Allele>) -> Self {
        Self { alleles }
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn get(&self, i: usize) -> Option<&Allele> {
        self.alleles.get(i)
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    /// Locus key → allele, for callers that want a keyed view.
    pub fn to_map(&self, loci: &[&Locus]) -> BTreeMap<String, Allele> {
        loci.iter()
            .zip(&self.alleles)
            .map(|(l, a)| (l.key.clone(), a.clone()))
            .collect()
    }
}

/// A haplotype and the probability a parent transmits it.
#[derive(Debug, Clone, PartialEq)]
pub struct Gamete {
    pub haplotype: Haplotype,
    pub probability: f64,
}

/// The individual's two chromosome copies over `loci`.
///
/// A hemizygous entry contributes the same allele to both copies, so a
/// hemizygous individual yields a single haplotype.
pub fn starting_haplotypes(genotype: &Genotype, loci: &[&Locus]) -> (Haplotype, Haplotype) {
    let pairs: Vec<AllelePair> = loci.iter().map(|l| genotype.pair_or_wild(l)).collect();
    let chrom1 = pairs.iter().map(|p| p.first().clone()).collect();
    let chrom2 = pairs.iter().map(|p| p.second().clone()).collect();
    (Haplotype::new(chrom1), Haplotype::new(chrom2))
}

/// Gamete distribution of one individual over one linkage group.
///
/// `loci` must be in physical order; rates are read between adjacent loci
/// (missing pairs assort independently). With fewer than two heterozygous
/// loci the two starting haplotypes are emitted at 0.5 each. Otherwise all
/// 2^(n-1) crossover patterns are enumerated, each yielding a
/// chromosome-1-seeded and a chromosome-2-seeded gamete at half the pattern
/// probability. The result is merged, renormalized, and gametes below
/// `epsilon` are dropped without redistributing their mass.
///
/// # Errors
///
/// Returns an error if `loci` is empty or longer than [`MAX_LINKED_LOCI`],
/// or if `epsilon` is outside `[0, 1)`.
pub fn gametes_for_linkage_group(
    genotype: &Genotype,
    loci: &[&Locus],
    rates: &RecombinationMap,
    epsilon: f64,
) -> Result<Vec<Gamete>> {
    if loci.is_empty() {
        return Err(PlumageError::InvalidInput(
            "linkage group must contain at least one locus".into(),
        ));
    }
    if loci.len() > MAX_LINKED_LOCI {
        return Err(PlumageError::InvalidInput(format!(
            "linkage group has {} loci, at most {} supported",
            loci.len(),
            MAX_LINKED_LOCI
        )));
    }
    if !(0.0..1.0).contains(&epsilon) {
        return Err(PlumageError::InvalidInput(format!(
            "gamete epsilon must be in [0, 1), got {epsilon}"
        )));
    }

    let (chrom1, chrom2) = starting_haplotypes(genotype, loci);
    let n_het = chrom1
        .alleles
        .iter()
        .zip(&chrom2.alleles)
        .filter(|(a, b)| a != b)
        .count();

    let mut dist: ProbabilityMap<Haplotype> = ProbabilityMap::new();
    if n_het < 2 {
        dist.add(chrom1, 0.5);
        dist.add(chrom2, 0.5);
    } else {
        let interval_rates: Vec<f64> = loci
            .windows(2)
            .map(|w| rates.rate(&w[0].key, &w[1].key))
            .collect();
        let sources = [&chrom1, &chrom2];
        for pattern in 0u32..(1u32 << interval_rates.len()) {
            let p_pattern: f64 = interval_rates
                .iter()
                .enumerate()
                .map(|(i, &r)| if (pattern >> i) & 1 == 1 { r } else { 1.0 - r })
                .product();
            if p_pattern == 0.0 {
                continue;
            }
            for seed in 0..2 {
                let mut active = seed;
                let mut alleles = Vec::with_capacity(loci.len());
                for locus_idx in 0..loci.len() {
                    if locus_idx > 0 && (pattern >> (locus_idx - 1)) & 1 == 1 {
                        active ^= 1;
                    }
                    alleles.push(sources[active].alleles[locus_idx].clone());
                }
                dist.add(Haplotype::new(alleles), 0.5 * p_pattern);
            }
        }
    }

    dist.normalize();
    let dropped = dist.prune(epsilon);
    trace!(
        loci = loci.len(),
        heterozygous = n_het,
        gametes = dist.len(),
        dropped,
        "enumerated linkage-group gametes"
    );

    Ok(dist
        .into_iter()
        .map(|(haplotype, probability)| Gamete {
            haplotype,
            probability,
        })
        .collect())
}
