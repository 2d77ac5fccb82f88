//! Z-linked inheritance under the ZW system.
//!
//! Males are ZZ and recombine their two Z copies like any linkage group.
//! Females are ZW: their single Z passes to every son unchanged, their W to
//! every daughter. A daughter's sex-linked genotype is therefore exactly the
//! Z gamete she received from her father.

use plumage_core::{ProbabilityMap, Result};

use crate::allele::{normalize, AllelePair};
use crate::gamete::{gametes_for_linkage_group, starting_haplotypes, Haplotype};
use crate::genotype::Genotype;
use crate::locus::Locus;
use crate::recombination::RecombinationMap;

/// A female's gamete: her Z haplotype or the W.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SexGamete {
    Z(Haplotype),
    W,
}

/// The two equally likely gametes of a female over the Z loci.
///
/// A dam recorded with a diploid entry transmits its `first` allele.
pub fn dam_gametes(dam: &Genotype, loci: &[&Locus]) -> [SexGamete; 2] {
    let (z, _) = starting_haplotypes(dam, loci);
    [SexGamete::Z(z), SexGamete::W]
}

/// Sex-linked genotypes of sons and daughters, each distribution summing to 1
/// before pruning. Entries follow the locus order passed in.
#[derive(Debug, Clone, Default)]
pub struct SexLinkedOffspring {
    pub sons: ProbabilityMap<Vec<AllelePair>>,
    pub daughters: ProbabilityMap<Vec<AllelePair>>,
}

/// Cross the Z-linked loci of a sire and a dam.
///
/// The sire's Z gametes come from [`gametes_for_linkage_group`] (a sire
/// recorded hemizygous at a locus behaves as homozygous for that allele).
/// Sons pair each sire gamete with the dam's Z, normalized per locus;
/// daughters carry the sire gamete alone, hemizygous.
///
/// # Errors
///
/// Propagates gamete-engine errors (empty `loci`, bad `epsilon`).
pub fn sex_linked_cross(
    sire: &Genotype,
    dam: &Genotype,
    loci: &[&Locus],
    rates: &RecombinationMap,
    epsilon: f64,
) -> Result<SexLinkedOffspring> {
    let sire_gametes = gametes_for_linkage_group(sire, loci, rates, epsilon)?;
    let mut out = SexLinkedOffspring::default();

    for dam_gamete in dam_gametes(dam, loci) {
        for g in &sire_gametes {
            match &dam_gamete {
                SexGamete::Z(maternal) => {
                    let pairs = loci
                        .iter()
                        .zip(g.haplotype.alleles().iter().zip(maternal.alleles()))
                        .map(|(locus, (p, m))| normalize(p.clone(), m.clone(), &locus.notation))
                        .collect();
                    out.sons.add(pairs, g.probability);
                }
                SexGamete::W => {
                    let pairs = g
                        .haplotype
                        .alleles()
                        .iter()
                        .cloned()
                        .map(AllelePair::Hemizygous)
                        .collect();
                    out.daughters.add(pairs, g.probability);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allele::Allele;
    use crate::gamete::DEFAULT_GAMETE_EPSILON;
    use crate::locus::{AlleleNotation, LocusRegistry};
    use plumage_core::Sex;

    const TOL: f64 = 1e-9;

    fn z_registry() -> LocusRegistry {
        LocusRegistry::new(vec![
            Locus::new("ino", true)
                .with_linkage("Z", 30.0)
                .with_notation(AlleleNotation::new("+", ["ino"])),
            Locus::new("cin", true)
                .with_linkage("Z", 33.0)
                .with_notation(AlleleNotation::new("+", ["cin"])),
        ])
        .unwrap()
    }

    fn text(pairs: &[AllelePair]) -> String {
        pairs.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
    }

    fn prob(map: &ProbabilityMap<Vec<AllelePair>>, want: &str) -> f64 {
        map.iter()
            .filter(|(pairs, _)| text(pairs) == want)
            .map(|(_, p)| p)
            .sum()
    }

    #[test]
    fn mutant_dam_by_wild_sire() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        let sire = Genotype::wild_type(&reg, Sex::Male);
        let dam = Genotype::parse(&reg, Sex::Female, [("ino", "inoW")]);
        let out = sex_linked_cross(&sire, &dam, &loci, &RecombinationMap::new(), DEFAULT_GAMETE_EPSILON)
            .unwrap();
        assert_eq!(out.sons.len(), 1);
        assert!((prob(&out.sons, "ino+ ++") - 1.0).abs() < TOL);
        assert_eq!(out.daughters.len(), 1);
        assert!((prob(&out.daughters, "+W +W") - 1.0).abs() < TOL);
    }

    #[test]
    fn mutant_sire_by_wild_dam() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        let sire = Genotype::parse(&reg, Sex::Male, [("ino", "inoino")]);
        let dam = Genotype::wild_type(&reg, Sex::Female);
        let out = sex_linked_cross(&sire, &dam, &loci, &RecombinationMap::new(), DEFAULT_GAMETE_EPSILON)
            .unwrap();
        assert!((prob(&out.sons, "ino+ ++") - 1.0).abs() < TOL);
        assert!((prob(&out.daughters, "inoW +W") - 1.0).abs() < TOL);
    }

    #[test]
    fn split_sire_gives_half_mutant_daughters() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        let sire = Genotype::parse(&reg, Sex::Male, [("cin", "cin+")]);
        let dam = Genotype::parse(&reg, Sex::Female, [("cin", "cinW")]);
        let out = sex_linked_cross(&sire, &dam, &loci, &RecombinationMap::new(), DEFAULT_GAMETE_EPSILON)
            .unwrap();
        assert!((prob(&out.sons, "++ cincin") - 0.5).abs() < TOL);
        assert!((prob(&out.sons, "++ cin+") - 0.5).abs() < TOL);
        assert!((prob(&out.daughters, "+W cinW") - 0.5).abs() < TOL);
        assert!((prob(&out.daughters, "+W +W") - 0.5).abs() < TOL);
    }

    #[test]
    fn linked_sire_recombines_into_daughters() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        let rates = RecombinationMap::new().with_rate("ino", "cin", 0.03).unwrap();
        let sire = Genotype::parse(&reg, Sex::Male, [("ino", "ino+"), ("cin", "+cin")]);
        let dam = Genotype::wild_type(&reg, Sex::Female);
        let out = sex_linked_cross(&sire, &dam, &loci, &rates, 0.0).unwrap();
        assert!((prob(&out.daughters, "inoW +W") - 0.485).abs() < TOL);
        assert!((prob(&out.daughters, "+W cinW") - 0.485).abs() < TOL);
        assert!((prob(&out.daughters, "inoW cinW") - 0.015).abs() < TOL);
        assert!((out.sons.total() - 1.0).abs() < TOL);
    }

    #[test]
    fn permissive_parent_records() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        // Sire written hemizygous, dam written diploid.
        let sire = Genotype::from_pairs(Sex::Male, [("ino".to_string(), AllelePair::hemizygous("ino"))]);
        let dam = Genotype::from_pairs(Sex::Female, [("cin".to_string(), AllelePair::diploid("cin", "+"))]);
        let out = sex_linked_cross(&sire, &dam, &loci, &RecombinationMap::new(), 0.0).unwrap();
        assert!((prob(&out.sons, "ino+ cin+") - 1.0).abs() < TOL);
        assert!((prob(&out.daughters, "inoW +W") - 1.0).abs() < TOL);
    }

    #[test]
    fn dam_gametes_are_z_and_w() {
        let reg = z_registry();
        let loci: Vec<&Locus> = reg.iter().collect();
        let dam = Genotype::parse(&reg, Sex::Female, [("cin", "cinW")]);
        let [z, w] = dam_gametes(&dam, &loci);
        assert_eq!(w, SexGamete::W);
        match z {
            SexGamete::Z(h) => assert_eq!(h.get(1).map(Allele::as_str), Some("cin")),
            SexGamete::W => panic!("expected Z"),
        }
    }
}
