//! Single-locus crosses via the Punnett square.

use plumage_core::ProbabilityMap;

use crate::allele::{normalize, AllelePair};
use crate::locus::AlleleNotation;

/// Offspring pair distribution for one unlinked locus.
///
/// Each parent contributes each of its copies with equal probability (a
/// hemizygous parent contributes its single allele), giving the 2×2 = 4
/// cells at 0.25 for two diploid parents. Cells are normalized and identical
/// results merged, in first-seen order.
pub fn punnett_map(
    sire: &AllelePair,
    dam: &AllelePair,
    notation: &AlleleNotation,
) -> ProbabilityMap<AllelePair> {
    let mut out = ProbabilityMap::new();
    for (s, ps) in sire.gametes() {
        for (d, pd) in dam.gametes() {
            out.add(normalize(s.clone(), d, notation), ps * pd);
        }
    }
    out
}

/// [`punnett_map`] as a vector of `(pair, probability)`.
pub fn punnett(
    sire: &AllelePair,
    dam: &AllelePair,
    notation: &AlleleNotation,
) -> Vec<(AllelePair, f64)> {
    punnett_map(sire, dam, notation).into_vec()
}
