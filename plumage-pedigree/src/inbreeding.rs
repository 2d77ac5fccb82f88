//! Wright's coefficient of relationship by shared-ancestor path counting.
//!
//! The coefficient of a prospective pair equals the inbreeding coefficient of
//! their offspring. A subject counts as its own ancestor at distance 0, which
//! is what gives a parent-offspring pair 0.25.
//!
//! Every recorded path from `a` up to a common ancestor is paired with every
//! recorded path from `b` up to it. A pair whose paths share no recorded bird
//! below the ancestor adds `0.5^(dA + dB + 1)`. With one path per side this is
//! the plain nearest-distance sum; an ancestor reached through two unrelated
//! parents contributes once per independent pair, while the parents of a
//! common parent are not counted again through that parent. The sum is
//! truncated at the pedigree depth and ignores the ancestors' own inbreeding.

use std::collections::BTreeMap;

use crate::pedigree::{AncestorLine, Pedigree, MAX_GENERATIONS};

/// Generations searched by default.
pub const DEFAULT_MAX_GENERATIONS: usize = MAX_GENERATIONS;

/// An individual as seen by the kinship calculation.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub id: &'a str,
    pub pedigree: Option<&'a Pedigree>,
}

impl<'a> Subject<'a> {
    pub fn new(id: &'a str, pedigree: Option<&'a Pedigree>) -> Self {
        Self { id, pedigree }
    }

    /// Self at distance 0 plus every pedigree path, each prefixed by the
    /// subject itself; `None` without a pedigree.
    fn lineage(&self, max_generations: usize) -> Option<Vec<AncestorLine>> {
        let mut lines = vec![AncestorLine {
            id: self.id.to_string(),
            distance: 0,
            via: Vec::new(),
        }];
        for mut line in self.pedigree?.ancestor_lines(max_generations) {
            line.via.insert(0, self.id.to_string());
            lines.push(line);
        }
        Some(lines)
    }
}

/// An ancestor shared by both subjects and what it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonAncestor {
    pub id: String,
    /// Shortest counted distance from `a`.
    pub distance_a: usize,
    /// Shortest counted distance from `b`.
    pub distance_b: usize,
    /// Independent path pairs through this ancestor.
    pub paths: usize,
    pub contribution: f64,
}

/// Ancestors common to `a` and `b` within `max_generations`, largest
/// contribution first (ties by id).
pub fn common_ancestors(a: &Subject<'_>, b: &Subject<'_>, max_generations: usize) -> Vec<CommonAncestor> {
    let (Some(la), Some(lb)) = (a.lineage(max_generations), b.lineage(max_generations)) else {
        return Vec::new();
    };
    let mut by_id: BTreeMap<&str, CommonAncestor> = BTreeMap::new();
    for line_a in &la {
        for line_b in lb.iter().filter(|l| l.id == line_a.id) {
            if line_b.via.iter().any(|v| line_a.via.contains(v)) {
                continue;
            }
            let (da, db) = (line_a.distance, line_b.distance);
            let contribution = 0.5f64.powi((da + db + 1) as i32);
            by_id
                .entry(line_a.id.as_str())
                .and_modify(|c| {
                    c.distance_a = c.distance_a.min(da);
                    c.distance_b = c.distance_b.min(db);
                    c.paths += 1;
                    c.contribution += contribution;
                })
                .or_insert_with(|| CommonAncestor {
                    id: line_a.id.clone(),
                    distance_a: da,
                    distance_b: db,
                    paths: 1,
                    contribution,
                });
        }
    }
    let mut common: Vec<CommonAncestor> = by_id.into_values().collect();
    common.sort_by(|x, y| {
        y.contribution
            .total_cmp(&x.contribution)
            .then_with(|| x.id.cmp(&y.id))
    });
    common
}

/// Coefficient of relationship of `a` and `b`, in `[0, 1]`.
///
/// Returns 0 when either subject has no pedigree or nothing is shared
/// within `max_generations`.
pub fn inbreeding_coefficient(a: &Subject<'_>, b: &Subject<'_>, max_generations: usize) -> f64 {
    common_ancestors(a, b, max_generations)
        .iter()
        .map(|c| c.contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn record(entries: &[(&str, &str)]) -> Pedigree {
        entries
            .iter()
            .try_fold(Pedigree::new(), |p, (k, v)| p.with(k, *v))
            .unwrap()
    }

    fn f(a: (&str, &Pedigree), b: (&str, &Pedigree)) -> f64 {
        inbreeding_coefficient(
            &Subject::new(a.0, Some(a.1)),
            &Subject::new(b.0, Some(b.1)),
            DEFAULT_MAX_GENERATIONS,
        )
    }

    #[test]
    fn unrelated_is_zero() {
        let a = record(&[("sire", "S1"), ("dam", "D1")]);
        let b = record(&[("sire", "S2"), ("dam", "D2")]);
        assert_eq!(f(("A", &a), ("B", &b)), 0.0);
    }

    #[test]
    fn full_siblings() {
        let p = record(&[("sire", "S"), ("dam", "D")]);
        assert!((f(("A", &p), ("B", &p)) - 0.25).abs() < TOL);
    }

    #[test]
    fn half_siblings() {
        let a = record(&[("sire", "S"), ("dam", "D1")]);
        let b = record(&[("sire", "S"), ("dam", "D2")]);
        assert!((f(("A", &a), ("B", &b)) - 0.125).abs() < TOL);
    }

    #[test]
    fn parent_and_offspring() {
        let parent = record(&[("sire", "GS"), ("dam", "GD")]);
        let child = Pedigree::from_parents(Some(("P", &parent)), Some(("M", &Pedigree::new())));
        assert!((f(("P", &parent), ("C", &child)) - 0.25).abs() < TOL);
        let common = common_ancestors(
            &Subject::new("P", Some(&parent)),
            &Subject::new("C", Some(&child)),
            DEFAULT_MAX_GENERATIONS,
        );
        // GS and GD are only reached through P on both sides.
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].id, "P");
        assert_eq!((common[0].distance_a, common[0].distance_b), (0, 1));
    }

    #[test]
    fn full_siblings_with_recorded_grandparents() {
        let sire = record(&[("sire", "GS"), ("dam", "GD")]);
        let dam = record(&[("sire", "GS2"), ("dam", "GD2")]);
        let p = Pedigree::from_parents(Some(("S", &sire)), Some(("D", &dam)));
        assert!((f(("A", &p), ("B", &p)) - 0.25).abs() < TOL);
    }

    #[test]
    fn first_cousins() {
        let sire_a = record(&[("sire", "G1"), ("dam", "G2")]);
        let sire_b = record(&[("sire", "G1"), ("dam", "G2")]);
        let a = Pedigree::from_parents(Some(("SA", &sire_a)), Some(("DA", &Pedigree::new())));
        let b = Pedigree::from_parents(Some(("SB", &sire_b)), Some(("DB", &Pedigree::new())));
        assert!((f(("A", &a), ("B", &b)) - 0.0625).abs() < TOL);
        let shallow = inbreeding_coefficient(&Subject::new("A", Some(&a)), &Subject::new("B", Some(&b)), 1);
        assert_eq!(shallow, 0.0);
    }

    #[test]
    fn repeated_ancestor_counts_each_path() {
        // S is both sire and great-grandsire of A: 0.5^3 + 0.5^5.
        let a = record(&[("sire", "S"), ("dam_dam_sire", "S")]);
        let b = record(&[("sire", "S")]);
        assert!((f(("A", &a), ("B", &b)) - 0.15625).abs() < TOL);
        let common = common_ancestors(&Subject::new("A", Some(&a)), &Subject::new("B", Some(&b)), 3);
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].paths, 2);
        assert_eq!((common[0].distance_a, common[0].distance_b), (1, 1));
    }

    #[test]
    fn full_siblings_whose_parents_are_half_siblings() {
        // S and D share their sire GS. A-S-GS-D-B and A-D-GS-S-B are
        // independent (0.5^5 each); A-S-GS-S-B repeats S and is skipped.
        // 0.25 + 2 * 0.03125 = 0.3125.
        let sire = record(&[("sire", "GS"), ("dam", "GD1")]);
        let dam = record(&[("sire", "GS"), ("dam", "GD2")]);
        let p = Pedigree::from_parents(Some(("S", &sire)), Some(("D", &dam)));
        assert!((f(("A", &p), ("B", &p)) - 0.3125).abs() < TOL);
        let common = common_ancestors(&Subject::new("A", Some(&p)), &Subject::new("B", Some(&p)), 3);
        let gs = common.iter().find(|c| c.id == "GS").unwrap();
        assert_eq!(gs.paths, 2);
        assert!((gs.contribution - 0.0625).abs() < TOL);
    }

    #[test]
    fn double_first_cousins() {
        // Sires are full sibs (G1 x G2), dams are full sibs (G3 x G4).
        // Four grandparents, one path pair each: 4 * 0.5^5 = 0.125.
        let sires = record(&[("sire", "G1"), ("dam", "G2")]);
        let dams = record(&[("sire", "G3"), ("dam", "G4")]);
        let a = Pedigree::from_parents(Some(("SA", &sires)), Some(("DA", &dams)));
        let b = Pedigree::from_parents(Some(("SB", &sires)), Some(("DB", &dams)));
        assert!((f(("A", &a), ("B", &b)) - 0.125).abs() < TOL);
        let common = common_ancestors(&Subject::new("A", Some(&a)), &Subject::new("B", Some(&b)), 3);
        assert_eq!(common.len(), 4);
        assert!(common.iter().all(|c| c.paths == 1));
    }

    #[test]
    fn missing_pedigree_is_zero() {
        let p = record(&[("sire", "S")]);
        let with = Subject::new("A", Some(&p));
        let without = Subject::new("B", None);
        assert_eq!(inbreeding_coefficient(&with, &without, 3), 0.0);
        assert!(common_ancestors(&without, &with, 3).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pedigree() -> impl Strategy<Value = Pedigree> {
        let ids = prop_oneof![Just(None), Just(Some("X")), Just(Some("Y")), Just(Some("Z")), Just(Some("W"))];
        proptest::collection::vec(ids, 14).prop_map(|slots| {
            Pedigree::from_slots(
                Pedigree::slot_keys()
                    .into_iter()
                    .zip(slots)
                    .map(|(k, id)| (k, id.map(str::to_string))),
            )
        })
    }

    proptest! {
        #[test]
        fn coefficient_in_unit_interval(a in pedigree(), b in pedigree()) {
            let fa = inbreeding_coefficient(&Subject::new("A", Some(&a)), &Subject::new("B", Some(&b)), 3);
            prop_assert!((0.0..=1.0).contains(&fa));
        }

        #[test]
        fn coefficient_is_symmetric(a in pedigree(), b in pedigree()) {
            let ab = inbreeding_coefficient(&Subject::new("A", Some(&a)), &Subject::new("B", Some(&b)), 3);
            let ba = inbreeding_coefficient(&Subject::new("B", Some(&b)), &Subject::new("A", Some(&a)), 3);
            prop_assert!((ab - ba).abs() < 1e-12);
        }
    }
}
