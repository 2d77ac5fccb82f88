//! Three-generation pedigree records keyed by relation path.
//!
//! A record has 14 slots: two parents, four grandparents, eight
//! great-grandparents. A slot is named by the path from the individual to the
//! ancestor (`sire`, `dam_sire`, `sire_dam_dam`), so its generation is the
//! path length. Records of offspring are derived from the parents' records
//! shifted one generation back.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use plumage_core::{PlumageError, Result};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

/// Generations a record holds.
pub const MAX_GENERATIONS: usize = 3;

const STEP_SEPARATOR: char = '_';

/// One step up the pedigree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parent {
    Sire,
    Dam,
}

impl Parent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parent::Sire => "sire",
            Parent::Dam => "dam",
        }
    }
}

/// Path from an individual to one of its ancestors.
///
/// Ordered by generation, then sire before dam at each step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationPath(Vec<Parent>);

impl RelationPath {
    /// A path of one or more steps.
    pub fn new(steps: Vec<Parent>) -> Result<Self> {
        if steps.is_empty() {
            return Err(PlumageError::InvalidInput("relation path must have at least one step".into()));
        }
        Ok(Self(steps))
    }

    pub fn sire() -> Self {
        Self(vec![Parent::Sire])
    }

    pub fn dam() -> Self {
        Self(vec![Parent::Dam])
    }

    pub fn steps(&self) -> &[Parent] {
        &self.0
    }

    /// 1 for parents, 2 for grandparents, 3 for great-grandparents.
    pub fn generation(&self) -> usize {
        self.0.len()
    }

    /// The same ancestor seen from a child of this individual via `parent`.
    pub fn through(&self, parent: Parent) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.push(parent);
        steps.extend_from_slice(&self.0);
        Self(steps)
    }

    /// All paths of exactly `generation` steps, in canonical order.
    pub fn all_of_generation(generation: usize) -> Vec<Self> {
        (0..1usize << generation)
            .map(|bits| {
                let steps = (0..generation)
                    .map(|i| {
                        if (bits >> (generation - 1 - i)) & 1 == 0 {
                            Parent::Sire
                        } else {
                            Parent::Dam
                        }
                    })
                    .collect();
                Self(steps)
            })
            .collect()
    }
}

impl Ord for RelationPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.generation()
            .cmp(&other.generation())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for RelationPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RelationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{STEP_SEPARATOR}")?;
            }
            f.write_str(step.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for RelationPath {
    type Err = PlumageError;

    fn from_str(s: &str) -> Result<Self> {
        let steps = s
            .split(STEP_SEPARATOR)
            .map(|step| match step {
                "sire" => Ok(Parent::Sire),
                "dam" => Ok(Parent::Dam),
                other => Err(PlumageError::Parse(format!(
                    "relation path '{s}': unknown step '{other}'"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(steps)
    }
}

/// Ancestor ids of one individual, up to [`MAX_GENERATIONS`] back.
///
/// Serializes as a map over every slot key, empty slots as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pedigree {
    slots: BTreeMap<RelationPath, String>,
}

impl Pedigree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The 14 slot paths in canonical order.
    pub fn slot_paths() -> Vec<RelationPath> {
        (1..=MAX_GENERATIONS)
            .flat_map(RelationPath::all_of_generation)
            .collect()
    }

    /// The 14 slot keys in canonical order (`sire`, `dam`, `sire_sire`, ...).
    pub fn slot_keys() -> Vec<String> {
        Self::slot_paths().iter().map(ToString::to_string).collect()
    }

    /// Build from `(slot key, id)` entries. Unknown keys and slots deeper
    /// than [`MAX_GENERATIONS`] are skipped with a warning.
    pub fn from_slots<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        let mut pedigree = Self::new();
        for (key, id) in entries {
            let key = key.as_ref();
            match key.parse::<RelationPath>() {
                Ok(path) if path.generation() <= MAX_GENERATIONS => {
                    if let Some(id) = id {
                        pedigree.slots.insert(path, id);
                    }
                }
                _ => warn!(slot = key, "ignoring unknown pedigree slot"),
            }
        }
        pedigree
    }

    /// Fill or clear one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is deeper than [`MAX_GENERATIONS`].
    pub fn set(&mut self, path: RelationPath, id: Option<String>) -> Result<()> {
        if path.generation() > MAX_GENERATIONS {
            return Err(PlumageError::InvalidInput(format!(
                "pedigree slot '{path}' is deeper than {MAX_GENERATIONS} generations"
            )));
        }
        match id {
            Some(id) => {
                self.slots.insert(path, id);
            }
            None => {
                self.slots.remove(&path);
            }
        }
        Ok(())
    }

    /// Builder form of [`set`](Self::set) taking a slot key.
    pub fn with(mut self, key: &str, id: impl Into<String>) -> Result<Self> {
        self.set(key.parse()?, Some(id.into()))?;
        Ok(self)
    }

    pub fn get(&self, path: &RelationPath) -> Option<&str> {
        self.slots.get(path).map(String::as_str)
    }

    /// Ancestor in the slot named `key`, if the key is valid and filled.
    pub fn get_key(&self, key: &str) -> Option<&str> {
        key.parse::<RelationPath>().ok().and_then(|p| self.get(&p))
    }

    pub fn sire(&self) -> Option<&str> {
        self.get(&RelationPath::sire())
    }

    pub fn dam(&self) -> Option<&str> {
        self.get(&RelationPath::dam())
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Filled slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&RelationPath, &str)> {
        self.slots.iter().map(|(p, id)| (p, id.as_str()))
    }

    /// Record of a new individual from its parents' ids and records.
    ///
    /// Each parent's own slots move one generation back under that parent;
    /// slots that would fall beyond [`MAX_GENERATIONS`] are dropped.
    pub fn from_parents(sire: Option<(&str, &Pedigree)>, dam: Option<(&str, &Pedigree)>) -> Self {
        let mut pedigree = Self::new();
        for (parent, entry) in [(Parent::Sire, sire), (Parent::Dam, dam)] {
            let Some((id, record)) = entry else { continue };
            pedigree.slots.insert(RelationPath(vec![parent]), id.to_string());
            for (path, ancestor) in &record.slots {
                let shifted = path.through(parent);
                if shifted.generation() <= MAX_GENERATIONS {
                    pedigree.slots.insert(shifted, ancestor.clone());
                }
            }
        }
        pedigree
    }

    /// Ancestor id → generation distance, up to `max_generations` back
    /// (capped at [`MAX_GENERATIONS`]). An ancestor reached by several paths
    /// keeps its nearest distance.
    pub fn ancestors(&self, max_generations: usize) -> BTreeMap<String, usize> {
        let limit = max_generations.min(MAX_GENERATIONS);
        let mut out: BTreeMap<String, usize> = BTreeMap::new();
        for (path, id) in &self.slots {
            let distance = path.generation();
            if distance > limit {
                continue;
            }
            out.entry(id.clone())
                .and_modify(|d| *d = (*d).min(distance))
                .or_insert(distance);
        }
        out
    }

    /// Every recorded path to an ancestor within `max_generations`, in
    /// canonical slot order. An ancestor filling several slots appears once
    /// per slot. Each line lists the recorded ids between the individual and
    /// the ancestor; unrecorded intermediate slots are skipped.
    pub fn ancestor_lines(&self, max_generations: usize) -> Vec<AncestorLine> {
        let limit = max_generations.min(MAX_GENERATIONS);
        self.slots
            .iter()
            .filter(|(path, _)| path.generation() <= limit)
            .map(|(path, id)| {
                let via = (1..path.generation())
                    .filter_map(|k| self.slots.get(&RelationPath(path.0[..k].to_vec())).cloned())
                    .collect();
                AncestorLine {
                    id: id.clone(),
                    distance: path.generation(),
                    via,
                }
            })
            .collect()
    }
}

/// One path from an individual up to an ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorLine {
    pub id: String,
    pub distance: usize,
    pub via: Vec<String>,
}

impl Serialize for Pedigree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let paths = Self::slot_paths();
        let mut map = serializer.serialize_map(Some(paths.len()))?;
        for path in &paths {
            map.serialize_entry(&path.to_string(), &self.get(path))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pedigree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: BTreeMap<String, Option<String>> = BTreeMap::deserialize(deserializer)?;
        Ok(Self::from_slots(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(key: &str) -> RelationPath {
        key.parse().unwrap()
    }

    #[test]
    fn slot_keys_canonical_order() {
        let keys = Pedigree::slot_keys();
        assert_eq!(keys.len(), 14);
        assert_eq!(&keys[..6], &["sire", "dam", "sire_sire", "sire_dam", "dam_sire", "dam_dam"]);
        assert_eq!(keys[6], "sire_sire_sire");
        assert_eq!(keys[13], "dam_dam_dam");
    }

    #[test]
    fn relation_path_parse_and_format() {
        let p = path("dam_sire_dam");
        assert_eq!(p.generation(), 3);
        assert_eq!(p.steps(), &[Parent::Dam, Parent::Sire, Parent::Dam]);
        assert_eq!(p.to_string(), "dam_sire_dam");
        assert!("".parse::<RelationPath>().is_err());
        assert!("sire_uncle".parse::<RelationPath>().is_err());
        assert!(RelationPath::new(vec![]).is_err());
    }

    #[test]
    fn paths_order_by_generation() {
        assert!(path("dam") < path("sire_sire"));
        assert!(path("sire") < path("dam"));
        assert!(path("sire_dam") < path("dam_sire"));
    }

    #[test]
    fn set_rejects_deep_slots() {
        let mut p = Pedigree::new();
        assert!(p.set(path("sire_sire_sire_sire"), Some("X".into())).is_err());
        p.set(path("sire"), Some("S".into())).unwrap();
        assert_eq!(p.sire(), Some("S"));
        p.set(path("sire"), None).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn from_parents_shifts_slots() {
        let sire_record = Pedigree::new()
            .with("sire", "GS")
            .unwrap()
            .with("dam_dam", "GGD")
            .unwrap()
            .with("sire_sire_sire", "TOO_OLD")
            .unwrap();
        let dam_record = Pedigree::new().with("dam", "GD").unwrap();
        let child = Pedigree::from_parents(Some(("S", &sire_record)), Some(("D", &dam_record)));
        assert_eq!(child.sire(), Some("S"));
        assert_eq!(child.dam(), Some("D"));
        assert_eq!(child.get_key("sire_sire"), Some("GS"));
        assert_eq!(child.get_key("sire_dam_dam"), Some("GGD"));
        assert_eq!(child.get_key("dam_dam"), Some("GD"));
        assert!(child.iter().all(|(_, id)| id != "TOO_OLD"));
        assert_eq!(child.len(), 5);
    }

    #[test]
    fn from_parents_with_missing_dam() {
        let child = Pedigree::from_parents(Some(("S", &Pedigree::new())), None);
        assert_eq!(child.sire(), Some("S"));
        assert_eq!(child.dam(), None);
    }

    #[test]
    fn ancestors_keep_nearest_distance() {
        let p = Pedigree::new()
            .with("sire", "A")
            .unwrap()
            .with("dam_sire", "B")
            .unwrap()
            .with("dam_dam_sire", "A")
            .unwrap()
            .with("sire_sire_dam", "C")
            .unwrap();
        let all = p.ancestors(3);
        assert_eq!(all["A"], 1);
        assert_eq!(all["B"], 2);
        assert_eq!(all["C"], 3);
        let near = p.ancestors(2);
        assert!(!near.contains_key("C"));
        assert_eq!(p.ancestors(10).len(), 3);
    }

    #[test]
    fn ancestor_lines_record_intermediates() {
        let p = Pedigree::new()
            .with("sire", "S")
            .unwrap()
            .with("sire_dam", "SD")
            .unwrap()
            .with("sire_dam_sire", "X")
            .unwrap()
            .with("dam_sire_sire", "Y")
            .unwrap()
            .with("dam_dam_dam", "S")
            .unwrap();
        let lines = p.ancestor_lines(3);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], AncestorLine { id: "S".into(), distance: 1, via: vec![] });
        assert_eq!(lines[1].via, vec!["S"]);
        let x = lines.iter().find(|l| l.id == "X").unwrap();
        assert_eq!(x.via, vec!["S", "SD"]);
        // dam and dam_sire are unrecorded.
        assert!(lines.iter().find(|l| l.id == "Y").unwrap().via.is_empty());
        // S is reached along two paths.
        assert_eq!(lines.iter().filter(|l| l.id == "S").count(), 2);
        assert_eq!(p.ancestor_lines(2).len(), 2);
    }

    #[test]
    fn serializes_every_slot() {
        let p = Pedigree::new().with("dam_sire", "B").unwrap();
        let json = serde_json::to_value(&p).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 14);
        assert_eq!(json["dam_sire"], "B");
        assert!(json["sire"].is_null());
    }

    #[test]
    fn deserialize_skips_unknown_keys() {
        let json = r#"{"sire": "S", "dam": null, "sire_uncle": "U", "sire_sire_sire_sire": "Z"}"#;
        let p: Pedigree = serde_json::from_str(json).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.sire(), Some("S"));
        let back: Pedigree = serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }
}
