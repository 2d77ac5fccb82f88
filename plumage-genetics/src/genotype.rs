//! Whole-individual genotypes: one allele pair per registry locus.

use std::collections::BTreeMap;

use plumage_core::Sex;
use serde::ser::{Serialize, Serializer};
use tracing::warn;

use crate::allele::{parse_for_sex, AllelePair};
use crate::locus::{Locus, LocusRegistry};

/// A genotype entry that could not be read and was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedGenotype {
    pub locus: String,
    pub input: String,
}

/// The allele pairs of one individual, keyed by locus.
///
/// Loci the genotype does not mention are wild type. Values are immutable
/// once built; crosses produce new genotypes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype {
    sex: Sex,
    loci: BTreeMap<String, AllelePair>,
}

impl Genotype {
    /// All-wild-type genotype for `sex` over every registry locus.
    pub fn wild_type(registry: &LocusRegistry, sex: Sex) -> Self {
        let loci = registry
            .iter()
            .map(|l| (l.key.clone(), wild_pair(l, sex)))
            .collect();
        Self { sex, loci }
    }

    /// Build from already-structured pairs.
    pub fn from_pairs(sex: Sex, pairs: impl IntoIterator<Item = (String, AllelePair)>) -> Self {
        Self {
            sex,
            loci: pairs.into_iter().collect(),
        }
    }

    /// Parse breeder notation for every registry locus.
    ///
    /// Entries naming unknown loci are ignored; unreadable strings fall back
    /// to wild type. Both are logged.
    pub fn parse<I, K, V>(registry: &LocusRegistry, sex: Sex, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::parse_checked(registry, sex, entries).0
    }

    /// Like [`parse`](Self::parse), also returning the entries that were
    /// replaced by defaults.
    pub fn parse_checked<I, K, V>(
        registry: &LocusRegistry,
        sex: Sex,
        entries: I,
    ) -> (Self, Vec<MalformedGenotype>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut genotype = Self::wild_type(registry, sex);
        let mut malformed = Vec::new();
        for (key, value) in entries {
            let (key, value) = (key.as_ref(), value.as_ref());
            let Some(locus) = registry.get(key) else {
                warn!(locus = key, "genotype names a locus missing from the registry; ignored");
                continue;
            };
            let parsed = parse_for_sex(value, locus, sex);
            if parsed.malformed {
                warn!(
                    locus = key,
                    input = value,
                    parsed = %parsed.pair,
                    "unrecognized genotype notation"
                );
                malformed.push(MalformedGenotype {
                    locus: key.to_string(),
                    input: value.to_string(),
                });
            }
            genotype.loci.insert(key.to_string(), parsed.pair);
        }
        (genotype, malformed)
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn get(&self, key: &str) -> Option<&AllelePair> {
        self.loci.get(key)
    }

    /// The pair at `locus`, or its wild-type default for this sex.
    pub fn pair_or_wild(&self, locus: &Locus) -> AllelePair {
        self.loci
            .get(&locus.key)
            .cloned()
            .unwrap_or_else(|| wild_pair(locus, self.sex))
    }

    /// `(locus key, pair)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AllelePair)> {
        self.loci.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Canonical string per locus, as breeders read it.
    pub fn to_canonical_map(&self, registry: &LocusRegistry) -> BTreeMap<String, String> {
        self.loci
            .iter()
            .map(|(k, pair)| {
                let text = match registry.get(k) {
                    Some(locus) => pair.canonical(&locus.notation),
                    None => pair.to_string(),
                };
                (k.clone(), text)
            })
            .collect()
    }

    /// Loci where this genotype differs from wild type, in canonical form.
    pub fn mutations(&self, registry: &LocusRegistry) -> Vec<(String, String)> {
        registry
            .iter()
            .filter_map(|locus| {
                let pair = self.pair_or_wild(locus);
                (!pair.mutants(&locus.notation).is_empty())
                    .then(|| (locus.key.clone(), pair.canonical(&locus.notation)))
            })
            .collect()
    }
}

/// Serializes as a map of locus key to allele-pair string.
impl Serialize for Genotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.loci.iter().map(|(k, v)| (k, v.to_string())))
    }
}

fn wild_pair(locus: &Locus, sex: Sex) -> AllelePair {
    AllelePair::wild(&locus.notation, locus.sex_linked && sex.is_hemizygous())
}
