//! Locus registry: the read-only table of genetic loci a cross runs over.
//!
//! Every locus carries its allele notation (wild-type token, declared
//! alleles, canonical ordering), whether it sits on the Z chromosome, its
//! linkage group and map position, and the labels the fallback phenotype
//! cascade uses. The engine owns no hardcoded locus list: a registry is built
//! from JSON (or [`LocusRegistry::builtin`]) and shared behind an `Arc`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use plumage_core::{Annotated, PlumageError, Result};
use serde::{Deserialize, Serialize};

/// Token used for the wild-type allele unless a locus declares otherwise.
pub const WILD_TYPE: &str = "+";

/// Language used when a label is missing in the requested one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Name of the linkage group holding every Z-linked locus.
pub const SEX_LINKED_GROUP: &str = "Z";

/// Per-language labels, keyed by language code.
pub type Labels = BTreeMap<String, String>;

/// Resolve a label in `language`, falling back to [`DEFAULT_LANGUAGE`].
pub fn resolve_label<'a>(labels: &'a Labels, language: &str) -> Option<&'a str> {
    labels
        .get(language)
        .or_else(|| labels.get(DEFAULT_LANGUAGE))
        .map(String::as_str)
}

fn default_wild() -> String {
    WILD_TYPE.to_string()
}

/// How the two alleles of a heterozygote are ordered in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlleleOrder {
    /// Mutant before wild type; two mutants sort alphabetically.
    #[default]
    MutantFirst,
    /// Tokens sort by their index in the declared allele list.
    Declared,
}

/// Allele notation rules for one locus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleNotation {
    /// Wild-type token (`+` for most loci, `d` for the dark factor).
    #[serde(default = "default_wild")]
    pub wild: String,
    /// Declared tokens, most dominant first. May include the wild token.
    #[serde(default)]
    pub alleles: Vec<String>,
    /// Canonical ordering convention.
    #[serde(default)]
    pub order: AlleleOrder,
}

impl Default for AlleleNotation {
    fn default() -> Self {
        Self {
            wild: default_wild(),
            alleles: Vec::new(),
            order: AlleleOrder::MutantFirst,
        }
    }
}

impl AlleleNotation {
    /// Notation with a wild token and declared alleles, mutant-first order.
    pub fn new<S: Into<String>>(wild: impl Into<String>, alleles: impl IntoIterator<Item = S>) -> Self {
        Self {
            wild: wild.into(),
            alleles: alleles.into_iter().map(Into::into).collect(),
            order: AlleleOrder::MutantFirst,
        }
    }

    /// Switch to declared-order canonicalization.
    pub fn declared_order(mut self) -> Self {
        self.order = AlleleOrder::Declared;
        self
    }

    /// Whether `token` is this locus's wild-type allele.
    pub fn is_wild(&self, token: &str) -> bool {
        token == self.wild
    }

    /// Whether `token` is the wild type or one of the declared alleles.
    pub fn is_known(&self, token: &str) -> bool {
        self.is_wild(token) || self.alleles.iter().any(|a| a == token)
    }

    /// Index of `token` in the declared allele list.
    pub fn rank(&self, token: &str) -> Option<usize> {
        self.alleles.iter().position(|a| a == token)
    }

    /// First declared non-wild allele, the locus's principal mutation.
    pub fn primary_mutant(&self) -> Option<&str> {
        self.alleles
            .iter()
            .map(String::as_str)
            .find(|a| !self.is_wild(a))
    }
}

/// Part a locus plays in the fallback phenotype cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocusRole {
    /// Sets the base colour series (green, aqua, turquoise, blue).
    BaseColor,
    /// Darkens the base colour by dose.
    Shade,
    /// INO series; full expression masks other traits.
    Ino,
    /// Overlay trait appended to the label.
    #[default]
    Modifier,
}

/// Dominance class of a locus's mutant alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    #[default]
    Recessive,
    Dominant,
    /// Dose dependent: one copy and two copies look different.
    Incomplete,
}

/// A single genetic locus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locus {
    /// Identifier used as the genotype map key.
    pub key: String,
    /// Display name per language.
    #[serde(default)]
    pub names: Labels,
    /// Whether the locus sits on the Z chromosome.
    #[serde(default)]
    pub sex_linked: bool,
    /// Autosomal linkage group. Ignored for sex-linked loci, which all share
    /// [`SEX_LINKED_GROUP`].
    #[serde(default)]
    pub linkage_group: Option<String>,
    /// Map position within the linkage group, used for ordering only.
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub notation: AlleleNotation,
    #[serde(default)]
    pub role: LocusRole,
    #[serde(default)]
    pub expression: Expression,
    /// Trait label per language.
    #[serde(default)]
    pub labels: Labels,
    /// Labels keyed by allele token or canonical pair (`"Dd"`, `"inopld"`).
    #[serde(default)]
    pub allele_labels: BTreeMap<String, Labels>,
    /// INO labels keyed by the expressed base-colour allele.
    #[serde(default)]
    pub series_labels: BTreeMap<String, Labels>,
    /// Loci whose traits are invisible when this locus is fully expressed.
    #[serde(default)]
    pub masks: Vec<String>,
}

impl Locus {
    /// Create an unlinked modifier locus with default notation.
    pub fn new(key: impl Into<String>, sex_linked: bool) -> Self {
        Self {
            key: key.into(),
            names: Labels::new(),
            sex_linked,
            linkage_group: None,
            position: None,
            notation: AlleleNotation::default(),
            role: LocusRole::Modifier,
            expression: Expression::Recessive,
            labels: Labels::new(),
            allele_labels: BTreeMap::new(),
            series_labels: BTreeMap::new(),
            masks: Vec::new(),
        }
    }

    pub fn with_notation(mut self, notation: AlleleNotation) -> Self {
        self.notation = notation;
        self
    }

    pub fn with_linkage(mut self, group: impl Into<String>, position: f64) -> Self {
        self.linkage_group = Some(group.into());
        self.position = Some(position);
        self
    }

    pub fn with_role(mut self, role: LocusRole, expression: Expression) -> Self {
        self.role = role;
        self.expression = expression;
        self
    }

    pub fn with_label(mut self, language: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(language.into(), label.into());
        self
    }

    pub fn with_allele_label(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.allele_labels
            .entry(key.into())
            .or_default()
            .insert(DEFAULT_LANGUAGE.to_string(), label.into());
        self
    }

    pub fn with_series_label(mut self, base: impl Into<String>, label: impl Into<String>) -> Self {
        self.series_labels
            .entry(base.into())
            .or_default()
            .insert(DEFAULT_LANGUAGE.to_string(), label.into());
        self
    }

    pub fn with_masks<S: Into<String>>(mut self, masks: impl IntoIterator<Item = S>) -> Self {
        self.masks = masks.into_iter().map(Into::into).collect();
        self
    }

    /// Label for an allele token or canonical pair in `language`.
    pub fn allele_label(&self, key: &str, language: &str) -> Option<&str> {
        self.allele_labels
            .get(key)
            .and_then(|labels| resolve_label(labels, language))
    }

    /// Trait label in `language`, falling back to the key.
    pub fn trait_label(&self, language: &str) -> &str {
        resolve_label(&self.labels, language).unwrap_or(&self.key)
    }
}

impl Annotated for Locus {
    fn name(&self) -> &str {
        &self.key
    }

    fn display_name(&self, language: &str) -> Option<&str> {
        resolve_label(&self.names, language)
    }
}

/// Loci inherited together, in physical order along the chromosome.
#[derive(Debug, Clone)]
pub struct LinkageGroup<'a> {
    pub name: String,
    pub sex_linked: bool,
    pub loci: Vec<&'a Locus>,
}

impl LinkageGroup<'_> {
    /// Locus keys in positional order.
    pub fn keys(&self) -> Vec<&str> {
        self.loci.iter().map(|l| l.key.as_str()).collect()
    }
}

/// The registry split into the units a cross enumerates independently.
#[derive(Debug, Clone)]
pub struct LocusPartition<'a> {
    /// Autosomal loci with no linked partner, in registry order.
    pub unlinked: Vec<&'a Locus>,
    /// Autosomal groups of two or more linked loci.
    pub linked: Vec<LinkageGroup<'a>>,
    /// All sex-linked loci, if any.
    pub sex_linked: Option<LinkageGroup<'a>>,
}

/// Read-only table of loci, in registration order.
#[derive(Debug, Clone, Default)]
pub struct LocusRegistry {
    loci: Vec<Locus>,
    index: HashMap<String, usize>,
}

const BUILTIN_LOCI: &str = include_str!("../data/loci.json");

impl LocusRegistry {
    /// Build a registry, rejecting duplicate keys, empty wild tokens, and
    /// masks that name unknown loci.
    pub fn new(loci: Vec<Locus>) -> Result<Self> {
        let mut index = HashMap::with_capacity(loci.len());
        for (i, locus) in loci.iter().enumerate() {
            if locus.key.is_empty() {
                return Err(PlumageError::Table(format!("locus {i} has an empty key")));
            }
            if locus.notation.wild.is_empty() {
                return Err(PlumageError::Table(format!(
                    "locus '{}' has an empty wild-type token",
                    locus.key
                )));
            }
            if index.insert(locus.key.clone(), i).is_some() {
                return Err(PlumageError::Table(format!(
                    "duplicate locus key '{}'",
                    locus.key
                )));
            }
        }
        for locus in &loci {
            if let Some(missing) = locus.masks.iter().find(|m| !index.contains_key(*m)) {
                return Err(PlumageError::Table(format!(
                    "locus '{}' masks unknown locus '{}'",
                    locus.key, missing
                )));
            }
        }
        Ok(Self { loci, index })
    }

    /// Parse a JSON array of locus definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let loci: Vec<Locus> =
            serde_json::from_str(json).map_err(|e| PlumageError::Parse(format!("locus table: {e}")))?;
        Self::new(loci)
    }

    /// Read a JSON locus table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The embedded budgerigar-style default registry.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LOCI)
    }

    pub fn get(&self, key: &str) -> Option<&Locus> {
        self.index.get(key).map(|&i| &self.loci[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Loci in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Locus> {
        self.loci.iter()
    }

    /// First locus playing `role`, if any.
    pub fn find_role(&self, role: LocusRole) -> Option<&Locus> {
        self.loci.iter().find(|l| l.role == role)
    }

    /// Split loci into unlinked autosomal loci, linked autosomal groups, and
    /// the sex-linked group.
    ///
    /// Groups are ordered by first appearance in the registry; loci inside a
    /// group by map position (loci without one keep registry order, after
    /// positioned loci).
    pub fn partition(&self) -> LocusPartition<'_> {
        let mut group_order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Locus>> = HashMap::new();
        let mut singles: Vec<&Locus> = Vec::new();
        let mut z: Vec<&Locus> = Vec::new();

        for locus in &self.loci {
            if locus.sex_linked {
                z.push(locus);
                continue;
            }
            match locus.linkage_group.as_deref() {
                Some(g) => {
                    if !groups.contains_key(g) {
                        group_order.push(g);
                    }
                    groups.entry(g).or_default().push(locus);
                }
                None => singles.push(locus),
            }
        }

        let mut linked = Vec::new();
        for name in group_order {
            let mut loci = groups.remove(name).unwrap_or_default();
            if loci.len() < 2 {
                singles.extend(loci);
                continue;
            }
            sort_by_position(&mut loci);
            linked.push(LinkageGroup {
                name: name.to_string(),
                sex_linked: false,
                loci,
            });
        }

        // Singleton groups are unlinked; restore registry order.
        singles.sort_by_key(|l| self.index.get(&l.key).copied().unwrap_or(usize::MAX));

        let sex_linked = if z.is_empty() {
            None
        } else {
            sort_by_position(&mut z);
            Some(LinkageGroup {
                name: SEX_LINKED_GROUP.to_string(),
                sex_linked: true,
                loci: z,
            })
        };

        LocusPartition {
            unlinked: singles,
            linked,
            sex_linked,
        }
    }
}

fn sort_by_position(loci: &mut [&Locus]) {
    loci.sort_by(|a, b| {
        let pa = a.position.unwrap_or(f64::INFINITY);
        let pb = b.position.unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });
}
