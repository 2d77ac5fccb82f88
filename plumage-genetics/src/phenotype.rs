//! Phenotype labels for finished genotypes.
//!
//! Two strategies implement [`PhenotypeInferencer`]:
//!
//! - [`MasterTableInferencer`] looks the genotype up in a colour master table
//!   supplied by the host and returns the best-matching entry's label.
//! - [`RuleCascade`] builds a composite label from the locus registry alone:
//!   INO epistasis first, then base colour, shade, and visible modifiers.
//!
//! The master table delegates to a fallback (normally the cascade) when no
//! entry matches.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use plumage_core::{PlumageError, Result, Sex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allele::{parse_alleles_checked, parse_hemizygous_checked, AllelePair, HEMIZYGOUS_MARKER};
use crate::genotype::Genotype;
use crate::locus::{resolve_label, Expression, Labels, Locus, LocusRegistry, LocusRole, DEFAULT_LANGUAGE};

/// Label returned when nothing classifies a genotype.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Cascade label for a bird with no visible trait fragments.
pub const WILD_TYPE_LABEL: &str = "Wild type";

/// Strategy that names the visible phenotype of a genotype.
pub trait PhenotypeInferencer: Send + Sync {
    fn infer(&self, genotype: &Genotype, sex: Sex) -> String;
}

/// The pair as it is expressed in an individual of `sex`.
///
/// Females show a single allele at sex-linked loci (a diploid record
/// contributes its `first` allele); a hemizygous record at an autosomal or
/// male locus counts as homozygous.
pub fn visible_pair(locus: &Locus, genotype: &Genotype, sex: Sex) -> AllelePair {
    let hemizygous = locus.sex_linked && sex.is_hemizygous();
    match (hemizygous, genotype.pair_or_wild(locus)) {
        (true, AllelePair::Diploid(a, _)) => AllelePair::Hemizygous(a),
        (false, p @ AllelePair::Hemizygous(_)) => p.as_homozygous(),
        (_, p) => p,
    }
}

// ── Rule cascade ──

/// Registry-driven fallback labelling.
#[derive(Debug, Clone)]
pub struct RuleCascade {
    registry: Arc<LocusRegistry>,
    language: String,
}

struct BaseColor {
    /// Canonical pair, e.g. `"aqtq"`, or the wild token.
    pair_key: String,
    /// Allele that determines the colour.
    allele: String,
}

impl RuleCascade {
    pub fn new(registry: Arc<LocusRegistry>) -> Self {
        Self {
            registry,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Label fragments in display order: INO series label or shade and base
    /// colour, followed by visible modifiers in registry order.
    pub fn fragments(&self, genotype: &Genotype, sex: Sex) -> Vec<String> {
        let lang = self.language.as_str();
        let base = self
            .registry
            .find_role(LocusRole::BaseColor)
            .map(|locus| (locus, base_color(locus, &visible_pair(locus, genotype, sex))));

        let mut masked: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();

        let ino = self.registry.iter().find(|l| {
            l.role == LocusRole::Ino
                && l.notation
                    .primary_mutant()
                    .is_some_and(|m| visible_pair(l, genotype, sex).expresses(m))
        });

        if let Some(ino) = ino {
            masked.insert(ino.key.as_str());
            masked.extend(ino.masks.iter().map(String::as_str));
            out.push(ino_label(ino, base.as_ref().map(|(_, b)| b), lang));
        } else {
            for shade in self.registry.iter().filter(|l| l.role == LocusRole::Shade) {
                let pair = visible_pair(shade, genotype, sex);
                if let Some(label) = shade_label(shade, &pair, lang) {
                    out.push(label);
                }
            }
            if let Some((locus, color)) = &base {
                let label = locus
                    .allele_label(&color.pair_key, lang)
                    .or_else(|| locus.allele_label(&color.allele, lang))
                    .unwrap_or(&color.allele);
                out.push(label.to_string());
            }
        }

        for locus in self.registry.iter() {
            if !matches!(locus.role, LocusRole::Modifier | LocusRole::Ino)
                || masked.contains(locus.key.as_str())
            {
                continue;
            }
            let pair = visible_pair(locus, genotype, sex);
            if let Some(label) = modifier_label(locus, &pair, lang) {
                out.push(label);
            }
        }
        out
    }
}

impl PhenotypeInferencer for RuleCascade {
    fn infer(&self, genotype: &Genotype, sex: Sex) -> String {
        let fragments = self.fragments(genotype, sex);
        if fragments.is_empty() {
            WILD_TYPE_LABEL.to_string()
        } else {
            fragments.join(" ")
        }
    }
}

/// Wild type wins; two mutants resolve by declared rank.
fn base_color(locus: &Locus, pair: &AllelePair) -> BaseColor {
    let n = &locus.notation;
    if pair.carries(&n.wild) {
        return BaseColor {
            pair_key: n.wild.clone(),
            allele: n.wild.clone(),
        };
    }
    let (a, b) = (pair.first().as_str(), pair.second().as_str());
    let allele = match (n.rank(a), n.rank(b)) {
        (Some(x), Some(y)) if y < x => b,
        (None, Some(_)) => b,
        (None, None) if b < a => b,
        _ => a,
    };
    BaseColor {
        pair_key: pair.as_homozygous().canonical(n),
        allele: allele.to_string(),
    }
}

fn ino_label(ino: &Locus, base: Option<&BaseColor>, lang: &str) -> String {
    let series = |key: &str| {
        ino.series_labels
            .get(key)
            .and_then(|labels| resolve_label(labels, lang))
    };
    base.and_then(|b| series(&b.pair_key).or_else(|| series(&b.allele)))
        .or_else(|| {
            ino.notation
                .primary_mutant()
                .and_then(|m| ino.allele_label(m, lang))
        })
        .unwrap_or_else(|| ino.trait_label(lang))
        .to_string()
}

fn shade_label(locus: &Locus, pair: &AllelePair, lang: &str) -> Option<String> {
    let n = &locus.notation;
    match locus.allele_label(&pair.canonical(n), lang) {
        Some(label) => Some(label.to_string()),
        None if !pair.mutants(n).is_empty() => Some(locus.trait_label(lang).to_string()),
        None => None,
    }
}

fn modifier_label(locus: &Locus, pair: &AllelePair, lang: &str) -> Option<String> {
    let n = &locus.notation;
    let mutants = pair.mutants(n);
    let visible = match locus.expression {
        Expression::Recessive => !mutants.is_empty() && !pair.carries(&n.wild),
        Expression::Dominant | Expression::Incomplete => !mutants.is_empty(),
    };
    if !visible {
        return None;
    }
    let label = locus
        .allele_label(&pair.canonical(n), lang)
        .or_else(|| mutants.first().and_then(|a| locus.allele_label(a.as_str(), lang)))
        .unwrap_or_else(|| locus.trait_label(lang));
    Some(label.to_string())
}

// ── Master table ──

/// What an entry requires at one locus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    /// Exactly this pair, e.g. `"blbl"`.
    Pair(String),
    /// Any of these pairs.
    AnyOf(Vec<String>),
    /// Homozygous, or hemizygous, for the allele.
    Expressed { expressed: String },
    /// At least one copy of the allele.
    Carries { carries: String },
}

/// One row of a colour master table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeEntry {
    pub id: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub requires: BTreeMap<String, Requirement>,
}

impl PhenotypeEntry {
    pub fn label(&self, language: &str) -> &str {
        resolve_label(&self.labels, language).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone)]
enum Condition {
    /// Canonical diploid forms.
    OneOf(Vec<String>),
    Expressed(String),
    Carries(String),
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    entry: PhenotypeEntry,
    conditions: Vec<(String, Condition)>,
}

/// Colour master table, validated against a locus registry.
#[derive(Debug, Clone, Default)]
pub struct MasterTable {
    entries: Vec<CompiledEntry>,
}

const BUILTIN_PHENOTYPES: &str = include_str!("../data/phenotypes.json");

impl MasterTable {
    /// Compile entries against `registry`.
    ///
    /// Pair requirements are canonicalized, so `"dD"` and `"Dd"` are the
    /// same; a sex-linked requirement may be written hemizygous (`"inoW"`)
    /// and matches a male homozygous for the allele as well.
    ///
    /// # Errors
    ///
    /// Returns [`PlumageError::Table`] for a requirement naming an unknown
    /// locus or an allele outside the locus's notation.
    pub fn new(entries: Vec<PhenotypeEntry>, registry: &LocusRegistry) -> Result<Self> {
        let mut compiled = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut conditions = Vec::with_capacity(entry.requires.len());
            for (key, req) in &entry.requires {
                let locus = registry.get(key).ok_or_else(|| {
                    PlumageError::Table(format!(
                        "phenotype '{}' requires unknown locus '{key}'",
                        entry.id
                    ))
                })?;
                let condition = match req {
                    Requirement::Pair(text) => {
                        Condition::OneOf(vec![canonical_requirement(&entry.id, text, locus)?])
                    }
                    Requirement::AnyOf(texts) => Condition::OneOf(
                        texts
                            .iter()
                            .map(|t| canonical_requirement(&entry.id, t, locus))
                            .collect::<Result<_>>()?,
                    ),
                    Requirement::Expressed { expressed } => {
                        Condition::Expressed(known_allele(&entry.id, expressed, locus)?)
                    }
                    Requirement::Carries { carries } => {
                        Condition::Carries(known_allele(&entry.id, carries, locus)?)
                    }
                };
                conditions.push((key.clone(), condition));
            }
            compiled.push(CompiledEntry { entry, conditions });
        }
        Ok(Self { entries: compiled })
    }

    pub fn from_json(json: &str, registry: &LocusRegistry) -> Result<Self> {
        let entries: Vec<PhenotypeEntry> = serde_json::from_str(json)
            .map_err(|e| PlumageError::Parse(format!("phenotype table: {e}")))?;
        Self::new(entries, registry)
    }

    pub fn from_path(path: impl AsRef<Path>, registry: &LocusRegistry) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text, registry)
    }

    /// The embedded colour table for [`LocusRegistry::builtin`].
    pub fn builtin(registry: &LocusRegistry) -> Result<Self> {
        Self::from_json(BUILTIN_PHENOTYPES, registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PhenotypeEntry> {
        self.entries.iter().map(|c| &c.entry)
    }

    /// The matching entry with the most requirements; ties go to the entry
    /// listed first.
    pub fn best_match(
        &self,
        registry: &LocusRegistry,
        genotype: &Genotype,
        sex: Sex,
    ) -> Option<&PhenotypeEntry> {
        let mut best: Option<&CompiledEntry> = None;
        for candidate in &self.entries {
            let matches = candidate.conditions.iter().all(|(key, cond)| {
                registry
                    .get(key)
                    .is_some_and(|locus| condition_holds(cond, &visible_pair(locus, genotype, sex), locus))
            });
            if matches && best.map_or(true, |b| candidate.conditions.len() > b.conditions.len()) {
                best = Some(candidate);
            }
        }
        best.map(|c| &c.entry)
    }
}

fn canonical_requirement(id: &str, text: &str, locus: &Locus) -> Result<String> {
    let n = &locus.notation;
    let text = text.trim();
    let parsed = if locus.sex_linked && text.ends_with(HEMIZYGOUS_MARKER) {
        parse_hemizygous_checked(text, locus)
    } else {
        parse_alleles_checked(text, locus)
    };
    let pair = parsed.pair.as_homozygous();
    let readable = !text.is_empty()
        && !parsed.malformed
        && [pair.first(), pair.second()]
            .iter()
            .all(|a| n.alleles.is_empty() || n.is_known(a.as_str()));
    if !readable {
        return Err(PlumageError::Table(format!(
            "phenotype '{id}': unreadable requirement '{text}' at locus '{}'",
            locus.key
        )));
    }
    Ok(pair.canonical(n))
}

fn known_allele(id: &str, token: &str, locus: &Locus) -> Result<String> {
    if locus.notation.alleles.is_empty() || locus.notation.is_known(token) {
        Ok(token.to_string())
    } else {
        Err(PlumageError::Table(format!(
            "phenotype '{id}': allele '{token}' is not declared for locus '{}'",
            locus.key
        )))
    }
}

fn condition_holds(cond: &Condition, pair: &AllelePair, locus: &Locus) -> bool {
    match cond {
        Condition::OneOf(pairs) => {
            let key = pair.as_homozygous().canonical(&locus.notation);
            pairs.iter().any(|p| *p == key)
        }
        Condition::Expressed(a) => pair.expresses(a),
        Condition::Carries(a) => pair.carries(a),
    }
}

/// Master-table lookup with an optional fallback strategy.
pub struct MasterTableInferencer {
    table: Arc<MasterTable>,
    registry: Arc<LocusRegistry>,
    language: String,
    fallback: Option<Arc<dyn PhenotypeInferencer>>,
}

impl MasterTableInferencer {
    /// Inferencer with no fallback; misses are [`UNCLASSIFIED`].
    pub fn new(table: Arc<MasterTable>, registry: Arc<LocusRegistry>) -> Self {
        Self {
            table,
            registry,
            language: DEFAULT_LANGUAGE.to_string(),
            fallback: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PhenotypeInferencer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Fall back to a [`RuleCascade`] over the same registry and language.
    pub fn with_cascade(self) -> Self {
        let cascade = RuleCascade::new(Arc::clone(&self.registry)).with_language(self.language.clone());
        self.with_fallback(Arc::new(cascade))
    }

    pub fn table(&self) -> &MasterTable {
        &self.table
    }
}

impl PhenotypeInferencer for MasterTableInferencer {
    fn infer(&self, genotype: &Genotype, sex: Sex) -> String {
        if let Some(entry) = self.table.best_match(&self.registry, genotype, sex) {
            return entry.label(&self.language).to_string();
        }
        warn!(
            sex = %sex,
            genotype = ?genotype.mutations(&self.registry),
            "no master-table entry matches; using fallback"
        );
        match &self.fallback {
            Some(fallback) => fallback.infer(genotype, sex),
            None => UNCLASSIFIED.to_string(),
        }
    }
}
