//! Cross orchestration: from two parent genotypes to a sorted list of
//! offspring outcomes.
//!
//! The registry is split into independent components (unlinked autosomal
//! loci, linked autosomal groups, the Z group). Each component yields an
//! offspring distribution; the joint distribution is their product, with the
//! Z component differing between sons and daughters. Outcomes are labelled,
//! merged, and sorted.

use std::collections::HashMap;
use std::sync::Arc;

use plumage_core::{PlumageError, ProbabilityMap, Result, Sex, Summarizable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allele::{normalize, AllelePair};
use crate::gamete::{gametes_for_linkage_group, DEFAULT_GAMETE_EPSILON};
use crate::genotype::Genotype;
use crate::locus::{LocusRegistry, DEFAULT_LANGUAGE};
use crate::phenotype::{MasterTable, MasterTableInferencer, PhenotypeInferencer, RuleCascade};
use crate::punnett::punnett_map;
use crate::recombination::RecombinationMap;
use crate::sexlinked::sex_linked_cross;

/// Probability of each sex among offspring.
pub const SEX_RATIO: f64 = 0.5;

/// Outcomes below this probability are dropped by default.
pub const DEFAULT_OUTCOME_THRESHOLD: f64 = 1e-3;

// ── Configuration ──

/// How raw outcomes are collapsed before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Identical (sex, phenotype) merge; the first genotype seen is kept.
    #[default]
    ByPhenotype,
    /// Identical (sex, genotype) merge; every distinct genotype is kept.
    ByGenotype,
}

/// Tunables for [`CrossEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossConfig {
    /// Per-group gamete pruning threshold.
    pub gamete_epsilon: f64,
    /// Joint-outcome pruning threshold.
    pub outcome_threshold: f64,
    pub merge: MergeMode,
    /// Language for phenotype labels.
    pub language: String,
}

impl Default for CrossConfig {
    fn default() -> Self {
        Self {
            gamete_epsilon: DEFAULT_GAMETE_EPSILON,
            outcome_threshold: DEFAULT_OUTCOME_THRESHOLD,
            merge: MergeMode::ByPhenotype,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl CrossConfig {
    /// Reject thresholds outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gamete_epsilon", self.gamete_epsilon),
            ("outcome_threshold", self.outcome_threshold),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(PlumageError::InvalidInput(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PlumageError::Parse(format!("cross config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

// ── Result types ──

/// One offspring class of a cross.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossOutcome {
    pub sex: Sex,
    pub genotype: Genotype,
    pub probability: f64,
    pub phenotype: String,
}

impl Summarizable for CrossOutcome {
    fn summary(&self) -> String {
        format!("{:.2}% {} {}", self.probability * 100.0, self.sex, self.phenotype)
    }
}

#[derive(PartialEq, Eq, Hash)]
enum MergeKey {
    Phenotype(Sex, String),
    Genotype(Genotype),
}

impl MergeKey {
    fn of(outcome: &CrossOutcome, mode: MergeMode) -> Self {
        match mode {
            MergeMode::ByPhenotype => Self::Phenotype(outcome.sex, outcome.phenotype.clone()),
            MergeMode::ByGenotype => Self::Genotype(outcome.genotype.clone()),
        }
    }
}

/// Collapse outcomes sharing a merge key, summing probabilities.
///
/// The first outcome seen for each key is kept as the representative, so
/// the result is independent of input order up to that choice.
pub fn merge_outcomes(outcomes: Vec<CrossOutcome>, mode: MergeMode) -> Vec<CrossOutcome> {
    let mut index: HashMap<MergeKey, usize> = HashMap::new();
    let mut merged: Vec<CrossOutcome> = Vec::new();
    for outcome in outcomes {
        let key = MergeKey::of(&outcome, mode);
        match index.get(&key) {
            Some(&i) => merged[i].probability += outcome.probability,
            None => {
                index.insert(key, merged.len());
                merged.push(outcome);
            }
        }
    }
    merged
}

/// Stable sort by descending probability.
pub fn sort_outcomes(outcomes: &mut [CrossOutcome]) {
    outcomes.sort_by(|a, b| b.probability.total_cmp(&a.probability));
}

/// Total probability mass of a result list.
pub fn total_probability(outcomes: &[CrossOutcome]) -> f64 {
    outcomes.iter().map(|o| o.probability).sum()
}

// ── Engine ──

/// Offspring distribution of one independent set of loci.
struct Component {
    keys: Vec<String>,
    dist: Vec<(Vec<AllelePair>, f64)>,
}

impl Component {
    fn from_map(keys: Vec<String>, dist: ProbabilityMap<Vec<AllelePair>>) -> Self {
        Self {
            keys,
            dist: dist.into_vec(),
        }
    }
}

/// Genetic cross engine over injected, read-only tables.
///
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct CrossEngine {
    registry: Arc<LocusRegistry>,
    rates: Arc<RecombinationMap>,
    inferencer: Arc<dyn PhenotypeInferencer>,
    config: CrossConfig,
}

impl CrossEngine {
    /// Engine labelling outcomes with a [`RuleCascade`] in the configured
    /// language.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`CrossConfig::validate`].
    pub fn new(
        registry: Arc<LocusRegistry>,
        rates: Arc<RecombinationMap>,
        config: CrossConfig,
    ) -> Result<Self> {
        config.validate()?;
        let cascade = RuleCascade::new(Arc::clone(&registry)).with_language(config.language.clone());
        Ok(Self {
            registry,
            rates,
            inferencer: Arc::new(cascade),
            config,
        })
    }

    /// Engine over the embedded loci and rates with default settings.
    pub fn builtin() -> Result<Self> {
        Self::new(
            Arc::new(LocusRegistry::builtin()?),
            Arc::new(RecombinationMap::builtin()?),
            CrossConfig::default(),
        )
    }

    /// Replace the phenotype strategy.
    pub fn with_inferencer(mut self, inferencer: Arc<dyn PhenotypeInferencer>) -> Self {
        self.inferencer = inferencer;
        self
    }

    /// Label through `table`, falling back to the rule cascade.
    pub fn with_master_table(self, table: Arc<MasterTable>) -> Self {
        let inferencer = MasterTableInferencer::new(table, Arc::clone(&self.registry))
            .with_language(self.config.language.clone())
            .with_cascade();
        self.with_inferencer(Arc::new(inferencer))
    }

    pub fn registry(&self) -> &LocusRegistry {
        &self.registry
    }

    pub fn rates(&self) -> &RecombinationMap {
        &self.rates
    }

    pub fn config(&self) -> &CrossConfig {
        &self.config
    }

    /// Labelled, merged, and sorted offspring of `sire × dam`.
    pub fn cross(&self, sire: &Genotype, dam: &Genotype) -> Result<Vec<CrossOutcome>> {
        let raw = self.offspring_distribution(sire, dam)?;
        let n_raw = raw.len();
        let outcomes = raw
            .into_iter()
            .map(|(genotype, probability)| {
                let sex = genotype.sex();
                CrossOutcome {
                    phenotype: self.inferencer.infer(&genotype, sex),
                    sex,
                    genotype,
                    probability,
                }
            })
            .collect();
        let mut merged = merge_outcomes(outcomes, self.config.merge);
        sort_outcomes(&mut merged);
        debug!(
            raw = n_raw,
            outcomes = merged.len(),
            mass = total_probability(&merged),
            merge = ?self.config.merge,
            "cross complete"
        );
        Ok(merged)
    }

    /// [`cross`](Self::cross) for parents that may be missing; a missing
    /// parent gives an empty result.
    pub fn cross_pair(&self, sire: Option<&Genotype>, dam: Option<&Genotype>) -> Result<Vec<CrossOutcome>> {
        match (sire, dam) {
            (Some(sire), Some(dam)) => self.cross(sire, dam),
            _ => {
                debug!(
                    sire = sire.is_some(),
                    dam = dam.is_some(),
                    "parent missing; no offspring"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Unlabelled, unmerged offspring genotypes with their probabilities,
    /// sons first. Outcomes below the configured threshold are omitted.
    pub fn offspring_distribution(&self, sire: &Genotype, dam: &Genotype) -> Result<Vec<(Genotype, f64)>> {
        if sire.sex() != Sex::Male || dam.sex() != Sex::Female {
            warn!(sire = %sire.sex(), dam = %dam.sex(), "parents recorded with unexpected sexes");
        }
        let epsilon = self.config.gamete_epsilon;
        let partition = self.registry.partition();
        let mut autosomal = Vec::new();

        for locus in &partition.unlinked {
            let dist = punnett_map(&sire.pair_or_wild(locus), &dam.pair_or_wild(locus), &locus.notation);
            autosomal.push(Component {
                keys: vec![locus.key.clone()],
                dist: dist.into_iter().map(|(pair, p)| (vec![pair], p)).collect(),
            });
        }

        for group in &partition.linked {
            let sire_gametes = gametes_for_linkage_group(sire, &group.loci, &self.rates, epsilon)?;
            let dam_gametes = gametes_for_linkage_group(dam, &group.loci, &self.rates, epsilon)?;
            let mut dist: ProbabilityMap<Vec<AllelePair>> = ProbabilityMap::new();
            for s in &sire_gametes {
                for d in &dam_gametes {
                    let pairs: Vec<AllelePair> = group
                        .loci
                        .iter()
                        .zip(s.haplotype.alleles().iter().zip(d.haplotype.alleles()))
                        .map(|(locus, (a, b))| normalize(a.clone(), b.clone(), &locus.notation))
                        .collect();
                    dist.add(pairs, s.probability * d.probability);
                }
            }
            let keys = group.loci.iter().map(|l| l.key.clone()).collect();
            autosomal.push(Component::from_map(keys, dist));
        }

        let (sons_z, daughters_z) = match &partition.sex_linked {
            Some(group) => {
                let z = sex_linked_cross(sire, dam, &group.loci, &self.rates, epsilon)?;
                let keys: Vec<String> = group.loci.iter().map(|l| l.key.clone()).collect();
                (
                    Some(Component::from_map(keys.clone(), z.sons)),
                    Some(Component::from_map(keys, z.daughters)),
                )
            }
            None => (None, None),
        };

        let mut out = Vec::new();
        let mut pruned = 0.0;
        for (sex, z) in [(Sex::Male, &sons_z), (Sex::Female, &daughters_z)] {
            let components: Vec<&Component> = autosomal.iter().chain(z.as_ref()).collect();
            let (genotypes, dropped) = self.expand(sex, &components);
            pruned += dropped;
            out.extend(genotypes);
        }
        debug!(
            components = autosomal.len() + usize::from(partition.sex_linked.is_some()),
            linked_groups = partition.linked.len(),
            outcomes = out.len(),
            pruned,
            "offspring distribution"
        );
        Ok(out)
    }

    /// Cartesian product of component distributions for one sex, dropping
    /// partial products below the outcome threshold.
    fn expand(&self, sex: Sex, components: &[&Component]) -> (Vec<(Genotype, f64)>, f64) {
        let threshold = self.config.outcome_threshold;
        let mut partial: Vec<(Vec<(String, AllelePair)>, f64)> = vec![(Vec::new(), SEX_RATIO)];
        let mut pruned = 0.0;
        for component in components {
            let mut next = Vec::with_capacity(partial.len() * component.dist.len());
            for (pairs, p) in &partial {
                for (values, q) in &component.dist {
                    let prob = p * q;
                    if prob < threshold {
                        pruned += prob;
                        continue;
                    }
                    let mut pairs = pairs.clone();
                    pairs.extend(component.keys.iter().cloned().zip(values.iter().cloned()));
                    next.push((pairs, prob));
                }
            }
            partial = next;
        }
        let genotypes = partial
            .into_iter()
            .map(|(pairs, p)| (Genotype::from_pairs(sex, pairs), p))
            .collect();
        (genotypes, pruned)
    }
}

impl Summarizable for CrossEngine {
    fn summary(&self) -> String {
        let partition = self.registry.partition();
        format!(
            "CrossEngine: {} loci ({} unlinked, {} linked groups, {} sex-linked), {} rates, merge {:?}",
            self.registry.len(),
            partition.unlinked.len(),
            partition.linked.len(),
            partition.sex_linked.as_ref().map_or(0, |g| g.loci.len()),
            self.rates.len(),
            self.config.merge,
        )
    }
}
