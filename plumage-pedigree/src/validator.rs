//! Breeding-pair checks consumed by hosts before a pairing is planned or
//! recorded.

use plumage_core::{PlumageError, Result, Sex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inbreeding::{inbreeding_coefficient, Subject, DEFAULT_MAX_GENERATIONS};
use crate::pedigree::Pedigree;

/// Whether a pairing is being proposed or an existing one recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreedingMode {
    Planning,
    Record,
}

/// Result of validating a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self { allowed: true, reason: None, warning: None }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: Some(reason.into()), warning: None }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// A bird as seen by the validator.
#[derive(Debug, Clone, Copy)]
pub struct Individual<'a> {
    pub id: &'a str,
    pub sex: Sex,
    pub pedigree: Option<&'a Pedigree>,
}

impl<'a> Individual<'a> {
    pub fn new(id: &'a str, sex: Sex, pedigree: Option<&'a Pedigree>) -> Self {
        Self { id, sex, pedigree }
    }

    fn subject(&self) -> Subject<'a> {
        Subject::new(self.id, self.pedigree)
    }
}

/// Pairing policy. Implementations must be pure.
pub trait BreedingValidator: Send + Sync {
    fn validate(&self, sire: &Individual<'_>, dam: &Individual<'_>, mode: BreedingMode) -> Verdict;
}

/// Default policy: sanity checks plus kinship thresholds on the coefficient
/// of the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinshipPolicy {
    /// Planned pairs at or above this coefficient are refused.
    pub deny_at: f64,
    /// Pairs at or above this coefficient carry a warning.
    pub warn_at: f64,
    pub max_generations: usize,
}

impl Default for KinshipPolicy {
    fn default() -> Self {
        Self {
            deny_at: 0.25,
            warn_at: 0.0625,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }
}

impl KinshipPolicy {
    /// Thresholds must lie in `[0, 1]` with `warn_at <= deny_at`.
    pub fn validate_config(&self) -> Result<()> {
        for (name, value) in [("deny_at", self.deny_at), ("warn_at", self.warn_at)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PlumageError::InvalidInput(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.warn_at > self.deny_at {
            return Err(PlumageError::InvalidInput(format!(
                "warn_at ({}) exceeds deny_at ({})",
                self.warn_at, self.deny_at
            )));
        }
        Ok(())
    }

    /// Parse and check a JSON policy; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| PlumageError::Parse(format!("kinship policy: {e}")))?;
        policy.validate_config()?;
        Ok(policy)
    }
}

impl BreedingValidator for KinshipPolicy {
    fn validate(&self, sire: &Individual<'_>, dam: &Individual<'_>, mode: BreedingMode) -> Verdict {
        if sire.id == dam.id {
            return Verdict::deny(format!("'{}' cannot be paired with itself", sire.id));
        }
        if sire.sex != Sex::Male {
            return Verdict::deny(format!("sire '{}' is {}", sire.id, sire.sex));
        }
        if dam.sex != Sex::Female {
            return Verdict::deny(format!("dam '{}' is {}", dam.id, dam.sex));
        }

        let f = inbreeding_coefficient(&sire.subject(), &dam.subject(), self.max_generations);
        debug!(sire = sire.id, dam = dam.id, coefficient = f, ?mode, "kinship check");

        let percent = f * 100.0;
        if mode == BreedingMode::Planning && f >= self.deny_at {
            return Verdict::deny(format!("inbreeding coefficient {percent:.2}% is too high"));
        }
        if f >= self.warn_at && f > 0.0 {
            return Verdict::allow().with_warning(format!("inbreeding coefficient {percent:.2}%"));
        }
        Verdict::allow()
    }
}
