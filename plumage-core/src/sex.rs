//! Sex of an individual under the Z/W sex-determination system.

use core::fmt;

/// Sex of a bird. Males are ZZ (diploid for Z-linked loci), females ZW
/// (hemizygous).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Both sexes, males first.
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Whether this sex carries a single Z chromosome.
    pub fn is_hemizygous(&self) -> bool {
        matches!(self, Sex::Female)
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}
