//! Pedigree records, inbreeding coefficients, and breeding-pair policy.
//!
//! - **Records** — [`Pedigree`], a fixed 3-generation ancestry keyed by [`RelationPath`]
//! - **Kinship** — [`inbreeding_coefficient`] and [`common_ancestors`]
//! - **Policy** — the [`BreedingValidator`] interface and its default [`KinshipPolicy`]
//!
//! # Example
//!
//! ```
//! use plumage_pedigree::{inbreeding_coefficient, Pedigree, Subject};
//!
//! let parents = Pedigree::new().with("sire", "S").unwrap().with("dam", "D").unwrap();
//! let f = inbreeding_coefficient(
//!     &Subject::new("A", Some(&parents)),
//!     &Subject::new("B", Some(&parents)),
//!     3,
//! );
//! assert!((f - 0.25).abs() < 1e-12);
//! ```

pub mod inbreeding;
pub mod pedigree;
pub mod validator;

pub use inbreeding::{common_ancestors, inbreeding_coefficient, CommonAncestor, Subject, DEFAULT_MAX_GENERATIONS};
pub use pedigree::{AncestorLine, Parent, Pedigree, RelationPath, MAX_GENERATIONS};
pub use validator::{BreedingMode, BreedingValidator, Individual, KinshipPolicy, Verdict};
