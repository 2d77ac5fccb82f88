//! Shared primitives, traits, and utilities for the Plumage breeding engine.
//!
//! `plumage-core` provides the foundation that the other Plumage crates build on:
//!
//! - **Error types** — [`PlumageError`] and [`Result`] for structured error handling
//! - **Sex** — [`Sex`] under the Z/W system (males ZZ, females ZW)
//! - **Probability maps** — [`ProbabilityMap`], an insertion-ordered discrete distribution
//! - **Traits** — [`Annotated`] and [`Summarizable`]

pub mod error;
pub mod prob;
pub mod sex;
pub mod traits;

pub use error::{PlumageError, Result};
pub use prob::{approx_eq, ProbabilityMap, PROB_TOLERANCE};
pub use sex::Sex;
pub use traits::*;
