//! Core trait definitions shared across the Plumage crates.

/// A type that carries human-readable names, possibly per language.
pub trait Annotated {
    /// Identifier used in tables and genotype maps.
    fn name(&self) -> &str;

    /// Display name in the requested language, if one is defined.
    fn display_name(&self, _language: &str) -> Option<&str> {
        None
    }
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
