//! Allele tokens, allele pairs, canonical ordering, and the notation parser.
//!
//! Breeders write genotypes as short strings (`"Dd"`, `"aqaq"`, `"+cin"`,
//! `"inoW"`). This module turns them into structured [`AllelePair`] values
//! once, at the boundary; nothing downstream re-parses strings.
//!
//! The written order of a parent's pair is kept: `first` is the allele on
//! chromosome 1 and `second` the allele on chromosome 2, which fixes phase for
//! linked loci. [`AllelePair::normalized`] gives the canonical form used for
//! offspring, display, and comparison.

use core::cmp::Ordering;
use core::fmt;

use plumage_core::Sex;

use crate::locus::{AlleleNotation, AlleleOrder, Locus, WILD_TYPE};

/// Suffix marking the single Z of a hemizygous female (`"inoW"`).
pub const HEMIZYGOUS_MARKER: &str = "W";

/// Explicit separator accepted between two tokens (`"ino/+"`).
pub const PAIR_SEPARATOR: char = '/';

/// An opaque allele token such as `+`, `D`, `aq`, or `ino`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Allele(String);

impl Allele {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The wild-type allele of a locus.
    pub fn wild(notation: &AlleleNotation) -> Self {
        Self(notation.wild.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wild(&self, notation: &AlleleNotation) -> bool {
        notation.is_wild(&self.0)
    }
}

impl From<&str> for Allele {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The alleles one individual carries at one locus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AllelePair {
    /// Two copies: chromosome 1 then chromosome 2.
    Diploid(Allele, Allele),
    /// A single Z copy in a female.
    Hemizygous(Allele),
}

impl AllelePair {
    pub fn diploid(a: impl Into<Allele>, b: impl Into<Allele>) -> Self {
        Self::Diploid(a.into(), b.into())
    }

    pub fn hemizygous(a: impl Into<Allele>) -> Self {
        Self::Hemizygous(a.into())
    }

    /// Wild-type pair, or the single wild allele when `hemizygous`.
    pub fn wild(notation: &AlleleNotation, hemizygous: bool) -> Self {
        if hemizygous {
            Self::Hemizygous(Allele::wild(notation))
        } else {
            Self::Diploid(Allele::wild(notation), Allele::wild(notation))
        }
    }

    /// Allele on chromosome 1 (the only allele when hemizygous).
    pub fn first(&self) -> &Allele {
        match self {
            Self::Diploid(a, _) => a,
            Self::Hemizygous(a) => a,
        }
    }

    /// Allele on chromosome 2. A hemizygous pair reports its single allele.
    pub fn second(&self) -> &Allele {
        match self {
            Self::Diploid(_, b) => b,
            Self::Hemizygous(a) => a,
        }
    }

    pub fn is_hemizygous(&self) -> bool {
        matches!(self, Self::Hemizygous(_))
    }

    pub fn is_heterozygous(&self) -> bool {
        matches!(self, Self::Diploid(a, b) if a != b)
    }

    /// Number of copies of `token`.
    pub fn copies(&self, token: &str) -> usize {
        match self {
            Self::Diploid(a, b) => (a.as_str() == token) as usize + (b.as_str() == token) as usize,
            Self::Hemizygous(a) => (a.as_str() == token) as usize,
        }
    }

    pub fn carries(&self, token: &str) -> bool {
        self.copies(token) > 0
    }

    /// Homozygous for `token`, or hemizygous for it.
    pub fn expresses(&self, token: &str) -> bool {
        match self {
            Self::Diploid(a, b) => a.as_str() == token && b.as_str() == token,
            Self::Hemizygous(a) => a.as_str() == token,
        }
    }

    /// Non-wild alleles, in pair order.
    pub fn mutants<'a>(&'a self, notation: &AlleleNotation) -> Vec<&'a Allele> {
        match self {
            Self::Diploid(a, b) => [a, b].into_iter().filter(|x| !x.is_wild(notation)).collect(),
            Self::Hemizygous(a) => [a].into_iter().filter(|x| !x.is_wild(notation)).collect(),
        }
    }

    /// Single-locus gametes: each copy with equal probability.
    pub fn gametes(&self) -> Vec<(Allele, f64)> {
        match self {
            Self::Diploid(a, b) => vec![(a.clone(), 0.5), (b.clone(), 0.5)],
            Self::Hemizygous(a) => vec![(a.clone(), 1.0)],
        }
    }

    /// Canonical ordering of this pair under `notation`.
    pub fn normalized(&self, notation: &AlleleNotation) -> Self {
        match self {
            Self::Diploid(a, b) => normalize(a.clone(), b.clone(), notation),
            Self::Hemizygous(_) => self.clone(),
        }
    }

    /// Canonical string form (`"Dd"`, `"ino+"`, `"cinW"`).
    pub fn canonical(&self, notation: &AlleleNotation) -> String {
        self.normalized(notation).to_string()
    }

    /// The diploid equivalent of a hemizygous pair (`cinW` → `cincin`).
    pub fn as_homozygous(&self) -> Self {
        match self {
            Self::Hemizygous(a) => Self::Diploid(a.clone(), a.clone()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for AllelePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diploid(a, b) => write!(f, "{a}{b}"),
            Self::Hemizygous(a) => write!(f, "{a}{HEMIZYGOUS_MARKER}"),
        }
    }
}

/// Ordering of two distinct tokens in canonical form.
fn compare_tokens(a: &Allele, b: &Allele, notation: &AlleleNotation) -> Ordering {
    let fallback = || match (a.is_wild(notation), b.is_wild(notation)) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(b),
    };
    match notation.order {
        AlleleOrder::MutantFirst => fallback(),
        AlleleOrder::Declared => match (notation.rank(a.as_str()), notation.rank(b.as_str())) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => fallback(),
        },
    }
}

/// Combine two alleles into one canonical diploid pair.
///
/// Identical alleles are homozygous. With one wild-type allele the mutant
/// comes first; two mutants sort alphabetically. Loci with
/// [`AlleleOrder::Declared`] sort by declared rank instead.
pub fn normalize(a: Allele, b: Allele, notation: &AlleleNotation) -> AllelePair {
    if compare_tokens(&a, &b, notation) == Ordering::Greater {
        AllelePair::Diploid(b, a)
    } else {
        AllelePair::Diploid(a, b)
    }
}

/// A parsed pair plus whether the input was recognized cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAlleles {
    pub pair: AllelePair,
    /// The input could not be read as written: a diploid string fell back to
    /// wild type, or a hemizygous token is not in the locus alphabet.
    pub malformed: bool,
}

impl ParsedAlleles {
    fn ok(pair: AllelePair) -> Self {
        Self {
            pair,
            malformed: false,
        }
    }
}

/// Split `text` into two tokens of the locus alphabet, if possible.
fn split_known<'a>(text: &'a str, notation: &AlleleNotation) -> Option<(&'a str, &'a str)> {
    text.char_indices().skip(1).find_map(|(i, _)| {
        let (a, b) = text.split_at(i);
        (notation.is_known(a) && notation.is_known(b)).then_some((a, b))
    })
}

/// Parse a diploid genotype string, reporting fallbacks.
///
/// Rules in priority order: empty → wild; `a/b`; two tokens of the locus
/// alphabet; even length ≥ 4 split in half; `+`-prefixed heterozygote;
/// two characters; otherwise wild type (malformed).
pub fn parse_alleles_checked(text: &str, locus: &Locus) -> ParsedAlleles {
    let notation = &locus.notation;
    let text = text.trim();
    if text.is_empty() {
        return ParsedAlleles::ok(AllelePair::wild(notation, false));
    }

    if let Some((a, b)) = text.split_once(PAIR_SEPARATOR) {
        let (a, b) = (a.trim(), b.trim());
        if !a.is_empty() && !b.is_empty() {
            return ParsedAlleles::ok(AllelePair::diploid(a, b));
        }
    }

    if let Some((a, b)) = split_known(text, notation) {
        return ParsedAlleles::ok(AllelePair::diploid(a, b));
    }

    let n_chars = text.chars().count();
    if n_chars >= 4 && n_chars % 2 == 0 {
        if let Some((mid, _)) = text.char_indices().nth(n_chars / 2) {
            let (a, b) = text.split_at(mid);
            return ParsedAlleles::ok(AllelePair::diploid(a, b));
        }
    }

    if let Some(rest) = text.strip_prefix(WILD_TYPE) {
        // `+` only stands for the wild type where the locus uses it.
        if !notation.is_wild(WILD_TYPE) {
            return malformed(notation);
        }
        if !rest.is_empty() {
            return ParsedAlleles::ok(AllelePair::Diploid(Allele::wild(notation), Allele::from(rest)));
        }
    }

    if n_chars == 2 {
        let mut chars = text.chars();
        if let (Some(a), Some(b)) = (chars.next(), chars.next()) {
            return ParsedAlleles::ok(AllelePair::Diploid(Allele::new(a), Allele::new(b)));
        }
    }

    malformed(notation)
}

fn malformed(notation: &AlleleNotation) -> ParsedAlleles {
    ParsedAlleles {
        pair: AllelePair::wild(notation, false),
        malformed: true,
    }
}

/// Parse a diploid genotype string; unreadable input becomes wild type.
pub fn parse_alleles(text: &str, locus: &Locus) -> AllelePair {
    parse_alleles_checked(text, locus).pair
}

/// Parse a female's sex-linked entry: strip the trailing `W`; the rest (or
/// the wild type if empty) is her single allele.
pub fn parse_hemizygous_checked(text: &str, locus: &Locus) -> ParsedAlleles {
    let notation = &locus.notation;
    let text = text.trim();
    let rest = text.strip_suffix(HEMIZYGOUS_MARKER).unwrap_or(text);
    if rest.is_empty() {
        return ParsedAlleles::ok(AllelePair::wild(notation, true));
    }
    if notation.is_known(rest) {
        return ParsedAlleles::ok(AllelePair::hemizygous(rest));
    }
    // Written in homozygous form ("inoino").
    if let Some((a, b)) = split_known(rest, notation) {
        if a == b {
            return ParsedAlleles::ok(AllelePair::hemizygous(a));
        }
    }
    ParsedAlleles {
        pair: AllelePair::hemizygous(rest),
        malformed: !notation.alleles.is_empty(),
    }
}

pub fn parse_hemizygous(text: &str, locus: &Locus) -> AllelePair {
    parse_hemizygous_checked(text, locus).pair
}

/// Parse with the parser appropriate to the locus and the individual's sex.
///
/// A male's sex-linked entry written in hemizygous form (`"inoW"`, `"+W"`)
/// reads as homozygous for that allele. A stray `W` left in a diploid token
/// is malformed.
pub fn parse_for_sex(text: &str, locus: &Locus, sex: Sex) -> ParsedAlleles {
    if !locus.sex_linked {
        return parse_alleles_checked(text, locus);
    }
    if sex.is_hemizygous() {
        return parse_hemizygous_checked(text, locus);
    }
    let notation = &locus.notation;
    let trimmed = text.trim();
    if trimmed.ends_with(HEMIZYGOUS_MARKER) && split_known(trimmed, notation).is_none() {
        let parsed = parse_hemizygous_checked(trimmed, locus);
        if !parsed.malformed {
            return ParsedAlleles::ok(parsed.pair.as_homozygous());
        }
    }
    let parsed = parse_alleles_checked(trimmed, locus);
    let stray = |a: &Allele| !notation.is_known(a.as_str()) && a.as_str().ends_with(HEMIZYGOUS_MARKER);
    if stray(parsed.pair.first()) || stray(parsed.pair.second()) {
        return malformed(notation);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::AlleleNotation;

    fn dark() -> Locus {
        Locus::new("dark", false).with_notation(AlleleNotation::new("d", ["D", "d"]).declared_order())
    }

    fn parblue() -> Locus {
        Locus::new("parblue", false).with_notation(AlleleNotation::new("+", ["aq", "tq", "bl"]))
    }

    fn ino() -> Locus {
        Locus::new("ino", true).with_notation(AlleleNotation::new("+", ["ino", "pld"]))
    }

    fn cin() -> Locus {
        Locus::new("cin", true).with_notation(AlleleNotation::new("+", ["cin"]))
    }

    #[test]
    fn shorthand_two_char() {
        assert_eq!(parse_alleles("Dd", &dark()), AllelePair::diploid("D", "d"));
        assert_eq!(parse_alleles("dd", &dark()), AllelePair::diploid("d", "d"));
        assert_eq!(parse_alleles("DD", &dark()), AllelePair::diploid("D", "D"));
    }

    #[test]
    fn shorthand_multi_char_tokens() {
        assert_eq!(parse_alleles("aqaq", &parblue()), AllelePair::diploid("aq", "aq"));
        assert_eq!(parse_alleles("+cin", &cin()), AllelePair::diploid("+", "cin"));
        assert_eq!(parse_alleles("ino+", &ino()), AllelePair::diploid("ino", "+"));
        assert_eq!(parse_alleles("inopld", &ino()), AllelePair::diploid("ino", "pld"));
    }

    #[test]
    fn even_length_split_for_unknown_alphabet() {
        let locus = Locus::new("mystery", false);
        assert_eq!(parse_alleles("xyxy", &locus), AllelePair::diploid("xy", "xy"));
        assert_eq!(parse_alleles("abcdef", &locus), AllelePair::diploid("abc", "def"));
    }

    #[test]
    fn plus_prefix_heterozygote() {
        let locus = Locus::new("mystery", false);
        assert_eq!(parse_alleles("+ab", &locus), AllelePair::diploid("+", "ab"));
    }

    #[test]
    fn two_char_arbitrary() {
        let locus = Locus::new("mystery", false);
        assert_eq!(parse_alleles("Xy", &locus), AllelePair::diploid("X", "y"));
    }

    #[test]
    fn separator_form() {
        assert_eq!(parse_alleles("ino/+", &ino()), AllelePair::diploid("ino", "+"));
        assert_eq!(parse_alleles(" aq / bl ", &parblue()), AllelePair::diploid("aq", "bl"));
    }

    #[test]
    fn empty_is_wild_not_malformed() {
        let parsed = parse_alleles_checked("   ", &dark());
        assert_eq!(parsed.pair, AllelePair::diploid("d", "d"));
        assert!(!parsed.malformed);
    }

    #[test]
    fn garbage_falls_back_to_wild() {
        let parsed = parse_alleles_checked("xyz", &parblue());
        assert_eq!(parsed.pair, AllelePair::diploid("+", "+"));
        assert!(parsed.malformed);
        assert_eq!(parse_alleles("Q", &dark()), AllelePair::diploid("d", "d"));
    }

    #[test]
    fn hemizygous_parser() {
        assert_eq!(parse_hemizygous("inoW", &ino()), AllelePair::hemizygous("ino"));
        assert_eq!(parse_hemizygous("+W", &ino()), AllelePair::hemizygous("+"));
        assert_eq!(parse_hemizygous("W", &ino()), AllelePair::hemizygous("+"));
        assert_eq!(parse_hemizygous("", &ino()), AllelePair::hemizygous("+"));
        assert_eq!(parse_hemizygous("cin", &cin()), AllelePair::hemizygous("cin"));
        assert_eq!(parse_hemizygous("inoino", &ino()), AllelePair::hemizygous("ino"));
    }

    #[test]
    fn hemizygous_unknown_token_kept_but_flagged() {
        let parsed = parse_hemizygous_checked("xqW", &ino());
        assert_eq!(parsed.pair, AllelePair::hemizygous("xq"));
        assert!(parsed.malformed);
    }

    #[test]
    fn parse_for_sex_dispatches() {
        assert!(parse_for_sex("inoW", &ino(), Sex::Female).pair.is_hemizygous());
        assert!(!parse_for_sex("ino+", &ino(), Sex::Male).pair.is_hemizygous());
        assert!(!parse_for_sex("Dd", &dark(), Sex::Female).pair.is_hemizygous());
    }

    #[test]
    fn male_sex_linked_entry_in_hemizygous_form() {
        let parsed = parse_for_sex("inoW", &ino(), Sex::Male);
        assert_eq!(parsed.pair, AllelePair::diploid("ino", "ino"));
        assert!(!parsed.malformed);
        assert_eq!(parse_for_sex("+W", &cin(), Sex::Male).pair, AllelePair::diploid("+", "+"));
        assert_eq!(parse_for_sex(" cinW ", &cin(), Sex::Male).pair, AllelePair::diploid("cin", "cin"));
    }

    #[test]
    fn stray_marker_in_male_entry_is_malformed() {
        let parsed = parse_for_sex("xyzW", &cin(), Sex::Male);
        assert_eq!(parsed.pair, AllelePair::diploid("+", "+"));
        assert!(parsed.malformed);
        let parsed = parse_for_sex("W+", &cin(), Sex::Male);
        assert_eq!(parsed.pair, AllelePair::diploid("+", "+"));
        assert!(parsed.malformed);
    }

    #[test]
    fn plus_prefix_needs_plus_wild_type() {
        let parsed = parse_alleles_checked("+D", &dark());
        assert_eq!(parsed.pair, AllelePair::diploid("d", "d"));
        assert!(parsed.malformed);
        assert!(!parse_alleles_checked("+ino", &ino()).malformed);
    }

    #[test]
    fn normalize_wild_last() {
        let n = &ino().notation;
        assert_eq!(normalize("+".into(), "ino".into(), n).to_string(), "ino+");
        assert_eq!(normalize("ino".into(), "+".into(), n).to_string(), "ino+");
    }

    #[test]
    fn normalize_declared_order() {
        let n = &dark().notation;
        assert_eq!(normalize("d".into(), "D".into(), n).to_string(), "Dd");
        assert_eq!(normalize("D".into(), "d".into(), n).to_string(), "Dd");
        assert_eq!(normalize("d".into(), "d".into(), n).to_string(), "dd");
    }

    #[test]
    fn normalize_compound_alphabetical() {
        let n = &parblue().notation;
        assert_eq!(normalize("tq".into(), "aq".into(), n).to_string(), "aqtq");
        assert_eq!(normalize("bl".into(), "aq".into(), n).to_string(), "aqbl");
    }

    #[test]
    fn pair_queries() {
        let p = AllelePair::diploid("ino", "+");
        assert!(p.is_heterozygous());
        assert_eq!(p.copies("ino"), 1);
        assert!(!p.expresses("ino"));
        assert!(AllelePair::hemizygous("ino").expresses("ino"));
        assert_eq!(AllelePair::hemizygous("cin").to_string(), "cinW");
        assert_eq!(
            AllelePair::hemizygous("cin").as_homozygous(),
            AllelePair::diploid("cin", "cin")
        );
        assert_eq!(p.mutants(&ino().notation).len(), 1);
    }

    #[test]
    fn canonical_round_trips_through_parser() {
        for text in ["ino+", "+ino", "inopld", "pldino", "++"] {
            let pair = parse_alleles(text, &ino());
            let canonical = pair.canonical(&ino().notation);
            let reparsed = parse_alleles(&canonical, &ino());
            assert_eq!(reparsed.canonical(&ino().notation), canonical);
        }
    }
}
