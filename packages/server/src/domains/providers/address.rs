//! Address cleaning and geocoding variants.
//!
//! A provider's street line is often noisy ("Rua X 10 (fundos)", QA rows
//! tagged "teste ..."). We clean it and then emit progressively looser
//! renderings so the geocoder has something to match even when the street
//! itself is unknown to it.

use lazy_static::lazy_static;
use regex::Regex;

/// Country suffix appended to every variant for geocoder disambiguation.
pub const COUNTRY_NAME: &str = "Brasil";

lazy_static! {
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref TEST_MARKER: Regex = Regex::new(r"(?i)\bteste\b.*$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NOT_LETTER_OR_SPACE: Regex = Regex::new(r"[^\p{L}\s]").unwrap();
    static ref POSTAL_CODE: Regex = Regex::new(r"\d{5}-?\d{3}").unwrap();
}

/// The address fields the geocoder cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
}

impl AddressParts {
    pub fn new(
        street: impl Into<String>,
        neighborhood: Option<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            neighborhood,
            city: city.into(),
            state: state.into(),
        }
    }

    /// Street, city and state are all present
    pub fn is_complete(&self) -> bool {
        !self.street.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.state.trim().is_empty()
    }
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Strip parenthetical notes and the QA marker, then normalize whitespace.
///
/// The marker only matches as a whole word ("teste123" is kept).
pub fn clean_street(street: &str) -> String {
    let without_notes = PARENTHETICAL.replace_all(street, " ");
    let without_marker = TEST_MARKER.replace(&without_notes, "");
    collapse_whitespace(&without_marker)
}

/// Street reduced to letters only ("Rua das Flores 123-B" -> "Rua das Flores B").
///
/// Non-letters become separators, so "Av.Paulista" stays two words.
pub fn simplify_street(cleaned: &str) -> String {
    let letters = NOT_LETTER_OR_SPACE.replace_all(cleaned, " ");
    collapse_whitespace(&letters)
}

/// Ordered geocoding candidates, most specific first.
///
/// Duplicates are dropped keeping the first occurrence, so a candidate is
/// never sent to the geocoder twice for the same address.
pub fn address_variants(parts: &AddressParts) -> Vec<String> {
    let city = parts.city.trim();
    let state = parts.state.trim();
    let street = clean_street(&parts.street);
    let neighborhood = parts
        .neighborhood
        .as_deref()
        .map(str::trim)
        .filter(|n| n.chars().count() > 2);

    let with_locality = |head: &str| format!("{}, {}, {}, {}", head, city, state, COUNTRY_NAME);

    let mut variants = Vec::new();

    if !street.is_empty() {
        if let Some(neighborhood) = neighborhood {
            variants.push(with_locality(&format!("{}, {}", street, neighborhood)));
        }

        variants.push(with_locality(&street));

        let simplified = simplify_street(&street);
        if simplified.chars().count() > 3 && simplified != street {
            variants.push(with_locality(&simplified));
        }
    }

    variants.push(format!("{}, {}, {}", city, state, COUNTRY_NAME));

    if !street.is_empty() && POSTAL_CODE.is_match(&street) {
        variants.push(with_locality(&street));
    }

    if let Some(neighborhood) = neighborhood {
        variants.push(with_locality(neighborhood));
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.clone()));
    variants
}
