//! Supported word lists and query validation.

use crate::constants::{MAX_QUERY_LEN, MIN_QUERY_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An official word list the lookup server can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Lexicon {
    /// Collins Scrabble Words 2021
    Csw21,
    /// NASPA Word List 2020
    #[default]
    Nwl20,
}

impl Lexicon {
    /// Every supported lexicon, in picker order.
    pub const ALL: [Lexicon; 2] = [Lexicon::Nwl20, Lexicon::Csw21];

    /// Canonical id used in lookup URLs and the cache.
    pub fn id(&self) -> &'static str {
        match self {
            Lexicon::Csw21 => "CSW21",
            Lexicon::Nwl20 => "NWL20",
        }
    }

    /// Family prefix matched against user-supplied names.
    fn family(&self) -> &'static str {
        match self {
            Lexicon::Csw21 => "CSW",
            Lexicon::Nwl20 => "NWL",
        }
    }

    /// Copyright notice that must accompany words from this list.
    pub fn copyright(&self) -> &'static str {
        match self {
            Lexicon::Csw21 => {
                "Collins Official Scrabble Words, an imprint of HarperCollins Publishers Limited."
            }
            Lexicon::Nwl20 => {
                "NASPA Word List, 2020 Edition, © 2020 North American Word Game Players Association"
            }
        }
    }

    /// Maps a user-supplied name such as `"csw19"` onto the current edition of its family.
    ///
    /// The name must start with a known family prefix (case-insensitive),
    /// optionally followed by digits.
    pub fn from_param(name: &str) -> Option<Lexicon> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|lexicon| {
            upper
                .strip_prefix(lexicon.family())
                .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        })
    }
}

impl fmt::Display for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Validates a query of 4 to 15 letters and returns it uppercased.
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim();
    let len = query.chars().count();
    if (MIN_QUERY_LEN..=MAX_QUERY_LEN).contains(&len) && query.chars().all(|c| c.is_ascii_alphabetic())
    {
        Some(query.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_param_normalizes_to_canonical_id() {
        let lexicon = Lexicon::from_param("csw21").expect("known family");
        assert_eq!(lexicon, Lexicon::Csw21);
        assert_eq!(lexicon.id(), "CSW21");
        assert!(lexicon.copyright().starts_with("Collins Official Scrabble Words"));
    }

    #[test]
    fn older_editions_map_to_current() {
        assert_eq!(Lexicon::from_param("CSW19"), Some(Lexicon::Csw21));
        assert_eq!(Lexicon::from_param("nwl2018"), Some(Lexicon::Nwl20));
        assert_eq!(Lexicon::from_param("Nwl"), Some(Lexicon::Nwl20));
    }

    #[test]
    fn unknown_lexicon_is_rejected() {
        assert_eq!(Lexicon::from_param("TWL06"), None);
        assert_eq!(Lexicon::from_param("CSWX"), None);
        assert_eq!(Lexicon::from_param(""), None);
    }

    #[test]
    fn nwl_is_default() {
        assert_eq!(Lexicon::default(), Lexicon::Nwl20);
        assert!(Lexicon::Nwl20.copyright().contains("NASPA"));
    }

    #[test]
    fn query_must_be_four_to_fifteen_letters() {
        assert_eq!(normalize_query("care"), Some("CARE".to_string()));
        assert_eq!(normalize_query(" Racecar "), Some("RACECAR".to_string()));
        assert_eq!(normalize_query("abcdefghijklmno"), Some("ABCDEFGHIJKLMNO".into()));
        assert_eq!(normalize_query("car"), None);
        assert_eq!(normalize_query("abcdefghijklmnop"), None);
        assert_eq!(normalize_query("care1"), None);
        assert_eq!(normalize_query("ca re"), None);
    }
}
