//! Story genres.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Genre bucket a story belongs to.
///
/// Parsing is lenient: labels are case-insensitive, a few common aliases are accepted,
/// and anything unrecognised maps to [`Genre::Fantasy`] through [`Genre::from_label`].
///
/// # Examples
///
/// ```
/// use taleweaver_core::Genre;
///
/// assert_eq!(Genre::from_label("Sci-Fi"), Genre::SciFi);
/// assert_eq!(Genre::from_label("science fiction"), Genre::SciFi);
/// assert_eq!(Genre::from_label("space opera"), Genre::Fantasy);
/// assert_eq!(Genre::Historical.to_string(), "historical");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Genre {
    /// Swords, sorcery and old kingdoms
    #[default]
    Fantasy,
    /// Starships, colonies and machines
    #[strum(
        to_string = "sci-fi",
        serialize = "scifi",
        serialize = "science fiction",
        serialize = "science-fiction"
    )]
    SciFi,
    /// Detectives and hidden truths
    #[strum(to_string = "mystery", serialize = "detective")]
    Mystery,
    /// Hearts and entanglements
    Romance,
    /// Pursuits, conspiracies and ticking clocks
    #[strum(to_string = "thriller", serialize = "horror", serialize = "suspense")]
    Thriller,
    /// Real eras, imagined lives
    Historical,
    /// Expeditions and treasure
    Adventure,
}

impl Genre {
    /// Parse a user supplied label, defaulting to fantasy.
    pub fn from_label(label: &str) -> Self {
        Self::from_str(label.trim()).unwrap_or_default()
    }
}

impl From<String> for Genre {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Genre> for String {
    fn from(genre: Genre) -> Self {
        genre.to_string()
    }
}
