//! Frequency term-meta bank built from a ranked lemma list.

use serde::Serialize;
use serde::ser::{SerializeTuple, Serializer};

/// Lemmas in the corpus listing that are punctuation, not words.
///
/// The curly double quotes appear as the single lemma `“”`.
const PUNCTUATION: &[&str] = &[
    ",", ".", "¡", "!", "¿", "?", "??", ";", ":", "'", "\"", "‘", "’", "“”", "«", "»", "[", "]",
    "{", "}", "…", "...", "—", "_", "-", "%", "\\", "/",
];

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Frequency {
    pub value: u64,
    #[serde(rename = "displayValue")]
    pub display_value: String,
}

/// `[lemma, "freq", {value, displayValue}]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrequencyRow {
    pub lemma: String,
    pub frequency: Frequency,
}

impl FrequencyRow {
    pub fn new(lemma: impl Into<String>, rank: u64) -> Self {
        Self {
            lemma: lemma.into(),
            frequency: Frequency {
                value: rank,
                display_value: rank.to_string(),
            },
        }
    }
}

impl Serialize for FrequencyRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(3)?;
        row.serialize_element(&self.lemma)?;
        row.serialize_element("freq")?;
        row.serialize_element(&self.frequency)?;
        row.end()
    }
}

pub fn is_punctuation(lemma: &str) -> bool {
    PUNCTUATION.contains(&lemma)
}

/// Rank lemmas in input order, starting at 1.
///
/// Each line is split on tabs and only the first field is used. Blank lines
/// and punctuation lemmas are skipped and do not consume a rank.
pub fn build_frequency_bank<I, L>(lines: I) -> Vec<FrequencyRow>
where
    I: IntoIterator<Item = L>,
    L: AsRef<str>,
{
    let mut rank = 0u64;
    lines
        .into_iter()
        .filter_map(|line| {
            let lemma = line.as_ref().trim().split('\t').next()?.trim().to_string();
            if lemma.is_empty() || is_punctuation(&lemma) {
                return None;
            }
            rank += 1;
            Some(FrequencyRow::new(lemma, rank))
        })
        .collect()
}
