//! Shared types for entries scraped from the student dictionary.
//!
//! The extractor (`dde-scrape`) produces [`Entry`] and [`Expression`] values,
//! the coordinator wraps them in [`StoredRecord`] lines, and the compiler
//! (`dde-yomitan`) reads those lines back. Every stored field defaults when
//! missing, null or of the wrong shape, and a list keeps the elements that
//! decode, so one bad field never empties the rest of a record.
//!
//! ```rust
//! use dde_types::{expression_url, strip_wildcards};
//!
//! assert_eq!(strip_wildcards("*día"), "día");
//! assert_eq!(
//!     expression_url("https://example/diccionario/ir", "loc3"),
//!     "https://example/diccionario/ir#loc3"
//! );
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Character the dictionary uses to flag cross-references that are not headwords.
pub const WILDCARD_MARKER: char = '*';

/// Which of the three tag vocabularies a marker belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum TagKind {
    Grammar,
    Usage,
    Geo,
}

impl TagKind {
    pub const ALL: [TagKind; 3] = [TagKind::Grammar, TagKind::Usage, TagKind::Geo];

    /// Stem used for the exported tag report (`grammar_tags.csv`, ...).
    pub fn report_stem(self) -> &'static str {
        match self {
            TagKind::Grammar => "grammar_tags",
            TagKind::Usage => "usage_tags",
            TagKind::Geo => "geo_tags",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagKind::Grammar => "grammar",
            TagKind::Usage => "usage",
            TagKind::Geo => "geo",
        })
    }
}

/// A tag as attached to a sense. The canonical name lives in the tag registry only.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "lenient")]
    pub display_text: String,
}

impl Tag {
    pub fn new(display_text: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
        }
    }
}

/// The three independent tag sequences of a sense, each in document order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub grammar: Vec<Tag>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub usage: Vec<Tag>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub geo: Vec<Tag>,
}

impl Tags {
    pub fn of_kind(&self, kind: TagKind) -> &[Tag] {
        match kind {
            TagKind::Grammar => &self.grammar,
            TagKind::Usage => &self.usage,
            TagKind::Geo => &self.geo,
        }
    }

    pub fn push(&mut self, kind: TagKind, tag: Tag) {
        match kind {
            TagKind::Grammar => self.grammar.push(tag),
            TagKind::Usage => self.usage.push(tag),
            TagKind::Geo => self.geo.push(tag),
        }
    }

    /// Grammar tags, then usage, then geo.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.grammar.iter().chain(&self.usage).chain(&self.geo)
    }

    pub fn is_empty(&self) -> bool {
        self.grammar.is_empty() && self.usage.is_empty() && self.geo.is_empty()
    }
}

/// A sense note: either free annotation text or a symbol marker.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Note {
    Symbol { symbol: String },
    Text(String),
}

impl Note {
    /// Text shown for the note regardless of its kind.
    pub fn as_text(&self) -> &str {
        match self {
            Note::Symbol { symbol } => symbol,
            Note::Text(text) => text,
        }
    }
}

/// One sense of an entry or expression.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Document anchor; senses without one cannot be linked to.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Tags,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub notes: Vec<Note>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub synonyms: Vec<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub antonyms: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Verb,
    #[default]
    General,
}

/// Conjugation metadata read from a verb page.
///
/// `note` is only set when the page carries none of the structured fields.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Inflection {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub plural: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub irregular_participles: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
}

impl Inflection {
    /// Assemble inflection data, dropping the note whenever structured data exists.
    ///
    /// Empty strings count as absent.
    pub fn from_parts(
        model: Option<String>,
        plural: Option<String>,
        irregular_participles: Vec<String>,
        note: Option<String>,
    ) -> Self {
        let model = model.filter(|m| !m.is_empty());
        let plural = plural.filter(|p| !p.is_empty());
        let irregular_participles: Vec<String> = irregular_participles
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        let structured = model.is_some() || plural.is_some() || !irregular_participles.is_empty();
        let note = if structured {
            None
        } else {
            note.filter(|n| !n.is_empty())
        };
        Self {
            model,
            plural,
            irregular_participles,
            note,
        }
    }
}

/// Primary record for one headword page.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, deserialize_with = "lenient")]
    pub lookup_key: String,
    #[serde(default, deserialize_with = "lenient")]
    pub headword: String,
    #[serde(default, deserialize_with = "lenient")]
    pub kind: EntryKind,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub definitions: Vec<Definition>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub expression_refs: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub inflection: Option<Inflection>,
}

impl Entry {
    /// Inflection data, honoured only for verb entries.
    pub fn inflection(&self) -> Option<&Inflection> {
        match self.kind {
            EntryKind::Verb => self.inflection.as_ref(),
            EntryKind::General => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionKind {
    #[default]
    Locution,
    Solution,
}

/// An idiom or locution nested in a parent page.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default, deserialize_with = "lenient")]
    pub headword: String,
    #[serde(default, deserialize_with = "lenient")]
    pub kind: ExpressionKind,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub definition: Definition,
    /// Lookup key of the entry whose page holds this expression.
    #[serde(default, deserialize_with = "lenient")]
    pub parent_key: String,
}

impl Expression {
    /// Anchor used to address the expression inside its parent page.
    ///
    /// Without an id the anchor is built from the expression's 1-based
    /// `position` among the page's sub-entries, which keeps it unique per page.
    pub fn anchor(&self, position: usize) -> String {
        match self.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => format!("{}-{position}", RecordType::from(self.kind)),
        }
    }
}

/// `type` column of a stored record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Verb,
    #[default]
    General,
    Locution,
    Solution,
}

impl RecordType {
    pub fn is_expression(self) -> bool {
        matches!(self, RecordType::Locution | RecordType::Solution)
    }
}

impl From<EntryKind> for RecordType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Verb => RecordType::Verb,
            EntryKind::General => RecordType::General,
        }
    }
}

impl From<ExpressionKind> for RecordType {
    fn from(kind: ExpressionKind) -> Self {
        match kind {
            ExpressionKind::Locution => RecordType::Locution,
            ExpressionKind::Solution => RecordType::Solution,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::Verb => "verb",
            RecordType::General => "general",
            RecordType::Locution => "locution",
            RecordType::Solution => "solution",
        })
    }
}

/// Payload of a stored record, chosen by its `type` column.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordData {
    Entry(Entry),
    Expression(Expression),
}

impl RecordData {
    /// Senses in document order; an expression always has exactly one.
    pub fn definitions(&self) -> &[Definition] {
        match self {
            RecordData::Entry(entry) => &entry.definitions,
            RecordData::Expression(expr) => std::slice::from_ref(&expr.definition),
        }
    }

    pub fn inflection(&self) -> Option<&Inflection> {
        match self {
            RecordData::Entry(entry) => entry.inflection(),
            RecordData::Expression(_) => None,
        }
    }

    pub fn expression_refs(&self) -> &[String] {
        match self {
            RecordData::Entry(entry) => &entry.expression_refs,
            RecordData::Expression(_) => &[],
        }
    }
}

/// One line of the append-only store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecord")]
pub struct StoredRecord {
    pub url: String,
    pub word: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub data: RecordData,
    pub timestamp: String,
}

impl StoredRecord {
    pub fn entry(url: impl Into<String>, entry: Entry, timestamp: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            word: entry.lookup_key.clone(),
            kind: entry.kind.into(),
            data: RecordData::Entry(entry),
            timestamp: timestamp.into(),
        }
    }

    pub fn expression(
        url: impl Into<String>,
        expression: Expression,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            word: expression.headword.clone(),
            kind: expression.kind.into(),
            data: RecordData::Expression(expression),
            timestamp: timestamp.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    url: String,
    #[serde(default)]
    word: String,
    #[serde(rename = "type", default)]
    kind: RecordType,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    timestamp: String,
}

impl From<RawRecord> for StoredRecord {
    fn from(raw: RawRecord) -> Self {
        // A payload of the wrong shape decodes to an empty record of the declared type.
        let data = if raw.kind.is_expression() {
            RecordData::Expression(serde_json::from_value(raw.data).unwrap_or_default())
        } else {
            RecordData::Entry(serde_json::from_value(raw.data).unwrap_or_default())
        };
        Self {
            url: raw.url,
            word: raw.word,
            kind: raw.kind,
            data,
            timestamp: raw.timestamp,
        }
    }
}

/// Decode a field, falling back to its default when it is null or mistyped.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a list element by element, dropping the elements that fail.
///
/// Anything but an array decodes as an empty list.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Remove wildcard markers and surrounding whitespace from a cross-reference.
///
/// Stripping is idempotent.
pub fn strip_wildcards(text: &str) -> String {
    text.replace(WILDCARD_MARKER, "").trim().to_string()
}

/// URL under which an expression nested at `anchor` is stored.
pub fn expression_url(parent_url: &str, anchor: &str) -> String {
    format!("{parent_url}#{anchor}")
}

/// Reader-side search link for a cross-reference word.
pub fn query_href(text: &str) -> String {
    format!("?query={}&wildcards=off", strip_wildcards(text))
}
