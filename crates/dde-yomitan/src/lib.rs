//! Compile stored dictionary records into tag-grouped lexicon rows.
//!
//! Each [`StoredRecord`] contributes one [`LexiconRow`] per distinct
//! `(tag_string, rule_id)` signature among its definitions. Rows come out in
//! input order, groups in first-seen order, and definitions inside a group
//! keep their original order. Every definition is rendered as its own
//! [`StructuredContent`] tree.
//!
//! # Example
//! ```
//! use dde_types::{Definition, Entry, StoredRecord, Tag};
//! use dde_yomitan::{CompileOptions, compile};
//!
//! let mut sense = Definition { text: "Estrella.".into(), ..Definition::default() };
//! sense.tags.grammar.push(Tag::new("m."));
//! let entry = Entry {
//!     lookup_key: "sol".into(),
//!     headword: "sol".into(),
//!     definitions: vec![sense],
//!     ..Entry::default()
//! };
//! let record = StoredRecord::entry("https://example/sol", entry, "");
//! let rows = compile(&[record], &CompileOptions::default());
//! assert_eq!(rows[0].rule_id, "n");
//! ```

pub mod conjugation;
mod content;
pub mod frequency;
mod tables;

use std::collections::HashMap;
use std::hash::Hash;

use dde_types::{Definition, StoredRecord, Tags, query_href, strip_wildcards};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use tracing::{debug, info, warn};

pub use content::{Content, ContentType, Data, Element, Role, StructuredContent};
pub use tables::{Rule, inflection_class, known_models};

/// Outbound link shown in the attribution block, followed by the row's word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributionLink {
    pub label: String,
    pub url_prefix: String,
}

impl AttributionLink {
    pub fn new(label: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url_prefix: url_prefix.into(),
        }
    }

    fn href(&self, word: &str) -> String {
        format!("{}{word}", self.url_prefix)
    }
}

#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Links of the attribution block, separated by `" | "`.
    pub attribution: Vec<AttributionLink>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            attribution: vec![
                AttributionLink::new("DLE", "https://dle.rae.es/"),
                AttributionLink::new("DLE", "https://rae.es/diccionario-estudiante/"),
            ],
        }
    }
}

/// One term-bank row. Serialized as an eight-element array.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LexiconRow {
    pub headword: String,
    pub reading: String,
    pub tag_string: String,
    pub rule_id: String,
    pub score: i64,
    pub content_blocks: Vec<StructuredContent>,
    pub sequence_number: i64,
    pub inflection_tags: String,
}

impl Serialize for LexiconRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(8)?;
        row.serialize_element(&self.headword)?;
        row.serialize_element(&self.reading)?;
        row.serialize_element(&self.tag_string)?;
        row.serialize_element(&self.rule_id)?;
        row.serialize_element(&self.score)?;
        row.serialize_element(&self.content_blocks)?;
        row.serialize_element(&self.sequence_number)?;
        row.serialize_element(&self.inflection_tags)?;
        row.end()
    }
}

/// Compile every record, preserving input order.
pub fn compile(records: &[StoredRecord], options: &CompileOptions) -> Vec<LexiconRow> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        let compiled = compile_record(record, options);
        if compiled.is_empty() {
            skipped += 1;
        }
        rows.extend(compiled);
    }
    info!(
        "compiled {} records into {} rows ({} without definitions)",
        records.len(),
        rows.len(),
        skipped
    );
    rows
}

/// Rows for a single record; empty when it has no definitions.
pub fn compile_record(record: &StoredRecord, options: &CompileOptions) -> Vec<LexiconRow> {
    let definitions = record.data.definitions();
    if definitions.is_empty() {
        warn!("no definitions found for \"{}\"", record.word);
        return Vec::new();
    }

    let inflection_tags = record
        .data
        .inflection()
        .and_then(|inflection| inflection.model.as_deref())
        .and_then(inflection_class)
        .unwrap_or_default();

    let last = definitions.len() - 1;
    let mut groups = OrderedGroups::default();
    for (idx, definition) in definitions.iter().enumerate() {
        let key = (tag_string(&definition.tags), rule_id(&definition.tags));
        let block = render_definition(record, definition, idx == 0, idx == last, options);
        groups.push(key, block);
    }

    debug!(
        "\"{}\" ({}): {} definitions in {} groups",
        record.word,
        record.kind,
        definitions.len(),
        groups.len()
    );

    groups
        .into_groups()
        .map(|((tag_string, rule_id), content_blocks)| LexiconRow {
            headword: record.word.clone(),
            tag_string,
            rule_id,
            content_blocks,
            inflection_tags: inflection_tags.to_string(),
            ..LexiconRow::default()
        })
        .collect()
}

/// Grammar, usage and geo display texts, hyphenated, joined by spaces.
pub fn tag_string(tags: &Tags) -> String {
    tags.iter()
        .map(|tag| hyphenate(&tag.display_text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifier of the first grammar tag with a known rule, or `""`.
pub fn rule_id(tags: &Tags) -> String {
    let hyphenated: Vec<String> = tags
        .grammar
        .iter()
        .map(|tag| hyphenate(&tag.display_text))
        .collect();
    Rule::first_match(hyphenated.iter().map(String::as_str))
        .map(|rule| rule.as_str().to_string())
        .unwrap_or_default()
}

fn hyphenate(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("-")
}

fn render_definition(
    record: &StoredRecord,
    definition: &Definition,
    first: bool,
    last: bool,
    options: &CompileOptions,
) -> StructuredContent {
    let mut root = StructuredContent::new();
    root.push(definition.text.as_str());

    if first {
        if let Some(inflection) = record.data.inflection() {
            if let Some(note) = &inflection.note {
                root.push(Element::block(Role::TermNote, note.as_str()));
            }
            if let Some(plural) = &inflection.plural {
                root.push(Element::block(Role::Plural, plural.as_str()));
            }
            for participle in &inflection.irregular_participles {
                root.push(linked_block(Role::Participles, participle));
            }
        }
    }

    if !definition.examples.is_empty() {
        let examples: Vec<Content> = definition
            .examples
            .iter()
            .map(|example| Element::block(Role::ExampleSentence, example.as_str()).into())
            .collect();
        root.push(Element::block(Role::ExtraInfo, examples));
    }

    if !definition.notes.is_empty() {
        let notes: Vec<Content> = definition
            .notes
            .iter()
            .map(|note| Element::block(Role::DefinitionNotes, note.as_text()).into())
            .collect();
        root.push(Element::block(Role::ExtraInfo, notes));
    }

    for synonym in &definition.synonyms {
        root.push(linked_block(Role::Synonyms, synonym));
    }
    for antonym in &definition.antonyms {
        root.push(linked_block(Role::Antonyms, antonym));
    }

    if last {
        if !options.attribution.is_empty() {
            root.push(attribution(&record.word, &options.attribution));
        }
        for expression in record.data.expression_refs() {
            root.push(linked_block(Role::Expressions, expression));
        }
    }

    root
}

/// `div` holding a single search link for `word`.
fn linked_block(role: Role, word: &str) -> Element {
    Element::block(role, vec![cross_reference(word).into()])
}

fn cross_reference(word: &str) -> Element {
    Element::link(strip_wildcards(word), query_href(word))
}

fn attribution(word: &str, links: &[AttributionLink]) -> Element {
    let mut content: Vec<Content> = Vec::with_capacity(links.len() * 2);
    for (idx, link) in links.iter().enumerate() {
        if idx > 0 {
            content.push(Element::new("span", " | ").into());
        }
        content.push(Element::link(link.label.as_str(), link.href(word)).into());
    }
    Element::block(Role::Attribution, content)
}

/// Groups values by key, remembering the order keys were first seen.
struct OrderedGroups<K, V> {
    groups: Vec<(K, Vec<V>)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for OrderedGroups<K, V> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, V> OrderedGroups<K, V> {
    fn push(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(value),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![value]));
            }
        }
    }

    fn len(&self) -> usize {
        self.groups.len()
    }

    fn into_groups(self) -> impl Iterator<Item = (K, Vec<V>)> {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dde_types::{Entry, EntryKind, Expression, Inflection, Note, RecordData, Tag};
    use serde_json::json;

    fn sense(text: &str, grammar: &[&str]) -> Definition {
        let mut def = Definition {
            text: text.into(),
            ..Definition::default()
        };
        for tag in grammar {
            def.tags.grammar.push(Tag::new(*tag));
        }
        def
    }

    fn verb(word: &str, model: &str, definitions: Vec<Definition>) -> StoredRecord {
        let entry = Entry {
            lookup_key: word.into(),
            headword: word.into(),
            kind: EntryKind::Verb,
            definitions,
            inflection: Some(Inflection::from_parts(
                Some(model.into()),
                None,
                Vec::new(),
                None,
            )),
            ..Entry::default()
        };
        StoredRecord::entry(format!("https://example/{word}"), entry, "")
    }

    fn general(word: &str, definitions: Vec<Definition>) -> StoredRecord {
        let entry = Entry {
            lookup_key: word.into(),
            headword: word.into(),
            definitions,
            ..Entry::default()
        };
        StoredRecord::entry(format!("https://example/{word}"), entry, "")
    }

    fn texts(row: &LexiconRow) -> Vec<&Content> {
        row.content_blocks.iter().map(|sc| &sc.content[0]).collect()
    }

    #[test]
    fn verb_with_two_signatures_yields_two_rows_sharing_the_class() {
        let record = verb(
            "contar",
            "contar",
            vec![sense("Numerar.", &["adj."]), sense("Referir.", &["v."])],
        );
        let rows = compile_record(&record, &CompileOptions::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rule_id, "adj");
        assert_eq!(rows[1].rule_id, "v");
        assert!(rows.iter().all(|row| row.inflection_tags == "28"));
        assert!(rows.iter().all(|row| row.headword == "contar"));
        assert!(rows.iter().all(|row| row.score == 0 && row.sequence_number == 0));
        assert!(rows.iter().all(|row| row.reading.is_empty()));
    }

    #[test]
    fn grouping_keeps_first_seen_and_intra_group_order() {
        let record = general(
            "banco",
            vec![
                sense("uno", &["m."]),
                sense("dos", &["adj."]),
                sense("tres", &["m."]),
                sense("cuatro", &[]),
                sense("cinco", &["adj."]),
            ],
        );
        let rows = compile_record(&record, &CompileOptions::default());
        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.tag_string.as_str(), r.rule_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("m.", "n"), ("adj.", "adj"), ("", "")]);
        assert_eq!(texts(&rows[0]), vec![&Content::from("uno"), &Content::from("tres")]);
        assert_eq!(texts(&rows[1]), vec![&Content::from("dos"), &Content::from("cinco")]);
        let total: usize = rows.iter().map(|r| r.content_blocks.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn tag_string_hyphenates_and_orders_kinds() {
        let mut tags = Tags::default();
        tags.push(dde_types::TagKind::Geo, Tag::new("Am. Central"));
        tags.push(dde_types::TagKind::Usage, Tag::new("coloq."));
        tags.push(dde_types::TagKind::Grammar, Tag::new("loc. adv."));
        tags.push(dde_types::TagKind::Grammar, Tag::new(" "));
        assert_eq!(tag_string(&tags), "loc.-adv. coloq. Am.-Central");
        assert_eq!(rule_id(&tags), "");
    }

    #[test]
    fn synonyms_link_to_stripped_words() {
        let mut def = sense("Tiempo de luz.", &["m."]);
        def.synonyms = vec!["*día".into(), "jornada".into()];
        let rows = compile_record(&general("día", vec![def]), &CompileOptions::default());
        let blocks: Vec<_> = rows[0].content_blocks[0]
            .blocks_with_role(Role::Synonyms)
            .map(|el| serde_json::to_value(el).unwrap())
            .collect();
        assert_eq!(
            blocks,
            vec![
                json!({"tag": "div", "data": {"content": "synonyms"}, "content": [
                    {"tag": "a", "content": "día", "href": "?query=día&wildcards=off"}
                ]}),
                json!({"tag": "div", "data": {"content": "synonyms"}, "content": [
                    {"tag": "a", "content": "jornada", "href": "?query=jornada&wildcards=off"}
                ]}),
            ]
        );
    }

    #[test]
    fn first_and_last_only_blocks_are_placed_once() {
        let mut entry = Entry {
            lookup_key: "poner".into(),
            headword: "poner".into(),
            kind: EntryKind::Verb,
            definitions: vec![sense("a", &["tr."]), sense("b", &["m."]), sense("c", &["tr."])],
            expression_refs: vec!["poner en *marcha".into()],
            ..Entry::default()
        };
        entry.inflection = Some(Inflection::from_parts(
            Some("poner".into()),
            Some("pones".into()),
            vec!["puesto".into()],
            None,
        ));
        let record = StoredRecord::entry("https://example/poner", entry, "");
        let rows = compile_record(&record, &CompileOptions::default());
        // Row 0 holds definitions a and c, row 1 holds b.
        let a = &rows[0].content_blocks[0];
        let c = &rows[0].content_blocks[1];
        let b = &rows[1].content_blocks[0];

        assert_eq!(a.blocks_with_role(Role::Plural).count(), 1);
        assert_eq!(a.blocks_with_role(Role::Participles).count(), 1);
        for later in [b, c] {
            assert_eq!(later.blocks_with_role(Role::Plural).count(), 0);
            assert_eq!(later.blocks_with_role(Role::Participles).count(), 0);
        }
        for earlier in [a, b] {
            assert_eq!(earlier.blocks_with_role(Role::Attribution).count(), 0);
            assert_eq!(earlier.blocks_with_role(Role::Expressions).count(), 0);
        }
        assert_eq!(c.blocks_with_role(Role::Attribution).count(), 1);
        let expression = c.blocks_with_role(Role::Expressions).next().unwrap();
        assert_eq!(
            serde_json::to_value(expression).unwrap()["content"][0]["content"],
            json!("poner en marcha")
        );
        assert_eq!(rows[0].inflection_tags, "50");
    }

    #[test]
    fn damaged_sense_leaves_the_rest_compilable() {
        let record: StoredRecord = serde_json::from_str(
            r#"{"url":"https://example/luz","word":"luz","type":"general",
                "data":{"headword":"luz","definitions":[
                    {"text":"Claridad.","examples":null},
                    "oops",
                    {"text":"Aparato.","tags":{"grammar":[{"display_text":"f."}]}}
                ]}}"#,
        )
        .unwrap();
        let rows = compile_record(&record, &CompileOptions::default());
        let glosses: Vec<_> = rows.iter().flat_map(texts).collect();
        assert_eq!(
            glosses,
            vec![&Content::from("Claridad."), &Content::from("Aparato.")]
        );
        assert_eq!(rows[1].tag_string, "f.");
    }

    #[test]
    fn inflection_note_opens_only_the_first_definition() {
        let mut record = verb(
            "haber",
            "",
            vec![sense("Existir.", &["impers."]), sense("Tener.", &["tr."])],
        );
        if let RecordData::Entry(entry) = &mut record.data {
            entry.inflection = Some(Inflection::from_parts(
                None,
                None,
                Vec::new(),
                Some("Verbo irregular.".into()),
            ));
        }
        let rows = compile_record(&record, &CompileOptions::default());
        let blocks: Vec<&StructuredContent> =
            rows.iter().flat_map(|row| &row.content_blocks).collect();
        assert_eq!(blocks.len(), 2);

        let notes: Vec<_> = blocks[0].blocks_with_role(Role::TermNote).collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            serde_json::to_value(notes[0]).unwrap()["content"],
            json!("Verbo irregular.")
        );
        assert_eq!(blocks[1].blocks_with_role(Role::TermNote).count(), 0);
        assert_eq!(
            blocks
                .iter()
                .map(|block| block.blocks_with_role(Role::TermNote).count())
                .sum::<usize>(),
            1
        );
    }

    #[test]
    fn attribution_links_follow_the_options() {
        let record = general("sol", vec![sense("Estrella.", &[])]);
        let rows = compile_record(&record, &CompileOptions::default());
        let block = rows[0].content_blocks[0]
            .blocks_with_role(Role::Attribution)
            .next()
            .unwrap();
        assert_eq!(
            serde_json::to_value(block).unwrap()["content"],
            json!([
                {"tag": "a", "content": "DLE", "href": "https://dle.rae.es/sol"},
                {"tag": "span", "content": " | "},
                {"tag": "a", "content": "DLE", "href": "https://rae.es/diccionario-estudiante/sol"}
            ])
        );

        let bare = CompileOptions {
            attribution: Vec::new(),
        };
        let rows = compile_record(&record, &bare);
        assert_eq!(rows[0].content_blocks[0].blocks_with_role(Role::Attribution).count(), 0);
    }

    #[test]
    fn examples_and_notes_are_wrapped_in_extra_info() {
        let mut def = sense("Luz.", &[]);
        def.examples = vec!["Hace sol.".into(), "Sol de invierno.".into()];
        def.notes = vec![
            Note::Text("Se usa poco.".into()),
            Note::Symbol {
                symbol: "▶".into(),
            },
        ];
        let rows = compile_record(&general("sol", vec![def]), &CompileOptions::default());
        let extra: Vec<_> = rows[0].content_blocks[0]
            .blocks_with_role(Role::ExtraInfo)
            .map(|el| serde_json::to_value(el).unwrap())
            .collect();
        assert_eq!(extra.len(), 2);
        assert_eq!(extra[0]["content"][1]["data"]["content"], json!("example-sentence"));
        assert_eq!(extra[0]["content"][1]["content"], json!("Sol de invierno."));
        assert_eq!(extra[1]["content"][0]["data"]["content"], json!("definition-notes"));
        assert_eq!(extra[1]["content"][1]["content"], json!("▶"));
    }

    #[test]
    fn records_without_definitions_produce_no_rows() {
        let empty = general("nada", Vec::new());
        assert!(compile_record(&empty, &CompileOptions::default()).is_empty());

        let expression = Expression {
            headword: "a la par".into(),
            definition: sense("Juntamente.", &[]),
            parent_key: "par".into(),
            ..Expression::default()
        };
        let record = StoredRecord::expression("https://example/par#loc1", expression, "");
        let rows = compile(&[empty, record], &CompileOptions::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].headword, "a la par");
        assert_eq!(rows[0].inflection_tags, "");
    }

    #[test]
    fn rows_serialize_as_fixed_arrays() {
        let rows = compile_record(
            &general("sol", vec![sense("Estrella.", &["m."])]),
            &CompileOptions {
                attribution: Vec::new(),
            },
        );
        assert_eq!(
            serde_json::to_value(&rows[0]).unwrap(),
            json!([
                "sol", "", "m.", "n", 0,
                [{"type": "structured-content", "content": ["Estrella."]}],
                0, ""
            ])
        );
    }
}
