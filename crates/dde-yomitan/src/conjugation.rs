//! Conjugation tables rendered as structured content.
//!
//! Saved conjugation pages carry one HTML table per verb. The first `tbody`
//! is turned into a `tbody`/`tr`/cell tree; cells keep their tag, their
//! trimmed text and any `colspan`/`rowspan` that parses as an integer.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::debug;

use crate::content::{Content, Element, StructuredContent};
use crate::{LexiconRow, Rule};

static TBODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody").expect("static selector is valid"));
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector is valid"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector is valid"));

/// One verb and the markup of its conjugation table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ConjugationSource {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub table: String,
}

/// Convert the first `tbody` of `html`. No `tbody` yields an empty root.
pub fn convert_table(html: &str) -> StructuredContent {
    let fragment = Html::parse_fragment(html);
    let mut root = StructuredContent::new();
    let Some(tbody) = fragment.select(&TBODY).next() else {
        debug!("conjugation table without tbody");
        return root;
    };

    let rows: Vec<Content> = tbody
        .select(&ROW)
        .map(|tr| {
            let cells: Vec<Content> = tr
                .select(&CELL)
                .map(|cell| convert_cell(cell).into())
                .collect();
            Element::new("tr", cells).into()
        })
        .collect();
    root.push(Element::new("tbody", rows));
    root
}

fn convert_cell(cell: ElementRef<'_>) -> Element {
    let text: String = cell.text().collect();
    Element {
        col_span: span(cell, "colspan"),
        row_span: span(cell, "rowspan"),
        ..Element::new(cell.value().name(), text.trim())
    }
}

fn span(cell: ElementRef<'_>, attr: &str) -> Option<u32> {
    cell.value().attr(attr)?.trim().parse().ok()
}

/// Verb row carrying the rendered table as its only content block.
pub fn conjugation_row(word: &str, table_html: &str) -> LexiconRow {
    LexiconRow {
        headword: word.to_string(),
        rule_id: Rule::Verb.as_str().to_string(),
        content_blocks: vec![convert_table(table_html)],
        ..LexiconRow::default()
    }
}

pub fn conjugation_rows(sources: &[ConjugationSource]) -> Vec<LexiconRow> {
    sources
        .iter()
        .map(|source| conjugation_row(&source.word, &source.table))
        .collect()
}
