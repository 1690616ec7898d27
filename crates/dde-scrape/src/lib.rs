//! Extract normalized entries from student dictionary pages.
//!
//! One fetched page becomes at most one [`Entry`] plus the [`Expression`]s
//! (locutions and solutions) nested inside it. Every tag met on the way is
//! recorded in a caller-owned [`TagRegistry`], which lives for the whole run.
//!
//! The page is read in two phases: sub-entries are extracted first, then the
//! article's own senses are read from a [`View`] that leaves those subtrees
//! out. The parsed document is never modified.
//!
//! # Example
//! ```
//! use dde_scrape::{TagRegistry, extract_markup};
//!
//! # fn main() -> Result<(), dde_scrape::ExtractError> {
//! let page = r#"<span class="entrada">sol</span>
//!     <article><div class="acep" id="a1"><span class="def">Estrella.</span></div></article>"#;
//! let mut registry = TagRegistry::new();
//! let extraction = extract_markup(page, "sol", &mut registry)?;
//! assert_eq!(extraction.entry.unwrap().definitions[0].text, "Estrella.");
//! # Ok(()) }
//! ```

mod definition;
mod markup;
mod registry;

use dde_types::{Entry, EntryKind, Expression, ExpressionKind, Inflection};
use scraper::{ElementRef, Html, Node};
use thiserror::Error;
use tracing::debug;

pub use definition::{SenseRole, extract_definition};
pub use markup::View;
pub use registry::{TagRegistry, TagRow};

/// Why a page produced nothing. Callers record the key as unresolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unparseable document: {0}")]
    Unparseable(String),
    #[error("no entry found for \"{key}\"")]
    Unresolved { key: String },
}

/// Records produced from one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Absent when the page yielded no sense for the headword itself.
    pub entry: Option<Entry>,
    pub expressions: Vec<Expression>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.expressions.is_empty()
    }
}

/// Parse raw markup into a navigable tree.
///
/// Blank markup, or markup with no content beyond the implied
/// `html`/`head`/`body` skeleton, is reported as [`ExtractError::Unparseable`].
pub fn parse_document(markup: &str) -> Result<Html, ExtractError> {
    if markup.trim().is_empty() {
        return Err(ExtractError::Unparseable("document is empty".into()));
    }
    let document = Html::parse_document(markup);
    if !document.errors.is_empty() {
        debug!("{} recoverable markup errors", document.errors.len());
    }
    if !has_content(&document) {
        return Err(ExtractError::Unparseable(
            "document has no elements or text".into(),
        ));
    }
    Ok(document)
}

/// [`parse_document`] followed by [`extract`].
pub fn extract_markup(
    markup: &str,
    lookup_key: &str,
    registry: &mut TagRegistry,
) -> Result<Extraction, ExtractError> {
    let document = parse_document(markup)?;
    extract(&document, lookup_key, registry)
}

/// Walk one page and build its entry and expressions.
pub fn extract(
    document: &Html,
    lookup_key: &str,
    registry: &mut TagRegistry,
) -> Result<Extraction, ExtractError> {
    let root = document.root_element();
    let everything = View::default();

    let headword = everything
        .first(root, &markup::HEADWORD)
        .map(markup::plain_text)
        .filter(|word| !word.is_empty())
        .ok_or_else(|| ExtractError::Unresolved {
            key: lookup_key.to_string(),
        })?;

    let mut definitions = Vec::new();
    let container = everything.first(root, &markup::INFLECTION);
    let inflection = container.map(read_inflection);
    if let Some(container) = container {
        for sense in senses(&everything, container) {
            definitions.extend(extract_definition(
                sense,
                SenseRole::Inflection,
                &everything,
                registry,
            ));
        }
    }

    let outside_container = View::default().excluding(container);
    let mut expressions = Vec::new();
    for article in outside_container.select(root, &markup::ARTICLE) {
        let sub_entries: Vec<ElementRef<'_>> = outside_container
            .select(article, &markup::SUBENTRY)
            .collect();
        for node in &sub_entries {
            expressions.push(extract_expression(*node, lookup_key, registry));
        }

        let article_view = outside_container.clone().excluding(sub_entries);
        for sense in senses(&article_view, article) {
            definitions.extend(extract_definition(
                sense,
                SenseRole::Article,
                &article_view,
                registry,
            ));
        }
    }

    debug!(
        "\"{lookup_key}\": {} definitions, {} expressions",
        definitions.len(),
        expressions.len()
    );

    let entry = if definitions.is_empty() {
        None
    } else {
        let kind = if container.is_some() {
            EntryKind::Verb
        } else {
            EntryKind::General
        };
        Some(Entry {
            lookup_key: lookup_key.to_string(),
            headword,
            kind,
            definitions,
            expression_refs: expressions.iter().map(|e| e.headword.clone()).collect(),
            inflection: inflection.filter(|_| kind == EntryKind::Verb),
        })
    };

    Ok(Extraction { entry, expressions })
}

fn senses<'v, 'a>(
    view: &'v View<'a>,
    scope: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'v {
    view.select(scope, &markup::SENSE)
        .filter(|el| markup::is_sense(*el))
}

fn read_inflection(container: ElementRef<'_>) -> Inflection {
    let view = View::default();
    let model = view.first(container, &markup::MODEL).map(markup::plain_text);
    let plural = view.first(container, &markup::PLURAL).map(markup::plain_text);
    let participles = view
        .select(container, &markup::PARTICIPLE)
        .map(markup::plain_text)
        .collect();
    let note = view
        .first(container, &markup::PARAGRAPH)
        .map(markup::plain_text);
    Inflection::from_parts(model, plural, participles, note)
}

fn extract_expression(
    node: ElementRef<'_>,
    parent_key: &str,
    registry: &mut TagRegistry,
) -> Expression {
    let view = View::default();
    let headword = view
        .first(node, &markup::SUBENTRY_HEADWORD)
        .map(markup::plain_text)
        .filter(|word| !word.is_empty())
        .unwrap_or_else(|| parent_key.to_string());
    let definition =
        extract_definition(node, SenseRole::Expression, &view, registry).unwrap_or_default();

    Expression {
        headword,
        kind: expression_kind(node),
        id: node.value().attr("id").map(str::to_string),
        definition,
        parent_key: parent_key.to_string(),
    }
}

/// The closest `locs`/`sols` container decides the kind.
fn expression_kind(node: ElementRef<'_>) -> ExpressionKind {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .find_map(|ancestor| match markup::class_of(ancestor) {
            "locs" => Some(ExpressionKind::Locution),
            "sols" => Some(ExpressionKind::Solution),
            _ => None,
        })
        .unwrap_or_default()
}

fn has_content(document: &Html) -> bool {
    document
        .root_element()
        .descendants()
        .any(|node| match node.value() {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(el) => !matches!(el.name(), "html" | "head" | "body"),
            _ => false,
        })
}
