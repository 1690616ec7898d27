use dde_types::{Definition, Note, Tag, TagKind};
use scraper::{ElementRef, Selector};

use crate::markup::{self, View};
use crate::registry::TagRegistry;

/// Where a sense node was found; decides which markup rules apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SenseRole {
    /// Top-level sense of an article. Must carry an `id`.
    Article,
    /// Sense inside the conjugation container.
    Inflection,
    /// The single sense of a locution or solution block.
    Expression,
}

/// Turn one sense node into a [`Definition`], registering its tags.
///
/// Returns `None` only for article senses without an `id`. Nested
/// sub-entries are left out before examples, notes, tags and references are
/// read, so their content is not counted twice.
pub fn extract_definition<'a>(
    sense: ElementRef<'a>,
    role: SenseRole,
    view: &View<'a>,
    registry: &mut TagRegistry,
) -> Option<Definition> {
    let id = sense.value().attr("id").map(str::to_string);
    if role == SenseRole::Article && id.is_none() {
        return None;
    }

    let gloss = match role {
        SenseRole::Expression => view.first(sense, &markup::SUBENTRY_GLOSS),
        SenseRole::Article | SenseRole::Inflection => view.first(sense, &markup::GLOSS),
    };
    let text = gloss.map(markup::joined_text).unwrap_or_default();

    let nested: Vec<_> = view.select(sense, &markup::SUBENTRY).collect();
    let view = view.clone().excluding(nested);

    let mut definition = Definition {
        id,
        text,
        ..Definition::default()
    };

    for (kind, selector) in [
        (TagKind::Grammar, &*markup::GRAMMAR_TAG),
        (TagKind::Usage, &*markup::USAGE_TAG),
        (TagKind::Geo, &*markup::GEO_TAG),
    ] {
        for marker in view.select(sense, selector) {
            let display = markup::leading_text(marker);
            if display.trim().is_empty() {
                continue;
            }
            let canonical = marker.value().attr("title").unwrap_or_default();
            registry.register(kind, &display, canonical);
            definition.tags.push(kind, Tag::new(display));
        }
    }

    definition.examples = texts(&view, sense, &markup::EXAMPLE);

    let annotations: &Selector = match role {
        SenseRole::Expression => &*markup::PARAGRAPH,
        SenseRole::Article | SenseRole::Inflection => &*markup::ANNOTATION,
    };
    definition.notes = texts(&view, sense, annotations)
        .into_iter()
        .map(Note::Text)
        .collect();
    definition.notes.extend(
        view.select(sense, &markup::SYMBOL)
            .map(|symbol| Note::Symbol {
                symbol: markup::plain_text(symbol),
            }),
    );

    for reference in view.select(sense, &markup::REFERENCE) {
        let suffix = markup::class_of(reference).replace("ref", "");
        let target = match suffix.trim() {
            "S" => &mut definition.synonyms,
            "A" => &mut definition.antonyms,
            _ => continue,
        };
        target.extend(reference_words(&view, reference));
    }

    Some(definition)
}

fn texts<'a>(view: &View<'a>, scope: ElementRef<'a>, selector: &Selector) -> Vec<String> {
    view.select(scope, selector).map(markup::joined_text).collect()
}

fn reference_words<'a>(view: &View<'a>, reference: ElementRef<'a>) -> Vec<String> {
    view.select(reference, &markup::LINK)
        .flat_map(|link| {
            link.children()
                .filter_map(|child| child.value().as_text().map(|t| t.trim().to_string()))
                .collect::<Vec<_>>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}
