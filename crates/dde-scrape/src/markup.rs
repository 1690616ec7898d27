//! Class vocabulary of the dictionary pages and a filtered view over the tree.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

pub(crate) static HEADWORD: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class="entrada"]"#));
pub(crate) static INFLECTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class="paracep"]"#));
pub(crate) static MODEL: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class*="verboModelo"]"#));
pub(crate) static PLURAL: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class*="pluralForm"]"#));
pub(crate) static PARTICIPLE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class*="participioIrregular"]"#));
pub(crate) static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class*="par"]"#));
pub(crate) static SENSE: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[class*="acep"]"#));
pub(crate) static ARTICLE: LazyLock<Selector> = LazyLock::new(|| selector("article"));
pub(crate) static SUBENTRY: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"div[class="locs"] div[class="fc"], div[class="sols"] div[class="fc"]"#)
});
pub(crate) static SUBENTRY_HEADWORD: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class="headword-fc"]"#));
pub(crate) static GLOSS: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[class="def"]"#));
pub(crate) static SUBENTRY_GLOSS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class="acep nogr"] span[class="def"]"#));
pub(crate) static EXAMPLE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class="ejemplo"]"#));
pub(crate) static ANNOTATION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class="defP"]"#));
pub(crate) static SYMBOL: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class="symbol"]"#));
pub(crate) static GRAMMAR_TAG: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"abbr[class="gram"], abbr[class="gram primera"]"#));
pub(crate) static USAGE_TAG: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"abbr[class="register"]"#));
pub(crate) static GEO_TAG: LazyLock<Selector> = LazyLock::new(|| selector(r#"abbr[class="geo"]"#));
pub(crate) static REFERENCE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class*="ref"]"#));
pub(crate) static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

/// The tree minus a set of excluded subtrees.
///
/// Sub-entries are read first and then excluded here, so the parent never
/// sees their text. The document itself is left untouched.
#[derive(Clone, Debug, Default)]
pub struct View<'a> {
    excluded: Vec<ElementRef<'a>>,
}

impl<'a> View<'a> {
    pub fn excluding(mut self, roots: impl IntoIterator<Item = ElementRef<'a>>) -> Self {
        self.excluded.extend(roots);
        self
    }

    /// `false` when `el` is an excluded root or lies below one.
    pub fn admits(&self, el: ElementRef<'a>) -> bool {
        !self.excluded.iter().any(|root| {
            root.id() == el.id() || el.ancestors().any(|ancestor| ancestor.id() == root.id())
        })
    }

    /// Descendants of `scope` (not `scope` itself) matching `selector`, in document order.
    pub fn select<'s>(
        &'s self,
        scope: ElementRef<'a>,
        selector: &'s Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 's {
        scope
            .select(selector)
            .filter(move |el| el.id() != scope.id() && self.admits(*el))
    }

    pub fn first(&self, scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
        self.select(scope, selector).next()
    }
}

/// All text below `el`, pieces joined by a space and whitespace runs collapsed.
pub(crate) fn joined_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// All text below `el` concatenated as-is, then trimmed.
pub(crate) fn plain_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text before the first child element, as the tag markers carry it.
pub(crate) fn leading_text(el: ElementRef<'_>) -> String {
    el.children()
        .next()
        .and_then(|child| child.value().as_text().map(|t| String::from(&**t)))
        .unwrap_or_default()
}

pub(crate) fn class_of<'a>(el: ElementRef<'a>) -> &'a str {
    el.value().attr("class").unwrap_or_default()
}

/// Sense containers carry a class token starting with `acep` (`acep`, `acep nogr`).
pub(crate) fn is_sense(el: ElementRef<'_>) -> bool {
    class_of(el)
        .split_ascii_whitespace()
        .any(|token| token.starts_with("acep"))
}
