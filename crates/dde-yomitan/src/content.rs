//! Structured-content trees as the dictionary reader renders them.

use serde::Serialize;

/// Data role attached to a `div` so the reader can style it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    TermNote,
    Plural,
    Participles,
    ExampleSentence,
    ExtraInfo,
    DefinitionNotes,
    Synonyms,
    Antonyms,
    Attribution,
    Expressions,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Data {
    pub content: Role,
}

/// A node: leaf text, a tagged element, or a list of nodes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Element(Box<Element>),
    List(Vec<Content>),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Content::Element(Box::new(element))
    }
}

impl From<Vec<Content>> for Content {
    fn from(items: Vec<Content>) -> Self {
        Content::List(items)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(rename = "colSpan", skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,
    #[serde(rename = "rowSpan", skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            tag: tag.into(),
            data: None,
            col_span: None,
            row_span: None,
            content: content.into(),
            href: None,
        }
    }

    /// `div` carrying a data role.
    pub fn block(role: Role, content: impl Into<Content>) -> Self {
        Self {
            data: Some(Data { content: role }),
            ..Self::new("div", content)
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            href: Some(href.into()),
            ..Self::new("a", text)
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.data.map(|d| d.content)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "structured-content")]
    StructuredContent,
}

/// Root of one rendered definition.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StructuredContent {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub content: Vec<Content>,
}

impl StructuredContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<Content>) {
        self.content.push(item.into());
    }

    /// Top-level elements carrying `role`.
    pub fn blocks_with_role(&self, role: Role) -> impl Iterator<Item = &Element> + '_ {
        self.content.iter().filter_map(move |item| match item {
            Content::Element(el) if el.role() == Some(role) => Some(el.as_ref()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_reader_node_shapes() {
        let mut root = StructuredContent::new();
        root.push("Estrella.");
        root.push(Element::block(
            Role::Synonyms,
            vec![Element::link("astro", "?query=astro&wildcards=off").into()],
        ));
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({
                "type": "structured-content",
                "content": [
                    "Estrella.",
                    {
                        "tag": "div",
                        "data": {"content": "synonyms"},
                        "content": [
                            {"tag": "a", "content": "astro", "href": "?query=astro&wildcards=off"}
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn table_cells_carry_spans() {
        let cell = Element {
            col_span: Some(2),
            ..Element::new("th", "Presente")
        };
        assert_eq!(
            serde_json::to_value(&cell).unwrap(),
            json!({"tag": "th", "colSpan": 2, "content": "Presente"})
        );
    }
}
