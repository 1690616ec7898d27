//! Fixed lookup tables: grammar tag → rule identifier, conjugation model → class.

use std::fmt;

/// Coarse part of speech the reader uses to pick deinflection rules.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Rule {
    Adjective,
    Verb,
    Noun,
}

impl Rule {
    /// Identifier written to the row's rule column.
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::Adjective => "adj",
            Rule::Verb => "v",
            Rule::Noun => "n",
        }
    }

    /// Resolve a single (hyphenated) grammar tag.
    pub fn from_grammar_tag(tag: &str) -> Option<Self> {
        match tag {
            "adj." => Some(Rule::Adjective),
            "aux." | "copul." | "intr." | "reg." | "tr." | "v." => Some(Rule::Verb),
            "m." | "f." | "n." => Some(Rule::Noun),
            _ => None,
        }
    }

    /// First grammar tag with a known rule wins.
    pub fn first_match<'t>(tags: impl IntoIterator<Item = &'t str>) -> Option<Self> {
        tags.into_iter().find_map(Self::from_grammar_tag)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjugation models of the dictionary's verb tables and their class number.
const CONJUGATION_MODELS: &[(&str, &str)] = &[
    ("amar", "1"),
    ("temer", "2"),
    ("partir", "3"),
    ("anunciar", "4"),
    ("enviar", "5"),
    ("liar", "6"),
    ("averiguar", "7"),
    ("actuar", "8"),
    ("bailar", "9"),
    ("aislar", "10"),
    ("causar", "11"),
    ("aunar", "12"),
    ("peinar", "13"),
    ("descafeinar", "14"),
    ("adeudar", "15"),
    ("rehusar", "16"),
    ("acertar", "17"),
    ("adquirir", "18"),
    ("agradecer", "19"),
    ("andar", "20"),
    ("asir", "21"),
    ("bendecir", "22"),
    ("caber", "23"),
    ("caer", "24"),
    ("ceñir", "25"),
    ("conducir", "26"),
    ("construir", "27"),
    ("contar", "28"),
    ("dar", "29"),
    ("decir", "30"),
    ("discernir", "31"),
    ("dormir", "32"),
    ("entender", "33"),
    ("erguir", "34"),
    ("errar", "35"),
    ("estar", "36"),
    ("haber", "37"),
    ("hacer", "38"),
    ("huir", "39"),
    ("ir", "40"),
    ("jugar", "41"),
    ("leer", "42"),
    ("lucir", "43"),
    ("mover", "44"),
    ("mullir", "45"),
    ("oír", "46"),
    ("oler", "47"),
    ("pedir", "48"),
    ("poder", "49"),
    ("poner", "50"),
    ("predecir", "51"),
    ("pudrir", "52"),
    ("podrir", "52"),
    ("querer", "53"),
    ("reír", "54"),
    ("roer", "55"),
    ("saber", "56"),
    ("salir", "57"),
    ("sentir", "58"),
    ("ser", "59"),
    ("sonreír", "60"),
    ("tañer", "61"),
    ("tener", "62"),
    ("traer", "63"),
    ("valer", "64"),
    ("venir", "65"),
    ("ver", "66"),
    ("yacer", "67"),
];

/// Class number for a conjugation model name, if the model is known.
pub fn inflection_class(model: &str) -> Option<&'static str> {
    let model = model.trim();
    CONJUGATION_MODELS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, class)| *class)
}

/// Number of known model names.
pub fn known_models() -> usize {
    CONJUGATION_MODELS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_matching_grammar_tag() {
        assert_eq!(Rule::first_match(["loc.", "adj.", "m."]), Some(Rule::Adjective));
        assert_eq!(Rule::first_match(["copul."]).map(Rule::as_str), Some("v"));
        assert_eq!(Rule::first_match(["f."]), Some(Rule::Noun));
        assert_eq!(Rule::first_match(["interj."]), None);
        assert_eq!(Rule::first_match(std::iter::empty()), None);
    }

    #[test]
    fn maps_conjugation_models() {
        assert_eq!(known_models(), 68);
        assert_eq!(inflection_class("contar"), Some("28"));
        assert_eq!(inflection_class("amar"), Some("1"));
        assert_eq!(inflection_class("podrir"), inflection_class("pudrir"));
        assert_eq!(inflection_class(" yacer "), Some("67"));
        assert_eq!(inflection_class("inventar"), None);
    }
}
