use itertools::Itertools;

/// An article as held in the link index.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub text: String,
    /// Outbound link targets, in first-occurrence order.
    pub links: Vec<String>,
    pub num_tokens: usize,
    pub disambiguation: bool,
}

/// Disambiguation pages are titled `... (disambiguation)` or open with a
/// "may refer to:" paragraph.
pub fn is_disambiguation(title: &str, text: &str) -> bool {
    if title.trim_end().to_lowercase().ends_with("(disambiguation)") {
        return true;
    }
    text.split("\n\n")
        .map(|p| p.trim())
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .map(|p| p.ends_with("may refer to:"))
        .unwrap_or(false)
}

/// A record as exported by the extractor (one JSON line per page).
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    #[serde(default)]
    pub plaintext: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, alias = "redirectTo", alias = "redirect")]
    pub redirect_to: Option<RedirectTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sentence {
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RedirectTarget {
    Title(String),
    Page { page: String },
}

impl RedirectTarget {
    pub fn title(&self) -> &str {
        match *self {
            RedirectTarget::Title(ref t) => t,
            RedirectTarget::Page { ref page } => page,
        }
    }
}

impl ExtractedArticle {
    /// Internal link targets in document order, each kept at its first occurrence.
    pub fn internal_links(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .flat_map(|p| p.sentences.iter())
            .flat_map(|s| s.links.iter())
            .filter(|l| l.kind == "internal")
            .filter_map(|l| l.page.as_ref())
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .unique()
            .map(|p| p.to_string())
            .collect()
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect_to.as_ref().map(|r| r.title())
    }

    /// Body stored for the article: a markdown heading followed by the plaintext.
    pub fn text(&self) -> Option<String> {
        let plain = self.plaintext.trim();
        if plain.is_empty() {
            None
        } else {
            Some(format!("# {}\n\n{}", self.title, plain))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn links_keep_document_order_and_drop_duplicates() {
        let record: ExtractedArticle = serde_json::from_str(
            r#"{
                "title": "Solen",
                "plaintext": "Solen er en stjerne.",
                "sections": [
                    {"paragraphs": [{"sentences": [
                        {"links": [{"type": "internal", "page": "Stjerne"},
                                   {"type": "external", "site": "http://x"},
                                   {"type": "internal", "page": "Jorden"}]},
                        {}
                    ]}]},
                    {"title": "Se også"},
                    {"paragraphs": [{"sentences": [
                        {"links": [{"type": "internal", "page": "Stjerne"},
                                   {"type": "internal", "page": "Helium"}]}
                    ]}]}
                ]
            }"#,
        ).unwrap();
        assert_eq!(record.internal_links(), vec!["Stjerne", "Jorden", "Helium"]);
        assert_eq!(record.text().unwrap(), "# Solen\n\nSolen er en stjerne.");
        assert!(record.redirect().is_none());
    }

    #[test]
    fn redirect_forms() {
        let a: ExtractedArticle =
            serde_json::from_str(r#"{"title": "Sun", "redirectTo": {"page": "Solen"}}"#).unwrap();
        let b: ExtractedArticle =
            serde_json::from_str(r#"{"title": "Sol", "redirect_to": "Solen"}"#).unwrap();
        assert_eq!(a.redirect(), Some("Solen"));
        assert_eq!(b.redirect(), Some("Solen"));
        assert!(a.text().is_none());
    }

    #[test]
    fn disambiguation_detection() {
        assert!(is_disambiguation("Mercury (Disambiguation)", "# Mercury\n\nA planet."));
        assert!(is_disambiguation("Mercury", "# Mercury\n\nMercury may refer to:\n\n* planet"));
        assert!(!is_disambiguation("Mercury", "# Mercury\n\nMercury is a planet."));
        assert!(!is_disambiguation("Mercury", ""));
    }
}
