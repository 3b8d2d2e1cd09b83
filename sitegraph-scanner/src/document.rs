use scraper::{Html, Selector};

/// An `<a>` element as the extractor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// The parts of a parsed HTML page the crawler cares about.
///
/// `scraper::Html` is not `Send`, so the document is reduced to owned data
/// right after parsing.
#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    pub anchors: Vec<Anchor>,
    pub image_count: usize,
}

impl PageDocument {
    /// Parse an HTML body. Malformed markup is tolerated by the parser; a body
    /// without anchors simply yields none.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let anchor_selector = Selector::parse("a").unwrap();
        let anchors = document
            .select(&anchor_selector)
            .map(|element| Anchor {
                text: element.text().collect::<String>().trim().to_string(),
                href: element.value().attr("href").unwrap_or_default().to_string(),
            })
            .collect();

        let image_selector = Selector::parse("img").unwrap();
        let image_count = document.select(&image_selector).count();

        Self {
            anchors,
            image_count,
        }
    }
}
