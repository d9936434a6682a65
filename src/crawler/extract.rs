//! HTML extraction seam
//!
//! Everything the engine knows about page markup lives here, behind a few
//! narrow functions, so the rest of the pipeline is untouched by markup
//! changes. A missing element degrades to `None`/empty rather than failing
//! the work item.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Content region of the listing page holding the namespace roster
const LISTING_REGION: &str = "#wikimiddle";

/// Pagination marker on namespace-index pages
const PAGINATION_BOX: &str = ".pagination-box";

/// Attribute on the pagination marker carrying the page count
const TOTAL_PAGES_ATTR: &str = "data-total-pages";

/// Anchor class marking an outbound article link
const ARTICLE_LINK: &str = "a.twikilink";

/// Article heading element
const TITLE_HEADING: &str = ".entry-title";

/// "also known as" hint shown on redirect targets
const AKA_HINT: &str = ".aka-title";

fn namespace_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // roster entries look like "1234: NamespaceName"
    PATTERN.get_or_init(|| Regex::new(r"\d+:\s*(\w+)").expect("namespace token pattern compiles"))
}

/// Extracts namespace name tokens from a listing page
pub fn namespace_names(html: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(LISTING_REGION) else {
        return Vec::new();
    };
    let Some(region) = html.select(&selector).next() else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for text in region.text() {
        for captures in namespace_token_pattern().captures_iter(text) {
            if let Some(name) = captures.get(1) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

/// Reads the total page count from a namespace-index page, when paginated
pub fn pagination_total(html: &Html) -> Option<u32> {
    let selector = Selector::parse(PAGINATION_BOX).ok()?;
    html.select(&selector)
        .next()?
        .value()
        .attr(TOTAL_PAGES_ATTR)?
        .parse()
        .ok()
}

/// Collects the href of every outbound article link on the page
pub fn article_links(html: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(ARTICLE_LINK) else {
        return Vec::new();
    };
    html.select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Extracts the article title from the heading element
///
/// The heading's first text node is the namespace marker; the title is the
/// text that follows it.
pub fn heading_title(html: &Html) -> Option<String> {
    let selector = Selector::parse(TITLE_HEADING).ok()?;
    let heading = html.select(&selector).next()?;
    last_direct_text(&heading)
}

/// Extracts the "also known as" title hint present on redirect targets
pub fn aka_title(html: &Html) -> Option<String> {
    let selector = Selector::parse(AKA_HINT).ok()?;
    let hint = html.select(&selector).next()?;
    let text = hint.text().collect::<String>();
    let text = text.trim();
    let title = text.strip_prefix("aka: ").unwrap_or(text).trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn last_direct_text(element: &ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.text.trim())
        .filter(|text| !text.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_names_from_listing_region() {
        let html = Html::parse_document(
            r#"<html><body><div id="wikimiddle">
                <div>ignored</div>
                <div>14230: Main 893: Anime 51: WesternAnimation</div>
            </div></body></html>"#,
        );
        assert_eq!(
            namespace_names(&html),
            vec!["Main", "Anime", "WesternAnimation"]
        );
    }

    #[test]
    fn test_namespace_names_outside_region_ignored() {
        let html = Html::parse_document(
            r#"<html><body>
                <div>99: NotCounted</div>
                <div id="wikimiddle">12: Main</div>
            </body></html>"#,
        );
        assert_eq!(namespace_names(&html), vec!["Main"]);
    }

    #[test]
    fn test_namespace_names_missing_region() {
        let html = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert!(namespace_names(&html).is_empty());
    }

    #[test]
    fn test_pagination_total() {
        let html = Html::parse_document(
            r#"<html><body><div class="pagination-box" data-total-pages="17"></div></body></html>"#,
        );
        assert_eq!(pagination_total(&html), Some(17));
    }

    #[test]
    fn test_pagination_absent() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(pagination_total(&html), None);
    }

    #[test]
    fn test_pagination_bad_attribute() {
        let html = Html::parse_document(
            r#"<html><body><div class="pagination-box" data-total-pages="lots"></div></body></html>"#,
        );
        assert_eq!(pagination_total(&html), None);
    }

    #[test]
    fn test_article_links() {
        let html = Html::parse_document(
            r#"<html><body>
                <a class="twikilink" href="/pmwiki/pmwiki.php/Main/Foo">Foo</a>
                <a href="/pmwiki/pmwiki.php/Main/Plain">not an article link</a>
                <a class="twikilink" href="/pmwiki/pmwiki.php/Anime/Bar">Bar</a>
            </body></html>"#,
        );
        assert_eq!(
            article_links(&html),
            vec![
                "/pmwiki/pmwiki.php/Main/Foo".to_string(),
                "/pmwiki/pmwiki.php/Anime/Bar".to_string(),
            ]
        );
    }

    #[test]
    fn test_heading_title_skips_namespace_marker() {
        let html = Html::parse_document(
            r#"<html><body><h1 class="entry-title">
                <strong>Main /</strong>
                Home Page
            </h1></body></html>"#,
        );
        assert_eq!(heading_title(&html), Some("Home Page".to_string()));
    }

    #[test]
    fn test_heading_title_missing() {
        let html = Html::parse_document("<html><body><h1>untagged</h1></body></html>");
        assert_eq!(heading_title(&html), None);
    }

    #[test]
    fn test_aka_title_strips_prefix() {
        let html = Html::parse_document(
            r#"<html><body><div class="aka-title">aka: The Old Name</div></body></html>"#,
        );
        assert_eq!(aka_title(&html), Some("The Old Name".to_string()));
    }

    #[test]
    fn test_aka_title_without_prefix() {
        let html = Html::parse_document(
            r#"<html><body><div class="aka-title">The Old Name</div></body></html>"#,
        );
        assert_eq!(aka_title(&html), Some("The Old Name".to_string()));
    }

    #[test]
    fn test_aka_title_absent() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(aka_title(&html), None);
    }
}
