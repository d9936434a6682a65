use std::fmt;
use url::Url;

/// Path prefix shared by every article URL on the wiki
pub const ARTICLE_PATH_PREFIX: &str = "/pmwiki/pmwiki.php";

/// Natural key of one wiki article: its namespace and page id as they
/// appear in the canonical URL path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleRef {
    pub namespace: String,
    pub id: String,
}

impl ArticleRef {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    /// The canonical article path for this identity
    pub fn path(&self) -> String {
        format!("{}/{}/{}", ARTICLE_PATH_PREFIX, self.namespace, self.id)
    }
}

impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

/// Derives the article identity from a canonical URL
///
/// Article paths have the shape `/pmwiki/pmwiki.php/<namespace>/<id>`; the
/// segments are taken positionally, as escaped, and missing segments come
/// back empty rather than failing the caller.
pub fn article_identity(url: &Url) -> ArticleRef {
    let mut segments = url.path().split('/');
    let namespace = segments.nth(3).unwrap_or("").to_string();
    let id = segments.next().unwrap_or("").to_string();
    ArticleRef { namespace, id }
}

/// Path of one paginated listing-index page
pub fn listing_path(page: u32) -> String {
    format!("/pmwiki/articlecount.php?page={}", page)
}

/// Path of the index page for one namespace
pub fn namespace_index_path(namespace: &str) -> String {
    format!("/pmwiki/namespace_index.php?ns={}", namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_article_url() {
        let url = Url::parse("https://tvtropes.org/pmwiki/pmwiki.php/Main/HomePage").unwrap();
        let article = article_identity(&url);
        assert_eq!(article.namespace, "Main");
        assert_eq!(article.id, "HomePage");
    }

    #[test]
    fn test_identity_keeps_escaping() {
        let url = Url::parse("https://tvtropes.org/pmwiki/pmwiki.php/Main/Caf%C3%A9").unwrap();
        let article = article_identity(&url);
        assert_eq!(article.id, "Caf%C3%A9");
    }

    #[test]
    fn test_identity_from_short_path_is_empty() {
        let url = Url::parse("https://tvtropes.org/pmwiki/articlecount.php").unwrap();
        let article = article_identity(&url);
        assert_eq!(article.namespace, "");
        assert_eq!(article.id, "");
    }

    #[test]
    fn test_path_round_trip() {
        let article = ArticleRef::new("Main", "HomePage");
        assert_eq!(article.path(), "/pmwiki/pmwiki.php/Main/HomePage");

        let url = Url::parse(&format!("https://tvtropes.org{}", article.path())).unwrap();
        assert_eq!(article_identity(&url), article);
    }

    #[test]
    fn test_listing_and_namespace_paths() {
        assert_eq!(listing_path(3), "/pmwiki/articlecount.php?page=3");
        assert_eq!(
            namespace_index_path("Anime"),
            "/pmwiki/namespace_index.php?ns=Anime"
        );
    }
}
