use crate::config::SiteConfig;
use url::Url;

/// Punctuation that passes through canonicalization unescaped, in addition
/// to ASCII alphanumerics.
const SAFE_PUNCTUATION: &str = "[].:-_~/?#@!$&'()*=+,;%";

/// Rewrites raw paths and URLs into fully-qualified, percent-escaped URLs
/// on the configured host.
///
/// Canonical URLs are the identity keys for the work queues and the visited
/// set, so `canonicalize` is total: any input yields some canonical URL, and
/// feeding a canonical URL back through is a no-op.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    scheme: String,
    host: String,
}

impl Canonicalizer {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
        }
    }

    pub fn from_site(site: &SiteConfig) -> Self {
        Self::new(&site.scheme, &site.host)
    }

    /// The root URL of the configured host
    pub fn root(&self) -> Url {
        // The scheme and host are validated at config load, so this parse
        // cannot fail on any configuration that reached the crawler.
        Url::parse(&format!("{}://{}/", self.scheme, self.host))
            .expect("configured scheme and host form a valid URL")
    }

    /// Canonicalizes an absolute URL, a host-relative path, or a bare path
    /// fragment
    pub fn canonicalize(&self, raw: &str) -> Url {
        let absolute = self.absolutize(raw.trim());
        let escaped = escape(&absolute);
        Url::parse(&escaped).unwrap_or_else(|_| self.root())
    }

    fn absolutize(&self, raw: &str) -> String {
        if let Some(rest) = raw.strip_prefix("https://") {
            format!("{}://{}", self.scheme, rest)
        } else if let Some(rest) = raw.strip_prefix("http://") {
            format!("{}://{}", self.scheme, rest)
        } else if raw.starts_with(&self.host) {
            format!("{}://{}", self.scheme, raw)
        } else if raw.starts_with('/') {
            format!("{}://{}{}", self.scheme, self.host, raw)
        } else {
            format!("{}://{}/{}", self.scheme, self.host, raw)
        }
    }
}

/// Percent-escapes every character outside the safe set, byte by byte for
/// multi-byte characters
fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut buf = [0u8; 4];
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || SAFE_PUNCTUATION.contains(ch) {
            out.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon() -> Canonicalizer {
        Canonicalizer::new("https", "tvtropes.org")
    }

    #[test]
    fn test_root_relative_path() {
        let url = canon().canonicalize("/pmwiki/pmwiki.php/Main/HomePage");
        assert_eq!(
            url.as_str(),
            "https://tvtropes.org/pmwiki/pmwiki.php/Main/HomePage"
        );
    }

    #[test]
    fn test_bare_fragment() {
        let url = canon().canonicalize("pmwiki/articlecount.php?page=1");
        assert_eq!(
            url.as_str(),
            "https://tvtropes.org/pmwiki/articlecount.php?page=1"
        );
    }

    #[test]
    fn test_insecure_scheme_rewritten() {
        let url = canon().canonicalize("http://tvtropes.org/pmwiki/pmwiki.php/Main/HomePage");
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_host_prefixed_input() {
        let url = canon().canonicalize("tvtropes.org/pmwiki/pmwiki.php/Main/HomePage");
        assert_eq!(
            url.as_str(),
            "https://tvtropes.org/pmwiki/pmwiki.php/Main/HomePage"
        );
    }

    #[test]
    fn test_spaces_escaped() {
        let url = canon().canonicalize("/pmwiki/pmwiki.php/Main/Home Page");
        assert!(url.as_str().ends_with("/Main/Home%20Page"));
    }

    #[test]
    fn test_multibyte_escaped_byte_by_byte() {
        let url = canon().canonicalize("/pmwiki/pmwiki.php/Main/Caf\u{e9}");
        assert!(url.as_str().ends_with("/Main/Caf%C3%A9"));
    }

    #[test]
    fn test_idempotent() {
        let c = canon();
        let inputs = [
            "/pmwiki/pmwiki.php/Main/Home Page",
            "http://tvtropes.org/pmwiki/namespace_index.php?ns=Main",
            "pmwiki/pmwiki.php/Main/Caf\u{e9}",
            "/pmwiki/pmwiki.php/Main/Don'tTryThisAtHome",
        ];
        for input in inputs {
            let once = c.canonicalize(input);
            let twice = c.canonicalize(once.as_str());
            assert_eq!(once, twice, "canonicalize not idempotent for {input}");
        }
    }

    #[test]
    fn test_output_restricted_to_safe_set() {
        let url = canon().canonicalize("/pmwiki/pmwiki.php/Main/\u{3042} b|c");
        for ch in url.as_str().chars() {
            assert!(
                ch.is_ascii_alphanumeric() || SAFE_PUNCTUATION.contains(ch),
                "unexpected character {ch:?} in {url}"
            );
        }
    }

    #[test]
    fn test_scheme_and_host_always_present() {
        for input in ["", "???", "/x", "no-slash"] {
            let url = canon().canonicalize(input);
            assert_eq!(url.scheme(), "https");
            assert_eq!(url.host_str(), Some("tvtropes.org"));
        }
    }

    #[test]
    fn test_http_scheme_config_for_mock_servers() {
        let c = Canonicalizer::new("http", "127.0.0.1:9999");
        let url = c.canonicalize("/pmwiki/pmwiki.php/Main/Foo");
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/pmwiki/pmwiki.php/Main/Foo");
    }
}
