//! Turning raw `href` values into fetchable URLs and dedup keys.
//!
//! Two strings come out of every anchor: the absolute URL used to fetch the
//! page, and the canonical key the registry identifies it by. Same-host pages
//! are keyed by their host-relative path so that `http://example.com/about`
//! and `/about` land on the same record.

use crate::error::{Result, ScanError};
use std::path::Path;
use url::Url;

/// Is a given href something the crawler can fetch?
pub fn is_crawlable(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    let stop_prefixes = ["javascript:", "mailto:", "tel:", "fax:"];
    if stop_prefixes.iter().any(|p| lower.starts_with(p)) {
        return false;
    }

    !lower.ends_with(".pdf")
}

/// Strip a trailing `#fragment`.
pub fn normalize_link(href: &str) -> String {
    match href.find('#') {
        Some(idx) => href[..idx].to_string(),
        None => href.to_string(),
    }
}

/// Collapse `..` segments in the path part of `url`.
///
/// Each `..` removes itself and the segment before it. A `..` that would
/// climb above the first segment (or above the root `/`) is dropped on its
/// own, so `/a/../../c` becomes `/c`. The `scheme://authority` prefix of an
/// absolute URL is never touched.
pub fn remove_dots_from_path(url: &str) -> String {
    let (prefix, path) = split_authority(url);
    if !path.split('/').any(|segment| segment == "..") {
        return url.to_string();
    }

    let mut parts: Vec<&str> = path.split('/').collect();
    while let Some(k) = parts.iter().position(|segment| *segment == "..") {
        if k == 0 || (k == 1 && parts[0].is_empty()) {
            parts.remove(k);
        } else {
            parts.drain(k - 1..=k);
        }
    }

    let mut joined = parts.join("/");
    if path.starts_with('/') && !joined.starts_with('/') {
        joined.insert(0, '/');
    }

    format!("{}{}", prefix, joined)
}

/// Is `absolute_url` on a different host than `base_url`?
pub fn is_external(absolute_url: &str, base_url: &str) -> bool {
    let trimmed = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .unwrap_or(base_url);
    let host = trimmed.split('/').next().unwrap_or("");

    for scheme in ["http://", "https://"] {
        let Some(rest) = strip_prefix_ignore_case(absolute_url, scheme) else {
            continue;
        };
        if let Some(after) = strip_prefix_ignore_case(rest, host)
            && (after.is_empty() || after.starts_with(['/', '?', '#', ':']))
        {
            return false;
        }
    }

    true
}

/// `scheme://host[:port]` of a network URL, `None` for anything else.
pub fn scheme_and_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

fn has_http_scheme(href: &str) -> bool {
    strip_prefix_ignore_case(href, "http://").is_some()
        || strip_prefix_ignore_case(href, "https://").is_some()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

fn split_authority(url: &str) -> (&str, &str) {
    let authority_start = if url.starts_with("//") {
        Some(2)
    } else {
        url.find("://")
            .filter(|idx| !url[..*idx].contains('/'))
            .map(|idx| idx + 3)
    };

    match authority_start {
        Some(start) => match url[start..].find('/') {
            Some(slash) => url.split_at(start + slash),
            None => (url, ""),
        },
        None => ("", url),
    }
}

/// The path part of a key or URL, without query or fragment.
fn source_path(source: &str) -> String {
    if let Ok(parsed) = Url::parse(source)
        && parsed.has_host()
    {
        return parsed.path().to_string();
    }

    let end = source.find(['?', '#']).unwrap_or(source.len());
    source[..end].to_string()
}

/// Append `href` to the directory of `path`. A last segment with a file
/// extension is treated as a file name and dropped first; a leading dot
/// (`.well-known`, `.cache`) is not an extension.
fn join_directory(path: &str, href: &str) -> String {
    let basename = path.rsplit('/').next().unwrap_or("");
    let dir = match basename.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < basename.len() => &path[..path.len() - basename.len()],
        _ => path,
    };

    format!("{}/{}", dir.trim_end_matches('/'), href)
}

/// URL resolution bound to one crawl's base URL.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base_url: String,
    base: Option<Url>,
    /// Other keys the root page is reachable under.
    root_aliases: Vec<String>,
}

impl UrlResolver {
    /// Resolver for a network crawl. The base must be an absolute
    /// `http`/`https` URL with a host.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim();
        let base = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                base_url,
                base.scheme()
            )));
        }
        if !base.has_host() {
            return Err(ScanError::InvalidUrl(format!("{}: missing host", base_url)));
        }

        // `http://example.com` and a `/` link are the same page.
        let mut root_path = base.path().to_string();
        if let Some(query) = base.query() {
            root_path.push('?');
            root_path.push_str(query);
        }

        Ok(Self {
            base_url: base_url.to_string(),
            base: Some(base),
            root_aliases: vec![remove_dots_from_path(&root_path)],
        })
    }

    /// Resolver for a crawl over HTML files on disk.
    pub fn local(base_path: &str) -> Result<Self> {
        let base_path = base_path.trim();
        if base_path.is_empty() {
            return Err(ScanError::InvalidUrl("empty base path".to_string()));
        }

        let absolute = std::path::absolute(base_path)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_path, e)))?;

        let base_url = absolute.to_string_lossy().into_owned();
        let root_aliases = if absolute.is_dir() {
            vec![remove_dots_from_path(&format!(
                "{}/index.html",
                base_url.trim_end_matches('/')
            ))]
        } else {
            Vec::new()
        };

        Ok(Self {
            base_url,
            base: None,
            root_aliases,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_local(&self) -> bool {
        self.base.is_none()
    }

    /// Registry key of the crawl root.
    pub fn root_key(&self) -> String {
        remove_dots_from_path(&self.base_url)
    }

    fn base_scheme(&self) -> Option<&str> {
        self.base.as_ref().map(|b| b.scheme())
    }

    fn base_origin(&self) -> Option<String> {
        scheme_and_host(&self.base_url)
    }

    /// Absolute, fetchable form of `href` found on the page at `source_url`.
    pub fn resolve_absolute(&self, href: &str, source_url: &str) -> String {
        let href = href.trim();

        let resolved = if has_http_scheme(href) {
            href.to_string()
        } else if href.starts_with('#') {
            format!("{}{}", self.base_url.trim_end_matches('/'), href)
        } else if !is_crawlable(href) {
            href.to_string()
        } else if href.starts_with("//") {
            format!("{}:{}", self.base_scheme().unwrap_or("http"), href)
        } else if let Some(origin) = self.base_origin() {
            if href.starts_with('/') {
                format!("{}{}", origin, href)
            } else {
                format!("{}{}", origin, join_directory(&source_path(source_url), href))
            }
        } else {
            self.resolve_local(href, source_url)
        };

        remove_dots_from_path(&resolved)
    }

    fn resolve_local(&self, href: &str, parent: &str) -> String {
        if parent.is_empty() {
            return href.to_string();
        }

        // A directory page is served through its index, so its links are
        // relative to the directory itself.
        let dir = if parent.ends_with('/') || Path::new(parent).is_dir() {
            parent.to_string()
        } else {
            Path::new(parent)
                .parent()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        if dir.is_empty() || href.starts_with(&dir) {
            href.to_string()
        } else {
            format!("{}/{}", dir.trim_end_matches('/'), href.trim_start_matches('/'))
        }
    }

    /// Dedup identity of `href` discovered on the page identified by `source`
    /// (a registry key or an absolute URL).
    pub fn canonical_key(&self, href: &str, source: &str) -> String {
        let href = href.trim();

        let key = if href == source || !is_crawlable(href) {
            href.to_string()
        } else {
            let href = match href.strip_prefix("//") {
                Some(rest) if !self.is_local() => {
                    format!("{}://{}", self.base_scheme().unwrap_or("http"), rest)
                }
                _ => href.to_string(),
            };

            let scheme_host = scheme_and_host(source).or_else(|| self.base_origin());
            let same_host_path = scheme_host.as_deref().and_then(|sh| {
                strip_prefix_ignore_case(&href, sh)
                    .filter(|rest| rest.starts_with(['/', '?']))
                    .map(str::to_string)
            });

            if let Some(path) = same_host_path {
                path
            } else if has_http_scheme(&href) {
                href
            } else if self.is_local() {
                self.resolve_local(&href, &source_path(source))
            } else if !href.starts_with('/') {
                join_directory(&source_path(source), &href)
            } else {
                href
            }
        };

        let key = remove_dots_from_path(&key);
        if self.root_aliases.contains(&key) {
            return self.root_key();
        }
        key
    }

    /// Is `absolute_url` outside the crawled site?
    pub fn is_external(&self, absolute_url: &str) -> bool {
        if self.is_local() {
            return has_http_scheme(absolute_url);
        }
        is_external(absolute_url, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> UrlResolver {
        UrlResolver::new("http://example.com").unwrap()
    }

    #[test]
    fn test_remove_dots_simple() {
        assert_eq!(remove_dots_from_path("/a/b/../c"), "/a/c");
    }

    #[test]
    fn test_remove_dots_above_root_is_clamped() {
        assert_eq!(remove_dots_from_path("/a/../../c"), "/c");
        assert_eq!(remove_dots_from_path("../x"), "x");
        assert_eq!(remove_dots_from_path("/.."), "/");
    }

    #[test]
    fn test_remove_dots_keeps_authority() {
        assert_eq!(
            remove_dots_from_path("http://example.com/../x"),
            "http://example.com/x"
        );
        assert_eq!(
            remove_dots_from_path("http://example.com/a/b/../../c"),
            "http://example.com/c"
        );
    }

    #[test]
    fn test_remove_dots_noop() {
        assert_eq!(remove_dots_from_path("/a/b.html"), "/a/b.html");
        assert_eq!(remove_dots_from_path("mailto:a@b.com"), "mailto:a@b.com");
    }

    #[test]
    fn test_crawlable() {
        for href in ["javascript:void(0)", "#section", "mailto:a@b.com", "tel:123", "fax:123", "doc.pdf", ""] {
            assert!(!is_crawlable(href), "{} should not be crawlable", href);
        }
        assert!(!is_crawlable("JavaScript:alert(1)"));
        assert!(!is_crawlable("/files/REPORT.PDF"));
        assert!(is_crawlable("/about"));
        assert!(is_crawlable("http://x.com/y"));
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(normalize_link("/a#top"), "/a");
        assert_eq!(normalize_link("#top"), "");
        assert_eq!(normalize_link("/a"), "/a");
    }

    #[test]
    fn test_is_external() {
        assert!(!is_external("http://example.com/x", "http://example.com"));
        assert!(!is_external("https://example.com", "http://example.com/"));
        assert!(is_external("http://other.com/x", "http://example.com"));
        assert!(is_external("http://example.com.evil.net/", "http://example.com"));
        assert!(is_external("mailto:a@example.com", "http://example.com"));
    }

    #[test]
    fn test_scheme_and_host_keeps_port() {
        assert_eq!(
            scheme_and_host("http://127.0.0.1:8080/a").as_deref(),
            Some("http://127.0.0.1:8080")
        );
        assert_eq!(
            scheme_and_host("https://example.com/a").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(scheme_and_host("/a/b"), None);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(UrlResolver::new("not a url"), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(UrlResolver::new("ftp://example.com"), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(UrlResolver::local("   "), Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonical_key_collapses_same_host() {
        let r = resolver();
        let base = r.base_url().to_string();
        assert_eq!(r.canonical_key("http://example.com/about", &base), "/about");
        assert_eq!(r.canonical_key("/about", &base), "/about");
        // From a host-relative source key the base host is used.
        assert_eq!(r.canonical_key("http://example.com/about", "/blog/post"), "/about");
    }

    #[test]
    fn test_canonical_key_self_reference() {
        let r = resolver();
        assert_eq!(r.canonical_key("http://example.com", "http://example.com"), "http://example.com");
    }

    #[test]
    fn test_canonical_key_other_host_unchanged() {
        let r = resolver();
        assert_eq!(
            r.canonical_key("http://external.com/about", "http://example.com"),
            "http://external.com/about"
        );
    }

    #[test]
    fn test_canonical_key_not_crawlable_is_raw() {
        let r = resolver();
        assert_eq!(r.canonical_key("mailto:a@b.com", "/"), "mailto:a@b.com");
        assert_eq!(r.canonical_key("tel:123", "/"), "tel:123");
    }

    #[test]
    fn test_canonical_key_relative_to_directory() {
        let r = resolver();
        assert_eq!(r.canonical_key("c.html", "/a/b.html"), "/a/c.html");
        assert_eq!(r.canonical_key("c", "/a/b"), "/a/b/c");
        assert_eq!(r.canonical_key("../c.html", "/a/b/d.html"), "/a/c.html");
        assert_eq!(r.canonical_key("about", "http://example.com"), "/about");
    }

    #[test]
    fn test_canonical_key_scheme_relative() {
        let r = resolver();
        assert_eq!(r.canonical_key("//example.com/x", "/"), "/x");
        assert_eq!(r.canonical_key("//cdn.net/x", "/"), "http://cdn.net/x");
    }

    #[test]
    fn test_resolve_absolute_variants() {
        let r = resolver();
        let src = "http://example.com/docs/index.html";
        assert_eq!(r.resolve_absolute("https://other.com/a", src), "https://other.com/a");
        assert_eq!(r.resolve_absolute("#top", src), "http://example.com#top");
        assert_eq!(r.resolve_absolute("mailto:a@b.com", src), "mailto:a@b.com");
        assert_eq!(r.resolve_absolute("//cdn.net/lib.js", src), "http://cdn.net/lib.js");
        assert_eq!(r.resolve_absolute("/about", src), "http://example.com/about");
        assert_eq!(r.resolve_absolute("intro.html", src), "http://example.com/docs/intro.html");
        assert_eq!(r.resolve_absolute("../up.html", src), "http://example.com/up.html");
    }

    #[test]
    fn test_resolve_absolute_keeps_port() {
        let r = UrlResolver::new("http://127.0.0.1:4000").unwrap();
        assert_eq!(
            r.resolve_absolute("/a", "http://127.0.0.1:4000"),
            "http://127.0.0.1:4000/a"
        );
        assert_eq!(r.canonical_key("http://127.0.0.1:4000/a", "/"), "/a");
    }

    #[test]
    fn test_resolve_local() {
        let r = UrlResolver::local("/srv/site/index.html").unwrap();
        assert!(r.is_local());
        assert_eq!(
            r.resolve_absolute("about.html", "/srv/site/index.html"),
            "/srv/site/about.html"
        );
        assert_eq!(
            r.resolve_absolute("/srv/site/blog.html", "/srv/site/index.html"),
            "/srv/site/blog.html"
        );
        assert_eq!(
            r.resolve_absolute("../other/x.html", "/srv/site/index.html"),
            "/srv/other/x.html"
        );
        assert!(!r.is_external("/srv/site/about.html"));
        assert!(r.is_external("http://example.com/"));
    }

    #[test]
    fn test_canonical_key_local() {
        let r = UrlResolver::local("/srv/site/index.html").unwrap();
        assert_eq!(
            r.canonical_key("about.html", "/srv/site/index.html"),
            "/srv/site/about.html"
        );
    }

    #[test]
    fn test_root_path_links_share_the_root_key() {
        let r = resolver();
        let root = r.root_key();
        assert_eq!(root, "http://example.com");
        assert_eq!(r.canonical_key("/", &root), root);
        assert_eq!(r.canonical_key("/", "/a/b.html"), root);
        assert_eq!(r.canonical_key("http://example.com/", "/a"), root);
        assert_eq!(r.canonical_key("http://example.com", "/a"), root);
        assert_eq!(r.canonical_key("//example.com/", "/a"), root);
        assert_eq!(r.canonical_key("/index.html", &root), "/index.html");
    }

    #[test]
    fn test_root_alias_for_base_with_path() {
        let r = UrlResolver::new("http://example.com/docs/").unwrap();
        assert_eq!(r.canonical_key("/docs/", "/docs/a.html"), "http://example.com/docs/");
        assert_eq!(r.canonical_key("/", "/docs/a.html"), "/");
    }

    #[test]
    fn test_dot_directory_is_not_a_file() {
        let r = resolver();
        assert_eq!(r.canonical_key("security.txt", "/.well-known"), "/.well-known/security.txt");
        assert_eq!(r.canonical_key("b.html", "/a/.hidden.html"), "/a/b.html");
    }

    #[test]
    fn test_local_directory_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap().to_string();
        let r = UrlResolver::local(&base).unwrap();
        let root = r.root_key();

        let expected = format!("{}/about.html", root);
        assert_eq!(r.resolve_absolute("about.html", &root), expected);
        assert_eq!(r.canonical_key("about.html", &root), expected);
        assert_eq!(r.canonical_key("index.html", &root), root);
    }
}
