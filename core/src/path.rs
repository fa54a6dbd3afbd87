//! URL path construction.
//!
//! `resolve` joins URL pieces with exactly one slash at each seam.
//! `ResourcePath` assembles the relative path of a request, percent-encoding
//! caller-supplied identifiers while passing static literals through as-is.

use std::fmt;

/// Join `part` onto `base` with exactly one `/`.
///
/// Trailing slashes on `base` and leading slashes on `part` are dropped. An
/// empty `part` returns the trimmed `base`. No URL validation is done.
pub fn resolve(base: &str, part: &str) -> String {
    let base = base.trim_end_matches('/');
    let part = part.trim_start_matches('/');
    if part.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{part}")
    }
}

/// Percent-encode a single path segment.
///
/// Everything outside ASCII letters, digits and `-_.~` is escaped, `/`
/// included.
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Relative path of a request, rendered as `""` or `/seg/seg/...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a trusted constant segment verbatim.
    pub fn literal(mut self, segment: &'static str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a caller-supplied identifier, percent-encoded.
    pub fn identifier(mut self, name: &str) -> Self {
        self.segments.push(encode_segment(name));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_with_single_slash() {
        assert_eq!(resolve("http://x/", "/y"), "http://x/y");
        assert_eq!(resolve("http://x", "y"), "http://x/y");
        assert_eq!(resolve("http://x/", "y"), "http://x/y");
        assert_eq!(resolve("http://x", "/y"), "http://x/y");
        assert_eq!(resolve("http://x///", "///y"), "http://x/y");
    }

    #[test]
    fn resolve_empty_part_returns_trimmed_base() {
        assert_eq!(resolve("http://x/", ""), "http://x");
        assert_eq!(resolve("http://x", "/"), "http://x");
        assert_eq!(resolve("http://x//", "//"), "http://x");
    }

    #[test]
    fn resolve_is_idempotent() {
        let base = "http://example.com/api//";
        let once = resolve(base, "");
        assert_eq!(resolve(&once, ""), once);
        assert_eq!(once, "http://example.com/api");
    }

    #[test]
    fn resolve_sequential_matches_prejoined() {
        let base = "http://example.com/";
        let stepwise = resolve(&resolve(base, "/meta"), "/db/DC/sources");
        let prejoined = resolve(base, "meta/db/DC/sources");
        assert_eq!(stepwise, prejoined);
        assert_eq!(stepwise, "http://example.com/meta/db/DC/sources");
    }

    #[test]
    fn resolve_keeps_inner_slashes() {
        assert_eq!(resolve("http://x", "/a//b/"), "http://x/a//b/");
    }

    #[test]
    fn encode_escapes_spaces_and_reserved() {
        assert_eq!(encode_segment("source catalog"), "source%20catalog");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("q?x=1&y#z"), "q%3Fx%3D1%26y%23z");
        assert_eq!(encode_segment("100%"), "100%25");
    }

    #[test]
    fn encode_leaves_unreserved_untouched() {
        let safe = "AZaz09-_.~";
        assert_eq!(encode_segment(safe), safe);
    }

    #[test]
    fn encode_utf8_bytes() {
        assert_eq!(encode_segment("é"), "%C3%A9");
    }

    #[test]
    fn resource_path_renders_segments() {
        let path = ResourcePath::root()
            .literal("db")
            .identifier("DC")
            .identifier("source catalog")
            .literal("tables");
        assert_eq!(path.to_string(), "/db/DC/source%20catalog/tables");
        assert_eq!(path.segments().len(), 4);
    }

    #[test]
    fn resource_path_root_is_empty() {
        let path = ResourcePath::root();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn resource_path_keeps_empty_identifier() {
        let path = ResourcePath::root().literal("db").identifier("");
        assert_eq!(path.to_string(), "/db/");
    }
}
