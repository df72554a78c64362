//! URL pattern matching for `wait_for_url`.

use regex::Regex;

/// Match a page URL against a caller-supplied pattern.
///
/// `*` patterns are treated as globs, anything that compiles as a regex is a
/// regex, and everything else falls back to substring containment.
pub(crate) fn url_matches(pattern: &str, url: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }

    if pattern.contains('*') {
        let mut regex = String::from("^");
        for part in pattern.split('*') {
            regex.push_str(&regex::escape(part));
            regex.push_str(".*");
        }
        // Trailing ".*" from the final split part is harmless.
        if let Ok(glob) = Regex::new(&regex) {
            return glob.is_match(url);
        }
    }

    if let Ok(re) = Regex::new(pattern) {
        if re.is_match(url) {
            return true;
        }
    }

    url.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::url_matches;

    #[test]
    fn glob_patterns() {
        assert!(url_matches(
            "https://x.com/*/status/*",
            "https://x.com/someone/status/123"
        ));
        assert!(!url_matches(
            "https://x.com/*/status/*",
            "https://x.com/home"
        ));
    }

    #[test]
    fn substring_patterns() {
        assert!(url_matches("/compose", "https://x.com/compose/post"));
        assert!(!url_matches("/settings", "https://x.com/compose/post"));
    }

    #[test]
    fn empty_pattern_matches_anything() {
        assert!(url_matches("", "https://example.org"));
    }
}
