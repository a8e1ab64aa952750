//! Syntactic URL checks performed before any network attempt.

/// True when `url` parses, uses http(s), and names a host.
pub fn is_well_formed(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().map_or(false, |h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_well_formed("http://example.com/a.jpg"));
        assert!(is_well_formed("https://example.com:8443/p/a.png?x=1"));
        assert!(is_well_formed("http://127.0.0.1:9000/x"));
    }

    #[test]
    fn rejects_malformed() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("example.com/a.jpg"));
        assert!(!is_well_formed("ftp://example.com/a.jpg"));
        assert!(!is_well_formed("http://"));
        assert!(!is_well_formed("http:// spaced.com/a.jpg"));
        assert!(!is_well_formed("file:///etc/passwd"));
    }
}
