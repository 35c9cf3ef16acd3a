use url::Url;

/// Convert a URL to a sanitized filename stem
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and a leading www.
    let mut name = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    name = name.strip_prefix("www.").unwrap_or(name);
    let name = name.trim_end_matches('/');

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Limit filename length
    sanitized.chars().take(100).collect()
}

/// Host of `url` without a leading `www.`, or the input itself when unparseable
pub fn site_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(crate::filter::normalize_host))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("https://www.example.com/a/b?x=1"), "example.com_a_b_x_1");
        assert_eq!(sanitize_filename("http://example.com/"), "example.com");
        assert_eq!(sanitize_filename(&format!("https://a.com/{}", "x".repeat(200))).len(), 100);
    }

    #[test]
    fn test_site_domain() {
        assert_eq!(site_domain("https://WWW.Example.com/path"), "example.com");
        assert_eq!(site_domain("not a url"), "not a url");
    }
}
