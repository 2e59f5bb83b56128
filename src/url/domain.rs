use url::Url;

/// Extracts the domain from a URL
///
/// Retrieves the host portion of a URL and converts it to lowercase. Returns
/// None for URLs with no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polwatch::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.GOV/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.gov".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.gov/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.gov".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://news.example.gov/post").unwrap();
        assert_eq!(extract_domain(&url), Some("news.example.gov".to_string()));
    }

    #[test]
    fn test_extract_lowercases_host() {
        let url = Url::parse("https://Example.GOV/post").unwrap();
        assert_eq!(extract_domain(&url), Some("example.gov".to_string()));
    }

}
