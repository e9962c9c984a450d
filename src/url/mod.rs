//! URL handling for catalog links
//!
//! Listing entries carry relative hrefs; this module turns them into absolute
//! URLs and keeps follow-up requests on the configured catalog domains.

use url::Url;

/// Resolves a listing href against the page it was found on
///
/// Returns None when the link cannot be followed:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - hrefs that do not resolve to an HTTP(S) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use parts_crawler::url::resolve_link;
///
/// let base = Url::parse("https://example.com/catalogue/acme").unwrap();
/// let resolved = resolve_link("brakes", &base).unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/catalogue/brakes");
/// assert!(resolve_link("javascript:void(0)", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}

/// Extracts the lowercase host of a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks a host against one allowed-domain pattern
///
/// Both "example.com" and "*.example.com" accept the bare domain and any of
/// its subdomains, so "www.example.com" stays on-site for either form.
pub fn domain_matches(pattern: &str, domain: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() {
        return false;
    }
    domain == base || domain.ends_with(&format!(".{}", base))
}

/// Returns true if the URL may be requested under the allowed-domain list
///
/// An empty list disables offsite filtering.
pub fn is_allowed(url: &Url, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    match extract_domain(url) {
        Some(domain) => allowed_domains
            .iter()
            .any(|pattern| domain_matches(&pattern.to_lowercase(), &domain)),
        None => false,
    }
}
