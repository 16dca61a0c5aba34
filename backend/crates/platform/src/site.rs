//! Request site detection
//!
//! Links embedded in emails (activation, password reset) point back at the
//! host the client talked to. This module derives that host and scheme from
//! request headers. Hosts outside the allow-list resolve to the configured
//! default domain, so a client cannot steer links elsewhere.

use axum::http::{HeaderMap, header};

/// Scheme + host a request was addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSite {
    /// `http` or `https`
    pub protocol: String,
    /// Host with optional port, e.g. `localhost:8000`
    pub domain: String,
}

/// Which request headers may name the site
#[derive(Debug, Clone, Copy)]
pub struct SitePolicy<'a> {
    /// Accepted hosts: exact names, `.example.com` for a domain and its
    /// subdomains, or `*` for any host
    pub allowed_hosts: &'a [String],
    /// Honor `X-Forwarded-Host` / `X-Forwarded-Proto` (behind a trusted proxy)
    pub trust_forwarded_headers: bool,
    /// Domain used when the request names no acceptable host
    pub default_domain: &'a str,
    /// Scheme used unless a trusted proxy header says otherwise
    pub default_protocol: &'a str,
}

impl RequestSite {
    pub fn new(protocol: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            domain: domain.into(),
        }
    }

    /// Derive the site from request headers
    ///
    /// ## Arguments
    /// * `headers` - HTTP request headers
    /// * `policy` - Allowed hosts, proxy trust and fallbacks
    pub fn from_headers(headers: &HeaderMap, policy: &SitePolicy<'_>) -> Self {
        let forwarded = |name: &str| {
            policy
                .trust_forwarded_headers
                .then(|| first_value(headers, name))
                .flatten()
        };

        let requested = forwarded("x-forwarded-host")
            .or_else(|| first_value(headers, header::HOST.as_str()));

        let domain = match requested {
            Some(host) if is_valid_host(host) && is_allowed(host, policy.allowed_hosts) => host,
            Some(host) => {
                tracing::warn!(host = %host, "Host not allowed, using default domain");
                policy.default_domain
            }
            None => policy.default_domain,
        }
        .to_string();

        let protocol = match forwarded("x-forwarded-proto") {
            Some(proto) if proto.eq_ignore_ascii_case("https") => "https".to_string(),
            Some(proto) if proto.eq_ignore_ascii_case("http") => "http".to_string(),
            _ => policy.default_protocol.to_string(),
        };

        Self { protocol, domain }
    }
}

/// First comma-separated entry of a header, trimmed
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Host header sanity check: `host[:port]`, no userinfo, path or whitespace
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 255
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}

/// `host[:port]` -> `host`, keeping bracketed IPv6 literals whole
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

fn is_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    let name = strip_port(host).trim_end_matches('.').to_ascii_lowercase();

    allowed_hosts.iter().any(|pattern| {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(suffix) => name == suffix || name.ends_with(&pattern),
            None => name == pattern,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn policy(allowed_hosts: &[String], trust_forwarded_headers: bool) -> SitePolicy<'_> {
        SitePolicy {
            allowed_hosts,
            trust_forwarded_headers,
            default_domain: "localhost:8000",
            default_protocol: "http",
        }
    }

    #[test]
    fn test_host_header() {
        let allowed = hosts(&["accounts.example.com"]);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("accounts.example.com"));

        let site = RequestSite::from_headers(&headers, &policy(&allowed, false));
        assert_eq!(site, RequestSite::new("http", "accounts.example.com"));
    }

    #[test]
    fn test_forwarded_headers_ignored_by_default() {
        let allowed = hosts(&["*"]);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.internal:8000"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("evil.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));

        let site = RequestSite::from_headers(&headers, &policy(&allowed, false));
        assert_eq!(site, RequestSite::new("http", "api.internal:8000"));
    }

    #[test]
    fn test_trusted_forwarded_headers_win() {
        let allowed = hosts(&[".example.com"]);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("10.0.0.5:8000"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("example.com, proxy.internal"),
        );
        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS"));

        let site = RequestSite::from_headers(&headers, &policy(&allowed, true));
        assert_eq!(site, RequestSite::new("https", "example.com"));
    }

    #[test]
    fn test_disallowed_host_falls_back() {
        let allowed = hosts(&["accounts.example.com"]);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("evil.example"));

        let site = RequestSite::from_headers(&headers, &policy(&allowed, false));
        assert_eq!(site.domain, "localhost:8000");
    }

    #[test]
    fn test_fallback_without_host() {
        let headers = HeaderMap::new();
        let site = RequestSite::from_headers(&headers, &policy(&[], false));
        assert_eq!(site, RequestSite::new("http", "localhost:8000"));
    }

    #[test]
    fn test_invalid_host_falls_back() {
        let allowed = hosts(&["*"]);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("evil.com/path"));
        let site = RequestSite::from_headers(&headers, &policy(&allowed, false));
        assert_eq!(site.domain, "localhost:8000");
    }

    #[test]
    fn test_allowed_host_patterns() {
        let allowed = hosts(&["localhost", ".example.com", "[::1]"]);
        assert!(is_allowed("localhost:8000", &allowed));
        assert!(is_allowed("LOCALHOST", &allowed));
        assert!(is_allowed("example.com", &allowed));
        assert!(is_allowed("api.example.com:443", &allowed));
        assert!(is_allowed("[::1]:8000", &allowed));
        assert!(!is_allowed("badexample.com", &allowed));
        assert!(!is_allowed("example.com.evil", &allowed));
        assert!(!is_allowed("127.0.0.1", &allowed));
    }
}
