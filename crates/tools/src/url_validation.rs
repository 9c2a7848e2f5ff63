//! URL Validation for SSRF Prevention
//!
//! Checks applied to user- or model-provided URLs before any network access.

use std::net::IpAddr;

/// Check if an IP address is in a private/reserved range.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_loopback()          // 127.0.0.0/8
                || ipv4.is_private()     // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
                || ipv4.is_link_local()  // 169.254.0.0/16
                || ipv4.is_unspecified() // 0.0.0.0
                || ipv4.is_broadcast()   // 255.255.255.255
        }
        IpAddr::V6(ipv6) => match ipv6.to_ipv4_mapped() {
            Some(ipv4) => is_private_ip(IpAddr::V4(ipv4)),
            None => {
                ipv6.is_loopback()
                    || ipv6.is_unspecified()
                    || (ipv6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                    || (ipv6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
            }
        },
    }
}

/// Check if a hostname is a known private/local name.
pub fn is_private_host(host: &str) -> bool {
    let lower = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_lowercase();
    if lower == "localhost" || lower.ends_with(".local") || lower.ends_with(".internal") {
        return true;
    }

    if let Ok(ip) = lower.parse::<IpAddr>() {
        return is_private_ip(ip);
    }

    false
}

/// Parse a URL for fetching: it must be well formed, use http(s), have a host,
/// and (when `block_private` is set) not point at a private/local host.
///
/// Returns the parsed URL or a human-readable reason.
pub fn validate_fetch_url(url_str: &str, block_private: bool) -> Result<url::Url, String> {
    let url = url::Url::parse(url_str.trim()).map_err(|e| format!("Invalid URL: {}", e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Invalid URL: unsupported scheme '{}'", url.scheme()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| "Invalid URL: no host".to_string())?;

    if block_private && is_private_host(host) {
        return Err(format!(
            "Blocked: private/local address '{}'",
            host
        ));
    }

    Ok(url)
}

/// Resolve the URL's host and reject it if any address is private/local.
///
/// Catches public-looking names that point inside the network.
pub async fn check_resolved_host(url: &url::Url) -> Result<(), String> {
    let host = url
        .host_str()
        .ok_or_else(|| "Invalid URL: no host".to_string())?
        .trim_start_matches('[')
        .trim_end_matches(']');
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| format!("DNS resolution failed for '{}': {}", host, e))?;
    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(format!(
                "Blocked: '{}' resolves to private address {}",
                host,
                addr.ip()
            ));
        }
    }
    Ok(())
}

/// Full check for one request target: [`validate_fetch_url`], then the
/// resolved addresses when `block_private` is set.
pub async fn validate_fetch_target(url_str: &str, block_private: bool) -> Result<url::Url, String> {
    let url = validate_fetch_url(url_str, block_private)?;
    if block_private {
        check_resolved_host(&url).await?;
    }
    Ok(url)
}
