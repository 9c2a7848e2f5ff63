//! HTTP Client Factory
//!
//! Builds the `reqwest` clients shared by the completion backend and the
//! tool providers.

use std::time::Duration;

use reqwest::redirect::Policy;

/// User agent sent by completion backend requests.
pub const DEFAULT_USER_AGENT: &str = "Ragdesk/0.1";

/// Build a `reqwest::Client` with a user agent and an optional default timeout.
///
/// Falls back to a plain client if the builder rejects the settings.
pub fn build_http_client(user_agent: &str, timeout: Option<Duration>) -> reqwest::Client {
    build_with_redirects(user_agent, timeout, || Policy::limited(5))
}

/// Like [`build_http_client`], but 3xx responses come back to the caller
/// unfollowed so each hop can be checked before it is requested.
pub fn build_manual_redirect_client(user_agent: &str, timeout: Option<Duration>) -> reqwest::Client {
    build_with_redirects(user_agent, timeout, Policy::none)
}

fn build_with_redirects(
    user_agent: &str,
    timeout: Option<Duration>,
    policy: fn() -> Policy,
) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(policy());
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to default HTTP client");
        reqwest::Client::builder()
            .redirect(policy())
            .build()
            .unwrap_or_default()
    })
}
