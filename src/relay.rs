//! Fetches cross-origin website content through public relay endpoints.
//!
//! The listing surface cannot reach the business website directly, so the
//! fetch goes through interchangeable relay services tried in a fixed
//! order. Each endpoint gets exactly one attempt per listing; the first
//! successful body wins and an error response is permanent for that
//! listing.

use crate::error::{AppError, Result};
use reqwest::Client;

/// Default relay endpoints. A base ending in `=` takes the target URL
/// percent-encoded into its query string; anything else takes the target
/// appended as a path suffix.
pub(crate) const DEFAULT_RELAY_ENDPOINTS: &[&str] = &[
    "https://api.allorigins.win/raw?url=",
    "https://cors-anywhere.herokuapp.com/",
    "https://thingproxy.freeboard.io/fetch/",
];

pub(crate) struct RelayClient {
    http: Client,
    endpoints: Vec<String>,
}

impl RelayClient {
    pub(crate) fn new(http: Client, endpoints: Vec<String>) -> Self {
        Self { http, endpoints }
    }

    /// Fetches the raw content of `target` through the first relay that
    /// answers with a non-empty 2xx body.
    pub(crate) async fn fetch(&self, target: &str) -> Result<String> {
        for endpoint in &self.endpoints {
            let request_url = build_relay_url(endpoint, target);
            tracing::debug!(target: "relay", "Trying relay: {}", request_url);

            match self.http.get(&request_url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        tracing::warn!(target: "relay", "Relay {} answered {}", endpoint, status);
                        continue;
                    }
                    match response.text().await {
                        Ok(body) if !body.trim().is_empty() => {
                            tracing::info!(
                                target: "relay",
                                "Fetched {} bytes for {} via {}",
                                body.len(),
                                target,
                                endpoint
                            );
                            return Ok(body);
                        }
                        Ok(_) => {
                            tracing::warn!(target: "relay", "Relay {} returned an empty body", endpoint);
                        }
                        Err(e) => {
                            tracing::warn!(target: "relay", "Failed reading body from {}: {}", endpoint, e);
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    tracing::warn!(target: "relay", "Timeout on relay {}: {}", endpoint, e);
                }
                Err(e) => {
                    tracing::warn!(target: "relay", "Request error on relay {}: {}", endpoint, e);
                }
            }
        }

        Err(AppError::Relay(format!(
            "all {} relay endpoints failed for {}",
            self.endpoints.len(),
            target
        )))
    }
}

fn build_relay_url(endpoint: &str, target: &str) -> String {
    if endpoint.ends_with('=') {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}{}", endpoint, encoded)
    } else {
        format!("{}{}", endpoint, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_style_encodes_target() {
        let url = build_relay_url(
            "https://api.allorigins.win/raw?url=",
            "https://acme.com/contact?x=1",
        );
        assert_eq!(
            url,
            "https://api.allorigins.win/raw?url=https%3A%2F%2Facme.com%2Fcontact%3Fx%3D1"
        );
    }

    #[test]
    fn test_prefix_style_appends_target() {
        let url = build_relay_url("https://thingproxy.freeboard.io/fetch/", "https://acme.com");
        assert_eq!(url, "https://thingproxy.freeboard.io/fetch/https://acme.com");
    }
}
