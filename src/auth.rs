//! Narrow credential-bootstrap collaborator: exchanges OpenStack env-var credentials for a
//! Keystone token and the compute/placement endpoints the rest of the planner needs.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::BalancerError;
use crate::ports::cloud::OpenStackSession;

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
}

/// Performs a Keystone v3 password authentication and resolves the public `compute` and
/// `placement` endpoints from the returned service catalog.
pub async fn authenticate(config: &Config, http: &Client) -> Result<OpenStackSession, BalancerError> {
    let user_domain = config.extra.get("OS_USER_DOMAIN_NAME").map(String::as_str).unwrap_or("Default");
    let project_domain = config
        .extra
        .get("OS_PROJECT_DOMAIN_NAME")
        .map(String::as_str)
        .unwrap_or("Default");

    let payload = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": config.username,
                        "domain": { "name": user_domain },
                        "password": config.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": config.project_name,
                    "domain": { "name": project_domain },
                }
            }
        }
    });

    let response = http
        .post(format!("{}/auth/tokens", config.auth_url.trim_end_matches('/')))
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(BalancerError::CloudUnavailable(format!(
            "keystone authentication failed with status {}",
            response.status()
        )));
    }

    let auth_token = response
        .headers()
        .get("X-Subject-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BalancerError::CloudUnavailable("keystone response missing X-Subject-Token".to_string()))?
        .to_string();

    let body: TokenResponse = response.json().await?;

    let mut endpoints = HashMap::new();
    for entry in body.token.catalog {
        if entry.service_type == "compute" || entry.service_type == "placement" {
            if let Some(public) = entry
                .endpoints
                .iter()
                .find(|e| e.interface == "public")
                .or_else(|| entry.endpoints.first())
            {
                endpoints.insert(entry.service_type, public.url.clone());
            }
        }
    }

    if !endpoints.contains_key("compute") {
        return Err(BalancerError::Configuration(
            "service catalog has no compute endpoint".to_string(),
        ));
    }

    Ok(OpenStackSession::new(auth_token, endpoints))
}
