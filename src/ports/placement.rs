//! Placement Port: resource-provider resolution and trait lookup, cached per run.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::BalancerError;
use crate::ports::cloud::OpenStackSession;

/// Abstract access to the placement service. Both operations are cached per run after the first
/// successful call; a failure returns the empty set/`None` and logs rather than propagating.
#[async_trait]
pub trait PlacementPort: Send + Sync {
    async fn resource_provider_uuid(&self, hostname: &str) -> Option<String>;

    async fn traits(&self, provider_uuid: &str) -> HashSet<String>;
}

#[derive(Deserialize)]
struct ResourceProvider {
    uuid: String,
}

#[derive(Deserialize)]
struct ResourceProvidersResponse {
    #[serde(default)]
    resource_providers: Vec<ResourceProvider>,
}

#[derive(Deserialize)]
struct TraitsResponse {
    #[serde(default)]
    traits: Vec<String>,
}

const PLACEMENT_API_VERSION: &str = "placement 1.32";

/// `reqwest`-backed Placement Port, matching `migration_planner.py::get_host_traits`: resolve
/// the resource provider for a hostname, then fetch its traits, caching both per run.
pub struct HttpPlacementClient {
    http: Client,
    session: OpenStackSession,
    provider_cache: Mutex<HashMap<String, Option<String>>>,
    traits_cache: Mutex<HashMap<String, HashSet<String>>>,
}

impl HttpPlacementClient {
    pub fn new(http: Client, session: OpenStackSession) -> Self {
        Self {
            http,
            session,
            provider_cache: Mutex::new(HashMap::new()),
            traits_cache: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch_provider_uuid(&self, hostname: &str) -> Result<Option<String>, BalancerError> {
        let placement_url = self.session.endpoint_for("placement")?;
        let response = self
            .http
            .get(format!("{placement_url}/resource_providers"))
            .header("X-Auth-Token", &self.session.auth_token)
            .header("OpenStack-API-Version", PLACEMENT_API_VERSION)
            .query(&[("name", hostname)])
            .send()
            .await?
            .error_for_status()?;
        let body: ResourceProvidersResponse = response.json().await?;
        Ok(body.resource_providers.into_iter().next().map(|p| p.uuid))
    }

    async fn fetch_traits(&self, provider_uuid: &str) -> Result<HashSet<String>, BalancerError> {
        let placement_url = self.session.endpoint_for("placement")?;
        let response = self
            .http
            .get(format!("{placement_url}/resource_providers/{provider_uuid}/traits"))
            .header("X-Auth-Token", &self.session.auth_token)
            .header("OpenStack-API-Version", PLACEMENT_API_VERSION)
            .send()
            .await?
            .error_for_status()?;
        let body: TraitsResponse = response.json().await?;
        Ok(body.traits.into_iter().collect())
    }
}

#[async_trait]
impl PlacementPort for HttpPlacementClient {
    async fn resource_provider_uuid(&self, hostname: &str) -> Option<String> {
        if let Some(cached) = self.provider_cache.lock().unwrap().get(hostname) {
            return cached.clone();
        }

        let result = match self.fetch_provider_uuid(hostname).await {
            Ok(uuid) => uuid,
            Err(err) => {
                log::error!("error resolving resource provider for host {hostname}: {err}");
                None
            }
        };
        self.provider_cache
            .lock()
            .unwrap()
            .insert(hostname.to_string(), result.clone());
        result
    }

    async fn traits(&self, provider_uuid: &str) -> HashSet<String> {
        if let Some(cached) = self.traits_cache.lock().unwrap().get(provider_uuid) {
            return cached.clone();
        }

        let result = match self.fetch_traits(provider_uuid).await {
            Ok(traits) => traits,
            Err(err) => {
                log::error!("error fetching traits for provider {provider_uuid}: {err}");
                HashSet::new()
            }
        };
        self.traits_cache
            .lock()
            .unwrap()
            .insert(provider_uuid.to_string(), result.clone());
        result
    }
}
