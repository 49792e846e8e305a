//! Cloud Port: hypervisor listing, server listing, flavor catalog, live-migrate dispatch.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::BalancerError;
use crate::model::{Flavor, HypervisorSnapshot, Vm};

/// Abstract access to the compute cloud. Implementations must tolerate upstream records missing
/// fields (see `HypervisorSnapshot`'s `#[serde(default)]` fields) and fail with
/// `BalancerError::CloudUnavailable` on transport error.
#[async_trait]
pub trait CloudPort: Send + Sync {
    async fn list_hypervisors(&self) -> Result<Vec<HypervisorSnapshot>, BalancerError>;

    /// VMs currently on `host`, across all projects.
    async fn list_servers(&self, host: &str) -> Result<Vec<Vm>, BalancerError>;

    async fn get_vm(&self, id: &str) -> Result<Vm, BalancerError>;

    async fn list_flavors(&self) -> Result<Vec<Flavor>, BalancerError>;

    /// Dispatch a live migration. No retry at this layer.
    async fn live_migrate(&self, vm_id: &str, target_host: &str) -> Result<(), BalancerError>;
}

/// A minimal authenticated session: bearer token plus per-service endpoint map. Credential
/// bootstrap proper (the Keystone token exchange) is an external collaborator with a narrow
/// interface; this type is the shape the planner needs from it.
#[derive(Debug, Clone)]
pub struct OpenStackSession {
    pub auth_token: String,
    endpoints: HashMap<String, String>,
}

impl OpenStackSession {
    pub fn new(auth_token: String, endpoints: HashMap<String, String>) -> Self {
        Self { auth_token, endpoints }
    }

    pub fn endpoint_for(&self, service: &str) -> Result<&str, BalancerError> {
        self.endpoints
            .get(service)
            .map(|s| s.as_str())
            .ok_or_else(|| BalancerError::Configuration(format!("no endpoint for service {service} in catalog")))
    }
}

#[derive(Deserialize)]
struct HypervisorsResponse {
    #[serde(default)]
    hypervisors: Vec<HypervisorSnapshot>,
}

#[derive(Deserialize)]
struct ServersResponse {
    #[serde(default)]
    servers: Vec<Vm>,
}

#[derive(Deserialize)]
struct ServerResponse {
    server: Vm,
}

#[derive(Deserialize)]
struct FlavorsResponse {
    #[serde(default)]
    flavors: Vec<Flavor>,
}

/// `reqwest`-backed Cloud Port talking to the compute API's `os-hypervisors`, `servers` and
/// live-migrate action endpoints, the Rust equivalent of the original manager's direct
/// `requests` calls.
pub struct OpenStackCloudClient {
    http: Client,
    session: OpenStackSession,
}

impl OpenStackCloudClient {
    pub fn new(http: Client, session: OpenStackSession) -> Self {
        Self { http, session }
    }

    fn compute_url(&self, path: &str) -> Result<String, BalancerError> {
        Ok(format!("{}{}", self.session.endpoint_for("compute")?, path))
    }
}

#[async_trait]
impl CloudPort for OpenStackCloudClient {
    async fn list_hypervisors(&self) -> Result<Vec<HypervisorSnapshot>, BalancerError> {
        let url = self.compute_url("/os-hypervisors/detail")?;
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.session.auth_token)
            .send()
            .await?
            .error_for_status()?;
        let body: HypervisorsResponse = response.json().await?;
        Ok(body.hypervisors)
    }

    async fn list_servers(&self, host: &str) -> Result<Vec<Vm>, BalancerError> {
        let url = self.compute_url("/servers/detail")?;
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.session.auth_token)
            .query(&[("all_tenants", "1"), ("host", host)])
            .send()
            .await?
            .error_for_status()?;
        let body: ServersResponse = response.json().await?;
        Ok(body.servers.into_iter().filter(|vm| vm.current_host == host).collect())
    }

    async fn get_vm(&self, id: &str) -> Result<Vm, BalancerError> {
        let url = self.compute_url(&format!("/servers/{id}"))?;
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.session.auth_token)
            .send()
            .await?
            .error_for_status()?;
        let body: ServerResponse = response.json().await?;
        Ok(body.server)
    }

    async fn list_flavors(&self) -> Result<Vec<Flavor>, BalancerError> {
        let url = self.compute_url("/flavors/detail")?;
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.session.auth_token)
            .send()
            .await?
            .error_for_status()?;
        let body: FlavorsResponse = response.json().await?;
        Ok(body.flavors)
    }

    async fn live_migrate(&self, vm_id: &str, target_host: &str) -> Result<(), BalancerError> {
        let url = self.compute_url(&format!("/servers/{vm_id}/action"))?;
        let payload = serde_json::json!({
            "os-migrateLive": {
                "host": target_host,
                "block_migration": "auto",
            }
        });
        let response = self
            .http
            .post(&url)
            .header("X-Auth-Token", &self.session.auth_token)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BalancerError::MigrationDispatch(format!(
                "live-migrate of {vm_id} to {target_host} rejected with status {}",
                response.status()
            )))
        }
    }
}
