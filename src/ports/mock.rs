//! In-memory mock ports used by integration tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::BalancerError;
use crate::model::{Flavor, HypervisorSnapshot, Vm};
use crate::ports::cloud::CloudPort;
use crate::ports::placement::PlacementPort;

#[derive(Default)]
pub struct MockCloudClient {
    pub hypervisors: Vec<HypervisorSnapshot>,
    pub servers: Vec<Vm>,
    pub flavors: Vec<Flavor>,
    pub dispatched: Mutex<Vec<(String, String)>>,
    /// VM ids for which `live_migrate` should fail.
    pub reject_migrations: HashSet<String>,
    /// VM ids for which `get_vm` should fail, simulating the VM vanishing between the host
    /// listing and the per-VM detail fetch.
    pub reject_get_vm: HashSet<String>,
    /// Per-VM record returned by `get_vm` in place of the matching entry in `servers`, for tests
    /// that need the detailed record to differ from the listing (e.g. additional required
    /// traits only present on the full record).
    pub vm_detail_overrides: HashMap<String, Vm>,
}

#[async_trait]
impl CloudPort for MockCloudClient {
    async fn list_hypervisors(&self) -> Result<Vec<HypervisorSnapshot>, BalancerError> {
        Ok(self.hypervisors.clone())
    }

    async fn list_servers(&self, host: &str) -> Result<Vec<Vm>, BalancerError> {
        Ok(self.servers.iter().filter(|vm| vm.current_host == host).cloned().collect())
    }

    async fn get_vm(&self, id: &str) -> Result<Vm, BalancerError> {
        if self.reject_get_vm.contains(id) {
            return Err(BalancerError::CloudUnavailable(format!("no such vm {id}")));
        }
        if let Some(vm) = self.vm_detail_overrides.get(id) {
            return Ok(vm.clone());
        }
        self.servers
            .iter()
            .find(|vm| vm.id == id)
            .cloned()
            .ok_or_else(|| BalancerError::CloudUnavailable(format!("no such vm {id}")))
    }

    async fn list_flavors(&self) -> Result<Vec<Flavor>, BalancerError> {
        Ok(self.flavors.clone())
    }

    async fn live_migrate(&self, vm_id: &str, target_host: &str) -> Result<(), BalancerError> {
        self.dispatched
            .lock()
            .unwrap()
            .push((vm_id.to_string(), target_host.to_string()));
        if self.reject_migrations.contains(vm_id) {
            Err(BalancerError::MigrationDispatch(format!("rejected migration of {vm_id}")))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MockPlacementClient {
    /// hostname -> provider uuid
    pub providers: HashMap<String, String>,
    /// provider uuid -> traits
    pub traits: HashMap<String, HashSet<String>>,
}

#[async_trait]
impl PlacementPort for MockPlacementClient {
    async fn resource_provider_uuid(&self, hostname: &str) -> Option<String> {
        self.providers.get(hostname).cloned()
    }

    async fn traits(&self, provider_uuid: &str) -> HashSet<String> {
        self.traits.get(provider_uuid).cloned().unwrap_or_default()
    }
}
