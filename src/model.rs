//! Data types for hypervisors, flavors and VMs, with upstream defaulting centralized here.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Power/administrative state reported by the compute service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypervisorState {
    Up,
    Down,
    #[serde(other)]
    Unknown,
}

impl Default for HypervisorState {
    fn default() -> Self {
        HypervisorState::Unknown
    }
}

/// Scheduling status reported by the compute service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypervisorStatus {
    Enabled,
    Disabled,
    #[serde(other)]
    Unknown,
}

impl Default for HypervisorStatus {
    fn default() -> Self {
        HypervisorStatus::Unknown
    }
}

/// One hypervisor record as reported by `os-hypervisors/detail`. Unknown/missing upstream
/// fields default to zero or `Unknown` rather than panicking.
#[derive(Debug, Clone, Deserialize)]
pub struct HypervisorSnapshot {
    #[serde(rename = "hypervisor_hostname")]
    pub hostname: String,
    #[serde(rename = "vcpus", default)]
    pub vcpus_total: u32,
    #[serde(default)]
    pub vcpus_used: u32,
    #[serde(rename = "memory_mb", default)]
    pub memory_mb_total: u64,
    #[serde(default)]
    pub memory_mb_used: u64,
    #[serde(default)]
    pub running_vms: u32,
    #[serde(default)]
    pub state: HypervisorState,
    #[serde(default)]
    pub status: HypervisorStatus,
}

impl HypervisorSnapshot {
    pub fn is_active(&self) -> bool {
        self.state == HypervisorState::Up && self.status == HypervisorStatus::Enabled
    }
}

/// Immutable resource template. `extra_specs` is always present (empty when the upstream record
/// omits it) so callers never need to probe for its existence.
#[derive(Debug, Clone, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    #[serde(rename = "ram")]
    pub ram_mb: u64,
    #[serde(default)]
    pub extra_specs: HashMap<String, String>,
}

impl Flavor {
    /// Traits required by this flavor: keys of the form `trait:NAME` whose value lowercases to
    /// `required`.
    pub fn required_traits(&self) -> HashSet<String> {
        self.extra_specs
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("trait:")
                    .filter(|_| value.eq_ignore_ascii_case("required"))
                    .map(|name| name.to_string())
            })
            .collect()
    }
}

/// A server (VM) instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Vm {
    pub id: String,
    pub name: String,
    pub status: String,
    pub current_host: String,
    pub flavor_ref: String,
    #[serde(default)]
    pub required_traits: HashSet<String>,
}

impl Vm {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
