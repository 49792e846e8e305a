//! Shadow per-host capacity/usage/pending-move state used exclusively by the planner.

use std::collections::{BTreeMap, HashSet};

use crate::config::{CPU_ALLOCATION_RATIO, RAM_ALLOCATION_RATIO};
use crate::model::{Flavor, HypervisorSnapshot};

/// Mutable per-host projection. Never stores the derived ratios; they're recomputed on demand so
/// they always reflect the latest committed moves.
#[derive(Clone)]
pub struct SimulatedHost {
    pub vcpus_total: u32,
    pub vcpus_used: u32,
    pub memory_mb_total: u64,
    pub memory_mb_used: u64,
    pub running_vms: u32,
    pub incoming_vm_ids: HashSet<String>,
    pub outgoing_vm_ids: HashSet<String>,
}

impl SimulatedHost {
    fn from_snapshot(snapshot: &HypervisorSnapshot) -> Self {
        Self {
            vcpus_total: snapshot.vcpus_total,
            vcpus_used: snapshot.vcpus_used,
            memory_mb_total: snapshot.memory_mb_total,
            memory_mb_used: snapshot.memory_mb_used,
            running_vms: snapshot.running_vms,
            incoming_vm_ids: HashSet::new(),
            outgoing_vm_ids: HashSet::new(),
        }
    }

    pub fn available_vcpus(&self) -> f64 {
        self.vcpus_total as f64 * CPU_ALLOCATION_RATIO - self.vcpus_used as f64
    }

    pub fn available_memory(&self) -> f64 {
        self.memory_mb_total as f64 * RAM_ALLOCATION_RATIO - self.memory_mb_used as f64
    }

    pub fn cpu_ratio(&self) -> f64 {
        if self.vcpus_total == 0 {
            return 1.0;
        }
        self.vcpus_used as f64 / (self.vcpus_total as f64 * CPU_ALLOCATION_RATIO)
    }

    pub fn memory_ratio(&self) -> f64 {
        if self.memory_mb_total == 0 {
            return 1.0;
        }
        self.memory_mb_used as f64 / (self.memory_mb_total as f64 * RAM_ALLOCATION_RATIO)
    }

    pub fn node_utilization(&self) -> f64 {
        self.cpu_ratio().max(self.memory_ratio())
    }

    /// Utilization this host would have after absorbing `flavor`, without mutating state.
    pub fn utilization_after_receiving(&self, flavor: &Flavor) -> f64 {
        let cpu = (self.vcpus_used as f64 + flavor.vcpus as f64) / (self.vcpus_total as f64 * CPU_ALLOCATION_RATIO);
        let memory =
            (self.memory_mb_used as f64 + flavor.ram_mb as f64) / (self.memory_mb_total as f64 * RAM_ALLOCATION_RATIO);
        cpu.max(memory)
    }
}

/// Shadow model of the whole cluster, keyed by hostname for deterministic iteration order.
#[derive(Clone)]
pub struct SimulatedCluster {
    hosts: BTreeMap<String, SimulatedHost>,
}

impl SimulatedCluster {
    /// Builds simulated state for every host in the input (both over- and underutilized are
    /// included, so candidates may source from any above-target node).
    pub fn init(hypervisors: &[HypervisorSnapshot]) -> Self {
        let hosts = hypervisors
            .iter()
            .map(|h| (h.hostname.clone(), SimulatedHost::from_snapshot(h)))
            .collect();
        Self { hosts }
    }

    pub fn get(&self, hostname: &str) -> Option<&SimulatedHost> {
        self.hosts.get(hostname)
    }

    pub fn hostnames(&self) -> impl Iterator<Item = &String> {
        self.hosts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SimulatedHost)> {
        self.hosts.iter()
    }

    /// (avg, min, max) node utilization across all simulated hosts; all zero when empty.
    pub fn cluster_metrics(&self) -> (f64, f64, f64) {
        if self.hosts.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let utilizations: Vec<f64> = self.hosts.values().map(|h| h.node_utilization()).collect();
        let avg = utilizations.iter().sum::<f64>() / utilizations.len() as f64;
        let min = utilizations.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = utilizations.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (avg, min, max)
    }

    /// Commit a planned move, mutating both sides atomically. Rejects (leaving state unchanged)
    /// if either side would violate a non-negativity or target-capacity invariant.
    pub fn try_commit(&mut self, vm_id: &str, source: &str, target: &str, flavor: &Flavor) -> Result<(), String> {
        if source == target {
            return Err(format!("refusing to migrate {vm_id} to its own host {source}"));
        }

        let source_host = self
            .hosts
            .get(source)
            .ok_or_else(|| format!("unknown source host {source}"))?;
        let target_host = self
            .hosts
            .get(target)
            .ok_or_else(|| format!("unknown target host {target}"))?;

        if (source_host.vcpus_used as i64) < flavor.vcpus as i64
            || (source_host.memory_mb_used as i64) < flavor.ram_mb as i64
            || source_host.running_vms == 0
        {
            return Err(format!("source {source} would go negative removing {vm_id}"));
        }
        if target_host.available_vcpus() < flavor.vcpus as f64 || target_host.available_memory() < flavor.ram_mb as f64
        {
            return Err(format!("target {target} lacks capacity for {vm_id}"));
        }

        let source_host = self.hosts.get_mut(source).unwrap();
        source_host.vcpus_used -= flavor.vcpus;
        source_host.memory_mb_used -= flavor.ram_mb;
        source_host.running_vms -= 1;
        source_host.outgoing_vm_ids.insert(vm_id.to_string());

        let target_host = self.hosts.get_mut(target).unwrap();
        target_host.vcpus_used += flavor.vcpus;
        target_host.memory_mb_used += flavor.ram_mb;
        target_host.running_vms += 1;
        target_host.incoming_vm_ids.insert(vm_id.to_string());

        Ok(())
    }
}
