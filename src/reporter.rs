//! Human-readable per-node utilization dump, used by `--show-resources`.

use crate::config::{CPU_ALLOCATION_RATIO, RAM_ALLOCATION_RATIO};
use crate::model::HypervisorSnapshot;

/// Resource usage view of a single node, with overcommit-adjusted ratios.
pub struct NodeResources {
    pub hostname: String,
    pub vcpus_total: u32,
    pub vcpus_used: u32,
    pub memory_mb_total: u64,
    pub memory_mb_used: u64,
    pub running_vms: u32,
    pub cpu_ratio: f64,
    pub memory_ratio: f64,
    pub status: String,
    pub state: String,
}

pub fn node_resources(snapshot: &HypervisorSnapshot) -> NodeResources {
    let cpu_ratio = if snapshot.vcpus_total > 0 {
        snapshot.vcpus_used as f64 / (snapshot.vcpus_total as f64 * CPU_ALLOCATION_RATIO)
    } else {
        1.0
    };
    let memory_ratio = if snapshot.memory_mb_total > 0 {
        snapshot.memory_mb_used as f64 / (snapshot.memory_mb_total as f64 * RAM_ALLOCATION_RATIO)
    } else {
        1.0
    };

    NodeResources {
        hostname: snapshot.hostname.clone(),
        vcpus_total: snapshot.vcpus_total,
        vcpus_used: snapshot.vcpus_used,
        memory_mb_total: snapshot.memory_mb_total,
        memory_mb_used: snapshot.memory_mb_used,
        running_vms: snapshot.running_vms,
        cpu_ratio,
        memory_ratio,
        status: format!("{:?}", snapshot.status).to_lowercase(),
        state: format!("{:?}", snapshot.state).to_lowercase(),
    }
}

pub fn print_node_resources(resources: &NodeResources) {
    log::info!("Node {}:", resources.hostname);
    log::info!(
        "  CPUs: {}/{} ({:.1}%)",
        resources.vcpus_used,
        resources.vcpus_total,
        resources.cpu_ratio * 100.0
    );
    log::info!(
        "  Memory: {}/{}MB ({:.1}%)",
        resources.memory_mb_used,
        resources.memory_mb_total,
        resources.memory_ratio * 100.0
    );
    log::info!("  Running VMs: {}", resources.running_vms);
    log::info!("  Status: {}, State: {}", resources.status, resources.state);
}
