//! Partitions active hypervisors into over/underutilized groups using a VM-count threshold.

use crate::model::HypervisorSnapshot;

/// Result of classifying the active subset of a hypervisor list.
pub struct ClassifiedNodes {
    pub overutilized: Vec<HypervisorSnapshot>,
    pub underutilized: Vec<HypervisorSnapshot>,
}

/// Discards nodes that are not `up`/`enabled`, computes the average running-VM count over the
/// remainder, and splits it at `avg * threshold`. The border case (`running_vms == avg *
/// threshold`) is underutilized.
pub fn classify(hypervisors: &[HypervisorSnapshot], threshold: f64) -> ClassifiedNodes {
    let active: Vec<&HypervisorSnapshot> = hypervisors.iter().filter(|h| h.is_active()).collect();

    let avg_vms = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|h| h.running_vms as f64).sum::<f64>() / active.len() as f64
    };

    let mut overutilized = Vec::new();
    let mut underutilized = Vec::new();

    for host in active {
        if host.running_vms as f64 > avg_vms * threshold {
            overutilized.push(host.clone());
        } else {
            underutilized.push(host.clone());
        }
    }

    ClassifiedNodes {
        overutilized,
        underutilized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HypervisorState, HypervisorStatus};

    fn host(name: &str, running_vms: u32, state: HypervisorState, status: HypervisorStatus) -> HypervisorSnapshot {
        HypervisorSnapshot {
            hostname: name.to_string(),
            vcpus_total: 16,
            vcpus_used: 0,
            memory_mb_total: 65536,
            memory_mb_used: 0,
            running_vms,
            state,
            status,
        }
    }

    #[test]
    fn skips_inactive_nodes() {
        let hosts = vec![
            host("a", 100, HypervisorState::Down, HypervisorStatus::Enabled),
            host("b", 1, HypervisorState::Up, HypervisorStatus::Disabled),
            host("c", 10, HypervisorState::Up, HypervisorStatus::Enabled),
        ];
        let classified = classify(&hosts, 1.2);
        assert_eq!(classified.overutilized.len(), 0);
        assert_eq!(classified.underutilized.len(), 1);
        assert_eq!(classified.underutilized[0].hostname, "c");
    }

    #[test]
    fn border_case_is_underutilized() {
        // avg=10, threshold=1.2 -> boundary is 12; running_vms==12 must land underutilized.
        let hosts = vec![
            host("a", 8, HypervisorState::Up, HypervisorStatus::Enabled),
            host("b", 12, HypervisorState::Up, HypervisorStatus::Enabled),
        ];
        let classified = classify(&hosts, 1.2);
        assert_eq!(classified.overutilized.len(), 0);
        assert_eq!(classified.underutilized.len(), 2);
    }

    #[test]
    fn empty_active_set_yields_empty_groups() {
        let classified = classify(&[], 1.2);
        assert!(classified.overutilized.is_empty());
        assert!(classified.underutilized.is_empty());
    }
}
