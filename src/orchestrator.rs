//! Top-level balance loop composing the ports, classifier, planner, executor and reporter.

use crate::classifier::classify;
use crate::error::BalancerError;
use crate::executor::{self, ExecutionSummary};
use crate::flavor_cache::FlavorCache;
use crate::planner::MigrationPlanner;
use crate::ports::{CloudPort, PlacementPort};
use crate::reporter::{node_resources, print_node_resources};

/// Outcome of a balancing pass, used by `main` to decide the process exit code.
#[derive(Debug)]
pub enum RunOutcome {
    /// Printed resource usage and exited without planning.
    ShowedResources,
    /// No overutilized nodes; cluster is already balanced.
    Balanced,
    /// Overutilized nodes exist but there are no underutilized targets.
    NoTargets,
    /// A plan was produced and executed (or dry-run logged).
    Executed(ExecutionSummary),
}

pub async fn run(
    cloud: &dyn CloudPort,
    placement: &dyn PlacementPort,
    threshold: f64,
    dry_run: bool,
    show_resources: bool,
) -> Result<RunOutcome, BalancerError> {
    let flavors = FlavorCache::load(cloud).await?;
    let hypervisors = cloud.list_hypervisors().await?;

    if show_resources {
        log::info!("Current node resources:");
        for snapshot in &hypervisors {
            print_node_resources(&node_resources(snapshot));
        }
        return Ok(RunOutcome::ShowedResources);
    }

    if hypervisors.is_empty() {
        log::warn!("no compute nodes found");
        return Ok(RunOutcome::Balanced);
    }

    let classified = classify(&hypervisors, threshold);
    log::info!(
        "found {} overutilized and {} underutilized nodes",
        classified.overutilized.len(),
        classified.underutilized.len()
    );

    if classified.overutilized.is_empty() {
        log::info!("no overutilized nodes found. cluster is balanced.");
        return Ok(RunOutcome::Balanced);
    }
    if classified.underutilized.is_empty() {
        log::warn!("no underutilized nodes available as migration targets.");
        return Ok(RunOutcome::NoTargets);
    }

    let mut all_hosts = classified.overutilized;
    all_hosts.extend(classified.underutilized);

    let planner = MigrationPlanner::new(cloud, placement, &flavors, &all_hosts);
    let plan = planner.plan().await;

    let summary = executor::execute(cloud, &plan, dry_run).await;

    log::info!("Migration summary:");
    log::info!("  Attempted: {}", summary.attempted);
    log::info!("  Successful: {}", summary.successful);
    log::info!("  Failed: {}", summary.failed());

    Ok(RunOutcome::Executed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HypervisorSnapshot, HypervisorState, HypervisorStatus, Vm};
    use crate::ports::mock::{MockCloudClient, MockPlacementClient};
    use std::collections::HashSet;

    fn host(name: &str, running_vms: u32) -> HypervisorSnapshot {
        HypervisorSnapshot {
            hostname: name.to_string(),
            vcpus_total: 16,
            vcpus_used: 8,
            memory_mb_total: 65536,
            memory_mb_used: 4096,
            running_vms,
            state: HypervisorState::Up,
            status: HypervisorStatus::Enabled,
        }
    }

    #[tokio::test]
    async fn balanced_cluster_s1() {
        let cloud = MockCloudClient {
            hypervisors: vec![host("A", 10), host("B", 10)],
            ..Default::default()
        };
        let placement = MockPlacementClient::default();
        let outcome = run(&cloud, &placement, 1.2, false, false).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Balanced));
    }

    #[tokio::test]
    async fn dry_run_isolation_s6() {
        let mut a = host("A", 20);
        a.vcpus_used = 64;
        a.memory_mb_used = 32768;
        let mut b = host("B", 1);
        b.vcpus_used = 8;
        b.memory_mb_used = 4096;

        let vm = Vm {
            id: "v1".into(),
            name: "v1".into(),
            status: "ACTIVE".into(),
            current_host: "A".into(),
            flavor_ref: "small".into(),
            required_traits: HashSet::new(),
        };
        let flavor = crate::model::Flavor {
            id: "small".into(),
            name: "small".into(),
            vcpus: 4,
            ram_mb: 8192,
            extra_specs: Default::default(),
        };
        let cloud = MockCloudClient {
            hypervisors: vec![a, b],
            servers: vec![vm],
            flavors: vec![flavor],
            ..Default::default()
        };
        let placement = MockPlacementClient::default();
        let outcome = run(&cloud, &placement, 1.2, true, false).await.unwrap();
        match outcome {
            RunOutcome::Executed(summary) => {
                assert_eq!(summary.attempted, summary.successful);
                assert!(!summary.outcomes.is_empty());
            }
            _ => panic!("expected a plan to be executed"),
        }
        assert!(cloud.dispatched.lock().unwrap().is_empty());
    }
}
