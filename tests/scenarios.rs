use std::collections::HashSet;

use fleet_rebalancer::model::{Flavor, HypervisorSnapshot, HypervisorState, HypervisorStatus, Vm};
use fleet_rebalancer::orchestrator::{run, RunOutcome};
use fleet_rebalancer::ports::mock::{MockCloudClient, MockPlacementClient};

fn host(name: &str, vcpus_total: u32, vcpus_used: u32, mem_total: u64, mem_used: u64, vms: u32) -> HypervisorSnapshot {
    HypervisorSnapshot {
        hostname: name.to_string(),
        vcpus_total,
        vcpus_used,
        memory_mb_total: mem_total,
        memory_mb_used: mem_used,
        running_vms: vms,
        state: HypervisorState::Up,
        status: HypervisorStatus::Enabled,
    }
}

fn small_flavor() -> Flavor {
    Flavor {
        id: "small".into(),
        name: "small".into(),
        vcpus: 4,
        ram_mb: 8192,
        extra_specs: Default::default(),
    }
}

fn vm(id: &str, current_host: &str) -> Vm {
    Vm {
        id: id.to_string(),
        name: id.to_string(),
        status: "ACTIVE".to_string(),
        current_host: current_host.to_string(),
        flavor_ref: "small".to_string(),
        required_traits: HashSet::new(),
    }
}

// Two equally loaded hosts never trigger a migration.
#[tokio::test]
async fn balanced_cluster_takes_no_action() {
    let cloud = MockCloudClient {
        hypervisors: vec![host("a", 16, 8, 65536, 4096, 10), host("b", 16, 8, 65536, 4096, 10)],
        ..Default::default()
    };
    let placement = MockPlacementClient::default();

    let outcome = run(&cloud, &placement, 1.2, false, false).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Balanced));
    assert!(cloud.dispatched.lock().unwrap().is_empty());
}

// One overloaded host, one idle host, a single VM: the VM lands on the idle host.
#[tokio::test]
async fn overloaded_host_migrates_its_vm_to_the_idle_host() {
    let cloud = MockCloudClient {
        hypervisors: vec![host("a", 16, 64, 65536, 32768, 8), host("b", 16, 8, 65536, 4096, 1)],
        servers: vec![vm("v1", "a")],
        flavors: vec![small_flavor()],
        ..Default::default()
    };
    let placement = MockPlacementClient::default();

    let outcome = run(&cloud, &placement, 1.2, false, false).await.unwrap();
    match outcome {
        RunOutcome::Executed(summary) => {
            assert_eq!(summary.attempted, 1);
            assert_eq!(summary.successful, 1);
        }
        other => panic!("expected a migration to execute, got {other:?}"),
    }
    let dispatched = cloud.dispatched.lock().unwrap();
    assert_eq!(dispatched.as_slice(), &[("v1".to_string(), "b".to_string())]);
}

// A VM requiring a trait the only candidate target lacks stays put.
#[tokio::test]
async fn missing_trait_on_every_target_blocks_the_migration() {
    let mut gpu_vm = vm("v1", "a");
    gpu_vm.required_traits.insert("GPU".to_string());
    let cloud = MockCloudClient {
        hypervisors: vec![host("a", 16, 64, 65536, 32768, 8), host("b", 16, 8, 65536, 4096, 1)],
        servers: vec![gpu_vm],
        flavors: vec![small_flavor()],
        ..Default::default()
    };
    let mut placement = MockPlacementClient::default();
    placement.providers.insert("b".to_string(), "prov-b".to_string());

    let outcome = run(&cloud, &placement, 1.2, false, false).await.unwrap();
    match outcome {
        RunOutcome::Executed(summary) => assert_eq!(summary.attempted, 0),
        RunOutcome::NoTargets | RunOutcome::Balanced => {}
        other => panic!("unexpected outcome for trait-blocked plan: {other:?}"),
    }
    assert!(cloud.dispatched.lock().unwrap().is_empty());
}

// --dry-run plans exactly as a live run would, but dispatches nothing.
#[tokio::test]
async fn dry_run_reports_a_full_plan_without_dispatching() {
    let cloud = MockCloudClient {
        hypervisors: vec![host("a", 16, 64, 65536, 32768, 8), host("b", 16, 8, 65536, 4096, 1)],
        servers: vec![vm("v1", "a")],
        flavors: vec![small_flavor()],
        ..Default::default()
    };
    let placement = MockPlacementClient::default();

    let outcome = run(&cloud, &placement, 1.2, true, false).await.unwrap();
    match outcome {
        RunOutcome::Executed(summary) => {
            assert_eq!(summary.attempted, summary.successful);
            assert_eq!(summary.attempted, 1);
        }
        other => panic!("expected a dry-run plan to execute cleanly, got {other:?}"),
    }
    assert!(cloud.dispatched.lock().unwrap().is_empty(), "dry-run must not call live_migrate");
}

// --show-resources reports without planning or touching the placement port at all.
#[tokio::test]
async fn show_resources_short_circuits_before_planning() {
    let cloud = MockCloudClient {
        hypervisors: vec![host("a", 16, 64, 65536, 32768, 8), host("b", 16, 8, 65536, 4096, 1)],
        servers: vec![vm("v1", "a")],
        flavors: vec![small_flavor()],
        ..Default::default()
    };
    let placement = MockPlacementClient::default();

    let outcome = run(&cloud, &placement, 1.2, false, true).await.unwrap();
    assert!(matches!(outcome, RunOutcome::ShowedResources));
    assert!(cloud.dispatched.lock().unwrap().is_empty());
}
