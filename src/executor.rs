//! Walks a migration plan in emitted order, issuing live-migrate calls (or logging intent under
//! dry-run), and summarizes the outcome. Never aborts the remaining plan on a single failure.

use crate::planner::PlannedMove;
use crate::ports::CloudPort;

/// Outcome of a single planned move after execution.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub vm_id: String,
    pub vm_name: String,
    pub source: String,
    pub target: String,
    pub succeeded: bool,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExecutionSummary {
    pub attempted: usize,
    pub successful: usize,
    pub outcomes: Vec<ExecutionOutcome>,
}

impl ExecutionSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.successful
    }
}

pub async fn execute(cloud: &dyn CloudPort, plan: &[PlannedMove], dry_run: bool) -> ExecutionSummary {
    let mut summary = ExecutionSummary::default();

    for planned in plan {
        summary.attempted += 1;

        if dry_run {
            log::info!(
                "[DRY RUN] would migrate vm {} from {} to {}",
                planned.vm.name,
                planned.source,
                planned.target
            );
            summary.successful += 1;
            summary.outcomes.push(ExecutionOutcome {
                vm_id: planned.vm.id.clone(),
                vm_name: planned.vm.name.clone(),
                source: planned.source.clone(),
                target: planned.target.clone(),
                succeeded: true,
                failure_reason: None,
            });
            continue;
        }

        match cloud.live_migrate(&planned.vm.id, &planned.target).await {
            Ok(()) => {
                log::info!("successfully initiated migration: {} to {}", planned.vm.name, planned.target);
                summary.successful += 1;
                summary.outcomes.push(ExecutionOutcome {
                    vm_id: planned.vm.id.clone(),
                    vm_name: planned.vm.name.clone(),
                    source: planned.source.clone(),
                    target: planned.target.clone(),
                    succeeded: true,
                    failure_reason: None,
                });
            }
            Err(err) => {
                log::error!("failed to migrate {} to {}: {err}", planned.vm.name, planned.target);
                summary.outcomes.push(ExecutionOutcome {
                    vm_id: planned.vm.id.clone(),
                    vm_name: planned.vm.name.clone(),
                    source: planned.source.clone(),
                    target: planned.target.clone(),
                    succeeded: false,
                    failure_reason: Some(err.to_string()),
                });
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vm;
    use crate::ports::mock::MockCloudClient;
    use std::collections::HashSet;

    fn planned(id: &str) -> PlannedMove {
        PlannedMove {
            vm: Vm {
                id: id.to_string(),
                name: id.to_string(),
                status: "ACTIVE".into(),
                current_host: "A".into(),
                flavor_ref: "f".into(),
                required_traits: HashSet::new(),
            },
            source: "A".into(),
            target: "B".into(),
        }
    }

    #[tokio::test]
    async fn dry_run_never_dispatches() {
        let cloud = MockCloudClient::default();
        let plan = vec![planned("v1"), planned("v2")];
        let summary = execute(&cloud, &plan, true).await;
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.successful, 2);
        assert!(cloud.dispatched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_run_dispatches_and_continues_past_failure() {
        let mut cloud = MockCloudClient::default();
        cloud.reject_migrations.insert("v1".to_string());
        let plan = vec![planned("v1"), planned("v2")];
        let summary = execute(&cloud, &plan, false).await;
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(cloud.dispatched.lock().unwrap().len(), 2);
    }
}
