//! The migration planner: ranks candidate VMs, scores targets under capacity and trait
//! constraints, and commits moves against the shadow cluster so later decisions see the effect
//! of earlier ones. This is the core of the balancer.

pub mod state;

use std::collections::HashSet;

use futures::future::join_all;

use crate::config::TARGET_FRACTION;
use crate::flavor_cache::FlavorCache;
use crate::model::{Flavor, Vm};
use crate::ports::{CloudPort, PlacementPort};
use state::SimulatedCluster;

/// A single planned migration, in commit order.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub vm: Vm,
    pub source: String,
    pub target: String,
}

struct Candidate {
    vm: Vm,
    source: String,
    flavor: Flavor,
}

pub struct MigrationPlanner<'a> {
    cloud: &'a dyn CloudPort,
    placement: &'a dyn PlacementPort,
    flavors: &'a FlavorCache,
    cluster: SimulatedCluster,
}

impl<'a> MigrationPlanner<'a> {
    /// Initializes simulated state for every host in `hypervisors` (both over- and
    /// underutilized, so candidates may source from any above-target node).
    pub fn new(
        cloud: &'a dyn CloudPort,
        placement: &'a dyn PlacementPort,
        flavors: &'a FlavorCache,
        hypervisors: &[crate::model::HypervisorSnapshot],
    ) -> Self {
        Self {
            cloud,
            placement,
            flavors,
            cluster: SimulatedCluster::init(hypervisors),
        }
    }

    async fn host_traits(&self, hostname: &str) -> HashSet<String> {
        match self.placement.resource_provider_uuid(hostname).await {
            Some(uuid) => self.placement.traits(&uuid).await,
            None => {
                log::warn!("no resource provider found for host {hostname}");
                HashSet::new()
            }
        }
    }

    /// Hosts whose current simulated utilization exceeds `avg * TARGET_FRACTION`, evaluated once
    /// against the initial simulated state (§4.5.3 of the spec).
    async fn gather_candidates(&self) -> Vec<Candidate> {
        let (avg_util, _, _) = self.cluster.cluster_metrics();
        let target_util = avg_util * TARGET_FRACTION;

        let source_hosts: Vec<String> = self
            .cluster
            .iter()
            .filter(|(_, host)| host.node_utilization() > target_util)
            .map(|(name, _)| name.clone())
            .collect();

        let mut candidates = Vec::new();
        for hostname in source_hosts {
            let vms = match self.cloud.list_servers(&hostname).await {
                Ok(vms) => vms,
                Err(err) => {
                    log::error!("error listing servers on {hostname}: {err}");
                    continue;
                }
            };

            for vm in vms {
                if !vm.is_active() {
                    continue;
                }

                // Re-fetch the full record so any required traits carried only on the detailed
                // per-VM view (not the host-filtered list) are folded in before scoring, the way
                // the original planner's `get_required_traits` re-queries `/servers/{id}` rather
                // than trusting the list response alone.
                let mut vm = vm;
                match self.cloud.get_vm(&vm.id).await {
                    Ok(full) => vm.required_traits.extend(full.required_traits),
                    Err(err) => {
                        log::warn!("skipping vm {} ({}): failed to fetch full record: {err}", vm.id, vm.name);
                        continue;
                    }
                }

                match self.flavors.get(&vm.flavor_ref) {
                    Some(flavor) => candidates.push(Candidate {
                        vm,
                        source: hostname.clone(),
                        flavor: flavor.clone(),
                    }),
                    None => {
                        log::warn!("skipping vm {} ({}): flavor {} not found", vm.id, vm.name, vm.flavor_ref);
                    }
                }
            }
        }

        // Descending resource footprint, ties broken by VM id ascending for determinism.
        candidates.sort_by(|a, b| {
            let footprint_a = a.flavor.vcpus as u64 * a.flavor.ram_mb;
            let footprint_b = b.flavor.vcpus as u64 * b.flavor.ram_mb;
            footprint_b.cmp(&footprint_a).then_with(|| a.vm.id.cmp(&b.vm.id))
        });

        candidates
    }

    /// Finds the best target host for `candidate`, recomputing `target_util` from the current
    /// simulated state (commits shift the mean, so this must not be cached across decisions).
    async fn best_target(&self, candidate: &Candidate) -> Option<String> {
        let required_traits: HashSet<String> = candidate
            .vm
            .required_traits
            .union(&candidate.flavor.required_traits())
            .cloned()
            .collect();

        let (avg_util, _, _) = self.cluster.cluster_metrics();
        let target_util = avg_util * TARGET_FRACTION;

        let mut best: Option<(String, f64, f64)> = None; // (hostname, score, current_util)

        for hostname in self.cluster.hostnames() {
            if hostname == &candidate.source {
                continue;
            }
            let host = self.cluster.get(hostname).unwrap();
            if host.node_utilization() > target_util {
                continue;
            }
            if host.available_vcpus() < candidate.flavor.vcpus as f64
                || host.available_memory() < candidate.flavor.ram_mb as f64
            {
                continue;
            }

            if !required_traits.is_empty() {
                let traits = self.host_traits(hostname).await;
                if !required_traits.is_subset(&traits) {
                    log::debug!(
                        "host {hostname} missing required traits for vm {}: {:?}",
                        candidate.vm.id,
                        required_traits.difference(&traits).collect::<Vec<_>>()
                    );
                    continue;
                }
            }

            let post_util = host.utilization_after_receiving(&candidate.flavor);
            let score = (post_util - target_util).abs();
            let current_util = host.node_utilization();

            let is_better = match &best {
                None => true,
                Some((best_hostname, best_score, best_current_util)) => {
                    (score, current_util, hostname) < (*best_score, *best_current_util, best_hostname)
                }
            };
            if is_better {
                best = Some((hostname.clone(), score, current_util));
            }
        }

        best.map(|(hostname, _, _)| hostname)
    }

    /// Warms the placement port's per-run trait cache for every host, concurrently, so the
    /// per-candidate scoring loop in `best_target` mostly hits cache instead of serializing one
    /// placement round-trip per host per candidate.
    async fn prefetch_traits(&self) {
        let hostnames: Vec<String> = self.cluster.hostnames().cloned().collect();
        join_all(hostnames.iter().map(|hostname| self.host_traits(hostname))).await;
    }

    /// Runs the planner to completion: iterates candidates once in sorted order, committing
    /// successful target selections against the shadow cluster, and returns the ordered plan.
    pub async fn plan(mut self) -> Vec<PlannedMove> {
        let candidates = self.gather_candidates().await;
        log::info!("found {} migration candidates", candidates.len());

        if !candidates.is_empty() {
            self.prefetch_traits().await;
        }

        let mut moves = Vec::new();

        for candidate in candidates {
            match self.best_target(&candidate).await {
                Some(target) => match self.cluster.try_commit(&candidate.vm.id, &candidate.source, &target, &candidate.flavor)
                {
                    Ok(()) => {
                        log::info!("planned: {} from {} to {}", candidate.vm.name, candidate.source, target);
                        moves.push(PlannedMove {
                            vm: candidate.vm,
                            source: candidate.source,
                            target,
                        });
                    }
                    Err(reason) => {
                        log::error!("rejected move of {}: {reason}", candidate.vm.id);
                    }
                },
                None => {
                    log::debug!("no suitable target found for vm {}", candidate.vm.name);
                }
            }
        }

        moves
    }
}
