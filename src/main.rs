//! CLI entry point: parses arguments, resolves credentials, wires the real ports, runs one
//! balancing pass, and maps the outcome to a process exit code.

use clap::Parser;

use fleet_rebalancer::auth;
use fleet_rebalancer::cli::Cli;
use fleet_rebalancer::config::Config;
use fleet_rebalancer::logging;
use fleet_rebalancer::orchestrator::{self, RunOutcome};
use fleet_rebalancer::ports::cloud::OpenStackCloudClient;
use fleet_rebalancer::ports::placement::HttpPlacementClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    match run(&cli).await {
        Ok(outcome) => {
            log_outcome(&outcome);
            std::process::ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome, fleet_rebalancer::error::BalancerError> {
    let config = Config::from_env()?;
    let http = reqwest::Client::new();
    let session = auth::authenticate(&config, &http).await?;

    let cloud = OpenStackCloudClient::new(http.clone(), session.clone());
    let placement = HttpPlacementClient::new(http, session);

    orchestrator::run(&cloud, &placement, cli.threshold, cli.dry_run, cli.show_resources).await
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::ShowedResources => log::debug!("resource report complete"),
        RunOutcome::Balanced => log::debug!("no migrations needed"),
        RunOutcome::NoTargets => log::debug!("no eligible migration targets"),
        RunOutcome::Executed(summary) => {
            log::debug!("plan executed: {}/{} successful", summary.successful, summary.attempted)
        }
    }
}
