//! certfix - delete stuck cert-manager certificate requests and their orders.
//!
//! Finds certificate requests that failed or never reported status, pairs
//! them with their ACME orders, and deletes each pair after operator
//! confirmation. Deletion order matters: the request goes first, otherwise
//! cert-manager recreates a fresh order under the stale request and it hangs
//! again.

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cert_remediator::{run, KubeCluster, RunOptions};

/// Remediate hanging cert-manager certificate requests and ACME orders.
#[derive(Parser)]
#[command(name = "certfix", version)]
#[command(about = "Remediate hanging cert-manager certificate requests and ACME orders")]
struct Cli {
    /// Context name from ~/.kube/config
    cluster: String,

    /// Optional namespace to use as filter
    #[arg(short, long)]
    namespace: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Prompt the operator for an explicit go-ahead. Only the literal `Y`
/// confirms; anything else (including `y`) declines.
fn confirm_from_operator() -> bool {
    print!("Is this ok [Y/n]: ");
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    input.trim() == "Y"
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("warn,cert_remediator=debug")
    } else {
        EnvFilter::new("warn,cert_remediator=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cluster = KubeCluster::connect(&cli.cluster).await?;

    let options = RunOptions {
        namespace: cli.namespace,
        ..RunOptions::new(cli.cluster)
    };

    run(&cluster, &options, confirm_from_operator).await;

    Ok(())
}
