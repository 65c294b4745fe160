//! # `kubeflake`
//!
//! Mints and inspects kubeflake ids from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # ten ids for machine 3 of the cluster in the current AWS region
//! kubeflake --cluster-id aws --machine-id static:3 next -n 10
//!
//! # inside a StatefulSet pod, keys instead of ids
//! KUBEFLAKE_MACHINE_ID=statefulset kubeflake next --keys
//!
//! # what is in this id?
//! kubeflake decompose 1409630387
//! ```

mod commands;
mod config;
mod telemetry;

use clap::Parser;

use crate::config::{CliArgs, Config};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Config::try_from(args)?;

    telemetry::init_tracing()?;
    tracing::debug!(?config, "starting");

    let stdout = std::io::stdout();
    commands::run(config, &mut stdout.lock())
}
