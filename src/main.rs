use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use idintel::cli::{Cli, Command, FilterArgs, KindArg};
use idintel::config::{Config, ENV_LOG};
use idintel::session::Session;
use idintel::view::{self, ViewArgs};
use idintel::{interactive, HttpSource, VerifiedRecord, ViolationRecord};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.no_color {
        view::fmt::disable_color();
    }

    let config = Config::from_env().with_overrides(cli.api_url.clone(), cli.role);
    let session = Session::new(config.role);
    tracing::debug!(api_url = %config.api_url, role = %config.role, "starting");

    if let Command::Nav = cli.command {
        view::nav(&session);
        return Ok(());
    }

    let source = Arc::new(
        HttpSource::new(&config.api_url)
            .with_context(|| format!("building client for {}", config.api_url))?,
    );

    match cli.command {
        Command::Violations(args) => {
            view::list::<ViolationRecord, _>(&*source, &view_args(&args.filter, args.page)).await
        }
        Command::Verified(args) => {
            view::list::<VerifiedRecord, _>(&*source, &view_args(&args.filter, args.page)).await
        }
        Command::Export {
            kind,
            filter,
            output,
        } => {
            let dir = output.unwrap_or_else(|| config.export_dir.clone());
            let args = view_args(&filter, 1);
            match kind {
                KindArg::Violations => view::export::<ViolationRecord, _>(&*source, &args, &dir).await,
                KindArg::Verified => view::export::<VerifiedRecord, _>(&*source, &args, &dir).await,
            }
        }
        Command::Stats { watch } => view::stats(source, watch).await,
        Command::Analytics { watch } => view::analytics(source, &session, watch).await,
        Command::Browse { kind } => match kind {
            KindArg::Violations => {
                interactive::run::<ViolationRecord, _>(source, config.export_dir.clone()).await
            }
            KindArg::Verified => {
                interactive::run::<VerifiedRecord, _>(source, config.export_dir.clone()).await
            }
        },
        Command::Nav => Ok(()),
    }
}

/// Diagnostics go to stderr, filtered by `IDINTEL_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn view_args(filter: &FilterArgs, page: usize) -> ViewArgs {
    ViewArgs {
        search: filter.search.clone(),
        since: filter.since.clone(),
        until: filter.until.clone(),
        page,
    }
}
