use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::LogKind;
use crate::session::Role;

#[derive(Parser, Debug)]
#[command(name = "idintel", version)]
#[command(about = "Browse, filter and export detection service logs from the terminal", long_about = None)]
#[command(after_help = "ENVIRONMENT:\n  \
    IDINTEL_API_URL      Detection service base URL (default: http://localhost:8081)\n  \
    IDINTEL_EXPORT_DIR   Where exports are written (default: Downloads, then cwd)\n  \
    IDINTEL_ROLE         admin | staff (default: admin)\n  \
    IDINTEL_LOG          Diagnostic log filter, e.g. debug or idintel=trace (default: warn)\n  \
    NO_COLOR             Disable colored output")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Detection service base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Role for this session
    #[arg(long, global = true)]
    pub role: Option<Role>,

    /// Disable colored output (also respects NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List violation records
    Violations(ListArgs),

    /// List verified personnel records
    Verified(ListArgs),

    /// Export the filtered log as CSV
    Export {
        #[arg(value_enum)]
        kind: KindArg,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory (default: IDINTEL_EXPORT_DIR or Downloads)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detection counters and compliance rate
    Stats {
        /// Keep refreshing every 5 seconds
        #[arg(short, long)]
        watch: bool,
    },

    /// Seven-day trend, hourly activity and breakdown (admin only)
    Analytics {
        /// Keep refreshing every 30 seconds
        #[arg(short, long)]
        watch: bool,
    },

    /// Interactive session over one log
    Browse {
        #[arg(value_enum)]
        kind: KindArg,
    },

    /// Views available to the current role
    Nav,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// From date (today, yesterday, 7d, 2w, 1m, YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// To date, inclusive (same formats as --since)
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Violations,
    Verified,
}

impl From<KindArg> for LogKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Violations => LogKind::Violations,
            KindArg::Verified => LogKind::Verified,
        }
    }
}
