//! pgtune - PostgreSQL configuration generator.
//!
//! Writes tuned `postgresql.conf` settings (and kernel shared memory limits for
//! old PostgreSQL versions) and prints a JSON report of what was generated.
//!
//! Usage:
//!   pgtune --db-version 9.6 --db-type web --postgresql-file /etc/postgresql/tune.conf
//!   pgtune --db-version 9.3 --db-type dw --total-memory 16GB --max-connections 50 \
//!          --postgresql-file ./tune.conf --sysctl-file ./sysctl_tune.conf
//!   pgtune --db-version 16 --db-type oltp --postgresql-file ./tune.conf --dry-run

use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

use pgtune_core::collector::RealFs;
use pgtune_core::tune::{DEFAULT_PROC_PATH, TuneRequest, plan, tune};

/// PostgreSQL configuration generator.
#[derive(Parser)]
#[command(name = "pgtune", about = "PostgreSQL configuration generator", version)]
struct Args {
    /// PostgreSQL version (e.g. 9.3, 9.6, 16).
    #[arg(long, env = "PGTUNE_DB_VERSION")]
    db_version: String,

    /// Workload type: web, oltp, dw, desktop or mixed.
    #[arg(long, env = "PGTUNE_DB_TYPE")]
    db_type: String,

    /// Memory usable by PostgreSQL (e.g. "1000MB", "16GB").
    /// Default: total memory from /proc/meminfo.
    #[arg(long, env = "PGTUNE_TOTAL_MEMORY")]
    total_memory: Option<String>,

    /// Tune for this percentage of total memory (1-100).
    #[arg(long, env = "PGTUNE_TOTAL_MEMORY_PERCENTAGE", default_value = "100")]
    total_memory_percentage: u32,

    /// Maximum number of client connections.
    /// Out of range values (outside 1-9999) fall back to the workload default.
    #[arg(long, env = "PGTUNE_MAX_CONNECTIONS", allow_negative_numbers = true)]
    max_connections: Option<i64>,

    /// Leave max_connections out of the generated file.
    /// Settings are still computed for --max-connections.
    #[arg(long, env = "PGTUNE_DISABLE_MAX_CONNECTIONS")]
    disable_max_connections: bool,

    /// Output path for PostgreSQL settings.
    #[arg(long, env = "PGTUNE_POSTGRESQL_FILE")]
    postgresql_file: PathBuf,

    /// Output path for kernel settings. Not written if omitted.
    #[arg(long, env = "PGTUNE_SYSCTL_FILE")]
    sysctl_file: Option<PathBuf>,

    /// Target operating system: linux or windows.
    #[arg(long, env = "PGTUNE_OS_TYPE", default_value = "linux")]
    os_type: String,

    /// Path to /proc filesystem (for memory detection).
    #[arg(long, default_value = DEFAULT_PROC_PATH)]
    proc_path: PathBuf,

    /// Print the generated files instead of writing them.
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn to_request(&self) -> TuneRequest {
        TuneRequest {
            total_memory: self.total_memory.clone(),
            total_memory_percentage: self.total_memory_percentage,
            max_connections: self.max_connections,
            disable_max_connections: self.disable_max_connections,
            sysctl_file: self.sysctl_file.clone(),
            os_type: self.os_type.clone(),
            proc_path: self.proc_path.clone(),
            ..TuneRequest::new(&self.db_version, &self.db_type, &self.postgresql_file)
        }
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr; stdout carries the report.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("pgtune={}", level).parse().unwrap())
        .add_directive(format!("pgtune_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let request = args.to_request();
    let fs = RealFs::new();

    if args.dry_run {
        match plan(&request, &fs) {
            Ok(plan) => {
                println!("# {}", request.postgresql_file.display());
                print!("{}", plan.render_postgres());
                if let Some(ref path) = request.sysctl_file {
                    println!();
                    println!("# {}", path.display());
                    print!("{}", plan.render_kernel());
                }
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let report = match tune(&request, &fs) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
