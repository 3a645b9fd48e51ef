// src/main.rs

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use factory_status::Error;
use factory_status::account::{AccountRegistry, ProjectRef};
use factory_status::client::ApiClient;
use factory_status::progress::{ConsoleProgress, NoProgress, ProgressReporter};
use factory_status::reconcile::reconcile;
use factory_status::report;
use factory_status::snapshot::{PackageListing, ProjectSpec, Resolver, Snapshot};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

/// Upper bound for `--jobs`; build.rs mirrors it for the man page
const MAX_JOBS: i64 = 64;

const USAGE: &str =
    "factory-status: [https://API_URL/]DEVEL_PROJECTS [https://API_URL/]FACTORY_PROJECT";

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "factory-status")]
#[command(author, version, about = "Compare devel projects against a Factory project", long_about = None)]
struct Cli {
    /// Devel projects followed by the Factory project, each PROJECT or https://API_URL/PROJECT
    projects: Vec<String>,

    /// osc configuration file (default: $OSC_CONFIG, ~/.config/osc/oscrc or ~/.oscrc)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API URL used for bare project names (overrides [general] apiurl)
    #[arg(long)]
    api_url: Option<String>,

    /// Maximum number of concurrent history requests (1-64)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=MAX_JOBS))]
    jobs: u16,

    /// Do not draw the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Split positional arguments into devel references and the Factory reference
fn split_projects(args: &[String]) -> factory_status::Result<(Vec<ProjectRef>, ProjectRef)> {
    let Some((factory, devel)) = args.split_last() else {
        return Err(Error::Usage(USAGE.to_string()));
    };
    if devel.is_empty() {
        return Err(Error::Usage(USAGE.to_string()));
    }

    let devel = devel
        .iter()
        .map(|reference| ProjectRef::parse(reference))
        .collect::<factory_status::Result<Vec<_>>>()?;
    let factory = ProjectRef::parse(factory)?;

    Ok((devel, factory))
}

/// Default log filter for a `-v` count
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level(cli.verbose))),
        )
        .with_writer(io::stderr)
        .init();

    let (devel_refs, factory_ref) = match split_projects(&cli.projects) {
        Ok(refs) => refs,
        Err(Error::Usage(message)) => {
            eprintln!("{}", message);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut registry = AccountRegistry::load(cli.config.as_deref())?;
    if let Some(api_url) = &cli.api_url {
        registry = registry.with_default_api_url(api_url);
    }
    info!("Default API URL: {}", registry.default_api_url());

    let devel_specs = devel_refs
        .iter()
        .map(|reference| ProjectSpec::from_ref(&registry, reference))
        .collect::<factory_status::Result<Vec<_>>>()?;
    let factory_spec = ProjectSpec::from_ref(&registry, &factory_ref)?;

    let client = ApiClient::new()?;
    let text = cli.format == OutputFormat::Text;

    if text {
        print!("Loading revision data... ");
        io::stdout().flush()?;
    }

    let devel = PackageListing::from_projects(&client, &devel_specs)?;
    let factory = PackageListing::from_projects(&client, std::slice::from_ref(&factory_spec))?;

    let console = ConsoleProgress::new()?;
    let progress: &dyn ProgressReporter = if cli.quiet { &NoProgress } else { &console };
    let snapshots = Resolver::new(progress)
        .with_jobs(usize::from(cli.jobs))
        .resolve(&client, vec![devel, factory])?;
    let [devel, factory]: [Snapshot; 2] = snapshots
        .try_into()
        .map_err(|_| anyhow::anyhow!("Expected devel and Factory snapshots"))?;

    let result = reconcile(&devel, &factory);
    info!(
        "{} package(s) to update, {} obsolete",
        result.to_update.len(),
        result.to_remove.len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if text {
        writeln!(out)?;
        writeln!(out, "Loaded revision data.")?;
        writeln!(out)?;
        report::write_text(&mut out, &result)?;
    } else {
        report::write_json(&mut out, &result)?;
    }

    Ok(())
}
