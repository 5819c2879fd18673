use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kube_cleanup::progress::ProgressReporter;
use kube_cleanup::{run_list, ListArgs};

#[derive(Parser)]
#[command(name = "kube-cleanup")]
#[command(version, about = "Kubernetes garbage collector: lists orphaned and broken resources", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List orphaned and broken resources
    #[command(visible_alias = "ls")]
    List(ListArgs),
}

fn init_tracing(cli: &Cli) {
    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(cli.debug); // Show target module in debug mode

    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => builder.with_max_level(level).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let Some(Commands::List(args)) = cli.command else {
        println!("For usage, run kube-cleanup --help");
        anyhow::bail!("Command not specified");
    };

    let mut progress = ProgressReporter::new(!args.no_progress);

    let report = run_list(&args, &mut progress).await?;
    info!(
        "Found {} problems in {} namespaces",
        report.violation_count(),
        report.namespaces.len()
    );

    print!("{}", report.render(args.output)?);

    if args.fail_on_findings && !report.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
