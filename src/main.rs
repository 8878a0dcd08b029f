//! npexec CLI for ephemeral package execution.

use clap::Parser;
use npexec::core::error::ExecError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "npexec",
    version,
    about = "Run a package's bin from the local tree or a shared cache, installing on demand"
)]
struct Cli {
    #[command(subcommand)]
    command: npexec::cli::Commands,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NPEXEC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(e: &ExecError) {
    eprintln!("error: {}", e);
    match e {
        ExecError::Usage { usage, .. } => eprintln!("\n{}", usage),
        ExecError::NoExecutable { pkgid } => eprintln!("package: {}", pkgid),
        _ => {}
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = npexec::cli::dispatch(cli.command).await {
        report(&e);
        std::process::exit(e.exit_code());
    }
}
