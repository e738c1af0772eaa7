use clap::Parser;

use gogbackup_cli::logging::init_tracing;
use gogbackup_cli::signals::forward_signals;
use gogbackup_cli::{BackupConfig, BackupContext, Cli, CliError, bootstrap};
use gogbackup_pipeline::FORCE_EXIT_CODE;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match start(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "Unable to start backup");
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let signals = forward_signals()?;
    let cancel = ctx.shutdown.cancellation_token();

    tokio::select! {
        summary = ctx.pipeline.run(cancel) => {
            if summary.failed > 0 {
                tracing::warn!(failed = summary.failed, "Some files could not be backed up");
            }
            println!("{summary}");
            Ok(())
        }
        reason = ctx.shutdown.supervise(signals) => {
            tracing::warn!(?reason, "Forcing exit with transfers still in flight");
            std::process::exit(FORCE_EXIT_CODE);
        }
    }
}

async fn start(cli: &Cli) -> Result<BackupContext, CliError> {
    bootstrap(BackupConfig::from_cli(cli)?).await
}
