use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use manual_exec::command::{Cli, execute};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Keep the HTTP transport quiet unless RUST_LOG asks for it.
    let mut filter = EnvFilter::new("info,hyper_util=warn,reqwest=warn,alloy_transport_http=warn");
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        if let Ok(parsed) = env_filter.parse() {
            filter = filter.add_directive(parsed);
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(outcome) if outcome.already_executed() => {
            info!("sequence number {} was already executed", outcome.sequence_number);
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("manual execution failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
