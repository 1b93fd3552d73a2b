use anyhow::Result;
use varco::cli::{self, actions::Action, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = match action {
        server @ Action::Server { .. } => cli::actions::server::handle(server).await,
    };

    telemetry::shutdown_tracer();

    result
}
