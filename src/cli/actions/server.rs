use crate::api;
use crate::api::email::{EmailSender, HttpEmailSender, LogEmailSender};
use crate::cli::actions::Action;
use crate::gate::GateState;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Start the gate server with the configured email transport.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server { port, config } = action;

    let sender: Arc<dyn EmailSender> = match config.mail_endpoint() {
        Some(endpoint) => Arc::new(HttpEmailSender::new(endpoint.clone())?),
        None => {
            info!("no mail endpoint configured, entry codes will be logged");
            Arc::new(LogEmailSender)
        }
    };

    let state = Arc::new(GateState::new(config, sender));

    api::new(port, state).await
}
