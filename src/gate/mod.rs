//! The admin entry gate core: signed tokens, one-time codes, cookies, and
//! the authorizer consulted by the `/admin` middleware.

pub mod authorize;
pub mod config;
pub mod cookies;
pub mod otp;
pub mod token;

pub use authorize::Authorizer;
pub use config::GateConfig;

use crate::api::email::EmailSender;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared request state: configuration, the email collaborator, and the
/// authorizer derived from the configuration.
pub struct GateState {
    config: GateConfig,
    sender: Arc<dyn EmailSender>,
    authorizer: Authorizer,
}

impl GateState {
    #[must_use]
    pub fn new(config: GateConfig, sender: Arc<dyn EmailSender>) -> Self {
        let authorizer = Authorizer::for_config(&config);
        Self {
            config,
            sender,
            authorizer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn sender(&self) -> &dyn EmailSender {
        self.sender.as_ref()
    }

    #[must_use]
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }
}

/// Wall-clock now as epoch milliseconds; token expiries use this scale.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
