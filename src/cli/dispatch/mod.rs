use crate::api::email::valid_email;
use crate::cli::actions::Action;
use crate::gate::GateConfig;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use url::Url;

/// Turn parsed arguments into an [`Action`], validating configuration up
/// front so the service fails at startup rather than mid-flow.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{name}"))
    };

    let mut config = GateConfig::new(
        required("slug")?,
        SecretString::from(required("entry-secret")?),
        SecretString::from(required("signing-key")?),
    );

    if let Some(email) = matches.get_one::<String>("admin-email") {
        if !valid_email(email) {
            return Err(anyhow!("invalid admin email address: {email}"));
        }
        config = config.with_admin_email(email.clone());
    }

    if let Some(ttl) = matches.get_one::<i64>("gate-ttl").copied() {
        if ttl <= 0 {
            return Err(anyhow!("gate ttl must be positive, got {ttl}"));
        }
        config = config.with_gate_ttl_seconds(ttl);
    }

    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.clone());
    }

    if let Some(sign_in_url) = matches.get_one::<String>("sign-in-url") {
        config = config.with_sign_in_url(sign_in_url.clone());
    }

    if let Some(mail_url) = matches.get_one::<String>("mail-url") {
        let endpoint = Url::parse(mail_url)
            .with_context(|| format!("invalid mail endpoint URL: {mail_url}"))?;
        config = config.with_mail_endpoint(endpoint);
    }

    if let Some(session_secret) = matches.get_one::<String>("session-secret") {
        config = config.with_session_secret(SecretString::from(session_secret.clone()));
    }

    Ok(Action::Server { port, config })
}
