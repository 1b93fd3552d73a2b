//! Gate configuration, injected explicitly into handlers and middleware.
//!
//! Nothing in the core reads the process environment; the CLI builds one
//! `GateConfig` at startup so tests can substitute their own secrets and
//! TTLs. The signing key is required up front: there is deliberately no
//! fallback to a shared or generic secret.

use secrecy::SecretString;
use url::Url;

pub const DEFAULT_GATE_TTL_SECONDS: i64 = 300;
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_SIGN_IN_URL: &str = "/login";

#[derive(Clone, Debug)]
pub struct GateConfig {
    slug: String,
    entry_secret: SecretString,
    signing_key: SecretString,
    admin_email: Option<String>,
    gate_ttl_seconds: i64,
    base_url: String,
    sign_in_url: String,
    mail_endpoint: Option<Url>,
    session_secret: Option<SecretString>,
}

impl GateConfig {
    #[must_use]
    pub fn new(slug: String, entry_secret: SecretString, signing_key: SecretString) -> Self {
        Self {
            slug,
            entry_secret,
            signing_key,
            admin_email: None,
            gate_ttl_seconds: DEFAULT_GATE_TTL_SECONDS,
            base_url: DEFAULT_BASE_URL.to_string(),
            sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
            mail_endpoint: None,
            session_secret: None,
        }
    }

    #[must_use]
    pub fn with_admin_email(mut self, email: String) -> Self {
        self.admin_email = Some(email);
        self
    }

    #[must_use]
    pub fn with_gate_ttl_seconds(mut self, seconds: i64) -> Self {
        self.gate_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_sign_in_url(mut self, sign_in_url: String) -> Self {
        self.sign_in_url = sign_in_url;
        self
    }

    #[must_use]
    pub fn with_mail_endpoint(mut self, endpoint: Url) -> Self {
        self.mail_endpoint = Some(endpoint);
        self
    }

    #[must_use]
    pub fn with_session_secret(mut self, secret: SecretString) -> Self {
        self.session_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn entry_secret(&self) -> &SecretString {
        &self.entry_secret
    }

    #[must_use]
    pub fn signing_key(&self) -> &SecretString {
        &self.signing_key
    }

    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    #[must_use]
    pub fn gate_ttl_seconds(&self) -> i64 {
        self.gate_ttl_seconds
    }

    #[must_use]
    pub fn sign_in_url(&self) -> &str {
        &self.sign_in_url
    }

    #[must_use]
    pub fn mail_endpoint(&self) -> Option<&Url> {
        self.mail_endpoint.as_ref()
    }

    #[must_use]
    pub fn session_secret(&self) -> Option<&SecretString> {
        self.session_secret.as_ref()
    }

    /// Only mark cookies secure when the gate is served over HTTPS.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}
