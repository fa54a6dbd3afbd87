//! Client configuration and builder.

use std::fmt;
use std::time::Duration;

use crate::auth::Auth;
use crate::error::{ClientError, Result};

/// Immutable settings for one `HttpClient`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Root URL of the web application, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Attached to every request when present.
    pub auth: Option<Auth>,
    /// Whole-request timeout handed to the transport. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Largest response body read, in bytes. `None` reads bodies of any size.
    pub max_body_size: Option<u64>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Usage("base_url cannot be empty".to_string()));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ClientError::Usage("timeout must be greater than zero".to_string()));
        }
        if self.max_body_size == Some(0) {
            return Err(ClientError::Usage(
                "max_body_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(|_| "***REDACTED***"))
            .field("timeout", &self.timeout)
            .field("max_body_size", &self.max_body_size)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: base_url.into(),
                auth: None,
                timeout: None,
                max_body_size: None,
                user_agent: format!("metaserv-client/{}", env!("CARGO_PKG_VERSION")),
            },
        }
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.config.auth = Some(auth);
        self
    }

    /// Set or clear the authentication strategy.
    pub fn auth_opt(mut self, auth: Option<Auth>) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn max_body_size(mut self, bytes: u64) -> Self {
        self.config.max_body_size = Some(bytes);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
