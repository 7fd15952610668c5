//! Core HTTP transport struct and constructors

use {
    super::url_builder::UrlBuilder,
    crate::err::ClientResult,
    anyhow::Context,
    reqwest::Client,
    std::{fmt, time::Duration},
    tracing::debug,
    url::Url,
};

/// Default server address for a local node.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8529";
/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`HttpTransport`].
#[derive(Clone)]
pub struct HttpConfig {
    pub endpoint: Url,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            // constant is a valid URL
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint parses"),
            user: "root".to_string(),
            password: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Printed in place of the password.
const REDACTED: &str = "<redacted>";

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpConfig {
    /// Read settings from `ARANGODB_URL`, `ARANGODB_USER`, `ARANGODB_PASSWORD`
    /// and `ARANGODB_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ARANGODB_URL") {
            config.endpoint =
                Url::parse(&url).with_context(|| format!("invalid ARANGODB_URL '{}'", url))?;
        }
        if let Ok(user) = std::env::var("ARANGODB_USER") {
            config.user = user;
        }
        if let Ok(password) = std::env::var("ARANGODB_PASSWORD") {
            config.password = password;
        }
        if let Ok(secs) = std::env::var("ARANGODB_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid ARANGODB_TIMEOUT_SECS '{}'", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        anyhow::ensure!(
            !config.endpoint.cannot_be_a_base(),
            "endpoint {} cannot be used as a base URL",
            config.endpoint
        );
        Ok(config)
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }
}

/// [`ArangoTransport`](crate::ArangoTransport) over the server's REST API.
#[derive(Clone)]
pub struct HttpTransport {
    pub endpoint: Url,
    pub(crate) http: Client,
    pub(crate) user: String,
    pub(crate) password: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("user", &self.user)
            .field("password", &REDACTED)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a transport for a local node with default credentials.
    ///
    /// # Example
    /// ```ignore
    /// let transport = HttpTransport::local_node()?;
    /// ```
    pub fn local_node() -> ClientResult<Self> {
        Self::new(HttpConfig::default())
    }

    pub fn new(config: HttpConfig) -> ClientResult<Self> {
        debug!("configuring HTTP transport for {}", config.endpoint);
        Ok(Self {
            http: Client::builder().timeout(config.timeout).build()?,
            endpoint: config.endpoint,
            user: config.user,
            password: config.password,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(HttpConfig::from_env()?)?)
    }

    pub(crate) fn build_url(&self) -> UrlBuilder<'_> {
        UrlBuilder::new(&self.endpoint)
    }

    pub(crate) fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_local_node() {
        let config = HttpConfig::default();
        assert_eq!(config.endpoint.as_str(), "http://localhost:8529/");
        assert_eq!(config.user, "root");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn credentials_can_be_overridden() {
        let config = HttpConfig::default().with_credentials("alice", "secret");
        assert_eq!(config.user, "alice");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn debug_output_hides_the_password() {
        let config = HttpConfig::default().with_credentials("alice", "hunter2");
        let printed = format!("{:?}", config);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));

        let transport = HttpTransport::new(config).unwrap();
        let printed = format!("{:?}", transport);
        assert!(printed.contains("localhost:8529"));
        assert!(!printed.contains("hunter2"));
    }
}
