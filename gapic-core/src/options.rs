//! # Call & Client Options
//!
//! * [`CallOptions`]: per-call overrides (retry, timeout, metadata).
//! * [`MethodConfig`]: per-method defaults, fixed when the method is wrapped.
//! * [`ClientOptions`]: where and how a transport connects.
use crate::retry::RetryPolicy;
use std::time::Duration;

/// The endpoint generated clients talk to when none is configured.
pub const DEFAULT_ENDPOINT: &str = "localhost:7469";

/// Per-call settings.
///
/// `None` for `retry` or `timeout` means "use the method default".
/// Pass [`RetryPolicy::disabled`] to turn retries off for one call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub retry: Option<RetryPolicy>,
    /// Budget for each attempt, not for the whole call.
    pub timeout: Option<Duration>,
    /// Custom gRPC metadata (headers), sent unchanged on every attempt.
    pub metadata: Vec<(String, String)>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Defaults a method applies when a call does not override them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodConfig {
    pub retry: Option<RetryPolicy>,
    pub timeout: Option<Duration>,
}

impl MethodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Connection settings consumed by transport factories.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `host`, `host:port` or a full URI.
    pub endpoint: String,
    /// Label of the transport to build. `None` selects the registry's first transport.
    pub transport: Option<String>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport: None,
            connect_timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_transport(mut self, label: impl Into<String>) -> Self {
        self.transport = Some(label.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The URI the channel is built from.
    ///
    /// A bare host gets the default HTTPS port (`:443`) and an endpoint without scheme is
    /// addressed over `http://`. Full URIs are used as they are.
    pub fn uri(&self) -> String {
        if self.endpoint.contains("://") {
            return self.endpoint.clone();
        }

        if self.endpoint.contains(':') {
            format!("http://{}", self.endpoint)
        } else {
            format!("http://{}:443", self.endpoint)
        }
    }
}
