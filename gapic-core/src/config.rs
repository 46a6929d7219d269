//! # Client Configuration
//!
//! Generated clients ship their per-method defaults as a gapic client-config JSON document:
//!
//! ```json
//! {
//!   "interfaces": {
//!     "google.showcase.v1beta1.Echo": {
//!       "retry_codes": { "idempotent": ["UNAVAILABLE", "DEADLINE_EXCEEDED"] },
//!       "retry_params": {
//!         "default": {
//!           "initial_retry_delay_millis": 100,
//!           "retry_delay_multiplier": 1.3,
//!           "max_retry_delay_millis": 60000,
//!           "total_timeout_millis": 600000
//!         }
//!       },
//!       "methods": {
//!         "Echo": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! [`ClientConfig::method_config`] turns one `methods` entry into a [`MethodConfig`].
use crate::{method::MethodDescriptor, options::MethodConfig, retry::RetryPolicy};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use tonic::Code;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse client config: '{0}'")]
    Parse(#[from] serde_json::Error),
    #[error("Method '{method}' refers to unknown retry codes '{name}'")]
    UnknownRetryCodes { method: String, name: String },
    #[error("Method '{method}' refers to unknown retry params '{name}'")]
    UnknownRetryParams { method: String, name: String },
    #[error("Unknown status code '{0}'")]
    UnknownCode(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub interfaces: HashMap<String, InterfaceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceConfig {
    #[serde(default)]
    pub retry_codes: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub retry_params: HashMap<String, RetryParams>,
    #[serde(default)]
    pub methods: HashMap<String, MethodSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryParams {
    pub initial_retry_delay_millis: u64,
    pub retry_delay_multiplier: f64,
    pub max_retry_delay_millis: u64,
    #[serde(default)]
    pub initial_rpc_timeout_millis: Option<u64>,
    #[serde(default)]
    pub rpc_timeout_multiplier: Option<f64>,
    #[serde(default)]
    pub max_rpc_timeout_millis: Option<u64>,
    pub total_timeout_millis: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodSettings {
    #[serde(default)]
    pub timeout_millis: Option<u64>,
    #[serde(default)]
    pub retry_codes_name: Option<String>,
    #[serde(default)]
    pub retry_params_name: Option<String>,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults of `service`/`method`.
    ///
    /// A service or method missing from the document gets [`MethodConfig::default`]: no retry,
    /// no timeout.
    pub fn method_config(&self, service: &str, method: &str) -> Result<MethodConfig, ConfigError> {
        let Some(interface) = self.interfaces.get(service) else {
            return Ok(MethodConfig::default());
        };
        let Some(settings) = interface.methods.get(method) else {
            return Ok(MethodConfig::default());
        };
        let qualified = || format!("{service}/{method}");

        let params = match &settings.retry_params_name {
            Some(name) => Some(interface.retry_params.get(name).ok_or_else(|| {
                ConfigError::UnknownRetryParams {
                    method: qualified(),
                    name: name.clone(),
                }
            })?),
            None => None,
        };

        let retry = match &settings.retry_codes_name {
            Some(name) => {
                let names = interface.retry_codes.get(name).ok_or_else(|| {
                    ConfigError::UnknownRetryCodes {
                        method: qualified(),
                        name: name.clone(),
                    }
                })?;
                let codes = names
                    .iter()
                    .map(String::as_str)
                    .map(parse_code)
                    .collect::<Result<Vec<_>, _>>()?;
                Some(retry_policy(codes, params))
            }
            None => None,
        };

        let timeout = params
            .and_then(|p| p.initial_rpc_timeout_millis)
            .or(settings.timeout_millis)
            .map(Duration::from_millis);

        Ok(MethodConfig { retry, timeout })
    }

    pub fn method_config_for(&self, method: &MethodDescriptor) -> Result<MethodConfig, ConfigError> {
        self.method_config(method.service(), method.name())
    }
}

fn retry_policy(codes: Vec<Code>, params: Option<&RetryParams>) -> RetryPolicy {
    let policy = RetryPolicy::default().with_retryable_codes(codes);
    match params {
        Some(params) => policy
            .with_initial_delay(Duration::from_millis(params.initial_retry_delay_millis))
            .with_multiplier(params.retry_delay_multiplier)
            .with_max_delay(Duration::from_millis(params.max_retry_delay_millis))
            .with_max_elapsed(Some(Duration::from_millis(params.total_timeout_millis))),
        None => policy,
    }
}

/// Parses a canonical status code name such as `UNAVAILABLE`.
pub fn parse_code(name: &str) -> Result<Code, ConfigError> {
    let code = match name {
        "OK" => Code::Ok,
        "CANCELLED" => Code::Cancelled,
        "UNKNOWN" => Code::Unknown,
        "INVALID_ARGUMENT" => Code::InvalidArgument,
        "DEADLINE_EXCEEDED" => Code::DeadlineExceeded,
        "NOT_FOUND" => Code::NotFound,
        "ALREADY_EXISTS" => Code::AlreadyExists,
        "PERMISSION_DENIED" => Code::PermissionDenied,
        "RESOURCE_EXHAUSTED" => Code::ResourceExhausted,
        "FAILED_PRECONDITION" => Code::FailedPrecondition,
        "ABORTED" => Code::Aborted,
        "OUT_OF_RANGE" => Code::OutOfRange,
        "UNIMPLEMENTED" => Code::Unimplemented,
        "INTERNAL" => Code::Internal,
        "UNAVAILABLE" => Code::Unavailable,
        "DATA_LOSS" => Code::DataLoss,
        "UNAUTHENTICATED" => Code::Unauthenticated,
        other => return Err(ConfigError::UnknownCode(other.to_string())),
    };
    Ok(code)
}
