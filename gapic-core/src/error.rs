//! # Errors
//!
//! Every fallible operation of the crate surfaces an [`Error`]. Transport failures keep the
//! method name and an echo of the request that failed so that log lines and panics in caller
//! code are actionable without extra context.
use crate::{proto::rpc, transport::TransportError};
use std::time::Duration;
use tonic::Code;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller combined arguments that cannot be used together.
    #[error("{0}")]
    Usage(String),

    #[error("Call to '{method}' failed: '{source}'. Request: {request}")]
    Transport {
        method: String,
        request: String,
        #[source]
        source: TransportError,
    },

    #[error("Call to '{method}' gave up after {attempts} attempt(s): '{source}'")]
    RetryExhausted {
        method: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Operation '{operation}' failed: {error}")]
    Job { operation: String, error: JobError },

    #[error("Operation '{operation}' did not complete within {waited:?}")]
    PollTimeout { operation: String, waited: Duration },

    #[error("Operation '{0}' is done but carries neither a response nor an error")]
    IncompleteOperation(String),

    #[error("Failed to decode '{type_url}': '{source}'")]
    Decode {
        type_url: String,
        #[source]
        source: prost::DecodeError,
    },
}

impl Error {
    /// The gRPC status code behind this error, when there is one.
    pub fn code(&self) -> Option<Code> {
        match self {
            Error::Transport { source, .. } | Error::RetryExhausted { source, .. } => {
                Some(source.code())
            }
            Error::Job { error, .. } => Some(error.code),
            Error::PollTimeout { .. } => Some(Code::DeadlineExceeded),
            Error::Usage(_) => Some(Code::InvalidArgument),
            Error::IncompleteOperation(_) | Error::Decode { .. } => None,
        }
    }
}

/// The error a failed long-running operation finished with.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{code:?}: {message}")]
pub struct JobError {
    pub code: Code,
    pub message: String,
    pub details: Vec<prost_types::Any>,
}

impl From<rpc::Status> for JobError {
    fn from(status: rpc::Status) -> Self {
        Self {
            code: Code::from(status.code),
            message: status.message,
            details: status.details,
        }
    }
}
