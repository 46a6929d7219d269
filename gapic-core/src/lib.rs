//! # Gapic Core
//!
//! `gapic-core` is the runtime shared by every generated API client (Echo, Identity, Messaging,
//! Testing, ...). The generated code only declares messages and method descriptors; everything
//! with actual control flow lives here.
//!
//! ## Key Components
//!
//! * **[`Transport`]:** Turns a logical RPC into wire traffic. It exposes the four gRPC call
//!   shapes plus long-running operation polling. [`GrpcTransport`] is the `tonic` implementation.
//! * **[`wrap`] & [`WrappedMethod`]:** The call wrapper. It layers retry, per-attempt timeout and
//!   metadata policy uniformly over any call shape.
//! * **[`Pager`]:** Presents a paginated list method as one lazy sequence of pages or items.
//! * **[`OperationFuture`]:** Presents a server-side long-running job as a pollable value with
//!   blocking-result and completion-callback semantics.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gapic_core::{CallOptions, ClientOptions, GrpcTransport, MethodConfig, RetryPolicy, wrap};
//! use gapic_core::method::{CallShape, MethodDescriptor};
//! use gapic_core::proto::longrunning::{GetOperationRequest, Operation};
//!
//! const GET: MethodDescriptor =
//!     MethodDescriptor::new("google.longrunning.Operations", "GetOperation", CallShape::Unary);
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = GrpcTransport::connect(&ClientOptions::default(), None).await?;
//! let get = wrap::<_, GetOperationRequest, Operation>(
//!     transport,
//!     GET,
//!     MethodConfig::new().with_retry(RetryPolicy::default()),
//! );
//!
//! let request = GetOperationRequest { name: "operations/42".to_string() };
//! let operation = get.unary(request, CallOptions::new()).await?;
//! println!("done: {}", operation.done);
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-types` and `tonic` so that generated clients
//! use compatible versions of these underlying dependencies.
pub mod config;
pub mod error;
pub mod method;
pub mod operation;
pub mod options;
pub mod pager;
pub mod proto;
pub mod request;
pub mod retry;
pub mod transport;
pub mod wrapper;

pub use config::{ClientConfig, ConfigError};
pub use error::{Error, JobError};
pub use method::{CallShape, MethodDescriptor};
pub use operation::{OperationFuture, OperationPoller, PollPolicy};
pub use options::{CallOptions, ClientOptions, MethodConfig};
pub use pager::{Page, PagedRequest, Pager};
pub use request::coerce_request;
pub use retry::{Backoff, RetryDecision, RetryPolicy};
pub use transport::{
    RequestStream, ResponseStream, Transport, TransportError,
    credentials::{Anonymous, Credentials, CredentialsError, CredentialsProvider, EnvironmentCredentials},
    grpc::{ConnectError, GrpcTransport},
    registry::{TransportFactory, TransportRegistry},
};
pub use wrapper::{WrappedMethod, wrap};

// Re-exports
pub use prost;
pub use prost_types;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
