//! # Showcase
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide the Echo showcase messages, a
//! gRPC server and a generated-style client for integration testing `gapic-core`.
//! It is not intended for production use.
use std::sync::Arc;
use tonic::service::Routes;

pub mod client;
pub mod pb;

pub mod longrunning {
    //! Server side of `google.longrunning.Operations`. The messages are `gapic_core`'s.
    tonic::include_proto!("google.longrunning");
}

pub use client::EchoClient;
pub use longrunning::operations_server::{Operations, OperationsServer};
pub use pb::echo_server::{Echo, EchoServer};

/// Serves `showcase` as the Echo service and as the Operations service `Wait` reports to.
///
/// The result is a `GrpcService`, so a transport can call it without a network.
pub fn routes<T: Echo + Operations>(showcase: Arc<T>) -> Routes {
    Routes::new(EchoServer::from_arc(Arc::clone(&showcase)))
        .add_service(OperationsServer::from_arc(showcase))
}
