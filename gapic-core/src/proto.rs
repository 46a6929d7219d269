//! # Long-Running Operation Protos
//!
//! `prost` bindings for the parts of `google.longrunning` and `google.rpc` the operation
//! machinery needs. They are wire compatible with the upstream definitions, so any server
//! implementing `google.longrunning.Operations` can be polled.

pub mod rpc {
    /// A structured error: a `google.rpc.Code` value, a developer-facing message and
    /// optional typed details.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Status {
        #[prost(int32, tag = "1")]
        pub code: i32,
        #[prost(string, tag = "2")]
        pub message: ::prost::alloc::string::String,
        #[prost(message, repeated, tag = "3")]
        pub details: ::prost::alloc::vec::Vec<::prost_types::Any>,
    }
}

pub mod longrunning {
    use crate::method::{CallShape, MethodDescriptor};

    pub const OPERATIONS_SERVICE: &str = "google.longrunning.Operations";

    pub const GET_OPERATION: MethodDescriptor =
        MethodDescriptor::new(OPERATIONS_SERVICE, "GetOperation", CallShape::Unary);

    pub const CANCEL_OPERATION: MethodDescriptor =
        MethodDescriptor::new(OPERATIONS_SERVICE, "CancelOperation", CallShape::Unary);

    /// A server-tracked asynchronous job.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Operation {
        /// Server-assigned name, unique within the service that returned it.
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        /// Service-specific progress information.
        #[prost(message, optional, tag = "2")]
        pub metadata: ::core::option::Option<::prost_types::Any>,
        /// If `true`, exactly one of `error` or `response` is set in `result`.
        #[prost(bool, tag = "3")]
        pub done: bool,
        #[prost(oneof = "operation::Result", tags = "4, 5")]
        pub result: ::core::option::Option<operation::Result>,
    }

    pub mod operation {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Result {
            /// The job failed or was cancelled.
            #[prost(message, tag = "4")]
            Error(super::super::rpc::Status),
            /// The job succeeded.
            #[prost(message, tag = "5")]
            Response(::prost_types::Any),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetOperationRequest {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CancelOperationRequest {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
    }
}
