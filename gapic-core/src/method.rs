//! # Method Descriptors
//!
//! A [`MethodDescriptor`] identifies one RPC: the fully-qualified service, the method name and
//! the call shape. Generated clients declare them as constants, so everything here is `const`
//! friendly and `Copy`.
use std::{fmt, str::FromStr};

use http::uri::{InvalidUri, PathAndQuery};

/// The four gRPC call shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// One request, one response.
    Unary,
    /// One request, a stream of responses.
    ServerStreaming,
    /// A stream of requests, one aggregated response.
    ClientStreaming,
    /// Independent request and response streams.
    BidiStreaming,
}

impl CallShape {
    /// Derives the shape from the streaming flags of a protobuf method definition.
    pub fn from_streaming(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => CallShape::Unary,
            (false, true) => CallShape::ServerStreaming,
            (true, false) => CallShape::ClientStreaming,
            (true, true) => CallShape::BidiStreaming,
        }
    }

    pub fn is_client_streaming(&self) -> bool {
        matches!(self, CallShape::ClientStreaming | CallShape::BidiStreaming)
    }

    pub fn is_server_streaming(&self) -> bool {
        matches!(self, CallShape::ServerStreaming | CallShape::BidiStreaming)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShape::Unary => write!(f, "unary"),
            CallShape::ServerStreaming => write!(f, "server-streaming"),
            CallShape::ClientStreaming => write!(f, "client-streaming"),
            CallShape::BidiStreaming => write!(f, "bidi-streaming"),
        }
    }
}

/// Immutable identifier of one RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    service: &'static str,
    name: &'static str,
    shape: CallShape,
}

impl MethodDescriptor {
    /// # Arguments
    ///
    /// * `service` - The fully qualified service name (e.g. `google.showcase.v1beta1.Echo`).
    /// * `name` - The method name (e.g. `Echo`).
    /// * `shape` - How requests and responses flow.
    pub const fn new(service: &'static str, name: &'static str, shape: CallShape) -> Self {
        Self {
            service,
            name,
            shape,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    /// Returns `package.Service/Method`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.service, self.name)
    }

    /// Builds the HTTP/2 path (`/package.Service/Method`) the call is routed to.
    pub fn path(&self) -> Result<PathAndQuery, InvalidUri> {
        PathAndQuery::from_str(&format!("/{}/{}", self.service, self.name))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.name)
    }
}
