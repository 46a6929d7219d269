//! # Transports
//!
//! A [`Transport`] turns a logical RPC into wire traffic. It knows nothing about retries or
//! pagination; it performs exactly one attempt of a call and reports how it went.
//!
//! ## Call shapes
//!
//! | Shape            | Request             | Response              |
//! |------------------|---------------------|-----------------------|
//! | Unary            | `Req`               | `Resp`                |
//! | Server streaming | `Req`               | [`ResponseStream`]    |
//! | Client streaming | [`RequestStream`]   | `Resp`                |
//! | Bidi streaming   | [`RequestStream`]   | [`ResponseStream`]    |
//!
//! Besides the four shapes a transport exposes the `google.longrunning.Operations` calls the
//! [`crate::OperationFuture`] polls with.
pub mod credentials;
pub mod grpc;
pub mod registry;

use crate::{
    BoxError,
    method::MethodDescriptor,
    options::CallOptions,
    proto::longrunning::{GET_OPERATION, GetOperationRequest, Operation},
};
use futures_util::{Stream, StreamExt, stream::BoxStream};
use http::uri::InvalidUri;
use prost::Message;
use std::{
    fmt,
    pin::Pin,
    str::FromStr,
    sync::{Arc, OnceLock},
    task::{Context, Poll},
};
use tonic::{
    Code, Status,
    metadata::{
        MetadataKey, MetadataMap, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
};

/// Outgoing messages of a client or bidi streaming call.
pub type RequestStream<T> = BoxStream<'static, T>;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid method path '{path}': '{source}'")]
    InvalidPath { path: String, source: InvalidUri },
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
    #[error("{}", .0.message())]
    Status(#[from] Status),
}

impl TransportError {
    /// Status code used to classify the failure for retries.
    pub fn code(&self) -> Code {
        match self {
            TransportError::ClientNotReady(_) => Code::Unavailable,
            TransportError::InvalidPath { .. } => Code::Internal,
            TransportError::InvalidMetadataKey { .. }
            | TransportError::InvalidMetadataValue { .. } => Code::InvalidArgument,
            TransportError::Status(status) => status.code(),
        }
    }

    /// `true` when the caller supplied something that can never be sent.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            TransportError::InvalidMetadataKey { .. } | TransportError::InvalidMetadataValue { .. }
        )
    }
}

/// One attempt of an RPC, in any of the four call shapes.
///
/// Implementations must be cheap to clone: wrapped methods, pagers and operation futures each
/// hold their own handle.
#[tonic::async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    async fn unary<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        request: Req,
        options: &CallOptions,
    ) -> Result<Resp, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static;

    async fn server_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        request: Req,
        options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static;

    async fn client_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        requests: RequestStream<Req>,
        options: &CallOptions,
    ) -> Result<Resp, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static;

    async fn bidi_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        requests: RequestStream<Req>,
        options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static;

    /// Fetches the latest state of a long-running operation.
    async fn get_operation(
        &self,
        name: &str,
        options: &CallOptions,
    ) -> Result<Operation, TransportError> {
        let request = GetOperationRequest {
            name: name.to_string(),
        };
        self.unary(&GET_OPERATION, request, options).await
    }

    /// Whether [`Transport::cancel_operation`] reaches a server.
    fn supports_cancellation(&self) -> bool {
        false
    }

    /// Asks the server to stop a long-running operation.
    async fn cancel_operation(
        &self,
        name: &str,
        _options: &CallOptions,
    ) -> Result<(), TransportError> {
        Err(Status::unimplemented(format!(
            "this transport cannot cancel operation '{name}'"
        ))
        .into())
    }
}

/// Incoming messages of a server or bidi streaming call.
///
/// Once the stream has been drained, [`ResponseStream::trailing_metadata`] exposes the
/// trailers the server finished the call with.
pub struct ResponseStream<T> {
    inner: BoxStream<'static, Result<T, Status>>,
    trailers: Arc<OnceLock<MetadataMap>>,
}

impl<T: Send + 'static> ResponseStream<T> {
    /// Wraps an arbitrary stream. It never reports trailers.
    pub fn new(stream: impl Stream<Item = Result<T, Status>> + Send + 'static) -> Self {
        Self {
            inner: stream.boxed(),
            trailers: Arc::new(OnceLock::new()),
        }
    }

    /// Wraps a `tonic` response stream, capturing its trailers when it ends.
    pub fn from_streaming(streaming: tonic::Streaming<T>) -> Self {
        let trailers = Arc::new(OnceLock::new());
        let slot = Arc::clone(&trailers);

        let inner = futures_util::stream::unfold(Some(streaming), move |state| {
            let slot = Arc::clone(&slot);
            async move {
                let mut streaming = state?;
                match streaming.message().await {
                    Ok(Some(message)) => Some((Ok(message), Some(streaming))),
                    Ok(None) => {
                        let map = streaming.trailers().await.ok().flatten().unwrap_or_default();
                        let _ = slot.set(map);
                        None
                    }
                    Err(status) => Some((Err(status), None)),
                }
            }
        })
        .boxed();

        Self { inner, trailers }
    }
}

impl<T> ResponseStream<T> {
    /// Trailers of the call, available once the stream has ended successfully.
    pub fn trailing_metadata(&self) -> Option<&MetadataMap> {
        self.trailers.get()
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = Result<T, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("trailers", &self.trailers.get())
            .finish_non_exhaustive()
    }
}

/// Converts string header pairs into a [`MetadataMap`]. Repeated keys keep every value,
/// in order.
pub(crate) fn metadata_map(headers: &[(String, String)]) -> Result<MetadataMap, TransportError> {
    let mut map = MetadataMap::new();
    for (k, v) in headers {
        let key =
            MetadataKey::from_str(k).map_err(|source| TransportError::InvalidMetadataKey {
                key: k.clone(),
                source,
            })?;
        let val = MetadataValue::from_str(v).map_err(|source| {
            TransportError::InvalidMetadataValue {
                key: k.clone(),
                source,
            }
        })?;
        map.append(key, val);
    }
    Ok(map)
}
