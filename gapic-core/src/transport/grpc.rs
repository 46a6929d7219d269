//! # gRPC Transport
//!
//! [`GrpcTransport`] drives calls over a `tonic` service. In production the service is a
//! [`Channel`]; tests pass an in-process server instead, which works because the transport is
//! generic over any [`GrpcService`].
//!
//! ## How it works
//!
//! * **Pathing**: The HTTP/2 path (`/package.Service/Method`) comes from the
//!   [`MethodDescriptor`].
//! * **Encoding**: Messages are `prost` types encoded with [`tonic_prost::ProstCodec`].
//! * **Metadata**: Call metadata and credentials become request headers. The per-attempt
//!   timeout is propagated as `grpc-timeout`.
use super::{
    ResponseStream, Transport, TransportError, credentials::Credentials,
    credentials::CredentialsError, metadata_map,
};
use crate::{
    BoxError,
    method::MethodDescriptor,
    options::{CallOptions, ClientOptions},
    proto::longrunning::{CANCEL_OPERATION, CancelOperationRequest},
};
use http_body::Body as HttpBody;
use prost::Message;
use std::str::FromStr;
use tonic::{
    GrpcMethod,
    client::{Grpc, GrpcService},
    metadata::MetadataValue,
    transport::{Channel, Endpoint},
};
use tonic_prost::ProstCodec;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
    #[error("Unknown transport '{0}'")]
    UnknownTransport(String),
    #[error("No transport is registered")]
    EmptyRegistry,
    #[error("Failed to resolve credentials: '{0}'")]
    Credentials(#[from] CredentialsError),
}

/// A [`Transport`] over `tonic`.
#[derive(Debug, Clone)]
pub struct GrpcTransport<S = Channel> {
    client: Grpc<S>,
    credentials: Option<Credentials>,
}

impl GrpcTransport<Channel> {
    /// Connects to the configured endpoint eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if the endpoint is not a valid URI or cannot be reached.
    pub async fn connect(
        options: &ClientOptions,
        credentials: Option<Credentials>,
    ) -> Result<Self, ConnectError> {
        let endpoint = endpoint(options)?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ConnectError::ConnectionFailed(options.uri(), e))?;

        tracing::debug!(endpoint = %options.uri(), "connected gRPC transport");
        Ok(Self::new(channel).with_credentials(credentials))
    }

    /// Creates a transport whose channel connects on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect_lazy(
        options: &ClientOptions,
        credentials: Option<Credentials>,
    ) -> Result<Self, ConnectError> {
        let channel = endpoint(options)?.connect_lazy();
        Ok(Self::new(channel).with_credentials(credentials))
    }
}

impl<S> GrpcTransport<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        Self {
            client: Grpc::new(service),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    async fn ready_client(&self) -> Result<Grpc<S>, TransportError> {
        let mut client = self.client.clone();
        client
            .ready()
            .await
            .map_err(|e| TransportError::ClientNotReady(e.into()))?;
        Ok(client)
    }

    fn build_request<T>(
        &self,
        method: &MethodDescriptor,
        message: T,
        options: &CallOptions,
    ) -> Result<tonic::Request<T>, TransportError> {
        let mut metadata = metadata_map(&options.metadata)?;
        if let Some(credentials) = &self.credentials {
            let value = MetadataValue::from_str(&credentials.authorization()).map_err(|source| {
                TransportError::InvalidMetadataValue {
                    key: "authorization".to_string(),
                    source,
                }
            })?;
            metadata.insert("authorization", value);
        }

        let mut request = tonic::Request::new(message);
        *request.metadata_mut() = metadata;
        if let Some(timeout) = options.timeout {
            request.set_timeout(timeout);
        }
        request
            .extensions_mut()
            .insert(GrpcMethod::new(method.service(), method.name()));
        Ok(request)
    }
}

fn endpoint(options: &ClientOptions) -> Result<Endpoint, ConnectError> {
    let uri = options.uri();
    let mut endpoint =
        Endpoint::from_shared(uri.clone()).map_err(|e| ConnectError::InvalidUrl(uri, e))?;
    if let Some(timeout) = options.connect_timeout {
        endpoint = endpoint.connect_timeout(timeout);
    }
    Ok(endpoint)
}

fn http_path(method: &MethodDescriptor) -> Result<http::uri::PathAndQuery, TransportError> {
    method.path().map_err(|source| TransportError::InvalidPath {
        path: method.full_name(),
        source,
    })
}

#[tonic::async_trait]
impl<S> Transport for GrpcTransport<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn unary<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        request: Req,
        options: &CallOptions,
    ) -> Result<Resp, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        let path = http_path(method)?;
        let request = self.build_request(method, request, options)?;
        let mut client = self.ready_client().await?;

        let response = client
            .unary(request, path, ProstCodec::<Req, Resp>::default())
            .await?;
        Ok(response.into_inner())
    }

    async fn server_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        request: Req,
        options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        let path = http_path(method)?;
        let request = self.build_request(method, request, options)?;
        let mut client = self.ready_client().await?;

        let response = client
            .server_streaming(request, path, ProstCodec::<Req, Resp>::default())
            .await?;
        Ok(ResponseStream::from_streaming(response.into_inner()))
    }

    async fn client_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        requests: super::RequestStream<Req>,
        options: &CallOptions,
    ) -> Result<Resp, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        let path = http_path(method)?;
        let request = self.build_request(method, requests, options)?;
        let mut client = self.ready_client().await?;

        let response = client
            .client_streaming(request, path, ProstCodec::<Req, Resp>::default())
            .await?;
        Ok(response.into_inner())
    }

    async fn bidi_streaming<Req, Resp>(
        &self,
        method: &MethodDescriptor,
        requests: super::RequestStream<Req>,
        options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        let path = http_path(method)?;
        let request = self.build_request(method, requests, options)?;
        let mut client = self.ready_client().await?;

        let response = client
            .streaming(request, path, ProstCodec::<Req, Resp>::default())
            .await?;
        Ok(ResponseStream::from_streaming(response.into_inner()))
    }

    fn supports_cancellation(&self) -> bool {
        true
    }

    async fn cancel_operation(
        &self,
        name: &str,
        options: &CallOptions,
    ) -> Result<(), TransportError> {
        let request = CancelOperationRequest {
            name: name.to_string(),
        };
        self.unary::<_, ()>(&CANCEL_OPERATION, request, options)
            .await
    }
}
