//! A generated-style client for the Echo service.
//!
//! Every method is a thin shell: coerce the request, then delegate to a [`WrappedMethod`].
use crate::pb::{
    EchoRequest, EchoResponse, ExpandRequest, PagedExpandRequest, PagedExpandResponse,
    WaitMetadata, WaitRequest, WaitResponse, echo_request,
};
use futures_util::Stream;
use gapic_core::{
    CallOptions, CallShape, ClientConfig, ConfigError, Error, GrpcTransport, MethodDescriptor,
    OperationFuture, Pager, ResponseStream, Transport, WrappedMethod, coerce_request,
    proto::{longrunning::Operation, rpc},
    wrap,
};

pub const SERVICE: &str = "google.showcase.v1beta1.Echo";

pub const ECHO: MethodDescriptor = MethodDescriptor::new(SERVICE, "Echo", CallShape::Unary);
pub const EXPAND: MethodDescriptor =
    MethodDescriptor::new(SERVICE, "Expand", CallShape::ServerStreaming);
pub const COLLECT: MethodDescriptor =
    MethodDescriptor::new(SERVICE, "Collect", CallShape::ClientStreaming);
pub const CHAT: MethodDescriptor = MethodDescriptor::new(SERVICE, "Chat", CallShape::BidiStreaming);
pub const PAGED_EXPAND: MethodDescriptor =
    MethodDescriptor::new(SERVICE, "PagedExpand", CallShape::Unary);
pub const WAIT: MethodDescriptor = MethodDescriptor::new(SERVICE, "Wait", CallShape::Unary);

/// Per-method retry and timeout defaults of the Echo service.
pub const DEFAULT_CLIENT_CONFIG: &str = r#"{
  "interfaces": {
    "google.showcase.v1beta1.Echo": {
      "retry_codes": {
        "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"],
        "non_idempotent": []
      },
      "retry_params": {
        "default": {
          "initial_retry_delay_millis": 100,
          "retry_delay_multiplier": 1.3,
          "max_retry_delay_millis": 60000,
          "initial_rpc_timeout_millis": 20000,
          "rpc_timeout_multiplier": 1.0,
          "max_rpc_timeout_millis": 20000,
          "total_timeout_millis": 600000
        }
      },
      "methods": {
        "Echo": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" },
        "Expand": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" },
        "Collect": { "timeout_millis": 60000, "retry_codes_name": "non_idempotent", "retry_params_name": "default" },
        "Chat": { "timeout_millis": 60000, "retry_codes_name": "non_idempotent", "retry_params_name": "default" },
        "PagedExpand": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" },
        "Wait": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" }
      }
    }
  }
}"#;

#[derive(Debug, Clone)]
pub struct EchoClient<T = GrpcTransport> {
    echo: WrappedMethod<T, EchoRequest, EchoResponse>,
    expand: WrappedMethod<T, ExpandRequest, EchoResponse>,
    collect: WrappedMethod<T, EchoRequest, EchoResponse>,
    chat: WrappedMethod<T, EchoRequest, EchoResponse>,
    paged_expand: WrappedMethod<T, PagedExpandRequest, PagedExpandResponse>,
    wait: WrappedMethod<T, WaitRequest, Operation>,
}

impl<T: Transport> EchoClient<T> {
    /// A client using [`DEFAULT_CLIENT_CONFIG`].
    pub fn new(transport: T) -> Result<Self, ConfigError> {
        Self::from_config(transport, &ClientConfig::from_json(DEFAULT_CLIENT_CONFIG)?)
    }

    pub fn from_config(transport: T, config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            echo: wrap(transport.clone(), ECHO, config.method_config_for(&ECHO)?),
            expand: wrap(transport.clone(), EXPAND, config.method_config_for(&EXPAND)?),
            collect: wrap(transport.clone(), COLLECT, config.method_config_for(&COLLECT)?),
            chat: wrap(transport.clone(), CHAT, config.method_config_for(&CHAT)?),
            paged_expand: wrap(
                transport.clone(),
                PAGED_EXPAND,
                config.method_config_for(&PAGED_EXPAND)?,
            ),
            wait: wrap(transport, WAIT, config.method_config_for(&WAIT)?),
        })
    }

    /// Echoes the request. `content` is a flattened field of [`EchoRequest`].
    pub async fn echo(
        &self,
        request: Option<EchoRequest>,
        content: Option<String>,
        options: CallOptions,
    ) -> Result<EchoResponse, Error> {
        let mut request = coerce_request(request, content.is_some())?;
        if let Some(content) = content {
            request.response = Some(echo_request::Response::Content(content));
        }
        self.echo.unary(request, options).await
    }

    /// Streams back one response per word of `content`, then fails with `error` if given.
    pub async fn expand(
        &self,
        request: Option<ExpandRequest>,
        content: Option<String>,
        error: Option<rpc::Status>,
        options: CallOptions,
    ) -> Result<ResponseStream<EchoResponse>, Error> {
        let mut request = coerce_request(request, content.is_some() || error.is_some())?;
        if let Some(content) = content {
            request.content = content;
        }
        if let Some(error) = error {
            request.error = Some(error);
        }
        self.expand.server_streaming(request, options).await
    }

    /// Concatenates the contents of every request into one response.
    pub async fn collect(
        &self,
        requests: impl Stream<Item = EchoRequest> + Send + 'static,
        options: CallOptions,
    ) -> Result<EchoResponse, Error> {
        self.collect.client_streaming(requests, options).await
    }

    /// Echoes every request as it arrives.
    pub async fn chat(
        &self,
        requests: impl Stream<Item = EchoRequest> + Send + 'static,
        options: CallOptions,
    ) -> Result<ResponseStream<EchoResponse>, Error> {
        self.chat.bidi_streaming(requests, options).await
    }

    pub async fn paged_expand(
        &self,
        request: PagedExpandRequest,
        options: CallOptions,
    ) -> Result<Pager<T, PagedExpandRequest, PagedExpandResponse>, Error> {
        self.paged_expand.paginate(request, options).await
    }

    /// Starts a job that finishes once the requested end time is reached.
    pub async fn wait(
        &self,
        request: WaitRequest,
        options: CallOptions,
    ) -> Result<OperationFuture<T, WaitResponse, WaitMetadata>, Error> {
        self.wait.long_running(request, options).await
    }
}
