//! # Call Wrapper
//!
//! [`wrap`] turns a [`Transport`] and a [`MethodDescriptor`] into a [`WrappedMethod`]: a
//! callable that applies retry, per-attempt timeout and metadata policy to every call.
//!
//! ## Precedence
//!
//! For both retry and timeout the value in [`CallOptions`] wins over the method's
//! [`MethodConfig`], which wins over "no retry" / "no timeout".
//!
//! ## Which calls are retried
//!
//! * **Unary**: the whole call.
//! * **Server streaming**: establishing the stream. Errors yielded by the stream afterwards
//!   reach the caller unchanged.
//! * **Client & bidi streaming**: never. The request stream is consumed by the first attempt.
use crate::{
    error::Error,
    method::{CallShape, MethodDescriptor},
    operation::{OperationFuture, OperationPoller},
    options::{CallOptions, MethodConfig},
    pager::{Page, PagedRequest, Pager},
    proto::longrunning::Operation,
    retry::{RetryDecision, RetryPolicy},
    transport::{ResponseStream, Transport, TransportError, metadata_map},
};
use futures_util::{Stream, StreamExt};
use prost::Message;
use std::{fmt, future::Future, marker::PhantomData, time::Duration};
use tokio::time::Instant;
use tonic::Status;

/// Binds a method to a transport together with its default policies.
pub fn wrap<T, Req, Resp>(
    transport: T,
    method: MethodDescriptor,
    config: MethodConfig,
) -> WrappedMethod<T, Req, Resp> {
    WrappedMethod {
        transport,
        method,
        config,
        _marker: PhantomData,
    }
}

/// A method bound to a transport. Cheap to clone.
pub struct WrappedMethod<T, Req, Resp> {
    transport: T,
    method: MethodDescriptor,
    config: MethodConfig,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<T: Clone, Req, Resp> Clone for WrappedMethod<T, Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            method: self.method,
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, Req, Resp> fmt::Debug for WrappedMethod<T, Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedMethod")
            .field("method", &self.method)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, Req, Resp> WrappedMethod<T, Req, Resp>
where
    T: Transport,
    Req: Message + Clone + fmt::Debug + 'static,
    Resp: Message + Default + 'static,
{
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn config(&self) -> &MethodConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn unary(&self, request: Req, options: CallOptions) -> Result<Resp, Error> {
        self.ensure_shape(CallShape::Unary)?;
        let (retry, options) = self.resolve(options)?;

        retry_call(&self.method, &request, &retry, options.timeout, || {
            self.transport
                .unary::<Req, Resp>(&self.method, request.clone(), &options)
        })
        .await
    }

    /// Opens a server stream. Only establishing the stream is retried.
    pub async fn server_streaming(
        &self,
        request: Req,
        options: CallOptions,
    ) -> Result<ResponseStream<Resp>, Error> {
        self.ensure_shape(CallShape::ServerStreaming)?;
        let (retry, options) = self.resolve(options)?;

        retry_call(&self.method, &request, &retry, options.timeout, || {
            self.transport
                .server_streaming::<Req, Resp>(&self.method, request.clone(), &options)
        })
        .await
    }

    pub async fn client_streaming(
        &self,
        requests: impl Stream<Item = Req> + Send + 'static,
        options: CallOptions,
    ) -> Result<Resp, Error> {
        self.ensure_shape(CallShape::ClientStreaming)?;
        let (_, options) = self.resolve(options)?;

        let attempt = self
            .transport
            .client_streaming::<Req, Resp>(&self.method, requests.boxed(), &options);
        with_timeout(options.timeout, attempt)
            .await
            .map_err(|source| self.stream_error(source))
    }

    pub async fn bidi_streaming(
        &self,
        requests: impl Stream<Item = Req> + Send + 'static,
        options: CallOptions,
    ) -> Result<ResponseStream<Resp>, Error> {
        self.ensure_shape(CallShape::BidiStreaming)?;
        let (_, options) = self.resolve(options)?;

        let attempt = self
            .transport
            .bidi_streaming::<Req, Resp>(&self.method, requests.boxed(), &options);
        with_timeout(options.timeout, attempt)
            .await
            .map_err(|source| self.stream_error(source))
    }

    /// A poller that reuses this method's transport and policies for `GetOperation` calls.
    pub fn poller(&self, options: CallOptions) -> Result<OperationPoller<T>, Error> {
        let (retry, options) = self.resolve(options)?;
        Ok(OperationPoller::new(self.transport.clone(), retry, options))
    }

    /// Retry policy and options a call with `options` runs with.
    fn resolve(&self, mut options: CallOptions) -> Result<(RetryPolicy, CallOptions), Error> {
        metadata_map(&options.metadata).map_err(|e| Error::Usage(e.to_string()))?;

        let retry = options
            .retry
            .take()
            .or_else(|| self.config.retry.clone())
            .unwrap_or_else(RetryPolicy::disabled);
        options.timeout = options.timeout.or(self.config.timeout);

        Ok((retry, options))
    }

    fn ensure_shape(&self, expected: CallShape) -> Result<(), Error> {
        if self.method.shape() == expected {
            Ok(())
        } else {
            Err(Error::Usage(format!(
                "'{}' is a {} method and cannot be called as {}",
                self.method,
                self.method.shape(),
                expected
            )))
        }
    }

    fn stream_error(&self, source: TransportError) -> Error {
        Error::Transport {
            method: self.method.full_name(),
            request: "<request stream>".to_string(),
            source,
        }
    }
}

impl<T, Req, Resp> WrappedMethod<T, Req, Resp>
where
    T: Transport,
    Req: Message + Clone + fmt::Debug + PagedRequest + 'static,
    Resp: Message + Default + Clone + Page + 'static,
{
    /// Fetches the first page and returns a [`Pager`] positioned on it.
    pub async fn paginate(
        &self,
        request: Req,
        options: CallOptions,
    ) -> Result<Pager<T, Req, Resp>, Error> {
        let first = self.unary(request.clone(), options.clone()).await?;
        Ok(Pager::new(self.clone(), request, first, options))
    }
}

impl<T, Req> WrappedMethod<T, Req, Operation>
where
    T: Transport,
    Req: Message + Clone + fmt::Debug + 'static,
{
    /// Starts a long-running operation.
    ///
    /// `R` is the type the operation resolves to and `M` the type of its progress metadata.
    pub async fn long_running<R, M>(
        &self,
        request: Req,
        options: CallOptions,
    ) -> Result<OperationFuture<T, R, M>, Error>
    where
        R: Message + Default,
        M: Message + Default,
    {
        let poller = self.poller(options.clone())?;
        let operation = self.unary(request, options).await?;

        tracing::debug!(method = %self.method, operation = %operation.name, "started long-running operation");
        Ok(OperationFuture::new(operation, poller))
    }
}

/// Runs `attempt` until it succeeds, fails with a non-retryable error or the policy's budget
/// is spent. Each attempt is bounded by `timeout`.
pub(crate) async fn retry_call<F, Fut, R, D>(
    method: &MethodDescriptor,
    request: &D,
    policy: &RetryPolicy,
    timeout: Option<Duration>,
    mut attempt: F,
) -> Result<R, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, TransportError>>,
    D: fmt::Debug + ?Sized,
{
    let started = Instant::now();
    let mut backoff = policy.backoff();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let error = match with_timeout(timeout, attempt()).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        let decision = if error.is_usage() {
            RetryDecision::GiveUp
        } else {
            let delay = backoff.next().unwrap_or_default();
            policy.decide(error.code(), attempts, started.elapsed(), delay)
        };

        match decision {
            RetryDecision::Retry(delay) => {
                tracing::warn!(
                    method = %method,
                    attempt = attempts,
                    code = ?error.code(),
                    ?delay,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp if error.is_usage() => {
                return Err(Error::Usage(error.to_string()));
            }
            RetryDecision::GiveUp => {
                tracing::debug!(method = %method, code = ?error.code(), "call failed");
                return Err(Error::Transport {
                    method: method.full_name(),
                    request: format!("{request:?}"),
                    source: error,
                });
            }
            RetryDecision::Exhausted => {
                tracing::warn!(method = %method, attempts, "retry budget exhausted");
                return Err(Error::RetryExhausted {
                    method: method.full_name(),
                    attempts,
                    source: error,
                });
            }
        }
    }
}

async fn with_timeout<R>(
    timeout: Option<Duration>,
    attempt: impl Future<Output = Result<R, TransportError>>,
) -> Result<R, TransportError> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, attempt)
            .await
            .unwrap_or_else(|_| {
                Err(Status::deadline_exceeded(format!(
                    "attempt did not complete within {timeout:?}"
                ))
                .into())
            }),
        None => attempt.await,
    }
}
