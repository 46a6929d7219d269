//! # Long-Running Operations
//!
//! Some methods start a job on the server and immediately return an [`Operation`] handle.
//! [`OperationFuture`] wraps that handle: it polls the server until the job is done, decodes
//! the typed result or error, runs completion callbacks and supports cancellation.
//!
//! ```rust,ignore
//! let mut future = client.wait(request, CallOptions::new()).await?;
//! future.add_done_callback(|f| println!("'{}' finished", f.name()));
//!
//! let response = future.result(Some(Duration::from_secs(30))).await?;
//! ```
use crate::{
    error::{Error, JobError},
    options::CallOptions,
    proto::longrunning::{CANCEL_OPERATION, GET_OPERATION, Operation, operation},
    retry::{Backoff, RetryPolicy},
    transport::Transport,
    wrapper::retry_call,
};
use prost::Message;
use std::{fmt, marker::PhantomData, time::Duration};
use tokio::time::Instant;
use tonic::Code;

/// Interval schedule between two polls of an unfinished operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 1.5,
            max: Duration::from_secs(20),
        }
    }
}

impl PollPolicy {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            initial,
            multiplier,
            max,
        }
    }

    pub fn intervals(&self) -> Backoff {
        Backoff::new(self.initial, self.multiplier, self.max)
    }
}

/// Issues `GetOperation` / `CancelOperation` calls with a fixed retry policy and call options.
#[derive(Debug, Clone)]
pub struct OperationPoller<T> {
    transport: T,
    retry: RetryPolicy,
    options: CallOptions,
}

impl<T: Transport> OperationPoller<T> {
    pub fn new(transport: T, retry: RetryPolicy, options: CallOptions) -> Self {
        Self {
            transport,
            retry,
            options,
        }
    }

    /// Fetches the latest state of the operation called `name`.
    pub async fn poll(&self, name: &str) -> Result<Operation, Error> {
        retry_call(
            &GET_OPERATION,
            name,
            &self.retry,
            self.options.timeout,
            || self.transport.get_operation(name, &self.options),
        )
        .await
    }

    pub fn supports_cancellation(&self) -> bool {
        self.transport.supports_cancellation()
    }

    pub async fn cancel(&self, name: &str) -> Result<(), Error> {
        retry_call(
            &CANCEL_OPERATION,
            name,
            &self.retry,
            self.options.timeout,
            || self.transport.cancel_operation(name, &self.options),
        )
        .await
    }
}

type DoneCallback<F> = Box<dyn FnOnce(&F) + Send>;

/// A long-running operation resolving to `R`, reporting progress as `M`.
///
/// The future keeps the last [`Operation`] it saw. Methods that need fresh state
/// ([`OperationFuture::done`], [`OperationFuture::result`], ...) poll the server; accessors
/// such as [`OperationFuture::operation`] never do.
pub struct OperationFuture<T, R, M = ()> {
    operation: Operation,
    poller: OperationPoller<T>,
    polling: PollPolicy,
    callbacks: Vec<DoneCallback<OperationFuture<T, R, M>>>,
    _marker: PhantomData<fn() -> (R, M)>,
}

impl<T, R, M> OperationFuture<T, R, M>
where
    T: Transport,
    R: Message + Default,
    M: Message + Default,
{
    pub fn new(operation: Operation, poller: OperationPoller<T>) -> Self {
        Self {
            operation,
            poller,
            polling: PollPolicy::default(),
            callbacks: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_poll_policy(mut self, polling: PollPolicy) -> Self {
        self.polling = polling;
        self
    }

    pub fn name(&self) -> &str {
        &self.operation.name
    }

    /// The last state fetched from the server.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Whether the last fetched state is final. Does not poll.
    pub fn is_done(&self) -> bool {
        self.operation.done
    }

    /// Polls the server (unless the operation is already known to be done) and reports whether
    /// the operation has finished.
    pub async fn done(&mut self) -> Result<bool, Error> {
        self.refresh().await?;
        Ok(self.operation.done)
    }

    /// Fetches the latest state. Fires the pending callbacks when the operation turns done.
    pub async fn refresh(&mut self) -> Result<&Operation, Error> {
        if !self.operation.done {
            self.operation = self.poller.poll(&self.operation.name).await?;
            if self.operation.done {
                tracing::debug!(operation = %self.operation.name, "operation finished");
                self.run_callbacks();
            }
        }
        Ok(&self.operation)
    }

    /// Polls until the operation is done.
    ///
    /// # Errors
    ///
    /// [`Error::PollTimeout`] when `timeout` elapses first. `None` waits forever.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<(), Error> {
        let started = Instant::now();
        let deadline = timeout.map(|timeout| started + timeout);
        let mut intervals = self.polling.intervals();

        loop {
            // A poll still in flight at the deadline is abandoned; its retries included.
            let done = match deadline {
                None => self.done().await?,
                Some(deadline) => match tokio::time::timeout_at(deadline, self.done()).await {
                    Ok(done) => done?,
                    Err(_) => return Err(self.poll_timeout(started)),
                },
            };
            if done {
                return Ok(());
            }

            let mut delay = intervals.next().unwrap_or(self.polling.max);
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.poll_timeout(started));
                }
                delay = delay.min(deadline - now);
            }

            tracing::trace!(operation = %self.operation.name, ?delay, "operation still running");
            tokio::time::sleep(delay).await;
        }
    }

    /// Waits for the operation and returns its decoded response.
    ///
    /// # Errors
    ///
    /// * [`Error::Job`] if the operation finished with an error.
    /// * [`Error::PollTimeout`] if `timeout` elapsed first.
    pub async fn result(&mut self, timeout: Option<Duration>) -> Result<R, Error> {
        self.wait(timeout).await?;

        match &self.operation.result {
            Some(operation::Result::Response(any)) => decode_any(any),
            Some(operation::Result::Error(status)) => Err(Error::Job {
                operation: self.operation.name.clone(),
                error: JobError::from(status.clone()),
            }),
            None => Err(Error::IncompleteOperation(self.operation.name.clone())),
        }
    }

    /// Waits for the operation and returns the error it finished with, if any.
    pub async fn exception(&mut self, timeout: Option<Duration>) -> Result<Option<JobError>, Error> {
        self.wait(timeout).await?;

        match &self.operation.result {
            Some(operation::Result::Error(status)) => Ok(Some(JobError::from(status.clone()))),
            Some(operation::Result::Response(_)) => Ok(None),
            None => Err(Error::IncompleteOperation(self.operation.name.clone())),
        }
    }

    /// Registers `callback` to run once the operation is done.
    ///
    /// Runs it right away when the operation is already known to be done. Otherwise it runs
    /// during the poll that observes completion.
    pub fn add_done_callback(&mut self, callback: impl FnOnce(&Self) + Send + 'static) {
        if self.operation.done {
            callback(&*self);
        } else {
            self.callbacks.push(Box::new(callback));
        }
    }

    /// Decodes the progress metadata of the last fetched state.
    pub fn metadata(&self) -> Result<Option<M>, Error> {
        self.operation.metadata.as_ref().map(decode_any::<M>).transpose()
    }

    /// Requests cancellation.
    ///
    /// Returns `false` when the operation is already done. Cancellation is best effort: use
    /// [`OperationFuture::cancelled`] to learn whether it took effect.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] when the transport cannot cancel operations.
    pub async fn cancel(&mut self) -> Result<bool, Error> {
        if self.operation.done {
            return Ok(false);
        }
        if !self.poller.supports_cancellation() {
            return Err(Error::Usage(format!(
                "the transport of operation '{}' does not support cancellation",
                self.operation.name
            )));
        }

        self.poller.cancel(&self.operation.name).await?;
        tracing::debug!(operation = %self.operation.name, "cancellation requested");
        Ok(true)
    }

    /// Polls and reports whether the operation finished as `CANCELLED`.
    pub async fn cancelled(&mut self) -> Result<bool, Error> {
        self.refresh().await?;
        Ok(matches!(
            &self.operation.result,
            Some(operation::Result::Error(status)) if Code::from(status.code) == Code::Cancelled
        ))
    }

    fn poll_timeout(&self, started: Instant) -> Error {
        Error::PollTimeout {
            operation: self.operation.name.clone(),
            waited: started.elapsed(),
        }
    }

    fn run_callbacks(&mut self) {
        for callback in std::mem::take(&mut self.callbacks) {
            callback(&*self);
        }
    }
}

impl<T, R, M> fmt::Debug for OperationFuture<T, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationFuture")
            .field("operation", &self.operation)
            .field("polling", &self.polling)
            .field("pending_callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

fn decode_any<T: Message + Default>(any: &prost_types::Any) -> Result<T, Error> {
    T::decode(any.value.as_slice()).map_err(|source| Error::Decode {
        type_url: any.type_url.clone(),
        source,
    })
}
