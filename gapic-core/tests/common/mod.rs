#![allow(dead_code)]

use gapic_core::{
    CallOptions, MethodDescriptor, RequestStream, ResponseStream, Transport, TransportError,
    prost::Message,
    proto::longrunning::{Operation, operation},
    proto::rpc,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use tonic::{Code, Status};

/// One scripted answer of the [`MockTransport`].
pub enum Reply {
    Ok(Vec<u8>),
    Err(Status),
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn ok(message: impl Message) -> Self {
        Reply::Ok(message.encode_to_vec())
    }

    pub fn err(code: Code) -> Self {
        Reply::Err(Status::new(code, format!("scripted {code:?}")))
    }

    pub fn delayed(delay: Duration, reply: Reply) -> Self {
        Reply::Delayed(delay, Box::new(reply))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub request: Vec<u8>,
    pub metadata: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RecordedCall {
    pub fn decode<M: Message + Default>(&self) -> M {
        M::decode(self.request.as_slice()).expect("recorded request decodes")
    }
}

#[derive(Default)]
struct State {
    replies: VecDeque<Reply>,
    calls: Vec<RecordedCall>,
    cancelled: Vec<String>,
}

/// A transport answering unary calls from a script and recording every call it sees.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
    cancellable: bool,
}

impl MockTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::default();
        transport.state.lock().unwrap().replies.extend(replies);
        transport
    }

    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self
    }

    pub fn push(&self, reply: Reply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    fn record(&self, method: &MethodDescriptor, request: Vec<u8>, options: &CallOptions) -> Reply {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            method: method.full_name(),
            request,
            metadata: options.metadata.clone(),
            timeout: options.timeout,
        });
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Reply::Err(Status::internal("script exhausted")))
    }
}

async fn resolve(mut reply: Reply) -> Result<Vec<u8>, Status> {
    loop {
        match reply {
            Reply::Ok(bytes) => return Ok(bytes),
            Reply::Err(status) => return Err(status),
            Reply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}

#[tonic::async_trait]
impl Transport for MockTransport {
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
        let reply = self.record(method, request.encode_to_vec(), options);
        let bytes = resolve(reply).await?;
        Ok(Resp::decode(bytes.as_slice()).map_err(|e| Status::internal(e.to_string()))?)
    }

    async fn server_streaming<Req, Resp>(
        &self,
        _method: &MethodDescriptor,
        _request: Req,
        _options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        Err(Status::unimplemented("mock").into())
    }

    async fn client_streaming<Req, Resp>(
        &self,
        _method: &MethodDescriptor,
        _requests: RequestStream<Req>,
        _options: &CallOptions,
    ) -> Result<Resp, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        Err(Status::unimplemented("mock").into())
    }

    async fn bidi_streaming<Req, Resp>(
        &self,
        _method: &MethodDescriptor,
        _requests: RequestStream<Req>,
        _options: &CallOptions,
    ) -> Result<ResponseStream<Resp>, TransportError>
    where
        Req: Message + 'static,
        Resp: Message + Default + 'static,
    {
        Err(Status::unimplemented("mock").into())
    }

    fn supports_cancellation(&self) -> bool {
        self.cancellable
    }

    async fn cancel_operation(
        &self,
        name: &str,
        _options: &CallOptions,
    ) -> Result<(), TransportError> {
        self.state
            .lock()
            .unwrap()
            .cancelled
            .push(name.to_string());
        Ok(())
    }
}

pub fn any<M: Message>(type_name: &str, message: &M) -> prost_types::Any {
    prost_types::Any {
        type_url: format!("type.googleapis.com/{type_name}"),
        value: message.encode_to_vec(),
    }
}

pub fn pending(name: &str) -> Operation {
    Operation {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn succeeded<M: Message>(name: &str, type_name: &str, response: &M) -> Operation {
    Operation {
        name: name.to_string(),
        done: true,
        result: Some(operation::Result::Response(any(type_name, response))),
        ..Default::default()
    }
}

pub fn failed(name: &str, code: Code, message: &str) -> Operation {
    Operation {
        name: name.to_string(),
        done: true,
        result: Some(operation::Result::Error(rpc::Status {
            code: code as i32,
            message: message.to_string(),
            details: vec![],
        })),
        ..Default::default()
    }
}
