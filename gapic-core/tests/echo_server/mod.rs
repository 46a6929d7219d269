use gapic_core::{
    prost::Message,
    proto::{
        longrunning::{CancelOperationRequest, GetOperationRequest, Operation, operation},
        rpc,
    },
};
use showcase::{
    Echo, Operations,
    pb::{
        EchoRequest, EchoResponse, ExpandRequest, PagedExpandRequest, PagedExpandResponse,
        WaitMetadata, WaitRequest, echo_request, wait_request,
    },
};
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, SystemTime},
};
use tokio::{sync::mpsc, time::Instant};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tonic::{Code, Request, Response, Status, Streaming, metadata::MetadataMap};

struct PendingWait {
    deadline: Instant,
    outcome: Option<wait_request::Response>,
    metadata: prost_types::Any,
    cancelled: bool,
}

#[derive(Default)]
struct State {
    operations: HashMap<String, PendingWait>,
    next_operation: u64,
    unavailable_budget: u32,
    echo_attempts: u32,
    seen_metadata: Vec<MetadataMap>,
}

/// Echo showcase behaviour backed by in-memory state.
#[derive(Default)]
pub struct ShowcaseImpl {
    state: Mutex<State>,
}

impl ShowcaseImpl {
    /// Fails the next `count` echo calls with `UNAVAILABLE`.
    pub fn unavailable_for(count: u32) -> Self {
        let showcase = Self::default();
        showcase.state.lock().unwrap().unavailable_budget = count;
        showcase
    }

    pub fn echo_attempts(&self) -> u32 {
        self.state.lock().unwrap().echo_attempts
    }

    pub fn seen_metadata(&self) -> Vec<MetadataMap> {
        self.state.lock().unwrap().seen_metadata.clone()
    }
}

fn status(error: &rpc::Status) -> Status {
    Status::new(Code::from(error.code), error.message.clone())
}

fn content(request: EchoRequest) -> Result<EchoResponse, Status> {
    match request.response {
        Some(echo_request::Response::Content(content)) => Ok(EchoResponse { content }),
        Some(echo_request::Response::Error(error)) => Err(status(&error)),
        None => Ok(EchoResponse::default()),
    }
}

fn any<M: Message>(type_name: &str, message: &M) -> prost_types::Any {
    prost_types::Any {
        type_url: format!("type.googleapis.com/{type_name}"),
        value: message.encode_to_vec(),
    }
}

impl PendingWait {
    fn to_operation(&self, name: &str) -> Operation {
        let finished = self.cancelled || Instant::now() >= self.deadline;
        let result = match (&self.outcome, self.cancelled) {
            _ if !finished => None,
            (_, true) => Some(operation::Result::Error(rpc::Status {
                code: Code::Cancelled as i32,
                message: "operation was cancelled".to_string(),
                details: vec![],
            })),
            (Some(wait_request::Response::Error(error)), false) => {
                Some(operation::Result::Error(error.clone()))
            }
            (Some(wait_request::Response::Success(response)), false) => Some(
                operation::Result::Response(any("google.showcase.v1beta1.WaitResponse", response)),
            ),
            (None, false) => Some(operation::Result::Response(any(
                "google.showcase.v1beta1.WaitResponse",
                &showcase::pb::WaitResponse::default(),
            ))),
        };

        Operation {
            name: name.to_string(),
            metadata: Some(self.metadata.clone()),
            done: finished,
            result,
        }
    }
}

#[tonic::async_trait]
impl Echo for ShowcaseImpl {
    type ExpandStream = ReceiverStream<Result<EchoResponse, Status>>;
    type ChatStream = ReceiverStream<Result<EchoResponse, Status>>;

    async fn echo(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        {
            let mut state = self.state.lock().unwrap();
            state.echo_attempts += 1;
            state.seen_metadata.push(request.metadata().clone());
            if state.unavailable_budget > 0 {
                state.unavailable_budget -= 1;
                return Err(Status::unavailable("warming up"));
            }
        }
        content(request.into_inner()).map(Response::new)
    }

    async fn expand(
        &self,
        request: Request<ExpandRequest>,
    ) -> Result<Response<Self::ExpandStream>, Status> {
        let request = request.into_inner();
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            for word in request.content.split_whitespace() {
                let response = EchoResponse {
                    content: word.to_string(),
                };
                if tx.send(Ok(response)).await.is_err() {
                    return;
                }
            }
            if let Some(error) = &request.error {
                let _ = tx.send(Err(status(error))).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn collect(
        &self,
        request: Request<Streaming<EchoRequest>>,
    ) -> Result<Response<EchoResponse>, Status> {
        let mut stream = request.into_inner();
        let mut contents = Vec::new();
        while let Some(message) = stream.next().await {
            contents.push(content(message?)?.content);
        }
        Ok(Response::new(EchoResponse {
            content: contents.join(" "),
        }))
    }

    async fn chat(
        &self,
        request: Request<Streaming<EchoRequest>>,
    ) -> Result<Response<Self::ChatStream>, Status> {
        let mut in_stream = request.into_inner();
        let (tx, rx) = mpsc::channel(128);

        tokio::spawn(async move {
            while let Some(result) = in_stream.next().await {
                let reply = result.and_then(content);
                let failed = reply.is_err();
                if tx.send(reply).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn paged_expand(
        &self,
        request: Request<PagedExpandRequest>,
    ) -> Result<Response<PagedExpandResponse>, Status> {
        let request = request.into_inner();
        let words: Vec<&str> = request.content.split_whitespace().collect();
        let start = if request.page_token.is_empty() {
            0
        } else {
            request
                .page_token
                .parse::<usize>()
                .map_err(|_| Status::invalid_argument("invalid page token"))?
        };
        if request.page_size <= 0 || start > words.len() {
            return Err(Status::invalid_argument("invalid page"));
        }

        let end = (start + request.page_size as usize).min(words.len());
        let next_page_token = if end < words.len() {
            end.to_string()
        } else {
            String::new()
        };

        Ok(Response::new(PagedExpandResponse {
            responses: words[start..end]
                .iter()
                .map(|word| EchoResponse {
                    content: word.to_string(),
                })
                .collect(),
            next_page_token,
        }))
    }

    async fn wait(&self, request: Request<WaitRequest>) -> Result<Response<Operation>, Status> {
        let request = request.into_inner();
        let ttl = match request.end {
            Some(wait_request::End::Ttl(ttl)) => {
                Duration::new(ttl.seconds.max(0) as u64, ttl.nanos.max(0) as u32)
            }
            _ => Duration::ZERO,
        };

        let mut state = self.state.lock().unwrap();
        state.next_operation += 1;
        let name = format!("operations/wait-{}", state.next_operation);
        let metadata = WaitMetadata {
            end_time: Some(prost_types::Timestamp::from(SystemTime::now() + ttl)),
        };
        let pending = PendingWait {
            deadline: Instant::now() + ttl,
            outcome: request.response,
            metadata: any("google.showcase.v1beta1.WaitMetadata", &metadata),
            cancelled: false,
        };

        let operation = pending.to_operation(&name);
        state.operations.insert(name, pending);
        Ok(Response::new(operation))
    }

}

#[tonic::async_trait]
impl Operations for ShowcaseImpl {
    async fn get_operation(
        &self,
        request: Request<GetOperationRequest>,
    ) -> Result<Response<Operation>, Status> {
        let name = request.into_inner().name;
        let state = self.state.lock().unwrap();
        let pending = state
            .operations
            .get(&name)
            .ok_or_else(|| Status::not_found(format!("operation '{name}' not found")))?;
        Ok(Response::new(pending.to_operation(&name)))
    }

    async fn cancel_operation(
        &self,
        request: Request<CancelOperationRequest>,
    ) -> Result<Response<()>, Status> {
        let name = request.into_inner().name;
        let mut state = self.state.lock().unwrap();
        let pending = state
            .operations
            .get_mut(&name)
            .ok_or_else(|| Status::not_found(format!("operation '{name}' not found")))?;
        if Instant::now() < pending.deadline {
            pending.cancelled = true;
        }
        Ok(Response::new(()))
    }
}
