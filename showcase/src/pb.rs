//! Messages and server of `google.showcase.v1beta1.Echo`, generated from `proto/echo.proto`.
use gapic_core::{Page, PagedRequest, proto::rpc::Status};

tonic::include_proto!("google.showcase.v1beta1");

impl EchoRequest {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            response: Some(echo_request::Response::Content(content.into())),
        }
    }

    pub fn error(error: Status) -> Self {
        Self {
            response: Some(echo_request::Response::Error(error)),
        }
    }
}

impl PagedRequest for PagedExpandRequest {
    fn set_page_token(&mut self, token: String) {
        self.page_token = token;
    }
}

impl Page for PagedExpandResponse {
    type Item = EchoResponse;

    fn next_page_token(&self) -> &str {
        &self.next_page_token
    }

    fn into_items(self) -> Vec<EchoResponse> {
        self.responses
    }
}
