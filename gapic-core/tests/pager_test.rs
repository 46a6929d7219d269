use common::{MockTransport, Reply};
use futures_util::StreamExt;
use gapic_core::{CallOptions, Error};
use showcase::{
    EchoClient,
    pb::{EchoResponse, PagedExpandRequest, PagedExpandResponse},
};
use tonic::Code;

mod common;

fn page(items: &[&str], next_page_token: &str) -> PagedExpandResponse {
    PagedExpandResponse {
        responses: items
            .iter()
            .map(|content| EchoResponse {
                content: content.to_string(),
            })
            .collect(),
        next_page_token: next_page_token.to_string(),
    }
}

/// Pages of 3, 0, 1 and 2 items chained by the tokens `abc`, `def` and `ghi`.
fn four_pages() -> MockTransport {
    MockTransport::new([
        Reply::ok(page(&["a", "b", "c"], "abc")),
        Reply::ok(page(&[], "def")),
        Reply::ok(page(&["d"], "ghi")),
        Reply::ok(page(&["e", "f"], "")),
    ])
}

fn request() -> PagedExpandRequest {
    PagedExpandRequest {
        content: "a b c d e f".to_string(),
        page_size: 3,
        page_token: String::new(),
    }
}

#[tokio::test]
async fn test_items_are_flattened_across_pages() {
    let transport = four_pages();
    let client = EchoClient::new(transport.clone()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    let items: Vec<String> = pager
        .items()
        .map(|item| item.unwrap().content)
        .collect()
        .await;

    assert_eq!(items, vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(transport.call_count(), 4);

    let tokens: Vec<String> = transport
        .calls()
        .iter()
        .map(|call| call.decode::<PagedExpandRequest>().page_token)
        .collect();
    assert_eq!(tokens, vec!["", "abc", "def", "ghi"]);
}

#[tokio::test]
async fn test_pages_keep_their_boundaries() {
    let client = EchoClient::new(four_pages()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    let pages: Vec<PagedExpandResponse> =
        pager.pages().map(|page| page.unwrap()).collect().await;

    let sizes: Vec<usize> = pages.iter().map(|page| page.responses.len()).collect();
    assert_eq!(sizes, vec![3, 0, 1, 2]);
    let tokens: Vec<&str> = pages
        .iter()
        .map(|page| page.next_page_token.as_str())
        .collect();
    assert_eq!(tokens, vec!["abc", "def", "ghi", ""]);
    assert_eq!(pager.next_page_token(), "");
}

#[tokio::test]
async fn test_items_of_the_first_page_need_no_further_fetch() {
    let transport = four_pages();
    let client = EchoClient::new(transport.clone()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    let first: Vec<String> = pager
        .items()
        .take(3)
        .map(|item| item.unwrap().content)
        .collect()
        .await;

    assert_eq!(first, vec!["a", "b", "c"]);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_pages_are_fetched_lazily() {
    let transport = four_pages();
    let client = EchoClient::new(transport.clone()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    assert_eq!(transport.call_count(), 1);
    assert_eq!(pager.current_page().next_page_token, "abc");

    let first = pager.next_page().await.unwrap().unwrap();
    assert_eq!(first.responses.len(), 3);
    assert_eq!(transport.call_count(), 1);

    let second = pager.next_page().await.unwrap().unwrap();
    assert!(second.responses.is_empty());
    assert_eq!(transport.call_count(), 2);
    assert_eq!(pager.next_page_token(), "def");
}

#[tokio::test]
async fn test_fetch_error_is_yielded_once_and_ends_iteration() {
    let transport = MockTransport::new([
        Reply::ok(page(&["a", "b"], "abc")),
        Reply::err(Code::PermissionDenied),
        Reply::ok(page(&["unreachable"], "")),
    ]);
    let client = EchoClient::new(transport.clone()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    let items: Vec<Result<EchoResponse, Error>> = pager.items().collect().await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().content, "a");
    assert_eq!(items[1].as_ref().unwrap().content, "b");
    assert_eq!(
        items[2].as_ref().unwrap_err().code(),
        Some(Code::PermissionDenied)
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_exhausted_pager_yields_nothing() {
    let transport = four_pages();
    let client = EchoClient::new(transport.clone()).unwrap();

    let mut pager = client
        .paged_expand(request(), CallOptions::new())
        .await
        .unwrap();
    assert_eq!(pager.items().count().await, 6);

    assert!(pager.next_page().await.is_none());
    assert_eq!(pager.items().count().await, 0);
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn test_later_pages_reuse_call_options() {
    let transport = four_pages();
    let client = EchoClient::new(transport.clone()).unwrap();

    let options = CallOptions::new().with_metadata("x-goog-request-params", "content=abc");
    let mut pager = client.paged_expand(request(), options).await.unwrap();
    while pager.next_page().await.is_some() {}

    let calls = transport.calls();
    assert_eq!(calls.len(), 4);
    for call in calls {
        assert_eq!(
            call.metadata,
            vec![(
                "x-goog-request-params".to_string(),
                "content=abc".to_string()
            )]
        );
    }
}
