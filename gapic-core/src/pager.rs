//! # Pagination
//!
//! List methods return one page at a time together with a `next_page_token`. A [`Pager`]
//! hides the token dance: it starts on the first page, fetches the next one only when asked
//! and stops when the server answers with an empty token.
//!
//! ```rust,ignore
//! let mut pager = client.paged_expand(request, CallOptions::new()).await?;
//! let mut items = pager.items();
//! while let Some(item) = items.next().await {
//!     println!("{}", item?.content);
//! }
//! ```
use crate::{error::Error, options::CallOptions, transport::Transport, wrapper::WrappedMethod};
use futures_util::{StreamExt, stream::BoxStream};
use prost::Message;
use std::fmt;

/// A list request that can be pointed at another page.
pub trait PagedRequest {
    fn set_page_token(&mut self, token: String);
}

/// One page of a list response.
pub trait Page {
    type Item;

    /// Empty when this is the last page.
    fn next_page_token(&self) -> &str;

    fn into_items(self) -> Vec<Self::Item>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// The current page has not been handed out yet.
    Unread,
    Read,
    Exhausted,
}

/// Lazy sequence of pages of a list method.
pub struct Pager<T, Req, Resp> {
    method: WrappedMethod<T, Req, Resp>,
    request: Req,
    options: CallOptions,
    current: Resp,
    state: State,
}

impl<T, Req, Resp: Page> Pager<T, Req, Resp> {
    /// # Arguments
    ///
    /// * `method` - The list method. Every further page is fetched through it.
    /// * `request` - The request `first` answered.
    /// * `first` - The first page.
    /// * `options` - Call options reused for every further page.
    pub fn new(
        method: WrappedMethod<T, Req, Resp>,
        request: Req,
        first: Resp,
        options: CallOptions,
    ) -> Self {
        Self {
            method,
            request,
            options,
            current: first,
            state: State::Unread,
        }
    }

    /// The most recently fetched page.
    pub fn current_page(&self) -> &Resp {
        &self.current
    }

    pub fn next_page_token(&self) -> &str {
        self.current.next_page_token()
    }
}

impl<T, Req, Resp> Pager<T, Req, Resp>
where
    T: Transport,
    Req: Message + Clone + fmt::Debug + PagedRequest + 'static,
    Resp: Message + Default + Clone + Page + 'static,
{
    /// Returns the next page, fetching it if needed.
    ///
    /// `None` once the last page has been returned. A failed fetch is returned once and ends
    /// the sequence.
    pub async fn next_page(&mut self) -> Option<Result<Resp, Error>> {
        match self.state {
            State::Exhausted => None,
            State::Unread => {
                self.state = State::Read;
                Some(Ok(self.current.clone()))
            }
            State::Read => {
                let token = self.current.next_page_token();
                if token.is_empty() {
                    self.state = State::Exhausted;
                    return None;
                }

                tracing::debug!(method = %self.method.method(), page_token = token, "fetching next page");
                self.request.set_page_token(token.to_string());

                match self
                    .method
                    .unary(self.request.clone(), self.options.clone())
                    .await
                {
                    Ok(page) => {
                        self.current = page.clone();
                        Some(Ok(page))
                    }
                    Err(e) => {
                        self.state = State::Exhausted;
                        Some(Err(e))
                    }
                }
            }
        }
    }

    /// The remaining pages as a stream.
    pub fn pages(&mut self) -> BoxStream<'_, Result<Resp, Error>> {
        futures_util::stream::unfold(self, |pager| async move {
            let page = pager.next_page().await?;
            Some((page, pager))
        })
        .boxed()
    }

    /// The items of the remaining pages, flattened in order.
    pub fn items(&mut self) -> BoxStream<'_, Result<Resp::Item, Error>>
    where
        Resp::Item: Send + 'static,
    {
        self.pages()
            .flat_map(|page| {
                let items: Vec<_> = match page {
                    Ok(page) => page.into_items().into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                futures_util::stream::iter(items)
            })
            .boxed()
    }
}

impl<T, Req, Resp: fmt::Debug> fmt::Debug for Pager<T, Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("current", &self.current)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
