//! Request coercion for methods with flattened parameters.
//!
//! Generated methods accept either a whole request message or a few of its fields as plain
//! arguments, never both.
use crate::error::Error;

/// Resolves the request a generated method sends.
///
/// Returns `request` unchanged, or a default request the caller then fills with the flattened
/// fields.
///
/// # Errors
///
/// [`Error::Usage`] when a request is given together with flattened fields. No call is made in
/// that case.
pub fn coerce_request<Req: Default>(
    request: Option<Req>,
    flattened_set: bool,
) -> Result<Req, Error> {
    match request {
        Some(_) if flattened_set => Err(Error::Usage(
            "If the `request` argument is set, then none of the individual field arguments \
             should be set."
                .to_string(),
        )),
        Some(request) => Ok(request),
        None => Ok(Req::default()),
    }
}
