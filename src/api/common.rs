//! Shared helpers for request handling

use validator::Validate;

use crate::api::middleware::ApiError;

/// Run the `validator` rules of a request body
pub fn validated<T: Validate>(body: T) -> Result<T, ApiError> {
    body.validate()?;
    Ok(body)
}
