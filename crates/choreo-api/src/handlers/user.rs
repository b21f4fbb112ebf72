//! User id extraction shared by handlers.
//!
//! There is no authentication: clients name their user in each request, and
//! the id doubles as a folder name under `uploads/`.

use choreo_models::{is_valid_user_id, DEFAULT_USER_ID};

use crate::error::{ApiError, ApiResult};

/// Optional user id, falling back to `default_user` when absent or blank.
pub fn user_or_default(raw: Option<&str>) -> ApiResult<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => validate(id),
        None => Ok(DEFAULT_USER_ID.to_string()),
    }
}

/// Required user id; `missing_message` is returned verbatim when absent or blank.
pub fn required_user(raw: Option<&str>, missing_message: &str) -> ApiResult<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => validate(id),
        None => Err(ApiError::bad_request(missing_message)),
    }
}

fn validate(id: &str) -> ApiResult<String> {
    if is_valid_user_id(id) {
        Ok(id.to_string())
    } else {
        Err(ApiError::bad_request("Invalid userId"))
    }
}
