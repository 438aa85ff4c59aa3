//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })` to get compile-time
//! type safety and consistent serialization.

use marquee_core::filters::Metadata;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "metadata": {...} }` envelope for paginated lists.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub metadata: Metadata,
}

/// Body for operations that have nothing to return but a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> DataResponse<Self> {
        DataResponse {
            data: Self {
                message: message.into(),
            },
        }
    }
}
