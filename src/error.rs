use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{order::FieldError, store::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation Failed")]
    Validation(Vec<FieldError>),

    #[error("Order not found")]
    OrderNotFound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Validation Failed", "errors": errors })),
            )
                .into_response(),

            AppError::OrderNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Order not found" })),
            )
                .into_response(),

            AppError::Store(source) => {
                error!("Store failure: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Something went wrong on the server!" })),
                )
                    .into_response()
            }
        }
    }
}
