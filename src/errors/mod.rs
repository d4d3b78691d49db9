use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::StoreError;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Database Error: {0}")]
    Database(String),
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl AppError {
    /// Validation failure naming a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        AppError::Validation {
            message: "Validation failed".to_string(),
            fields,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", err.code),
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation {
            message: "Validation failed".to_string(),
            fields,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::BadRequest(msg),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { message, fields } => ErrorResponse {
                error: message.clone(),
                fields: Some(fields),
            },
            AppError::Database(msg) | AppError::Internal(msg) => {
                error!("{}", self);
                ErrorResponse {
                    error: msg.clone(),
                    fields: None,
                }
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) => ErrorResponse {
                error: msg.clone(),
                fields: None,
            },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::field("id", "x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_keep_field_names() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("date");
        err.message = Some("Date has wrong format. Use DD/MM/YYYY.".into());
        errors.add("date_of_birth", err);
        errors.add("email", ValidationError::new("email"));

        match AppError::from(errors) {
            AppError::Validation { fields, .. } => {
                assert_eq!(
                    fields["date_of_birth"],
                    vec!["Date has wrong format. Use DD/MM/YYYY.".to_string()]
                );
                assert_eq!(fields["email"], vec!["Invalid value (email).".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
