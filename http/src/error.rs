use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docqa_application::ApplicationError;
use docqa_domain::DomainError;
use serde_json::json;

#[derive(Debug)]
pub enum HttpError {
    BadRequest { message: String },
    Validation { message: String },
    Rejected { status: StatusCode, message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Rejected { status, .. } => *status,
            HttpError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            HttpError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            HttpError::BadRequest { message }
            | HttpError::Validation { message }
            | HttpError::Rejected { message, .. }
            | HttpError::BadGateway { message }
            | HttpError::Internal { message } => message,
        };

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}

pub fn error_mapper(error: ApplicationError) -> HttpError {
    match error {
        ApplicationError::Validation(message) => HttpError::Validation { message },
        ApplicationError::Domain(DomainError::InvalidInput(message)) => {
            HttpError::Validation { message }
        }
        ApplicationError::Domain(err @ DomainError::ExternalService { .. }) => {
            HttpError::BadGateway {
                message: err.to_string(),
            }
        }
        other => HttpError::Internal {
            message: other.to_string(),
        },
    }
}

impl From<ApplicationError> for HttpError {
    fn from(error: ApplicationError) -> Self {
        error_mapper(error)
    }
}
