use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use holdem_engine::{EngineError, ErrorKind};
use serde::Serialize;

/// Wraps [`EngineError`] with the HTTP status `spec.md` §7 assigns to each
/// taxonomy bucket (client / state-machine / authorization / fatal).
#[derive(Debug, Clone)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::NotYourTurn | ErrorKind::CashOutDuringHand | ErrorKind::TableBusy | ErrorKind::GameNotWaiting => {
                StatusCode::CONFLICT
            }
            ErrorKind::GameNotFound | ErrorKind::TableFull => StatusCode::NOT_FOUND,
            ErrorKind::DeckExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody { kind: self.0.kind, message: self.0.message };
        (status, Json(body)).into_response()
    }
}
