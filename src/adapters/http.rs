//! HTTP surface of the ledger
//!
//! | Method  | Path                      | Body          |
//! |---------|---------------------------|---------------|
//! | `GET`   | `/point/:id`              |               |
//! | `PATCH` | `/point/:id/charge`       | JSON number   |
//! | `PATCH` | `/point/:id/use`          | JSON number   |
//! | `GET`   | `/point/:id/histories`    |               |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::{
    commands::{
        charge::ChargeRequest, get_balance::GetBalanceRequest, get_history::GetHistoryRequest,
        use_points::UseRequest, DomainLogic, Error, ErrorKind,
    },
    domain::{Balance, HistoryEntry, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};

const INTERNAL_ERROR_MESSAGE: &str = "an internal error occurred";

pub fn router<B, H>(logic: DomainLogic<B, H>) -> Router
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    Router::new()
        .route("/point/:user_id", get(get_balance::<B, H>))
        .route("/point/:user_id/charge", patch(charge::<B, H>))
        .route("/point/:user_id/use", patch(use_points::<B, H>))
        .route("/point/:user_id/histories", get(get_history::<B, H>))
        .layer(TraceLayer::new_for_http())
        .with_state(logic)
}

async fn get_balance<B, H>(
    State(logic): State<DomainLogic<B, H>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Balance>, ApiError>
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    let balance = logic.oneshot(GetBalanceRequest { user_id }).await?;
    Ok(Json(balance))
}

async fn charge<B, H>(
    State(logic): State<DomainLogic<B, H>>,
    Path(user_id): Path<UserId>,
    Json(amount): Json<i64>,
) -> Result<Json<Balance>, ApiError>
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    let balance = logic.oneshot(ChargeRequest { user_id, amount }).await?;
    Ok(Json(balance))
}

async fn use_points<B, H>(
    State(logic): State<DomainLogic<B, H>>,
    Path(user_id): Path<UserId>,
    Json(amount): Json<i64>,
) -> Result<Json<Balance>, ApiError>
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    let balance = logic.oneshot(UseRequest { user_id, amount }).await?;
    Ok(Json(balance))
}

async fn get_history<B, H>(
    State(logic): State<DomainLogic<B, H>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    let entries = logic.oneshot(GetHistoryRequest { user_id }).await?;
    Ok(Json(entries))
}

/// Body of every error response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: String,
    pub message: String,
}

/// Ledger error on its way out of a handler
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.kind() {
            ErrorKind::InvalidAmount | ErrorKind::InsufficientBalance => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            ErrorKind::Unclassified => {
                tracing::error!("unhandled ledger error: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let body = ErrorResponse {
            status_code: status.as_u16().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
