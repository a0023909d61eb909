//! Account endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::{ApiError, ApiResponse};
use crate::api::state::AppState;
use crate::types::Account;

/// Query parameters for listing top accounts
#[derive(Debug, Deserialize)]
pub struct TopAccountsParams {
    /// Maximum number of accounts to return (default: 10, max: 1000)
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    10
}

/// GET /api/accounts - Top accounts ordered by account id
pub async fn list_top_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopAccountsParams>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let count = params.count.min(1000);

    let accounts = state.source.fetch_top(count).await.map_err(|e| {
        warn!(error = %e, "error from account source");
        ApiError::Unavailable(e.to_string())
    })?;

    let total = accounts.len();
    Ok(Json(ApiResponse::with_total(accounts, total)))
}

/// GET /api/accounts/:account_id - Single account summary
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    // URL decode the id (handles spaces and special chars)
    let account_id = urlencoding::decode(&account_id)
        .map(|s| s.into_owned())
        .unwrap_or(account_id);

    if account_id.trim().is_empty() || account_id == "0" {
        info!(account = %account_id, "invalid account id");
        return Err(ApiError::BadRequest("Invalid account id".to_string()));
    }

    match state.source.get_account(&account_id).await {
        Ok(Some(account)) => Ok(Json(ApiResponse::new(account))),
        Ok(None) => {
            info!(account = %account_id, "account not found");
            Err(ApiError::NotFound("account does not exist".to_string()))
        }
        Err(e) => {
            warn!(account = %account_id, error = %e, "unable to retrieve account summary");
            Err(ApiError::Unavailable("Unable to retrieve account".to_string()))
        }
    }
}
