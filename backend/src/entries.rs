//! Ledger entry listing and manual creation.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::error::{Result, ValidationError};
use crate::store::NewEntry;
use crate::SharedState;

/// GET /api/entries
pub async fn list(State(state): State<SharedState>, headers: HeaderMap) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;
    let entries = state.store.list_entries(user_id).await?;
    Ok(Json(json!({ "ok": true, "entries": entries })))
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub entry_type: String,
    /// Accepts a JSON number or a numeric string, like the original API.
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub note: Option<String>,
}

/// Coerce the loose `amount` field into a positive number.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v > 0.0)
}

/// POST /api/entries
pub async fn create(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<CreateEntryRequest>,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;

    let entry_type = req.entry_type.trim().to_lowercase();
    if entry_type != "income" && entry_type != "expense" {
        return Err(ValidationError::EntryTypeInvalid.into());
    }

    let amount = parse_amount(&req.amount).ok_or(ValidationError::AmountInvalid)?;
    let note = req
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let entry = state
        .store
        .create_entry(
            user_id,
            NewEntry {
                entry_type,
                amount,
                note,
                source: "manual".to_string(),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(json!({ "ok": true, "entry": entry })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_number_or_numeric_string() {
        assert_eq!(parse_amount(&json!(120.5)), Some(120.5));
        assert_eq!(parse_amount(&json!("340")), Some(340.0));
        assert_eq!(parse_amount(&json!(" 12.75 ")), Some(12.75));
    }

    #[test]
    fn amount_rejects_non_positive_and_garbage() {
        assert_eq!(parse_amount(&json!(0)), None);
        assert_eq!(parse_amount(&json!(-5)), None);
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!({"x": 1})), None);
    }
}
