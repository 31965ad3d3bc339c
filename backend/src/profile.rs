//! Business profile for the onboarding wizard.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::error::{Result, ValidationError};
use crate::store::{Profile, ProfileUpdate};
use crate::SharedState;

const BUSINESS_TYPES: &[&str] = &["retail", "wholesale", "services", "other"];

/// GSTIN format check: exactly 15 alphanumeric characters.
pub fn validate_gstin(gstin: &str) -> bool {
    gstin.len() == 15 && gstin.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Profile completion over the three fields the wizard's first step asks
/// for: name 33, GSTIN 34, business type 33, capped at 100.
pub fn completion_pct(
    business_name: Option<&str>,
    gstin: Option<&str>,
    business_type: Option<&str>,
) -> i64 {
    let mut score = 0;
    if business_name.is_some() {
        score += 33;
    }
    if gstin.is_some() {
        score += 34;
    }
    if business_type.is_some() {
        score += 33;
    }
    score.min(100)
}

/// GET /api/profile — an absent profile reads as an all-empty one.
pub async fn get_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;
    let profile = state.store.get_profile(user_id).await?.unwrap_or_default();
    Ok(Json(json!({ "ok": true, "profile": profile })))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account_number: Option<String>,
    #[serde(default)]
    pub bank_ifsc: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/profile
pub async fn update_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;

    let business_name = clean(req.business_name);
    let gstin = clean(req.gstin).map(|g| g.to_uppercase());
    let business_type = clean(req.business_type).map(|t| t.to_lowercase());

    if let Some(gstin) = gstin.as_deref() {
        if !validate_gstin(gstin) {
            return Err(ValidationError::GstinInvalid.into());
        }
    }
    if let Some(kind) = business_type.as_deref() {
        if !BUSINESS_TYPES.contains(&kind) {
            return Err(ValidationError::BusinessTypeInvalid.into());
        }
    }

    let pct = completion_pct(
        business_name.as_deref(),
        gstin.as_deref(),
        business_type.as_deref(),
    );

    let profile: Profile = state
        .store
        .upsert_profile(
            user_id,
            ProfileUpdate {
                business_name,
                gstin,
                business_type,
                address: clean(req.address),
                phone: clean(req.phone),
                bank_name: clean(req.bank_name),
                bank_account_number: clean(req.bank_account_number),
                bank_ifsc: clean(req.bank_ifsc).map(|v| v.to_uppercase()),
            },
            pct,
        )
        .await?;

    Ok(Json(json!({ "ok": true, "profile": profile })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gstin_must_be_15_alphanumerics() {
        assert!(validate_gstin("27AAPFU0939F1ZV"));
        assert!(!validate_gstin("27AAPFU0939F1Z"));
        assert!(!validate_gstin("27AAPFU0939F1ZVX"));
        assert!(!validate_gstin("27AAPFU-939F1ZV"));
        assert!(!validate_gstin(""));
    }

    #[test]
    fn completion_is_additive_and_capped() {
        assert_eq!(completion_pct(None, None, None), 0);
        assert_eq!(completion_pct(Some("x"), None, None), 33);
        assert_eq!(completion_pct(None, Some("x"), None), 34);
        assert_eq!(completion_pct(Some("x"), Some("y"), None), 67);
        assert_eq!(completion_pct(Some("x"), Some("y"), Some("z")), 100);
    }

    #[test]
    fn clean_trims_and_drops_empty() {
        assert_eq!(clean(Some("  hi  ".into())), Some("hi".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }
}
