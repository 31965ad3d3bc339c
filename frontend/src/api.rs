//! View models mirrored from server JSON and the fetch helpers that load
//! them. All requests are same-origin with credentials and carry the bearer
//! token when one is stored.

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use web_sys::RequestCredentials;

pub const API_BASE_URL: &str = "";

pub const NETWORK_ERROR: &str = "Network error. Check your connection and try again.";
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

// ─── Models ──────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Entry {
    pub id: i64,
    pub entry_type: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct EntriesResponse {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct EntryResponse {
    pub entry: Entry,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub user: Option<ApiUser>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub user: ApiUser,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct TrendPoint {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expense: f64,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct SourceCount {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub count: i64,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct InsightsSummary {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub net_cash: f64,
    #[serde(default)]
    pub week_income: f64,
    #[serde(default)]
    pub week_expenses: f64,
    #[serde(default)]
    pub week_net: f64,
    #[serde(default)]
    pub today_income: f64,
    #[serde(default)]
    pub today_expenses: f64,
    #[serde(default)]
    pub source_breakdown: Vec<SourceCount>,
    #[serde(default)]
    pub daily_trend: Vec<TrendPoint>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct SummaryResponse {
    pub summary: InsightsSummary,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct Profile {
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
    #[serde(default)]
    pub profile_completion_pct: i64,
    #[serde(default)]
    pub catalog_completion_pct: i64,
    #[serde(default)]
    pub inventory_completion_pct: i64,
    #[serde(default)]
    pub integrations_completion_pct: i64,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct VoiceItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct VoiceResponse {
    pub entry: Entry,
    #[serde(default)]
    pub items: Vec<VoiceItem>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct BillItem {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct UploadedBill {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub detected_amount: Option<f64>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub bill_date: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub gst_amount: Option<f64>,
    #[serde(default)]
    pub items: Option<Vec<BillItem>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub bill: UploadedBill,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct StoredBill {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub bill_date: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct BillsResponse {
    #[serde(default)]
    pub bills: Vec<StoredBill>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct AskPoint {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub value_format: String,
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub data: Option<Vec<AskPoint>>,
}

// ─── Token storage ───────────────────────────────────────────────────────────

pub fn auth_token() -> Option<String> {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(token)) = storage.get_item("access_token") {
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }
    }
    None
}

pub fn store_auth_token(token: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item("access_token", token);
        }
    }
}

pub fn clear_auth_token() {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.remove_item("access_token");
        }
    }
}

// ─── Requests ────────────────────────────────────────────────────────────────

fn with_auth(builder: RequestBuilder) -> RequestBuilder {
    let builder = builder.credentials(RequestCredentials::Include);
    match auth_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {token}")),
        None => builder,
    }
}

/// The user-facing message for a failed response body: `message`, then
/// `error`, then a generic fallback.
pub fn error_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if resp.ok() {
        resp.json::<T>()
            .await
            .map_err(|_| "Could not read the server response.".to_string())
    } else {
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Err(error_message(&body))
    }
}

pub async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    let url = format!("{API_BASE_URL}{path}");
    let resp = with_auth(Request::get(&url))
        .send()
        .await
        .map_err(|_| NETWORK_ERROR.to_string())?;
    decode(resp).await
}

pub async fn post_json<T: DeserializeOwned, B: Serialize>(path: &str, body: &B) -> Result<T, String> {
    let url = format!("{API_BASE_URL}{path}");
    let request = with_auth(Request::post(&url))
        .json(body)
        .map_err(|_| GENERIC_ERROR.to_string())?;
    let resp = request.send().await.map_err(|_| NETWORK_ERROR.to_string())?;
    decode(resp).await
}

/// Multipart POST for file uploads.
pub async fn post_form<T: DeserializeOwned>(
    path: &str,
    form: web_sys::FormData,
) -> Result<T, String> {
    let url = format!("{API_BASE_URL}{path}");
    let request = with_auth(Request::post(&url))
        .body(form)
        .map_err(|_| GENERIC_ERROR.to_string())?;
    let resp = request.send().await.map_err(|_| NETWORK_ERROR.to_string())?;
    decode(resp).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_message_over_error() {
        let body = json!({"error": "password_too_short", "message": "Password must be at least 8 characters"});
        assert_eq!(error_message(&body), "Password must be at least 8 characters");
    }

    #[test]
    fn error_message_falls_back_to_error_code() {
        let body = json!({"error": "unauthorized"});
        assert_eq!(error_message(&body), "unauthorized");
    }

    #[test]
    fn error_message_generic_for_unreadable_bodies() {
        assert_eq!(error_message(&Value::Null), GENERIC_ERROR);
        assert_eq!(error_message(&json!({"ok": false})), GENERIC_ERROR);
    }

    #[test]
    fn entry_parses_with_missing_optionals() {
        let entry: Entry =
            serde_json::from_value(json!({"id": 1, "entry_type": "income", "amount": 50.0}))
                .unwrap();
        assert_eq!(entry.note, None);
        assert_eq!(entry.source, None);
    }
}
