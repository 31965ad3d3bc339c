//! Insights: the summary dashboard and the natural-language query endpoint.

use axum::{extract::State, http::HeaderMap, Json};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::auth::require_user;
use crate::error::{ApiError, Result, ValidationError};
use crate::SharedState;

const INSIGHTS_SYSTEM_PROMPT: &str = "\
You are a BI query generator for Ledgerly, a ledger/accounting system for \
small Indian businesses.

DATABASE SCHEMA:
- entries(id, user_id, entry_type TEXT ['income','expense'], amount REAL, \
note TEXT, source TEXT ['manual','voice','bill_upload'], vendor_name TEXT, \
created_at TEXT)

USER QUERIES (Hindi/English/Hinglish mixed):
- \"Kal ka galla\" -> yesterday's total income
- \"Aaj kitna kamaya\" -> today's total income
- \"Aaj kitna kharch\" -> today's total expenses
- \"GST kitna laga\" -> total from bill_upload entries
- \"Total income\" -> sum of all income entries
- \"Last 7 din\" -> last 7 days data

OUTPUT FORMAT (JSON ONLY, NO MARKDOWN, NO CODE BLOCKS):
{\"sql\": \"SELECT ...\", \"chart\": \"bar|pie|line|none\", \
\"title\": \"Human readable title\", \"value_format\": \"currency|number|percent\"}

RULES:
1. Output ONLY valid JSON - no ```json blocks, no explanations, no markdown
2. Use SQLite date functions: date('now'), date('now', '-1 day'), date('now', '-7 days')
3. created_at is stored as 'YYYY-MM-DD HH:MM:SS' format
4. For date comparisons use: date(created_at) = date('now')
5. Chart types: \"bar\" for trends, \"pie\" for breakdowns, \"line\" for time series, \"none\" for single values
6. Always filter by user_id = {user_id} for security
7. For aggregations return: SELECT SUM(amount), entry_type FROM entries WHERE ... GROUP BY entry_type
8. For trends return: SELECT date(created_at) as day, SUM(amount) FROM entries WHERE ... GROUP BY day ORDER BY day";

/// GET /api/insights/summary
pub async fn summary(State(state): State<SharedState>, headers: HeaderMap) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;
    let summary = state.store.summary(user_id).await?;
    Ok(Json(json!({ "ok": true, "summary": summary })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

fn default_chart() -> String {
    "none".to_string()
}
fn default_title() -> String {
    "Query Result".to_string()
}
fn default_value_format() -> String {
    "currency".to_string()
}

#[derive(Debug, Deserialize)]
struct GeneratedQuery {
    #[serde(default)]
    sql: String,
    #[serde(default = "default_chart")]
    chart: String,
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_value_format")]
    value_format: String,
}

/// Guard a model-generated query before it may touch the database:
/// SELECT-only, no mutating keywords or statement separators, and a
/// `user_id` filter is forced in when the model forgot one.
pub fn validate_sql(sql: &str, user_id: i64) -> std::result::Result<String, String> {
    static WHERE_RE: OnceLock<Regex> = OnceLock::new();
    static FROM_ENTRIES_RE: OnceLock<Regex> = OnceLock::new();

    let sql = sql.trim();
    let sql_lower = sql.to_lowercase();

    if !sql_lower.starts_with("select") {
        return Err("Only SELECT queries are allowed".to_string());
    }

    if sql_lower.contains(';') {
        return Err("Dangerous SQL keyword detected: ;".to_string());
    }
    for keyword in ["drop", "delete", "update", "insert", "alter", "create", "truncate"] {
        // Word-boundary match so column names like created_at pass.
        let hit = sql_lower
            .match_indices(keyword)
            .any(|(idx, _)| {
                let before = sql_lower[..idx].chars().next_back();
                let after = sql_lower[idx + keyword.len()..].chars().next();
                let boundary =
                    |c: Option<char>| c.map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
                boundary(before) && boundary(after)
            });
        if hit {
            return Err(format!("Dangerous SQL keyword detected: {keyword}"));
        }
    }

    if sql_lower.contains("user_id") {
        return Ok(sql.to_string());
    }

    if sql_lower.contains("where") {
        let re = WHERE_RE.get_or_init(|| Regex::new(r"(?i)\bWHERE\b").expect("static pattern"));
        Ok(re
            .replace(sql, format!("WHERE user_id = {user_id} AND").as_str())
            .into_owned())
    } else {
        let re = FROM_ENTRIES_RE
            .get_or_init(|| Regex::new(r"(?i)\bFROM\s+entries\b").expect("static pattern"));
        if !re.is_match(sql) {
            return Err("Query must read from the entries table".to_string());
        }
        Ok(re
            .replace(sql, format!("FROM entries WHERE user_id = {user_id}").as_str())
            .into_owned())
    }
}

/// POST /api/insights/ask
pub async fn ask(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;

    let question = req.question.trim();
    if question.is_empty() {
        return Err(ValidationError::QuestionRequired.into());
    }

    let client = state.ai.as_ref().ok_or(ApiError::AiNotConfigured)?;

    let system_prompt = INSIGHTS_SYSTEM_PROMPT.replace("{user_id}", &user_id.to_string());
    let generated: GeneratedQuery = client
        .chat_json(&system_prompt, question)
        .await
        .map_err(|err| ApiError::Internal(format!("query generation failed: {err:#}")))?;

    if generated.sql.trim().is_empty() {
        return Err(ApiError::SqlRejected(
            "Could not generate SQL from question".to_string(),
        ));
    }

    let sql = validate_sql(&generated.sql, user_id).map_err(ApiError::SqlRejected)?;
    tracing::debug!(%sql, "running insights query");

    let points = state.store.run_insights_query(&sql).await?;

    if generated.chart == "none" || points.len() <= 1 {
        let value = points.first().map(|(_, v)| *v).unwrap_or(0.0);
        return Ok(Json(json!({
            "ok": true,
            "title": generated.title,
            "value": value,
            "value_format": generated.value_format,
            "chart": "none",
            "data": Value::Null,
            "sql": sql,
        })));
    }

    let total: f64 = points.iter().map(|(_, v)| v).sum();
    let data: Vec<Value> = points
        .into_iter()
        .map(|(label, value)| json!({ "label": label, "value": value }))
        .collect();

    Ok(Json(json!({
        "ok": true,
        "title": generated.title,
        "value": total,
        "value_format": generated.value_format,
        "chart": generated.chart,
        "data": data,
        "sql": sql,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_select_is_allowed() {
        assert!(validate_sql("SELECT SUM(amount) FROM entries", 1).is_ok());
        assert!(validate_sql("UPDATE entries SET amount = 0", 1).is_err());
        assert!(validate_sql("  delete from entries", 1).is_err());
        assert!(validate_sql("", 1).is_err());
    }

    #[test]
    fn dangerous_keywords_and_separators_rejected() {
        assert!(validate_sql("SELECT 1 FROM entries; DROP TABLE entries", 1).is_err());
        assert!(validate_sql("SELECT * FROM entries WHERE note = 'x' AND 1=1 UNION SELECT password_hash, 1 FROM users; --", 1).is_err());
        assert!(validate_sql("SELECT truncate FROM entries", 1).is_err());
    }

    #[test]
    fn created_at_is_not_a_dangerous_keyword() {
        let sql = "SELECT date(created_at), SUM(amount) FROM entries WHERE user_id = 7 GROUP BY 1";
        assert_eq!(validate_sql(sql, 7).unwrap(), sql);
    }

    #[test]
    fn user_filter_injected_into_existing_where() {
        let out = validate_sql(
            "SELECT SUM(amount) FROM entries WHERE entry_type = 'income'",
            42,
        )
        .unwrap();
        assert_eq!(
            out,
            "SELECT SUM(amount) FROM entries WHERE user_id = 42 AND entry_type = 'income'"
        );
    }

    #[test]
    fn user_filter_appended_when_no_where() {
        let out = validate_sql("SELECT SUM(amount) FROM entries", 42).unwrap();
        assert_eq!(out, "SELECT SUM(amount) FROM entries WHERE user_id = 42");
    }

    #[test]
    fn queries_not_touching_entries_are_rejected() {
        assert!(validate_sql("SELECT * FROM users", 1).is_err());
    }
}
