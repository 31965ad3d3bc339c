//! SQLite persistence for users, sessions, ledger entries, bills and
//! business profiles.

use rand_core::{OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// Session time-to-live in seconds (14 days; 30 with "remember me").
const SESSION_TTL_SECS: i64 = 14 * 24 * 3600;
const REMEMBER_TTL_SECS: i64 = 30 * 24 * 3600;

pub const DEMO_EMAIL: &str = "demo@ledgerly.in";
const DEMO_USERNAME: &str = "Demo Owner";
const DEMO_PASSWORD: &str = "Ledgerly@123";

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn unixepoch() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Generate a 32-char hex session token (UUID v4, dashes stripped).
fn random_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Salted SHA-256 password hash, stored as `<salt_hex>$<digest_hex>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    format!("{salt_hex}${}", digest_with_salt(&salt_hex, password))
}

/// Constant shape check plus digest comparison against a stored hash.
pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt_hex, digest_hex)) => digest_with_salt(salt_hex, password) == digest_hex,
        None => false,
    }
}

fn digest_with_salt(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// ─── Models ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    pub id: i64,
    pub entry_type: String,
    pub amount: f64,
    pub note: Option<String>,
    pub source: String,
    pub created_at: String,
}

/// Insert payload for an entry; bill uploads carry the GST split.
#[derive(Debug, Default)]
pub struct NewEntry {
    pub entry_type: String,
    pub amount: f64,
    pub note: Option<String>,
    pub source: String,
    pub vendor_name: Option<String>,
    pub vendor_gstin: Option<String>,
    pub bill_number: Option<String>,
    pub bill_date: Option<String>,
    pub taxable_amount: Option<f64>,
    pub cgst_amount: Option<f64>,
    pub sgst_amount: Option<f64>,
    pub igst_amount: Option<f64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bill {
    pub id: i64,
    pub filename: String,
    pub public_url: String,
    pub ocr_text: Option<String>,
    pub detected_amount: Option<f64>,
    pub vendor_name: Option<String>,
    pub bill_date: Option<String>,
    pub total_amount: Option<f64>,
    pub gst_amount: Option<f64>,
    pub items_json: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct Profile {
    pub business_name: Option<String>,
    pub gstin: Option<String>,
    pub business_type: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub profile_completion_pct: i64,
    pub catalog_completion_pct: i64,
    pub inventory_completion_pct: i64,
    pub integrations_completion_pct: i64,
}

/// Fields a profile update may set; completion is computed by the caller.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub business_name: Option<String>,
    pub gstin: Option<String>,
    pub business_type: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub day: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_cash: f64,
    pub week_income: f64,
    pub week_expenses: f64,
    pub week_net: f64,
    pub today_income: f64,
    pub today_expenses: f64,
    pub source_breakdown: Vec<SourceCount>,
    pub daily_trend: Vec<TrendPoint>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
        .map_err(|e| ApiError::Internal(format!("bad database path {db_path:?}: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    Ok(SqlitePool::connect_with(opts).await?)
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schema and seed the demo account when absent.
    pub async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.seed_demo_user().await?;
        Ok(())
    }

    async fn seed_demo_user(&self) -> Result<()> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(DEMO_EMAIL)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_none() {
            sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
                .bind(DEMO_USERNAME)
                .bind(DEMO_EMAIL)
                .bind(hash_password(DEMO_PASSWORD))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    // ─── Users & sessions ─────────────────────────────────────────────────

    pub async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(hash_password(password))
            .execute(&self.pool)
            .await;

        let result = match result {
            Ok(r) => r,
            Err(e) => {
                let unique = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);
                return Err(if unique { ApiError::UserExists } else { e.into() });
            }
        };

        self.get_user(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ApiError::Internal("user vanished after insert".into()))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Look up a user by email or username, case-insensitively.
    pub async fn find_user(&self, identifier: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users \
             WHERE lower(email) = lower(?) OR lower(username) = lower(?) LIMIT 1",
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn create_session(&self, user_id: i64, remember: bool) -> Result<String> {
        let token = random_session_token();
        let ttl = if remember { REMEMBER_TTL_SECS } else { SESSION_TTL_SECS };
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(unixepoch() + ttl)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    pub async fn revoke_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a bearer token to a user id; expired sessions are pruned.
    pub async fn user_id_for_token(&self, token: &str) -> Result<Option<i64>> {
        sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(unixepoch())
            .execute(&self.pool)
            .await?;

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(unixepoch())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    // ─── Entries ──────────────────────────────────────────────────────────

    pub async fn list_entries(&self, user_id: i64) -> Result<Vec<Entry>> {
        Ok(sqlx::query_as::<_, Entry>(
            "SELECT id, entry_type, amount, note, source, created_at \
             FROM entries WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_entry(&self, user_id: i64, new: NewEntry) -> Result<Entry> {
        let result = sqlx::query(
            "INSERT INTO entries \
             (user_id, entry_type, amount, note, source, vendor_name, vendor_gstin, \
              bill_number, bill_date, taxable_amount, cgst_amount, sgst_amount, igst_amount) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&new.entry_type)
        .bind(new.amount)
        .bind(&new.note)
        .bind(&new.source)
        .bind(&new.vendor_name)
        .bind(&new.vendor_gstin)
        .bind(&new.bill_number)
        .bind(&new.bill_date)
        .bind(new.taxable_amount)
        .bind(new.cgst_amount)
        .bind(new.sgst_amount)
        .bind(new.igst_amount)
        .execute(&self.pool)
        .await?;

        Ok(sqlx::query_as::<_, Entry>(
            "SELECT id, entry_type, amount, note, source, created_at FROM entries WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?)
    }

    // ─── Bills ────────────────────────────────────────────────────────────

    pub async fn insert_bill(
        &self,
        user_id: i64,
        filename: &str,
        stored_path: &str,
        public_url: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO bills (user_id, filename, stored_path, public_url, status) \
             VALUES (?, ?, ?, ?, 'processing')",
        )
        .bind(user_id)
        .bind(filename)
        .bind(stored_path)
        .bind(public_url)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn finish_bill(
        &self,
        bill_id: i64,
        ocr_text: &str,
        detected_amount: Option<f64>,
        vendor_name: Option<&str>,
        bill_date: Option<&str>,
        total_amount: Option<f64>,
        gst_amount: Option<f64>,
        items_json: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE bills SET ocr_text = ?, detected_amount = ?, vendor_name = ?, bill_date = ?, \
             total_amount = ?, gst_amount = ?, items_json = ?, status = 'done' WHERE id = ?",
        )
        .bind(ocr_text)
        .bind(detected_amount)
        .bind(vendor_name)
        .bind(bill_date)
        .bind(total_amount)
        .bind(gst_amount)
        .bind(items_json)
        .bind(bill_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_bills(&self, user_id: i64) -> Result<Vec<Bill>> {
        Ok(sqlx::query_as::<_, Bill>(
            "SELECT id, filename, public_url, ocr_text, detected_amount, vendor_name, bill_date, \
             total_amount, gst_amount, items_json, status, created_at \
             FROM bills WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_bill(&self, user_id: i64, bill_id: i64) -> Result<Option<Bill>> {
        Ok(sqlx::query_as::<_, Bill>(
            "SELECT id, filename, public_url, ocr_text, detected_amount, vendor_name, bill_date, \
             total_amount, gst_amount, items_json, status, created_at \
             FROM bills WHERE id = ? AND user_id = ?",
        )
        .bind(bill_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    // ─── Profiles ─────────────────────────────────────────────────────────

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<Profile>> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT business_name, gstin, business_type, address, phone, \
             bank_name, bank_account_number, bank_ifsc, \
             profile_completion_pct, catalog_completion_pct, \
             inventory_completion_pct, integrations_completion_pct \
             FROM business_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn upsert_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
        completion_pct: i64,
    ) -> Result<Profile> {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM business_profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            sqlx::query(
                "UPDATE business_profiles SET \
                 business_name = ?, gstin = ?, business_type = ?, address = ?, phone = ?, \
                 bank_name = ?, bank_account_number = ?, bank_ifsc = ?, \
                 profile_completion_pct = ?, updated_at = datetime('now') \
                 WHERE user_id = ?",
            )
            .bind(&update.business_name)
            .bind(&update.gstin)
            .bind(&update.business_type)
            .bind(&update.address)
            .bind(&update.phone)
            .bind(&update.bank_name)
            .bind(&update.bank_account_number)
            .bind(&update.bank_ifsc)
            .bind(completion_pct)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO business_profiles \
                 (user_id, business_name, gstin, business_type, address, phone, \
                  bank_name, bank_account_number, bank_ifsc, profile_completion_pct) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&update.business_name)
            .bind(&update.gstin)
            .bind(&update.business_type)
            .bind(&update.address)
            .bind(&update.phone)
            .bind(&update.bank_name)
            .bind(&update.bank_account_number)
            .bind(&update.bank_ifsc)
            .bind(completion_pct)
            .execute(&self.pool)
            .await?;
        }

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::Internal("profile vanished after upsert".into()))
    }

    // ─── Insights ─────────────────────────────────────────────────────────

    pub async fn summary(&self, user_id: i64) -> Result<Summary> {
        let total_income = self.sum_entries(user_id, "income", None).await?;
        let total_expenses = self.sum_entries(user_id, "expense", None).await?;
        let week_income = self.sum_entries(user_id, "income", Some("-7 days")).await?;
        let week_expenses = self.sum_entries(user_id, "expense", Some("-7 days")).await?;
        let today_income = self.sum_entries_today(user_id, "income").await?;
        let today_expenses = self.sum_entries_today(user_id, "expense").await?;

        let source_breakdown: Vec<SourceCount> = sqlx::query_as::<_, (String, i64)>(
            "SELECT COALESCE(source, 'manual') AS src, COUNT(*) AS cnt \
             FROM entries WHERE user_id = ? GROUP BY src",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect();

        let daily_trend: Vec<TrendPoint> = sqlx::query_as::<_, (String, f64, f64)>(
            "SELECT date(created_at) AS day, \
             SUM(CASE WHEN entry_type = 'income' THEN amount ELSE 0.0 END) AS income, \
             SUM(CASE WHEN entry_type = 'expense' THEN amount ELSE 0.0 END) AS expense \
             FROM entries WHERE user_id = ? AND date(created_at) >= date('now', '-7 days') \
             GROUP BY day ORDER BY day",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(day, income, expense)| TrendPoint { day, income, expense })
        .collect();

        Ok(Summary {
            total_income,
            total_expenses,
            net_cash: total_income - total_expenses,
            week_income,
            week_expenses,
            week_net: week_income - week_expenses,
            today_income,
            today_expenses,
            source_breakdown,
            daily_trend,
        })
    }

    async fn sum_entries(
        &self,
        user_id: i64,
        entry_type: &str,
        since: Option<&str>,
    ) -> Result<f64> {
        let sql = match since {
            Some(_) => {
                "SELECT COALESCE(SUM(amount), 0.0) FROM entries \
                 WHERE user_id = ? AND entry_type = ? AND date(created_at) >= date('now', ?)"
            }
            None => {
                "SELECT COALESCE(SUM(amount), 0.0) FROM entries \
                 WHERE user_id = ? AND entry_type = ?"
            }
        };
        let mut query = sqlx::query_scalar::<_, f64>(sql).bind(user_id).bind(entry_type);
        if let Some(modifier) = since {
            query = query.bind(modifier);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn sum_entries_today(&self, user_id: i64, entry_type: &str) -> Result<f64> {
        Ok(sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(amount), 0.0) FROM entries \
             WHERE user_id = ? AND entry_type = ? AND date(created_at) = date('now')",
        )
        .bind(user_id)
        .bind(entry_type)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Execute an already-guarded SELECT and collapse each row into a
    /// `(label, value)` pair the insights endpoint can chart.
    pub async fn run_insights_query(&self, sql: &str) -> Result<Vec<(String, f64)>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let width = row.len();
            if width == 0 {
                continue;
            }
            if width == 1 {
                points.push(("Total".to_string(), decode_number(&row, 0)));
            } else {
                points.push((decode_label(&row, 0), decode_number(&row, 1)));
            }
        }
        Ok(points)
    }
}

fn decode_number(row: &sqlx::sqlite::SqliteRow, idx: usize) -> f64 {
    row.try_get::<f64, _>(idx)
        .or_else(|_| row.try_get::<i64, _>(idx).map(|v| v as f64))
        .unwrap_or(0.0)
}

fn decode_label(row: &sqlx::sqlite::SqliteRow, idx: usize) -> String {
    row.try_get::<String, _>(idx)
        .or_else(|_| row.try_get::<f64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<i64, _>(idx).map(|v| v.to_string()))
        .unwrap_or_else(|_| "Unknown".to_string())
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token      TEXT PRIMARY KEY,
        user_id    INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS entries (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id        INTEGER NOT NULL,
        entry_type     TEXT NOT NULL,
        amount         REAL NOT NULL,
        note           TEXT,
        source         TEXT NOT NULL DEFAULT 'manual',
        vendor_name    TEXT,
        vendor_gstin   TEXT,
        bill_number    TEXT,
        bill_date      TEXT,
        taxable_amount REAL,
        cgst_amount    REAL,
        sgst_amount    REAL,
        igst_amount    REAL,
        created_at     TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_entries_user ON entries(user_id)",
    "CREATE TABLE IF NOT EXISTS bills (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         INTEGER NOT NULL,
        filename        TEXT NOT NULL,
        stored_path     TEXT NOT NULL,
        public_url      TEXT NOT NULL,
        ocr_text        TEXT,
        detected_amount REAL,
        vendor_name     TEXT,
        bill_date       TEXT,
        total_amount    REAL,
        gst_amount      REAL,
        items_json      TEXT,
        status          TEXT NOT NULL DEFAULT 'processing',
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_bills_user ON bills(user_id)",
    "CREATE TABLE IF NOT EXISTS business_profiles (
        id                          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id                     INTEGER NOT NULL UNIQUE,
        business_name               TEXT,
        gstin                       TEXT,
        business_type               TEXT,
        address                     TEXT,
        phone                       TEXT,
        bank_name                   TEXT,
        bank_account_number         TEXT,
        bank_ifsc                   TEXT,
        profile_completion_pct      INTEGER NOT NULL DEFAULT 0,
        catalog_completion_pct      INTEGER NOT NULL DEFAULT 0,
        inventory_completion_pct    INTEGER NOT NULL DEFAULT 0,
        integrations_completion_pct INTEGER NOT NULL DEFAULT 0,
        updated_at                  TEXT
    )",
];

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePool::connect_with(opts).await.unwrap();
        let store = Store::new(pool);
        store.init().await.unwrap();
        store
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("Ledgerly@123");
        assert!(hash.contains('$'));
        assert!(verify_password(&hash, "Ledgerly@123"));
        assert!(!verify_password(&hash, "ledgerly@123"));
        assert!(!verify_password("garbage-without-separator", "x"));
    }

    #[test]
    fn password_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[tokio::test]
    async fn demo_user_is_seeded_once() {
        let store = test_store().await;
        // init again must not duplicate the demo account
        store.init().await.unwrap();
        let user = store.find_user(DEMO_EMAIL).await.unwrap().unwrap();
        assert_eq!(user.email, DEMO_EMAIL);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = test_store().await;
        store.create_user("Asha", "asha@example.in", "password123").await.unwrap();
        let err = store
            .create_user("Other", "asha@example.in", "password456")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UserExists));
    }

    #[tokio::test]
    async fn login_identifier_matches_email_or_username() {
        let store = test_store().await;
        store.create_user("Asha", "asha@example.in", "password123").await.unwrap();

        let by_email = store.find_user("ASHA@EXAMPLE.IN").await.unwrap();
        let by_name = store.find_user("asha").await.unwrap();
        assert!(by_email.is_some());
        assert!(by_name.is_some());
        assert_eq!(by_email.unwrap().id, by_name.unwrap().id);
    }

    #[tokio::test]
    async fn sessions_resolve_and_revoke() {
        let store = test_store().await;
        let user = store.create_user("Asha", "asha@example.in", "password123").await.unwrap();

        let token = store.create_session(user.id, false).await.unwrap();
        assert_eq!(token.len(), 32);
        assert_eq!(store.user_id_for_token(&token).await.unwrap(), Some(user.id));

        store.revoke_session(&token).await.unwrap();
        assert_eq!(store.user_id_for_token(&token).await.unwrap(), None);
        assert_eq!(store.user_id_for_token("nonsense").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_are_scoped_per_user() {
        let store = test_store().await;
        let a = store.create_user("A", "a@example.in", "password123").await.unwrap();
        let b = store.create_user("B", "b@example.in", "password123").await.unwrap();

        for (user, amount) in [(&a, 100.0), (&a, 50.0), (&b, 999.0)] {
            store
                .create_entry(
                    user.id,
                    NewEntry {
                        entry_type: "income".into(),
                        amount,
                        source: "manual".into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let mine = store.list_entries(a.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        // newest first
        assert_eq!(mine[0].amount, 50.0);
        assert!(mine.iter().all(|e| e.entry_type == "income"));
    }

    #[tokio::test]
    async fn summary_reflects_inserts() {
        let store = test_store().await;
        let user = store.create_user("A", "a@example.in", "password123").await.unwrap();

        for (kind, amount, source) in [
            ("income", 500.0, "manual"),
            ("income", 250.0, "voice"),
            ("expense", 100.0, "bill_upload"),
        ] {
            store
                .create_entry(
                    user.id,
                    NewEntry {
                        entry_type: kind.into(),
                        amount,
                        source: source.into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let summary = store.summary(user.id).await.unwrap();
        assert_eq!(summary.total_income, 750.0);
        assert_eq!(summary.total_expenses, 100.0);
        assert_eq!(summary.net_cash, 650.0);
        // entries were just created, so the week and today views agree
        assert_eq!(summary.week_income, 750.0);
        assert_eq!(summary.today_expenses, 100.0);
        assert_eq!(summary.source_breakdown.len(), 3);
        assert!(!summary.daily_trend.is_empty());
    }

    #[tokio::test]
    async fn profile_upsert_creates_then_updates() {
        let store = test_store().await;
        let user = store.create_user("A", "a@example.in", "password123").await.unwrap();
        assert!(store.get_profile(user.id).await.unwrap().is_none());

        let created = store
            .upsert_profile(
                user.id,
                ProfileUpdate {
                    business_name: Some("Sharma Traders".into()),
                    ..Default::default()
                },
                33,
            )
            .await
            .unwrap();
        assert_eq!(created.profile_completion_pct, 33);

        let updated = store
            .upsert_profile(
                user.id,
                ProfileUpdate {
                    business_name: Some("Sharma Traders".into()),
                    gstin: Some("27AAPFU0939F1ZV".into()),
                    business_type: Some("retail".into()),
                    ..Default::default()
                },
                100,
            )
            .await
            .unwrap();
        assert_eq!(updated.profile_completion_pct, 100);
        assert_eq!(updated.gstin.as_deref(), Some("27AAPFU0939F1ZV"));
    }

    #[tokio::test]
    async fn insights_query_collapses_rows() {
        let store = test_store().await;
        let user = store.create_user("A", "a@example.in", "password123").await.unwrap();
        for (kind, amount) in [("income", 300.0), ("expense", 120.0)] {
            store
                .create_entry(
                    user.id,
                    NewEntry {
                        entry_type: kind.into(),
                        amount,
                        source: "manual".into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let sql = format!(
            "SELECT entry_type, SUM(amount) FROM entries WHERE user_id = {} GROUP BY entry_type",
            user.id
        );
        let mut points = store.run_insights_query(&sql).await.unwrap();
        points.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(points, vec![("expense".into(), 120.0), ("income".into(), 300.0)]);

        let single = store
            .run_insights_query(&format!(
                "SELECT SUM(amount) FROM entries WHERE user_id = {}",
                user.id
            ))
            .await
            .unwrap();
        assert_eq!(single, vec![("Total".into(), 420.0)]);
    }
}
