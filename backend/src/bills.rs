//! Bill upload: store the image, OCR it, extract structured fields, and
//! auto-create the matching expense entry.

use std::io;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::require_user;
use crate::error::{ApiError, Result, ValidationError};
use crate::extract::{extract_bill, validate_bill, BillExtraction};
use crate::store::NewEntry;
use crate::SharedState;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff"];

const BILL_SYSTEM_PROMPT: &str = "\
You extract structured data from OCR text of Indian GST bills. \
Respond with JSON only, no markdown, in this shape:
{
  \"vendor_name\": \"\",
  \"vendor_gstin\": \"\",
  \"bill_number\": \"\",
  \"bill_date\": \"\",
  \"items\": [
    {\"description\": \"\", \"hsn_code\": \"\", \"quantity\": 0, \"rate\": 0, \"amount\": 0}
  ],
  \"subtotal\": 0,
  \"cgst_rate\": 0, \"cgst_amount\": 0,
  \"sgst_rate\": 0, \"sgst_amount\": 0,
  \"igst_rate\": 0, \"igst_amount\": 0,
  \"total_amount\": 0
}
The OCR text may be inaccurate; leave fields you cannot read as null or 0.";

const BILL_VERIFY_PROMPT: &str = "\
You are a strict financial auditor. Given OCR text of a bill and a JSON \
extraction from it, verify numerical consistency (total_amount should equal \
subtotal plus the GST amounts), fix obvious mistakes, and set fields you are \
unsure about to null or 0. Return ONLY the corrected JSON, same schema, no \
explanations.";

pub fn file_extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Keep only characters that are safe in a stored filename.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches('_').to_string()
}

/// Run the external `tesseract` binary over an image and return its text.
async fn run_tesseract(image_path: &Path) -> Result<String> {
    let output = tokio::process::Command::new("tesseract")
        .arg(image_path)
        .arg("stdout")
        .output()
        .await;

    match output {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ApiError::TesseractMissing),
        Err(err) => Err(ApiError::OcrFailed(err.to_string())),
        Ok(out) if !out.status.success() => Err(ApiError::OcrFailed(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        )),
        Ok(out) => Ok(String::from_utf8_lossy(&out.stdout).into_owned()),
    }
}

/// Two-pass LLM extraction over OCR text; any failure falls back to the
/// deterministic extractor.
async fn structured_extraction(state: &SharedState, ocr_text: &str) -> BillExtraction {
    if let Some(client) = &state.ai {
        match client
            .chat_json::<BillExtraction>(BILL_SYSTEM_PROMPT, ocr_text)
            .await
        {
            Ok(mut extracted) => {
                let verify_input = format!(
                    "OCR text:\n<<<{}>>>\n\nExtracted data:\n<<<{}>>>",
                    ocr_text,
                    serde_json::to_string(&extracted).unwrap_or_default(),
                );
                match client
                    .chat_json::<BillExtraction>(BILL_VERIFY_PROMPT, &verify_input)
                    .await
                {
                    Ok(verified) => extracted = verified,
                    Err(err) => {
                        tracing::warn!("bill verification pass failed, keeping first pass: {err:#}");
                    }
                }
                if extracted.is_useful() {
                    return extracted;
                }
            }
            Err(err) => {
                tracing::warn!("bill extraction via LLM failed, falling back: {err:#}");
            }
        }
    }
    extract_bill(ocr_text)
}

/// POST /api/bills/upload
pub async fn upload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;

    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(format!("bad multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(format!("failed to read upload: {e}")))?
                    .to_vec(),
            );
        }
    }

    let bytes = bytes.ok_or(ValidationError::NoFile)?;
    let original_filename = filename.filter(|f| !f.is_empty()).ok_or(ValidationError::EmptyFilename)?;

    if file_extension(&original_filename).as_deref() == Some("pdf") {
        return Err(ApiError::PdfUnsupported);
    }
    if !allowed_file(&original_filename) {
        return Err(ValidationError::InvalidFileType.into());
    }

    let stored_filename = format!(
        "{}_{}",
        Uuid::new_v4().simple(),
        sanitize_filename(&original_filename)
    );
    let bills_dir = PathBuf::from(&state.config.upload_dir).join("bills");
    tokio::fs::create_dir_all(&bills_dir).await?;
    let local_path = bills_dir.join(&stored_filename);
    tokio::fs::write(&local_path, &bytes).await?;
    let public_url = format!("/uploads/bills/{stored_filename}");

    let bill_id = state
        .store
        .insert_bill(user_id, &original_filename, &local_path.to_string_lossy(), &public_url)
        .await?;

    let ocr_text = run_tesseract(&local_path).await?;

    // The quick regex scan runs regardless of the LLM, so the raw detected
    // amount is always comparable across bills.
    let detected_amount = extract_bill(&ocr_text).total_amount;

    let mut structured = structured_extraction(&state, &ocr_text).await;
    structured = validate_bill(structured);
    structured.ensure_inferred_item();

    let gst_amount = structured.gst_amount();
    let items_json = serde_json::to_string(&structured.items)?;

    state
        .store
        .finish_bill(
            bill_id,
            &ocr_text,
            detected_amount,
            structured.vendor_name.as_deref(),
            structured.bill_date.as_deref(),
            structured.total_amount,
            Some(gst_amount),
            Some(&items_json),
        )
        .await?;

    // A confident total auto-creates the matching expense entry.
    if let Some(total) = structured.total_amount.filter(|t| *t > 0.0) {
        let vendor = structured.vendor_name.clone().unwrap_or_else(|| "Unknown Vendor".to_string());
        state
            .store
            .create_entry(
                user_id,
                NewEntry {
                    entry_type: "expense".to_string(),
                    amount: total,
                    note: Some(format!("Bill from {vendor}")),
                    source: "bill_upload".to_string(),
                    vendor_name: structured.vendor_name.clone(),
                    vendor_gstin: structured.vendor_gstin.clone(),
                    bill_number: structured.bill_number.clone(),
                    bill_date: structured.bill_date.clone(),
                    taxable_amount: structured.subtotal,
                    cgst_amount: structured.cgst_amount,
                    sgst_amount: structured.sgst_amount,
                    igst_amount: structured.igst_amount,
                },
            )
            .await?;
    }

    Ok(Json(json!({
        "ok": true,
        "bill": {
            "id": bill_id,
            "filename": original_filename,
            "public_url": public_url,
            "ocr_text": ocr_text,
            "detected_amount": detected_amount,
            "vendor_name": structured.vendor_name,
            "bill_date": structured.bill_date,
            "total_amount": structured.total_amount,
            "gst_amount": gst_amount,
            "items": structured.items,
            "confidence": structured.confidence,
            "status": "done",
        }
    })))
}

/// GET /api/bills
pub async fn list(State(state): State<SharedState>, headers: HeaderMap) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;
    let bills = state.store.list_bills(user_id).await?;
    Ok(Json(json!({ "ok": true, "bills": bills })))
}

/// GET /api/bills/:id
pub async fn get_one(
    State(state): State<SharedState>,
    headers: HeaderMap,
    UrlPath(bill_id): UrlPath<i64>,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;
    let bill = state
        .store
        .get_bill(user_id, bill_id)
        .await?
        .ok_or(ApiError::BillNotFound)?;
    Ok(Json(json!({ "ok": true, "bill": bill })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allowlist() {
        assert!(allowed_file("bill.jpg"));
        assert!(allowed_file("BILL.PNG"));
        assert!(allowed_file("scan.2024.webp"));
        assert!(!allowed_file("bill.pdf"));
        assert!(!allowed_file("bill.exe"));
        assert!(!allowed_file("noextension"));
    }

    #[test]
    fn filename_sanitization() {
        assert_eq!(sanitize_filename("my bill (1).jpg"), "my_bill__1_.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("साफ.png"), ".png");
    }
}
