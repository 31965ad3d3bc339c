//! Voice entry processing: transcript in, ledger entry out.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::error::{ApiError, Result, ValidationError};
use crate::extract::{extract_voice, VoiceExtraction, VoiceItem};
use crate::store::NewEntry;
use crate::SharedState;

const VOICE_SYSTEM_PROMPT: &str = "\
You extract accounting entries from voice transcripts for small Indian \
businesses. The transcript may mix Hindi, English and Hinglish. \
Respond with JSON only, no markdown, in this shape:
{
  \"entry_type\": \"income\" | \"expense\",
  \"amount\": 0,
  \"note\": \"Description of the transaction\",
  \"items\": [
    {\"name\": \"item name\", \"quantity\": 1, \"unit\": \"kg/pcs/etc\", \"price\": 0}
  ]
}";

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    #[serde(default)]
    pub transcript: String,
}

/// Append item details to the note the way the ledger displays them.
pub fn note_with_items(transcript: &str, items: &[VoiceItem]) -> String {
    if items.is_empty() {
        return transcript.to_string();
    }
    let rendered: Vec<String> = items
        .iter()
        .filter(|item| !item.name.is_empty())
        .map(|item| {
            let qty = if item.quantity > 0.0 { item.quantity } else { 1.0 };
            match item.price {
                Some(price) => format!("{} {} {} @ ₹{:.2}", qty, item.unit, item.name, price),
                None => format!("{} {} {}", qty, item.unit, item.name),
            }
        })
        .collect();
    if rendered.is_empty() {
        transcript.to_string()
    } else {
        format!("{} | Items: {}", transcript, rendered.join(", "))
    }
}

/// POST /api/voice/process
pub async fn process(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<VoiceRequest>,
) -> Result<Json<Value>> {
    let user_id = require_user(&state, &headers).await?;

    let transcript = req.transcript.trim().to_string();
    if transcript.is_empty() {
        return Err(ValidationError::TranscriptRequired.into());
    }

    let mut extracted: Option<VoiceExtraction> = None;
    if let Some(client) = &state.ai {
        match client
            .chat_json::<VoiceExtraction>(VOICE_SYSTEM_PROMPT, &transcript)
            .await
        {
            Ok(result) => extracted = Some(result),
            Err(err) => {
                tracing::warn!("voice extraction via LLM failed, falling back: {err:#}");
            }
        }
    }

    let mut extracted = extracted.unwrap_or_else(|| extract_voice(&transcript));

    if extracted.entry_type != "income" && extracted.entry_type != "expense" {
        extracted.entry_type = "income".to_string();
    }

    // The LLM sometimes drops the amount; retry the deterministic pass
    // before giving up.
    if extracted.amount <= 0.0 {
        extracted.amount = extract_voice(&transcript).amount;
    }
    if extracted.amount <= 0.0 {
        return Err(ApiError::AmountNotFound);
    }

    let note = if extracted.note.trim().is_empty() {
        transcript.clone()
    } else {
        extracted.note.clone()
    };
    let note = note_with_items(&note, &extracted.items);

    let entry = state
        .store
        .create_entry(
            user_id,
            NewEntry {
                entry_type: extracted.entry_type.clone(),
                amount: extracted.amount,
                note: Some(note),
                source: "voice".to_string(),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(json!({
        "ok": true,
        "entry": entry,
        "items": extracted.items,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_keeps_transcript_when_no_items() {
        assert_eq!(note_with_items("sold rice", &[]), "sold rice");
    }

    #[test]
    fn note_appends_priced_and_unpriced_items() {
        let items = vec![
            VoiceItem {
                name: "chawal".into(),
                quantity: 5.0,
                unit: "kg".into(),
                price: Some(100.0),
            },
            VoiceItem {
                name: "dal".into(),
                quantity: 2.0,
                unit: "kg".into(),
                price: None,
            },
        ];
        assert_eq!(
            note_with_items("becha", &items),
            "becha | Items: 5 kg chawal @ ₹100.00, 2 kg dal"
        );
    }

    #[test]
    fn note_ignores_nameless_items() {
        let items = vec![VoiceItem::default()];
        assert_eq!(note_with_items("sold", &items), "sold");
    }
}
