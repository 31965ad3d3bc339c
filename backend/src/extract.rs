//! Deterministic extraction from voice transcripts and OCR text.
//!
//! These are the fallbacks used whenever the LLM is unconfigured or fails;
//! they must never error, only degrade to lower confidence.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn regexes(cell: &'static OnceLock<Vec<Regex>>, patterns: &[&str]) -> &'static [Regex] {
    cell.get_or_init(|| {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("static pattern"))
            .collect()
    })
}

fn parse_amount_str(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| *v > 0.0)
}

// ─── Voice transcripts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceExtraction {
    #[serde(default)]
    pub entry_type: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub items: Vec<VoiceItem>,
}

const INCOME_KEYWORDS: &[&str] = &[
    "sold", "received", "income", "becha", "bech", "diya", "milaa", "mila", "aaya", "aayi",
    "payment received",
];
const EXPENSE_KEYWORDS: &[&str] = &[
    "bought", "purchased", "kharida", "liya", "spent", "paid", "expense",
];

/// Regex extraction for voice transcripts, handling Hinglish patterns like
/// "5 kilo chawal 500 rupaye mein becha" (amount 500, income) or
/// "200 rupees ka rice kharida" (amount 200, expense).
pub fn extract_voice(transcript: &str) -> VoiceExtraction {
    static CURRENCY: OnceLock<Vec<Regex>> = OnceLock::new();
    static ANY_NUMBER: OnceLock<Vec<Regex>> = OnceLock::new();

    let text_lower = transcript.to_lowercase();

    let currency_patterns = regexes(
        &CURRENCY,
        &[
            // 500 rupaye
            r"(\d+(?:,\d+)*(?:\.\d+)?)\s*(?:rupaye|rupees|rupiya|rs\.?|₹)",
            // rs 500
            r"(?:rupaye|rupees|rupiya|rs\.?|₹)\s*(\d+(?:,\d+)*(?:\.\d+)?)",
            // 500 ka (Hindi pattern)
            r"(\d+(?:,\d+)*(?:\.\d+)?)\s*(?:ka|ke|ki|mein|me|में)",
        ],
    );

    let mut amount = 0.0;
    for pattern in currency_patterns {
        if let Some(caps) = pattern.captures(&text_lower) {
            if let Some(value) = caps.get(1).and_then(|m| parse_amount_str(m.as_str())) {
                amount = value;
                break;
            }
        }
    }

    // No currency marker: take the largest number in the transcript.
    if amount == 0.0 {
        let number = &regexes(&ANY_NUMBER, &[r"(\d+(?:,\d+)*(?:\.\d+)?)"])[0];
        amount = number
            .captures_iter(transcript)
            .filter_map(|caps| parse_amount_str(&caps[1]))
            .fold(0.0, f64::max);
    }

    let mut entry_type = "expense";
    if INCOME_KEYWORDS.iter().any(|k| text_lower.contains(k)) {
        entry_type = "income";
    } else if EXPENSE_KEYWORDS.iter().any(|k| text_lower.contains(k)) {
        entry_type = "expense";
    }

    VoiceExtraction {
        entry_type: entry_type.to_string(),
        amount,
        note: transcript.to_string(),
        items: Vec::new(),
    }
}

// ─── Bill OCR text ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillExtraction {
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub vendor_gstin: Option<String>,
    #[serde(default)]
    pub bill_number: Option<String>,
    #[serde(default)]
    pub bill_date: Option<String>,
    #[serde(default)]
    pub items: Vec<BillItem>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub cgst_rate: Option<f64>,
    #[serde(default)]
    pub cgst_amount: Option<f64>,
    #[serde(default)]
    pub sgst_rate: Option<f64>,
    #[serde(default)]
    pub sgst_amount: Option<f64>,
    #[serde(default)]
    pub igst_rate: Option<f64>,
    #[serde(default)]
    pub igst_amount: Option<f64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl BillExtraction {
    pub fn gst_amount(&self) -> f64 {
        self.cgst_amount.unwrap_or(0.0)
            + self.sgst_amount.unwrap_or(0.0)
            + self.igst_amount.unwrap_or(0.0)
    }

    /// Whether extraction recovered anything the pipeline can act on.
    pub fn is_useful(&self) -> bool {
        self.total_amount.map(|t| t > 0.0).unwrap_or(false) || !self.items.is_empty()
    }

    /// If no line items were found but a total is known, synthesize a single
    /// inferred item so the client always has something to render.
    pub fn ensure_inferred_item(&mut self) {
        if self.items.is_empty() {
            if let Some(total) = self.total_amount.filter(|t| *t > 0.0) {
                self.items.push(BillItem {
                    description: "Inferred item".to_string(),
                    hsn_code: None,
                    quantity: 1.0,
                    rate: total,
                    amount: total,
                });
            }
        }
    }
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

fn labelled_amount(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| parse_amount_str(&caps[1]))
}

/// Regex-based extraction over raw OCR text, used when no LLM is configured.
pub fn extract_bill(ocr_text: &str) -> BillExtraction {
    static AMOUNTS: OnceLock<Vec<Regex>> = OnceLock::new();
    static GSTIN: OnceLock<Vec<Regex>> = OnceLock::new();
    static DATES: OnceLock<Vec<Regex>> = OnceLock::new();
    static BILL_NUMBERS: OnceLock<Vec<Regex>> = OnceLock::new();
    static GST_AMOUNTS: OnceLock<Vec<Regex>> = OnceLock::new();
    static SUBTOTAL: OnceLock<Vec<Regex>> = OnceLock::new();
    static NUMERIC_LINE: OnceLock<Vec<Regex>> = OnceLock::new();

    let amount_patterns = regexes(
        &AMOUNTS,
        &[
            // Labelled totals first, so they win over stray numbers.
            r"(?i)(?:Grand\s*Total|Net\s*Amount|Total\s*Amount|Amount\s*Payable)[:\s]*(?:₹|Rs\.?|INR)?\s*([\d,]+\.?\d*)",
            r"(?i)(?:₹|Rs\.?|INR)\s*([\d,]+\.?\d*)\s*(?:only|/-)?",
            r"(?i)Total[:\s]*(?:₹|Rs\.?|INR)?\s*([\d,]+\.?\d*)",
            r"(?i)Amount[:\s]*(?:₹|Rs\.?|INR)?\s*([\d,]+\.?\d*)",
            r"\b([\d,]+\.\d{2})\b",
            r"\b(\d{3,}(?:,\d{3})*(?:\.\d{2})?)\b",
        ],
    );

    // Bills repeat the total near several labels; the largest candidate is
    // almost always the grand total.
    let mut all_amounts = Vec::new();
    for pattern in amount_patterns {
        for caps in pattern.captures_iter(ocr_text) {
            if let Some(value) = parse_amount_str(&caps[1]) {
                all_amounts.push(value);
            }
        }
    }
    let total_amount = all_amounts.iter().cloned().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    });

    let upper = ocr_text.to_uppercase();
    let vendor_gstin = first_capture(
        regexes(&GSTIN, &[r"\b(\d{2}[A-Z]{5}\d{4}[A-Z]\d[A-Z\d]{2})\b"]),
        &upper,
    );

    let bill_date = first_capture(
        regexes(
            &DATES,
            &[
                r"(?i)(?:Date|Dt\.?|Dated)[:\s]*(\d{1,2}[\-/\.]\d{1,2}[\-/\.]\d{2,4})",
                r"(\d{1,2}[\-/]\d{1,2}[\-/]\d{2,4})",
                r"(\d{4}[\-/]\d{1,2}[\-/]\d{1,2})",
                r"(?i)(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{2,4})",
            ],
        ),
        ocr_text,
    );

    let bill_number = first_capture(
        regexes(
            &BILL_NUMBERS,
            &[
                r"(?i)(?:Invoice|Bill|Receipt)\s*(?:No\.?|Number|#)[:\s]*([A-Z0-9\-/]+)",
                r"(?i)(?:No\.?|#)[:\s]*([A-Z0-9\-/]{3,})",
            ],
        ),
        ocr_text,
    );

    let gst_patterns = regexes(
        &GST_AMOUNTS,
        &[
            r"(?i)CGST[:\s@%\d]*(?:₹|Rs\.?)?\s*([\d,]+\.?\d*)",
            r"(?i)SGST[:\s@%\d]*(?:₹|Rs\.?)?\s*([\d,]+\.?\d*)",
            r"(?i)IGST[:\s@%\d]*(?:₹|Rs\.?)?\s*([\d,]+\.?\d*)",
        ],
    );
    let cgst_amount = labelled_amount(&gst_patterns[0], ocr_text);
    let sgst_amount = labelled_amount(&gst_patterns[1], ocr_text);
    let igst_amount = labelled_amount(&gst_patterns[2], ocr_text);

    let subtotal = labelled_amount(
        &regexes(
            &SUBTOTAL,
            &[r"(?i)(?:Sub\s*Total|Taxable\s*(?:Value|Amount))[:\s]*(?:₹|Rs\.?)?\s*([\d,]+\.?\d*)"],
        )[0],
        ocr_text,
    );

    // Vendor name: first of the top lines that is neither a label nor numbers.
    let numeric_line = &regexes(&NUMERIC_LINE, &[r"^[\d\s\-/\.,:₹]+$"])[0];
    let skip_labels = [
        "invoice", "bill", "date", "gst", "total", "amount", "tax", "receipt", "cash", "credit",
        "payment",
    ];
    let vendor_name = ocr_text
        .lines()
        .take(10)
        .map(str::trim)
        .filter(|line| line.len() >= 3)
        .filter(|line| {
            let lower = line.to_lowercase();
            !skip_labels.iter().any(|label| lower.contains(label))
        })
        .find(|line| !numeric_line.is_match(line))
        .map(|line| line.chars().take(50).collect::<String>());

    let mut confidence: f64 = 0.3;
    if total_amount.map(|a| a > 10.0).unwrap_or(false) {
        confidence += 0.25;
    }
    if vendor_gstin.is_some() {
        confidence += 0.15;
    }
    if bill_date.is_some() {
        confidence += 0.1;
    }
    if vendor_name.is_some() {
        confidence += 0.1;
    }
    if cgst_amount.is_some() || sgst_amount.is_some() || igst_amount.is_some() {
        confidence += 0.1;
    }

    BillExtraction {
        vendor_name,
        vendor_gstin,
        bill_number,
        bill_date,
        items: Vec::new(),
        subtotal,
        cgst_amount,
        sgst_amount,
        igst_amount,
        total_amount,
        confidence: Some(confidence.min(1.0)),
        ..Default::default()
    }
}

/// Rule-based validation applied to every extraction, LLM or fallback.
/// Each violated rule costs confidence; implausible GST figures are nulled.
pub fn validate_bill(mut bill: BillExtraction) -> BillExtraction {
    let mut confidence = bill.confidence.unwrap_or(0.5);

    // Rule 1: a total under ₹10 is suspicious.
    if bill.total_amount.map(|t| t < 10.0).unwrap_or(false) {
        confidence -= 0.2;
    }

    // Rule 2: GST cannot exceed the total.
    let gst = bill.gst_amount();
    if let Some(total) = bill.total_amount {
        if gst > 0.0 && gst > total {
            bill.cgst_amount = None;
            bill.sgst_amount = None;
            bill.igst_amount = None;
            confidence -= 0.15;
        }
    }

    // Rule 3: GST percentage sanity (0-28% in India).
    for rate in [bill.cgst_rate, bill.sgst_rate, bill.igst_rate] {
        if rate.map(|r| !(0.0..=28.0).contains(&r)).unwrap_or(false) {
            confidence -= 0.1;
            break;
        }
    }
    bill.cgst_rate = bill.cgst_rate.filter(|r| (0.0..=28.0).contains(r));
    bill.sgst_rate = bill.sgst_rate.filter(|r| (0.0..=28.0).contains(r));
    bill.igst_rate = bill.igst_rate.filter(|r| (0.0..=28.0).contains(r));

    // Rule 4: subtotal + GST should be within 10% of the total.
    if let (Some(subtotal), Some(total)) = (bill.subtotal, bill.total_amount) {
        let gst = bill.gst_amount();
        if gst > 0.0 && (subtotal + gst - total).abs() > total * 0.1 {
            confidence -= 0.15;
        }
    }

    // Rule 5: no line items recovered.
    if bill.items.is_empty() {
        confidence -= 0.1;
    }

    bill.confidence = Some(confidence.clamp(0.0, 1.0));
    bill
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Voice ────────────────────────────────────────────────────────────

    #[test]
    fn voice_currency_pattern_beats_bare_numbers() {
        let out = extract_voice("5 kilo chawal 500 rupaye mein becha");
        assert_eq!(out.amount, 500.0);
        assert_eq!(out.entry_type, "income");
        assert_eq!(out.note, "5 kilo chawal 500 rupaye mein becha");
    }

    #[test]
    fn voice_rs_prefix_and_expense_keyword() {
        let out = extract_voice("rs 200 ka rice kharida");
        assert_eq!(out.amount, 200.0);
        assert_eq!(out.entry_type, "expense");
    }

    #[test]
    fn voice_english_income() {
        let out = extract_voice("received 1000 from customer");
        assert_eq!(out.amount, 1000.0);
        assert_eq!(out.entry_type, "income");
    }

    #[test]
    fn voice_largest_number_fallback() {
        let out = extract_voice("gave 3 boxes for 750 total");
        assert_eq!(out.amount, 750.0);
    }

    #[test]
    fn voice_income_keywords_win_over_expense() {
        let out = extract_voice("sold goods and paid 50 for transport, total 500 rupaye");
        assert_eq!(out.entry_type, "income");
    }

    #[test]
    fn voice_defaults_to_expense_with_zero_amount() {
        let out = extract_voice("hello there");
        assert_eq!(out.amount, 0.0);
        assert_eq!(out.entry_type, "expense");
        assert!(out.items.is_empty());
    }

    #[test]
    fn voice_comma_grouped_amount() {
        let out = extract_voice("received ₹1,25,000 advance");
        assert_eq!(out.amount, 125000.0);
        assert_eq!(out.entry_type, "income");
    }

    // ─── Bills ────────────────────────────────────────────────────────────

    const SAMPLE_BILL: &str = "Sharma Kirana Store\n\
        GSTIN: 27AAPFU0939F1ZV\n\
        Invoice No: INV-2041\n\
        Date: 12/03/2025\n\
        Rice 5kg  450.00\n\
        Oil 1L    180.00\n\
        Sub Total: 630.00\n\
        CGST @9%: 56.70\n\
        SGST @9%: 56.70\n\
        Grand Total: 743.40\n";

    #[test]
    fn bill_labelled_total_wins() {
        let out = extract_bill(SAMPLE_BILL);
        assert_eq!(out.total_amount, Some(743.40));
        assert_eq!(out.subtotal, Some(630.0));
    }

    #[test]
    fn bill_gstin_and_gst_amounts_recovered() {
        let out = extract_bill(SAMPLE_BILL);
        assert_eq!(out.vendor_gstin.as_deref(), Some("27AAPFU0939F1ZV"));
        assert_eq!(out.cgst_amount, Some(56.70));
        assert_eq!(out.sgst_amount, Some(56.70));
        assert_eq!(out.igst_amount, None);
        assert_eq!(out.bill_date.as_deref(), Some("12/03/2025"));
        assert_eq!(out.bill_number.as_deref(), Some("INV-2041"));
    }

    #[test]
    fn bill_vendor_heuristic_skips_labels() {
        let out = extract_bill(SAMPLE_BILL);
        assert_eq!(out.vendor_name.as_deref(), Some("Sharma Kirana Store"));

        // A label line must not become the vendor
        let out = extract_bill("Tax Invoice\n12/03/2025\nGupta Hardware\nTotal: 500");
        assert_eq!(out.vendor_name.as_deref(), Some("Gupta Hardware"));
    }

    #[test]
    fn bill_confidence_is_additive_and_clamped() {
        let rich = extract_bill(SAMPLE_BILL);
        // 0.3 base + amount 0.25 + gstin 0.15 + date 0.1 + vendor 0.1 + gst 0.1,
        // clamped to 1.0
        assert!((rich.confidence.unwrap() - 1.0).abs() < 1e-9);

        let poor = extract_bill("--\n12 34\n");
        assert!((poor.confidence.unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn bill_empty_text_extracts_nothing() {
        let out = extract_bill("");
        assert_eq!(out.total_amount, None);
        assert!(!out.is_useful());
    }

    // ─── Validation rules ─────────────────────────────────────────────────

    fn base_bill() -> BillExtraction {
        BillExtraction {
            total_amount: Some(500.0),
            confidence: Some(0.5),
            items: vec![BillItem {
                description: "thing".into(),
                quantity: 1.0,
                rate: 500.0,
                amount: 500.0,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn rule_tiny_total_penalized() {
        let mut bill = base_bill();
        bill.total_amount = Some(5.0);
        let out = validate_bill(bill);
        assert!((out.confidence.unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn rule_gst_exceeding_total_is_nulled() {
        let mut bill = base_bill();
        bill.cgst_amount = Some(600.0);
        let out = validate_bill(bill);
        assert_eq!(out.cgst_amount, None);
        assert!((out.confidence.unwrap() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn rule_gst_rate_outside_range_is_nulled() {
        let mut bill = base_bill();
        bill.cgst_rate = Some(45.0);
        let out = validate_bill(bill);
        assert_eq!(out.cgst_rate, None);
        assert!((out.confidence.unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn rule_subtotal_mismatch_penalized() {
        let mut bill = base_bill();
        bill.subtotal = Some(300.0);
        bill.cgst_amount = Some(50.0);
        // 300 + 50 = 350 vs total 500: > 10% off
        let out = validate_bill(bill);
        assert!((out.confidence.unwrap() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn rule_no_items_penalized_and_confidence_clamped() {
        let mut bill = base_bill();
        bill.items.clear();
        bill.confidence = Some(0.05);
        let out = validate_bill(bill);
        assert_eq!(out.confidence, Some(0.0));
    }

    #[test]
    fn inferred_item_fills_empty_list() {
        let mut bill = base_bill();
        bill.items.clear();
        bill.ensure_inferred_item();
        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.items[0].amount, 500.0);
        assert_eq!(bill.items[0].description, "Inferred item");
    }
}
