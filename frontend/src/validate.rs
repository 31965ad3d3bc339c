//! Client-side form validation. Every submit path runs these before any
//! request is issued; a failure here means no network traffic at all.

pub fn validate_login(identifier: &str, password: &str) -> Result<(), String> {
    if identifier.trim().is_empty() {
        return Err("Email or username is required".to_string());
    }
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    Ok(())
}

pub fn validate_register(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Business or owner name is required".to_string());
    }
    if !email.trim().contains('@') {
        return Err("Enter a valid email address".to_string());
    }
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

/// Amounts are typed into a free-text field; they must parse as a positive
/// number before an entry can be created.
pub fn parse_positive_amount(raw: &str) -> Result<f64, String> {
    let cleaned = raw.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err("Amount must be a positive number.".to_string()),
    }
}

/// GSTIN shape check: exactly 15 alphanumeric characters.
pub fn is_valid_gstin(gstin: &str) -> bool {
    gstin.len() == 15 && gstin.chars().all(|c| c.is_ascii_alphanumeric())
}

const ALLOWED_BILL_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff"];

/// Extension allowlist for bill uploads, checked before the file leaves the
/// browser.
pub fn allowed_bill_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_BILL_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_rejected_before_any_request() {
        assert!(validate_login("owner@shop.in", "seven77").is_err());
        assert!(validate_register("Asha", "owner@shop.in", "seven77", "seven77").is_err());
        assert!(validate_login("owner@shop.in", "eightchars").is_ok());
    }

    #[test]
    fn login_requires_identifier() {
        assert!(validate_login("   ", "longenough").is_err());
    }

    #[test]
    fn register_checks_email_and_confirmation() {
        assert!(validate_register("Asha", "not-an-email", "longenough", "longenough").is_err());
        assert!(validate_register("Asha", "a@b.in", "longenough", "different1").is_err());
        assert!(validate_register("", "a@b.in", "longenough", "longenough").is_err());
        assert!(validate_register("Asha", "a@b.in", "longenough", "longenough").is_ok());
    }

    #[test]
    fn amounts_must_be_positive_numbers() {
        assert_eq!(parse_positive_amount("250"), Ok(250.0));
        assert_eq!(parse_positive_amount(" 1,250.50 "), Ok(1250.5));
        assert!(parse_positive_amount("0").is_err());
        assert!(parse_positive_amount("-5").is_err());
        assert!(parse_positive_amount("abc").is_err());
        assert!(parse_positive_amount("").is_err());
    }

    #[test]
    fn gstin_shape() {
        assert!(is_valid_gstin("27AAPFU0939F1ZV"));
        assert!(!is_valid_gstin("27AAPFU0939F1Z"));
        assert!(!is_valid_gstin("27AAPFU0939F1ZV2X"));
        assert!(!is_valid_gstin("27-APFU0939F1ZV"));
    }

    #[test]
    fn bill_extensions() {
        assert!(allowed_bill_file("bill.jpg"));
        assert!(allowed_bill_file("BILL.JPEG"));
        assert!(!allowed_bill_file("bill.pdf"));
        assert!(!allowed_bill_file("bill"));
    }
}
