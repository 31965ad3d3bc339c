fn format_with_commas(value: i64) -> String {
    let is_negative = value < 0;
    let s = value.abs().to_string().chars().rev().collect::<Vec<char>>();
    let mut out = Vec::new();
    for (i, ch) in s.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    let formatted: String = out.into_iter().rev().collect();
    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// "₹1,234.56"; negatives keep the sign in front of the symbol.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    let mut whole = abs.trunc() as i64;
    let mut cents = ((abs - abs.trunc()) * 100.0).round() as i64;
    if cents >= 100 {
        whole += 1;
        cents = 0;
    }
    format!("{sign}₹{}.{:02}", format_with_commas(whole), cents)
}

/// Whole-number percent, clamped to 0-100 for progress bars.
pub fn format_percent(value: i64) -> String {
    format!("{}%", value.clamp(0, 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_group_thousands() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1000), "1,000");
        assert_eq!(format_with_commas(1234567), "1,234,567");
        assert_eq!(format_with_commas(-45000), "-45,000");
    }

    #[test]
    fn currency_keeps_two_decimals() {
        assert_eq!(format_currency(0.0), "₹0.00");
        assert_eq!(format_currency(743.4), "₹743.40");
        assert_eq!(format_currency(1234.56), "₹1,234.56");
        assert_eq!(format_currency(-250.0), "-₹250.00");
    }

    #[test]
    fn currency_rounds_instead_of_truncating() {
        assert_eq!(format_currency(9.999), "₹10.00");
        assert_eq!(format_currency(0.005), "₹0.01");
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(format_percent(50), "50%");
        assert_eq!(format_percent(-5), "0%");
        assert_eq!(format_percent(140), "100%");
    }
}
