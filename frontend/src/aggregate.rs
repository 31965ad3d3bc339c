//! Dashboard totals: a full linear scan over the fetched entries, recomputed
//! on every refresh. No caching, no incremental updates.

use crate::api::Entry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub today_income: f64,
    pub today_expense: f64,
}

/// `today` is a `YYYY-MM-DD` date; an entry counts as today's when its
/// `created_at` starts with it.
pub fn totals(entries: &[Entry], today: &str) -> Totals {
    let mut out = Totals::default();
    for entry in entries {
        let is_today = entry
            .created_at
            .as_deref()
            .map(|ts| ts.starts_with(today))
            .unwrap_or(false);

        match entry.entry_type.as_str() {
            "income" => {
                out.income += entry.amount;
                if is_today {
                    out.today_income += entry.amount;
                }
            }
            "expense" => {
                out.expense += entry.amount;
                if is_today {
                    out.today_expense += entry.amount;
                }
            }
            _ => {}
        }
    }
    out.net = out.income - out.expense;
    out
}

/// Local calendar date as `YYYY-MM-DD`.
pub fn local_today() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year(),
        now.get_month() + 1,
        now.get_date()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_type: &str, amount: f64, created_at: &str) -> Entry {
        Entry {
            id: 0,
            entry_type: entry_type.to_string(),
            amount,
            note: None,
            source: None,
            created_at: Some(created_at.to_string()),
        }
    }

    #[test]
    fn totals_equal_sums_grouped_by_type() {
        let entries = vec![
            entry("income", 500.0, "2025-08-01 10:00:00"),
            entry("income", 250.0, "2025-08-02 11:00:00"),
            entry("expense", 120.0, "2025-08-02 12:00:00"),
            entry("expense", 30.0, "2025-08-03 09:00:00"),
        ];
        let out = totals(&entries, "2025-08-02");
        assert_eq!(out.income, 750.0);
        assert_eq!(out.expense, 150.0);
        assert_eq!(out.net, 600.0);
    }

    #[test]
    fn today_only_counts_matching_dates() {
        let entries = vec![
            entry("income", 100.0, "2025-08-02 10:00:00"),
            entry("income", 40.0, "2025-08-01 10:00:00"),
            entry("expense", 25.0, "2025-08-02 18:30:00"),
        ];
        let out = totals(&entries, "2025-08-02");
        assert_eq!(out.today_income, 100.0);
        assert_eq!(out.today_expense, 25.0);
    }

    #[test]
    fn unknown_types_and_missing_dates_are_ignored() {
        let mut no_date = entry("income", 10.0, "");
        no_date.created_at = None;
        let entries = vec![no_date, entry("transfer", 999.0, "2025-08-02 10:00:00")];
        let out = totals(&entries, "2025-08-02");
        assert_eq!(out.income, 10.0);
        assert_eq!(out.today_income, 0.0);
        assert_eq!(out.expense, 0.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(totals(&[], "2025-08-02"), Totals::default());
    }
}
