//! Fixed pt-BR rendering for currency and counts.
//!
//! The dashboard always formats with Brazilian conventions: `.` thousands
//! grouping, `,` decimal separator, BRL currency.

/// "R$ 1.234,56"
pub fn currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {whole},{:02}", cents % 100)
}

/// Grouped integer rendering; fractional input rounds to the nearest whole.
pub fn number(value: f64) -> String {
    let negative = value < 0.0;
    let grouped = group_thousands(value.abs().round() as u64);
    if negative { format!("-{grouped}") } else { grouped }
}

pub fn count(value: u64) -> String {
    group_thousands(value)
}

/// Confidence fraction (0-1) as a rounded percentage.
pub fn confidence(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_brl_conventions() {
        assert_eq!(currency(1234.56), "R$ 1.234,56");
        assert_eq!(currency(0.0), "R$ 0,00");
        assert_eq!(currency(1857340.555), "R$ 1.857.340,56");
        assert_eq!(currency(-12.5), "-R$ 12,50");
    }

    #[test]
    fn numbers_group_with_dots() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(999.0), "999");
        assert_eq!(number(482310.4), "482.310");
        assert_eq!(number(12345.678), "12.346");
    }

    #[test]
    fn counts_group_like_numbers() {
        assert_eq!(count(1284), "1.284");
        assert_eq!(count(1000000), "1.000.000");
    }

    #[test]
    fn confidence_rounds_to_whole_percent() {
        assert_eq!(confidence(0.85), "85%");
        assert_eq!(confidence(0.854), "85%");
        assert_eq!(confidence(1.0), "100%");
    }
}
