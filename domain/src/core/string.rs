//! String utilities for the domain layer.

/// Cut `s` to at most `max_len` bytes, ending in `...` when shortened
///
/// The cut always falls on a character boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let budget = max_len.saturating_sub(3);
    let end = s
        .char_indices()
        .map(|(start, c)| start + c.len_utf8())
        .take_while(|&end| end <= budget)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..end])
}

/// Format a whole-dollar amount with thousands separators (e.g. `$13,000`).
pub fn format_dollars(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("floor", 10), "floor");
        assert_eq!(truncate("maximize the floor", 8), "maxim...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "é" is two bytes; the cut must not land inside it
        assert_eq!(truncate("équité équité", 6), "éq...");
        assert_eq!(truncate("ééééé", 9), "ééé...");
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(0), "$0");
        assert_eq!(format_dollars(999), "$999");
        assert_eq!(format_dollars(13000), "$13,000");
        assert_eq!(format_dollars(1234567), "$1,234,567");
        assert_eq!(format_dollars(-2500), "-$2,500");
    }
}
