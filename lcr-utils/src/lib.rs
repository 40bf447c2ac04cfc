//! Shared formatting helpers for LCR report tables.

/// Numeric-to-string helpers for acre-feet tables.
pub mod format {
    /// Default column width for acre-feet values.
    pub const AF_COLUMN_WIDTH: usize = 14;

    /// Default column width for counts and factors.
    pub const NUMBER_COLUMN_WIDTH: usize = 8;

    /// Right-justify a string in a field of `width` characters.
    pub fn right_justified(s: &str, width: usize) -> String {
        format!("{s:>width$}")
    }

    /// Comma-grouped integer rendering of a value, e.g. "1,543,000".
    /// Values are rounded to whole acre-feet.
    pub fn comma_grouped(value: f64) -> String {
        let rounded = value.round() as i64;
        let digits = rounded.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (index, ch) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if rounded < 0 {
            format!("-{grouped}")
        } else {
            grouped
        }
    }

    /// Acre-feet table column: comma-grouped, right-justified.
    pub fn af_as_str(value: f64) -> String {
        right_justified(&comma_grouped(value), AF_COLUMN_WIDTH)
    }

    /// Count/plain-number table column.
    pub fn number_as_str(value: f64) -> String {
        right_justified(&comma_grouped(value), NUMBER_COLUMN_WIDTH)
    }

    /// A 0..1 fraction as a percent column, e.g. "  90.0%".
    pub fn percent_as_str(fraction: f64) -> String {
        format!("{:>6.1}%", fraction * 100.0)
    }

}
