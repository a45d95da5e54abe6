//! Formatting layer: Brazilian-locale rendering of currency, percentages
//! and dates
//!
//! Pure functions only. The engine and views work on raw `Decimal` values
//! and nothing here feeds back into a computation.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::engine::Metric;
use crate::models::MISSING_LABEL;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "R$ " prefix (Brazilian Real)
    BRL,
    /// Plain number, for chart labels and table cells
    None,
}

/// Group the integer digits with `.` and use `,` as decimal separator.
///
/// Values are rounded half away from zero to two places.
///
/// # Examples
/// ```
/// use carteira::utils::{format_number, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_number(dec!(1234.56), CurrencySymbol::BRL), "R$ 1.234,56");
/// assert_eq!(format_number(dec!(-1234), CurrencySymbol::None), "-1.234,00");
/// ```
pub fn format_number(value: Decimal, symbol: CurrencySymbol) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let prefix = match symbol {
        CurrencySymbol::BRL => "R$ ",
        CurrencySymbol::None => "",
    };
    let sign = if is_negative { "-" } else { "" };

    format!("{}{}{},{}", prefix, sign, grouped, decimal_part)
}

/// Format as Brazilian Real: "R$ 1.234,56"
///
/// # Examples
/// ```
/// use carteira::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "R$ 1.234,56");
/// assert_eq!(format_currency(dec!(-500)), "R$ -500,00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_number(value, CurrencySymbol::BRL)
}

/// A value already in percentage points: `12.345` -> "12,35%"
pub fn format_percent(points: Decimal) -> String {
    let rounded = points.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}%", rounded).replace('.', ",")
}

/// A fractional return: `0.1234` -> "12,34%"
pub fn format_rate(fraction: Decimal) -> String {
    format_percent(fraction * Decimal::ONE_HUNDRED)
}

/// Apply `format` to a present value, "N/A" otherwise
pub fn format_optional(value: Option<Decimal>, format: fn(Decimal) -> String) -> String {
    value.map(format).unwrap_or_else(|| MISSING_LABEL.to_string())
}

/// An undefined metric shows its zero fallback
pub fn format_metric(metric: Metric, format: fn(Decimal) -> String) -> String {
    format(metric.value())
}

/// `DD/MM/YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
