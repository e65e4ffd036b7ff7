use rust_decimal::Decimal;

/// Rounds to two places and groups thousands: `50000` -> `50,000`, `1234.5` -> `1,234.5`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + integer.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    let digits = integer.len();
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Currency symbol followed by the grouped amount, e.g. `Rs. 50,000`.
pub fn format_money(currency: &str, amount: Decimal) -> String {
    format!("{}{}", currency, format_amount(amount))
}
