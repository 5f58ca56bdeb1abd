use crate::types::Number;

/// Significant digits shown for float results.
pub const SIGNIFICANT_DIGITS: usize = 10;

/// Display text for a result: integers verbatim, floats with
/// [`SIGNIFICANT_DIGITS`] significant digits and no trailing zeros.
pub fn format_result(value: &Number) -> String {
    match value {
        Number::Int(i) => i.to_string(),
        Number::Float(f) => format_general(*f, SIGNIFICANT_DIGITS),
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// `%.{precision}g` style formatting: fixed notation for decimal exponents in
/// `-4..precision`, scientific otherwise; insignificant zeros removed.
pub fn format_general(f: f64, precision: usize) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }
    let precision = precision.max(1);

    // Round to the requested significant digits first; the exponent of the
    // rounded value picks the notation.
    let sci = format!("{:.*e}", precision - 1, f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let fixed = format!("{:.*}", decimals, f);
        trim_fraction(&fixed).to_string()
    }
}
