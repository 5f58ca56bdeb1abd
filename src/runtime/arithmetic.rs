use crate::error::{Error, ErrorKind};
use crate::types::Number;

/// Wraps a float result, refusing infinities and NaNs.
pub fn finite(f: f64) -> Result<Number, Error> {
    if f.is_nan() {
        Err(Error::new(ErrorKind::UndefinedResult))
    } else if f.is_infinite() {
        Err(Error::new(ErrorKind::NumericOverflow))
    } else {
        Ok(Number::Float(f))
    }
}

/// Integer op when both sides are integers and it does not overflow,
/// float op otherwise.
fn int_or_float(
    a: Number,
    b: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Number, Error> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if let Some(v) = int_op(x, y) {
            return Ok(Number::Int(v));
        }
    }
    finite(float_op(a.as_f64(), b.as_f64()))
}

pub fn add(a: Number, b: Number) -> Result<Number, Error> {
    int_or_float(a, b, i64::checked_add, |x, y| x + y)
}

pub fn sub(a: Number, b: Number) -> Result<Number, Error> {
    int_or_float(a, b, i64::checked_sub, |x, y| x - y)
}

pub fn mul(a: Number, b: Number) -> Result<Number, Error> {
    int_or_float(a, b, i64::checked_mul, |x, y| x * y)
}

/// True division; always yields a float.
pub fn div(a: Number, b: Number) -> Result<Number, Error> {
    if b.is_zero() {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    finite(a.as_f64() / b.as_f64())
}

/// Floored modulo: a non-zero result takes the sign of the divisor.
pub fn modulo(a: Number, b: Number) -> Result<Number, Error> {
    if b.is_zero() {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            // i64::MIN % -1 is the only overflowing case and its remainder is 0.
            let r = x.checked_rem(y).unwrap_or(0);
            if r != 0 && (r < 0) != (y < 0) {
                Ok(Number::Int(r + y))
            } else {
                Ok(Number::Int(r))
            }
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let mut r = x % y;
            if r == 0.0 {
                r = 0.0f64.copysign(y);
            } else if (r < 0.0) != (y < 0.0) {
                r += y;
            }
            finite(r)
        }
    }
}

pub fn pow(a: Number, b: Number) -> Result<Number, Error> {
    if let (Number::Int(base), Number::Int(exp)) = (a, b) {
        if exp >= 0 {
            if let Some(v) = u32::try_from(exp).ok().and_then(|e| base.checked_pow(e)) {
                return Ok(Number::Int(v));
            }
        }
    }
    let (x, y) = (a.as_f64(), b.as_f64());
    if x == 0.0 && y < 0.0 {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    if x < 0.0 && y.fract() != 0.0 {
        return Err(Error::new(ErrorKind::UndefinedResult));
    }
    finite(x.powf(y))
}

pub fn neg(a: Number) -> Result<Number, Error> {
    match a {
        Number::Int(x) => match x.checked_neg() {
            Some(v) => Ok(Number::Int(v)),
            None => finite(-(x as f64)),
        },
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}
