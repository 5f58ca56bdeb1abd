use serde::Serialize;

/// A computed value: integer while every step stays integral, float otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    /// Numeric equality with zero, regardless of representation.
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Number::Int(_) => "Integer",
            Number::Float(_) => "Float",
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}
