pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod syntax;
pub mod types;
pub mod validate;

pub use ast::{BinaryOp, Expr};
pub use cache::{CacheStats, ExpressionCache};
pub use config::Limits;
pub use error::{Error, ErrorKind};
pub use format::format_result;
pub use history::{History, HistoryEntry};
pub use types::Number;

// Default evaluator behind the free functions
lazy_static::lazy_static! {
    static ref DEFAULT_EVALUATOR: Evaluator = Evaluator::with_defaults();
}

/// Evaluates arithmetic text under a set of [`Limits`], memoizing outcomes
/// when the limits give the cache a non-zero capacity.
///
/// An `Evaluator` is `Send + Sync` and meant to be shared.
pub struct Evaluator {
    limits: Limits,
    cache: Option<ExpressionCache>,
}

impl Evaluator {
    pub fn new(limits: Limits) -> Self {
        Self { cache: ExpressionCache::new(limits.cache_capacity), limits }
    }

    pub fn with_defaults() -> Self {
        Self::new(Limits::default())
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Trims the input and enforces the emptiness and length bounds.
    fn guard<'s>(&self, input: &'s str) -> Result<&'s str, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::new(ErrorKind::EmptyExpression));
        }
        if trimmed.chars().count() > self.limits.max_length {
            return Err(Error::new(ErrorKind::ExpressionTooLong));
        }
        Ok(trimmed)
    }

    /// Guards, parses and validates `input` into an arithmetic tree without
    /// evaluating it.
    pub fn parse(&self, input: &str) -> Result<Expr, Error> {
        let text = self.guard(input)?;
        // the parser enforces the node and depth budgets as it builds the tree
        let node = parser::Parser::new(text, &self.limits)?.parse()?;
        let expr = validate::validate(&node)?;
        tracing::trace!(nodes = expr.node_count(), "expression accepted");
        Ok(expr)
    }

    /// Evaluates `input` to a number or a classified failure.
    pub fn evaluate(&self, input: &str) -> Result<Number, Error> {
        if let Some(cache) = &self.cache {
            if let Some(outcome) = cache.get(input) {
                return outcome;
            }
        }
        let outcome = self.parse(input).and_then(|expr| runtime::eval(&expr));
        if let Some(cache) = &self.cache {
            cache.put(input, outcome.clone());
        }
        outcome
    }

    /// `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ExpressionCache::stats)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse arithmetic text into a validated tree using the default limits.
pub fn parse(input: &str) -> Result<Expr, Error> {
    DEFAULT_EVALUATOR.parse(input)
}

/// Evaluate arithmetic text using the shared default evaluator.
pub fn evaluate(input: &str) -> Result<Number, Error> {
    DEFAULT_EVALUATOR.evaluate(input)
}

/// Expression for a two-operand calculation: `(a)op(b)`.
pub fn basic_expression(a: Number, op: BinaryOp, b: Number) -> String {
    fn operand(n: Number) -> String {
        match n {
            Number::Int(i) => i.to_string(),
            // Debug keeps a decimal point or exponent, so floats stay floats
            Number::Float(f) => format!("{:?}", f),
        }
    }
    format!("({}){}({})", operand(a), op.symbol(), operand(b))
}
