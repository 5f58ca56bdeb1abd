pub mod arithmetic;
pub mod evaluation;

// Re-export the main public functions
pub use evaluation::eval;
