use abacus::{evaluate, Evaluator, ErrorKind, Limits, Number};
use std::thread;

#[test]
fn empty_and_blank_input() {
    assert_eq!(evaluate("").unwrap_err().kind, ErrorKind::EmptyExpression);
    assert_eq!(evaluate("   ").unwrap_err().kind, ErrorKind::EmptyExpression);
    assert_eq!(evaluate("\n\t").unwrap_err().kind, ErrorKind::EmptyExpression);
}

#[test]
fn length_bound_applies_to_trimmed_input() {
    let digits = "1".repeat(301);
    assert_eq!(evaluate(&digits).unwrap_err().kind, ErrorKind::ExpressionTooLong);
    let at_limit = format!("  {}  ", "2".repeat(300));
    assert!(evaluate(&at_limit).is_ok());
}

#[test]
fn long_sums_are_too_complex() {
    // 67 additions: 1 root + 68 literals + 67 * 2 = 203 nodes
    let over = format!("{}1", "1+".repeat(67));
    assert_eq!(evaluate(&over).unwrap_err().kind, ErrorKind::ExpressionTooComplex);
    // 66 additions: exactly 200 nodes
    let at_limit = format!("{}1", "1+".repeat(66));
    assert_eq!(evaluate(&at_limit).unwrap(), Number::Int(67));
}

#[test]
fn deep_parentheses_are_too_complex() {
    let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
    assert_eq!(evaluate(&nested(100)).unwrap(), Number::Int(1));
    assert_eq!(evaluate(&nested(101)).unwrap_err().kind, ErrorKind::ExpressionTooComplex);
}

#[test]
fn deepest_allowed_nesting_fits_a_small_stack() {
    let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    let handle = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || Evaluator::with_defaults().evaluate(&nested))
        .unwrap();
    assert_eq!(handle.join().unwrap(), Ok(Number::Int(1)));
}

#[test]
fn complexity_is_bounded_without_the_length_guard() {
    let evaluator = Evaluator::new(Limits { max_length: 2_000_000, ..Limits::default() });
    for src in [
        format!("{}1", "1+".repeat(400_000)),
        format!("{}1", "a:=".repeat(200_000)),
        format!("{}1", "-".repeat(500_000)),
        format!("{}1{}", "[".repeat(300_000), "]".repeat(300_000)),
    ] {
        assert_eq!(evaluator.evaluate(&src).unwrap_err().kind, ErrorKind::ExpressionTooComplex);
    }
}

#[test]
fn long_unary_chains_are_too_complex() {
    let chain = format!("{}1", "-".repeat(120));
    assert_eq!(evaluate(&chain).unwrap_err().kind, ErrorKind::ExpressionTooComplex);
}

#[test]
fn limits_are_configurable() {
    let evaluator = Evaluator::new(Limits { max_length: 5, max_nodes: 5, ..Limits::default() });
    assert_eq!(evaluator.evaluate("1+1").unwrap(), Number::Int(2));
    assert_eq!(evaluator.evaluate("1+1+1").unwrap_err().kind, ErrorKind::ExpressionTooComplex);
    assert_eq!(evaluator.evaluate("123456").unwrap_err().kind, ErrorKind::ExpressionTooLong);

    let shallow = Evaluator::new(Limits { max_depth: 2, ..Limits::default() });
    assert!(shallow.evaluate("((1))").is_ok());
    assert_eq!(shallow.evaluate("(((1)))").unwrap_err().kind, ErrorKind::ExpressionTooComplex);
}
