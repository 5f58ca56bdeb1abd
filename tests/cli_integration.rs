use std::io::Write;
use std::process::{Command, Stdio};

fn run_abacus(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_abacus"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run abacus");
    (
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn run_abacus_with_stdin(args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_abacus"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn abacus");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    let output = child.wait_with_output().expect("failed to wait for abacus");
    (
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_cli_basic_arithmetic() {
    let (stdout, _stderr, code) = run_abacus(&["2 + 3 * 4"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "14");
}

#[test]
fn test_cli_formats_floats() {
    let (stdout, _stderr, code) = run_abacus(&["1/3"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "0.3333333333");
}

#[test]
fn test_cli_leading_minus_expression() {
    let (stdout, _stderr, code) = run_abacus(&["-2**2"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "-4");
}

#[test]
fn test_cli_error_exit_code() {
    let (stdout, stderr, code) = run_abacus(&["1/0"]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Error: division by zero"), "stderr: {stderr}");

    let (_stdout, stderr, code) = run_abacus(&["__import__('os')"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Invalid expression syntax"), "stderr: {stderr}");
}

#[test]
fn test_cli_output_json() {
    let (stdout, _stderr, code) = run_abacus(&["10/4", "--output-json"]);
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(v["expression"], "10/4");
    assert_eq!(v["result"], 2.5);
    assert_eq!(v["display"], "2.5");
    assert_eq!(v["type"], "Float");
    assert!(v["execution_time"].as_str().unwrap().ends_with("ms"));
}

#[test]
fn test_cli_output_json_error() {
    let (stdout, _stderr, code) = run_abacus(&["5%0", "--output-json"]);
    assert_eq!(code, 2);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(v["kind"], "DivisionByZero");
    assert_eq!(v["error"], "division by zero");
}

#[test]
fn test_cli_basic_mode() {
    let (stdout, _stderr, code) = run_abacus(&["--basic", "7", "%", "-3"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "-2");

    let (stdout, _stderr, code) = run_abacus(&["--basic", "1.5", "**", "2"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "2.25");
}

#[test]
fn test_cli_basic_mode_rejects_unknown_operator() {
    let (_stdout, stderr, code) = run_abacus(&["--basic", "7", "//", "2"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown operator"), "stderr: {stderr}");
}

#[test]
fn test_cli_limit_flags() {
    let (_stdout, stderr, code) = run_abacus(&["1+2+3", "--max-nodes", "5"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Expression too complex"), "stderr: {stderr}");
}

#[test]
fn test_cli_batch_file_in_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "1+1").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "2**10").unwrap();
    writeln!(file, "1/0").unwrap();
    writeln!(file, "10/4").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let (stdout, _stderr, code) = run_abacus(&["--batch", &path]);
    assert_eq!(code, 2);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["1+1 => 2", "2**10 => 1024", "1/0 => Error: division by zero", "10/4 => 2.5"]
    );
}

#[test]
fn test_cli_batch_deep_nesting() {
    let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
    let input = format!("{}\n{}\n", nested(100), nested(101));
    let (stdout, _stderr, code) = run_abacus_with_stdin(&["--batch"], &input);
    assert_eq!(code, 2);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("=> 1"), "{}", lines[0]);
    assert!(lines[1].contains("Expression too complex"), "{}", lines[1]);
}

#[test]
fn test_cli_batch_stdin_json() {
    let (stdout, _stderr, code) = run_abacus_with_stdin(&["--batch", "--output-json"], "3*3\n2**-1\n");
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(v[0]["display"], "9");
    assert_eq!(v[1]["display"], "0.5");
}

#[test]
fn test_cli_session_history() {
    let script = "1+1\n2*3\nfoo\n:last\n:history\n:clear\n:history\n:quit\n";
    let (stdout, stderr, code) = run_abacus_with_stdin(&[], script);
    assert_eq!(code, 0);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "2");
    assert_eq!(lines[1], "6");
    assert_eq!(lines[2], "6"); // :last
    assert!(lines[3].starts_with("1. 2*3 -> 6"));
    assert!(lines[4].starts_with("2. 1+1 -> 2"));
    assert_eq!(lines[5], "History cleared");
    assert_eq!(lines[6], "No history yet");
    assert!(stderr.contains("Invalid expression syntax"), "stderr: {stderr}");
}
