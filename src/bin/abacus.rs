use abacus::{basic_expression, format_result, BinaryOp, Error, Evaluator, History, Limits, Number};
use clap::{CommandFactory, Parser};
use serde_json::json;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// Batch workers get the same stack as the main thread.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Safe arithmetic calculator: literals, + - * / % ** and parentheses only.
#[derive(Parser, Debug)]
#[command(name = "abacus", version, about)]
struct Cli {
    /// Expression to evaluate; omit it for an interactive session
    #[arg(allow_hyphen_values = true, conflicts_with_all = ["basic", "batch"])]
    expression: Option<String>,

    /// Two-operand mode: A OP B, with OP one of + - * / % **
    #[arg(long, num_args = 3, value_names = ["A", "OP", "B"], allow_hyphen_values = true, conflicts_with = "batch")]
    basic: Option<Vec<String>>,

    /// Evaluate one expression per line of FILE ('-' or nothing for stdin)
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "-")]
    batch: Option<PathBuf>,

    /// Output results in JSON format with type and timing
    #[arg(long)]
    output_json: bool,

    #[arg(long)]
    max_length: Option<usize>,

    #[arg(long)]
    max_nodes: Option<usize>,

    #[arg(long)]
    max_depth: Option<usize>,

    /// Number of memoized expressions (0 disables the cache)
    #[arg(long)]
    cache_size: Option<usize>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn limits(&self) -> Limits {
        let mut limits = Limits::from_env();
        if let Some(v) = self.max_length {
            limits.max_length = v;
        }
        if let Some(v) = self.max_nodes {
            limits.max_nodes = v;
        }
        if let Some(v) = self.max_depth {
            limits.max_depth = v;
        }
        if let Some(v) = self.cache_size {
            limits.cache_capacity = v;
        }
        limits
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let limits = cli.limits();
    tracing::debug!(?limits, "starting");
    let evaluator = Arc::new(Evaluator::new(limits));

    let code = if let Some(parts) = &cli.basic {
        let expr = compose_basic(parts);
        run_once(&evaluator, &expr, cli.output_json)
    } else if let Some(path) = &cli.batch {
        run_batch(evaluator, path, cli.output_json)
    } else if let Some(expr) = &cli.expression {
        run_once(&evaluator, expr, cli.output_json)
    } else {
        run_session(&evaluator)
    };
    std::process::exit(code);
}

fn usage_error(msg: String) -> ! {
    Cli::command().error(clap::error::ErrorKind::InvalidValue, msg).exit()
}

fn parse_operand(s: &str) -> Number {
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => f.into(),
        _ => usage_error(format!("invalid number '{}'", s)),
    }
}

fn compose_basic(parts: &[String]) -> String {
    let [a, op, b] = parts else {
        usage_error("--basic takes exactly three values: A OP B".to_string());
    };
    let op = BinaryOp::from_symbol(op)
        .unwrap_or_else(|| usage_error(format!("unknown operator '{}' (expected + - * / % **)", op)));
    basic_expression(parse_operand(a), op, parse_operand(b))
}

fn success_json(expr: &str, value: &Number, elapsed_ms: f64) -> serde_json::Value {
    json!({
        "expression": expr,
        "result": value,
        "display": format_result(value),
        "type": value.type_name(),
        "execution_time": format!("{:.2} ms", elapsed_ms),
    })
}

fn failure_json(expr: &str, err: &Error) -> serde_json::Value {
    json!({
        "expression": expr,
        "error": err.to_string(),
        "kind": err.kind(),
    })
}

fn run_once(evaluator: &Evaluator, expr: &str, output_json: bool) -> i32 {
    let start_time = Instant::now();
    let result = evaluator.evaluate(expr);
    let elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(value) => {
            if output_json {
                println!("{}", pretty(&success_json(expr, &value, elapsed_ms)));
            } else {
                println!("{}", format_result(&value));
            }
            0
        }
        Err(e) => {
            if output_json {
                println!("{}", pretty(&failure_json(expr, &e)));
            } else {
                eprintln!("Error: {}", e);
            }
            2
        }
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(io::BufReader::new(io::stdin()))
    } else {
        Box::new(io::BufReader::new(std::fs::File::open(path)?))
    };
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Evaluates every line on a worker pool and prints in input order.
fn run_batch(evaluator: Arc<Evaluator>, path: &Path, output_json: bool) -> i32 {
    let lines = match read_lines(path) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", path.display(), e);
            return 1;
        }
    };

    let pool = threadpool::Builder::new()
        .num_threads(num_cpus::get().max(1))
        .thread_name("abacus-batch".to_string())
        .thread_stack_size(WORKER_STACK_SIZE)
        .build();
    let (tx, rx) = mpsc::channel();
    for (index, line) in lines.iter().enumerate() {
        let tx = tx.clone();
        let evaluator = Arc::clone(&evaluator);
        let line = line.clone();
        pool.execute(move || {
            let result = evaluator.evaluate(&line);
            // receiver outlives the pool; a send error means nobody is listening
            let _ = tx.send((index, result));
        });
    }
    drop(tx);

    let mut results: Vec<(usize, Result<Number, Error>)> = rx.iter().collect();
    results.sort_by_key(|(index, _)| *index);
    if let Some(stats) = evaluator.cache_stats() {
        tracing::debug!(
            count = results.len(),
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "batch finished"
        );
    }

    let mut failed = false;
    let mut json_rows = Vec::new();
    for (index, result) in results {
        let expr = lines[index].as_str();
        match &result {
            Ok(value) if output_json => json_rows.push(success_json(expr, value, 0.0)),
            Ok(value) => println!("{} => {}", expr, format_result(value)),
            Err(e) => {
                failed = true;
                if output_json {
                    json_rows.push(failure_json(expr, e));
                } else {
                    println!("{} => Error: {}", expr, e);
                }
            }
        }
    }
    if output_json {
        println!("{}", pretty(&serde_json::Value::Array(json_rows)));
    }
    if failed {
        2
    } else {
        0
    }
}

/// Interactive loop; successful results are kept in the session history.
fn run_session(evaluator: &Evaluator) -> i32 {
    let interactive = io::stdin().is_terminal();
    let mut history = History::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if interactive {
        println!("abacus: enter an expression, or :history, :last, :clear, :quit");
    }
    loop {
        if interactive {
            print!("> ");
            let _ = stdout.flush();
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":q" => break,
            ":history" => {
                if history.is_empty() {
                    println!("No history yet");
                }
                for (i, entry) in history.iter().enumerate() {
                    println!(
                        "{}. {} -> {}  ({})",
                        i + 1,
                        entry.expression,
                        entry.result,
                        entry.at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
            ":last" => match history.last() {
                Some(entry) => println!("{}", entry.result),
                None => println!("No result yet"),
            },
            ":clear" => {
                history.clear();
                println!("History cleared");
            }
            expr => match evaluator.evaluate(expr) {
                Ok(value) => {
                    let shown = format_result(&value);
                    println!("{}", shown);
                    history.push(expr, shown);
                }
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }
    0
}
