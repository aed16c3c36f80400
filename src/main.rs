mod debug_report;

use std::io::{self, IsTerminal, Read};

use kielo::{Applicator, Options};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let applicator = match Applicator::from_path(&config.grammar) {
        Ok(applicator) => applicator.with_options(Options { max_section_passes: config.max_passes }),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let input = match read_input(&config) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut doc = match applicator.parse(&input) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let metrics = applicator.run_rules(&mut doc);
    print!("{doc}");

    if config.trace {
        debug_report::print_run(&config.grammar, &metrics, config.color);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stderr).init();
}

struct CliConfig {
    grammar: String,
    input: Option<String>,
    trace: bool,
    color: bool,
    max_passes: usize,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut grammar: Option<String> = None;
    let mut input: Option<String> = None;
    let mut trace = false;
    let mut color = io::stderr().is_terminal();
    let mut max_passes = Options::default().max_section_passes;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("kielo {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--trace" => trace = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "--grammar" | "-g" => {
                let value = args.next().ok_or_else(|| "error: --grammar expects a path".to_string())?;
                if grammar.is_some() {
                    return Err("error: grammar provided multiple times".to_string());
                }
                grammar = Some(value);
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a path".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--max-passes" => {
                let value = args.next().ok_or_else(|| "error: --max-passes expects a number".to_string())?;
                max_passes = value
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("error: invalid --max-passes '{value}'"))?;
            }
            _ if arg.starts_with("--grammar=") => {
                let value = arg.trim_start_matches("--grammar=");
                if grammar.is_some() {
                    return Err("error: grammar provided multiple times".to_string());
                }
                grammar = Some(value.to_string());
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ => {
                return Err(format!("error: unknown option '{arg}'\n\n{}", help_text()));
            }
        }
    }

    let grammar = grammar.ok_or_else(|| format!("error: no grammar provided\n\n{}", help_text()))?;
    Ok(CliConfig { grammar, input, trace, color, max_passes })
}

fn read_input(config: &CliConfig) -> Result<String, String> {
    match &config.input {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|err| format!("error: failed to read {path}: {err}"))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("error: failed to read stdin: {err}"))?;
            Ok(buffer)
        }
    }
}

fn help_text() -> String {
    format!(
        "kielo {version}

Constraint-grammar disambiguation CLI: compiles a grammar, applies it to a
cohort/reading stream, and writes the disambiguated stream to stdout.

Usage:
  kielo --grammar <file> [OPTIONS]

Options:
  -g, --grammar <file>       Grammar file to compile (required).
  -i, --input <file>         Document stream to disambiguate. Reads stdin
                             when omitted.
  --max-passes <n>           Pass cap per rule section (default: {passes}).
  --trace                    Print a per-section run report to stderr.
  --color                    Force ANSI color in the report.
  --no-color                 Disable ANSI color in the report.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  1  Grammar or document error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        passes = Options::default().max_section_passes
    )
}
