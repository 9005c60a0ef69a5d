mod runner;
mod tap;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use cfgtoml_core::{ConvertError, ConvertOptions, Value};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// cfgtoml configuration language converter.
#[derive(Parser)]
#[command(
    name = "cfgtoml",
    version,
    about = "Convert cfgtoml configuration files to TOML"
)]
struct Cli {
    /// Diagnostic format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a configuration file to TOML
    Convert {
        /// Path to the source file, or `-` to read stdin
        file: PathBuf,
        /// Write the TOML document to this file instead of stdout
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        /// Omit the generation timestamp comment
        #[arg(long)]
        no_header: bool,
        /// Predefine a constant; VALUE is an integer, `true` or `false`
        #[arg(
            short = 'D',
            long = "define",
            value_name = "NAME=VALUE",
            value_parser = parse_define
        )]
        defines: Vec<(String, Value)>,
    },

    /// Print sample configurations
    Examples,

    /// Run the conformance test suite
    Test {
        /// Path to the conformance suite directory
        #[arg(default_value = "conformance")]
        suite_dir: PathBuf,
    },
}

static DEMOS: &[(&str, &str)] = &[
    (
        "Web server configuration",
        include_str!("../../../demos/web_server.conf"),
    ),
    ("Game configuration", include_str!("../../../demos/game.conf")),
];

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            file,
            out,
            no_header,
            defines,
        } => {
            let options = ConvertOptions {
                header: !no_header,
                defines: defines.into_iter().collect(),
            };
            cmd_convert(&file, out.as_deref(), &options, cli.output, cli.quiet);
        }
        Commands::Examples => cmd_examples(),
        Commands::Test { suite_dir } => cmd_test(&suite_dir, cli.output, cli.quiet),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();
}

fn parse_define(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing constant name in '{}'", raw));
    }
    let value = match value.trim() {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        other => other
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("invalid value '{}': expected integer, true or false", other))?,
    };
    Ok((name.to_owned(), value))
}

fn read_source(file: &Path) -> io::Result<String> {
    if file == Path::new("-") {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        Ok(src)
    } else {
        std::fs::read_to_string(file)
    }
}

fn cmd_convert(
    file: &Path,
    out: Option<&Path>,
    options: &ConvertOptions,
    output: OutputFormat,
    quiet: bool,
) {
    tracing::info!(file = %file.display(), "converting");
    let src = match read_source(file) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let toml = match cfgtoml_core::convert_with(&src, options) {
        Ok(toml) => toml,
        Err(e) => {
            report_conversion_error(file, &e, output, quiet);
            process::exit(1);
        }
    };

    match out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &toml) {
                let msg = format!("error writing '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
            tracing::debug!(path = %path.display(), "wrote output");
        }
        None => print!("{}", toml),
    }
}

fn cmd_examples() {
    for (i, (title, src)) in DEMOS.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let heading = format!("Example {}: {}", i + 1, title);
        println!("{}", heading);
        println!("{}", "=".repeat(heading.chars().count()));
        print!("{}", src);
    }
}

fn cmd_test(suite_dir: &Path, output: OutputFormat, quiet: bool) {
    if !suite_dir.is_dir() {
        let msg = format!("suite directory '{}' not found", suite_dir.display());
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    let result = runner::run_suite(suite_dir);
    if result.failed > 0 {
        process::exit(1);
    }
}

fn report_conversion_error(file: &Path, e: &ConvertError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}: {}", file.display(), e);
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
