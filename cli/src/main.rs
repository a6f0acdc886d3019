use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use docopt_grammar_core::validate_ast;
use docopt_grammar_parser::{
    OutputFormat, ParserConfig, format_outcome, parse_docopt_with_config, render_errors,
    render_tokens,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "docopt-ast")]
#[command(about = "Parse docopt help texts into syntax trees")]
#[command(version)]
struct Cli {
    /// Log parser steps to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a help text and print its syntax tree.
    Parse(ParseArgs),
    /// Print the token stream the parser consumed.
    Tokens(TokensArgs),
    /// Parse a help text and check the tree's structural invariants.
    Check(CheckArgs),
    /// Write the default parser configuration as YAML.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Help text file; reads stdin when omitted or `-`.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Parser configuration YAML file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured error limit.
    #[arg(long)]
    max_errors: Option<usize>,
    /// Skip the remaining sections after the first failing one.
    #[arg(long)]
    stop_on_error: bool,
}

#[derive(Debug, Args)]
struct ParseArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output format.
    #[arg(long, default_value = "tree")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct TokensArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination file.
    #[arg(long)]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init_tracing();
    }

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Tokens(args) => run_tokens(args),
        Command::Check(args) => run_check(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docopt_grammar_parser=debug,docopt_ast=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let help_text = read_input(args.source.input.as_deref())?;
    let config = load_config(&args.source)?;

    let outcome = parse_docopt_with_config(&help_text, &config);
    info!(
        errors = outcome.errors.len(),
        stopped = outcome.stopped,
        "parsed help text"
    );
    let output = format_outcome(&outcome, args.format)?;
    print!("{output}");

    if outcome.errors.is_empty() {
        return Ok(());
    }
    if matches!(args.format, OutputFormat::Tree) {
        eprint!("{}", render_errors(&outcome.errors));
    }
    Err(format!("{} parse error(s)", outcome.errors.len()))
}

fn run_tokens(args: TokensArgs) -> Result<(), String> {
    let help_text = read_input(args.source.input.as_deref())?;
    let config = ParserConfig {
        record_tokens: true,
        ..load_config(&args.source)?
    };

    let outcome = parse_docopt_with_config(&help_text, &config);
    debug!(tokens = outcome.tokens.len(), "recorded token stream");
    print!("{}", render_tokens(&outcome.tokens));

    if outcome.errors.is_empty() {
        Ok(())
    } else {
        eprint!("{}", render_errors(&outcome.errors));
        Err(format!("{} parse error(s)", outcome.errors.len()))
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let help_text = read_input(args.source.input.as_deref())?;
    let config = load_config(&args.source)?;

    let ast = parse_docopt_with_config(&help_text, &config)
        .into_result()
        .map_err(|failure| {
            format!("{failure}\n{}", render_errors(&failure.errors).trim_end())
        })?;

    let violations = validate_ast(&ast);
    debug!(nodes = ast.len(), violations = violations.len(), "validated syntax tree");
    if !violations.is_empty() {
        let lines: Vec<String> = violations.iter().map(|v| format!("  {v}")).collect();
        return Err(format!("invalid syntax tree:\n{}", lines.join("\n")));
    }

    println!(
        "ok: {} usage line(s), {} option line(s), program `{}`",
        ast.usage_lines().len(),
        ast.option_lines().len(),
        ast.prog_name().unwrap_or_default()
    );
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    ParserConfig::default()
        .save(&args.output)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<String, String> {
    match input {
        Some(path) if path != Path::new("-") => {
            debug!(path = %path.display(), "reading help text");
            fs::read_to_string(path)
                .map_err(|err| format!("Failed to read '{}': {err}", path.display()))
        }
        _ => {
            debug!("reading help text from stdin");
            let mut help_text = String::new();
            std::io::stdin()
                .read_to_string(&mut help_text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(help_text)
        }
    }
}

fn load_config(source: &SourceArgs) -> Result<ParserConfig, String> {
    let mut config = match &source.config {
        Some(path) => {
            debug!(path = %path.display(), "loading parser config");
            ParserConfig::load(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?
        }
        None => ParserConfig::default(),
    };
    if let Some(max_errors) = source.max_errors {
        config.max_errors = max_errors;
    }
    if source.stop_on_error {
        config.stop_on_error = true;
    }
    Ok(config)
}
