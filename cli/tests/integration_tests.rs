use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("docopt_ast_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("failed to write test file");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const NAVAL_FATE: &str = "\
Naval Fate.

Usage:
  naval_fate ship <name> move <x> <y> [--speed=<kn>]
  naval_fate -h | --help

Options:
  -h, --help     Show this screen.
  --speed=<kn>   Speed in knots [default: 10].
";

fn docopt_ast(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docopt-ast"))
        .args(args)
        .output()
        .expect("failed to run docopt-ast")
}

fn docopt_ast_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_docopt-ast"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn docopt-ast");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for docopt-ast")
}

#[test]
fn parse_file_prints_tree() {
    let dir = TempDir::new("parse_tree");
    let input = dir.write("help.txt", NAVAL_FATE);

    let output = docopt_ast(&["parse", "--input", input.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "parse failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Root\n"));
    assert!(stdout.contains("ProgName \"naval_fate\""));
    assert!(stdout.contains("OptionDefault \"[default: 10]\""));
}

#[test]
fn parse_stdin_json_output() {
    let output = docopt_ast_stdin(&["parse", "--format", "json"], NAVAL_FATE);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("Invalid JSON output: {e}\n{stdout}"));
    assert_eq!(parsed["prog_name"], "naval_fate");
    assert_eq!(parsed["ast"]["kind"], "Root");
    assert_eq!(parsed["errors"].as_array().map(Vec::len), Some(0));
    assert_eq!(parsed["stopped"], false);
}

#[test]
fn parse_yaml_output() {
    let output = docopt_ast_stdin(&["parse", "--format", "yaml", "--input", "-"], NAVAL_FATE);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prog_name: naval_fate"));
    assert!(stdout.contains("kind: UsageSection"));
}

#[test]
fn parse_errors_exit_nonzero() {
    let output = docopt_ast_stdin(&["parse"], "Usage:\n  prog cmd\n  other cmd\n");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: program name `other`"), "stderr: {stderr}");
    assert!(stderr.contains("error: 1 parse error(s)"));
}

#[test]
fn max_errors_flag_stops_parse() {
    let output = docopt_ast_stdin(
        &["parse", "--format", "json", "--max-errors", "1"],
        "Usage: prog . .\n",
    );
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["stopped"], true);
    let messages: Vec<&str> = parsed["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["message"].as_str())
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].starts_with("too many errors"));
}

#[test]
fn config_file_is_honoured() {
    let dir = TempDir::new("config");
    let config = dir.write("parser.yml", "max_errors: 1\n");

    let output = docopt_ast_stdin(
        &["parse", "--format", "json", "--config", config.to_str().unwrap()],
        "Usage: prog . .\n",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["stopped"], true);
}

#[test]
fn missing_config_file_is_reported() {
    let output = docopt_ast_stdin(&["parse", "--config", "/nonexistent/parser.yml"], NAVAL_FATE);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "stderr: {stderr}");
}

#[test]
fn tokens_dump_one_per_line() {
    let output = docopt_ast_stdin(&["tokens"], "Usage: prog -h\n");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "USAGE:\"Usage:\"",
            "BLANK:\" \"",
            "PROG_NAME:\"prog\"",
            "SHORT:\"-h\"",
            "NEWLINE:\"\\n\"",
            "EOF:\"\"",
        ]
    );
}

#[test]
fn check_reports_summary() {
    let output = docopt_ast_stdin(&["check"], NAVAL_FATE);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "ok: 2 usage line(s), 2 option line(s), program `naval_fate`"
    );
}

#[test]
fn check_fails_without_usage() {
    let output = docopt_ast_stdin(&["check"], "nothing to see\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no usage section found"), "stderr: {stderr}");
}

#[test]
fn init_config_writes_defaults() {
    let dir = TempDir::new("init_config");
    let path = dir.join("parser.yml");

    let output = docopt_ast(&["init-config", "--output", path.to_str().unwrap()]);
    assert!(output.status.success());

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("max_errors: 10"));
    assert!(written.contains("stop_on_error: false"));
}

#[test]
fn missing_input_file_is_reported() {
    let output = docopt_ast(&["parse", "--input", "/nonexistent/help.txt"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: Failed to read"));
}

#[test]
fn verbose_logs_to_stderr() {
    let output = Command::new(env!("CARGO_BIN_EXE_docopt-ast"))
        .args(["--verbose", "parse", "--input", "-"])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            child
                .stdin
                .take()
                .expect("stdin is piped")
                .write_all(NAVAL_FATE.as_bytes())?;
            child.wait_with_output()
        })
        .expect("failed to run docopt-ast");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reading help text from stdin"), "stderr: {stderr}");
    assert!(stderr.contains("parsed help text"), "stderr: {stderr}");
    assert!(stderr.contains("program name discovered"), "stderr: {stderr}");
}
