use std::io::Read;

use cc_devflow::config::{self, defaults};
use cc_devflow::eval::Decision;
use cc_devflow::format::{self, FormatOutcome, FormatSettings};
use cc_devflow::git::GitCli;
use cc_devflow::hook::{self, HookInput};
use cc_devflow::logging;
use cc_devflow::runner::SystemRunner;

const USAGE: &str = "\
usage: cc-devflow [MODE]

Reads a Claude Code hook request as JSON on stdin.

modes:
  validate-git    PreToolUse: check git commands against the workflow policy (default)
  format          PostToolUse: format and type-check written Python files
  --dump-config   print the resolved policy as TOML
  --version, -V   print the version
  --help, -h      print this help";

fn read_stdin() -> String {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }
    input
}

fn emit(decision: &Decision) {
    match hook::encode(decision) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode response: {e}");
            std::process::exit(1);
        }
    }
}

fn warn(message: &str) {
    for line in message.lines() {
        eprintln!("Warning: {line}");
    }
}

fn validate_git() {
    let input = HookInput::parse(&read_stdin());
    let project = config::project_dir(input.cwd.as_deref());
    let policy = config::load(&project);
    let runner = SystemRunner::new(defaults().git.lookup_timeout_secs);
    let lookup = GitCli::new(&runner);

    let decision = hook::pre_tool_use(&input, &policy, &lookup);
    if let Some(command) = input.shell_command() {
        logging::log_decision("validate-git", command, &decision);
    }
    if let Decision::WarnApprove { message } = &decision {
        warn(message);
    }
    emit(&decision);
}

fn format_file() {
    let input = HookInput::parse(&read_stdin());
    let project = config::project_dir(input.cwd.as_deref());
    let settings = FormatSettings::resolve(&config::load(&project), &project);
    let runner = SystemRunner::new(defaults().format.timeout_secs);

    let FormatOutcome::Done {
        file,
        advisory,
        warnings,
    } = format::post_tool_use(&input, &settings, &runner)
    else {
        return;
    };

    for warning in &warnings {
        warn(warning);
    }
    let subject = file.to_string_lossy();
    match advisory {
        Some(decision) => {
            logging::log_decision("format", &subject, &decision);
            emit(&decision);
        }
        None => logging::log_decision("format", &subject, &Decision::Approve),
    }
}

fn dump_config() {
    let project = config::project_dir(None);
    match toml::to_string_pretty(&config::load(&project)) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    logging::init();

    let mode = std::env::args().nth(1);
    match mode.as_deref() {
        None | Some("validate-git") => validate_git(),
        Some("format") => format_file(),
        Some("--dump-config") => dump_config(),
        Some("--version" | "-V") => println!("cc-devflow {}", env!("CARGO_PKG_VERSION")),
        Some("--help" | "-h") => println!("{USAGE}"),
        Some(other) => {
            eprintln!("unknown mode: {other}\n\n{USAGE}");
            std::process::exit(1);
        }
    }
}
