//! Interactive REPL for the arith-mcp server.
//!
//! Launch with `arith-mcp repl`. Slash commands drive the tool registry
//! directly; a line starting with `{` is sent through the dispatcher as a
//! JSON-RPC message against a strict session, exactly as stdio would see it.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::{Map, Value};

use arith::Operation;

use crate::config;
use crate::protocol::{Control, Dispatcher, SessionPolicy, SessionState};
use crate::tools::ToolRegistry;
use crate::types::{FunctionCall, SERVER_NAME, SERVER_VERSION};

const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server name, version, and session state"),
    ("/tools", "List registered tools"),
    ("/calc", "Run the calculator: /calc <operation> <n> <n> ..."),
    ("/call", "Invoke a tool: /call <tool> <json parameters>"),
    ("/mode", "Show the serve mode the environment selects"),
    ("/reset", "Start a fresh JSON-RPC session"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

struct ArithHelper;

impl Completer for ArithHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        // Operation names after /calc
        if let Some(arg) = input.strip_prefix("/calc ") {
            if !arg.contains(' ') {
                let start = input.len() - arg.len();
                let matches: Vec<Pair> = Operation::ALL
                    .iter()
                    .map(|op| op.as_str())
                    .filter(|op| op.starts_with(arg))
                    .map(|op| Pair {
                        display: op.to_string(),
                        replacement: format!("{op} "),
                    })
                    .collect();
                return Ok((start, matches));
            }
        }

        Ok((pos, Vec::new()))
    }
}

impl Hinter for ArithHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ArithHelper {}
impl Validator for ArithHelper {}
impl Helper for ArithHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

struct ReplState {
    dispatcher: Dispatcher,
    session: SessionState,
    policy: SessionPolicy,
}

/// Run the interactive REPL.
pub fn run() -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1m{SERVER_NAME} v{SERVER_VERSION}\x1b[0m \x1b[90mcalculator console\x1b[0m"
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!("    Lines starting with \x1b[36m{{\x1b[0m are sent as JSON-RPC.");
    eprintln!();

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<ArithHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(rl_config)?;
    rl.set_helper(Some(ArithHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".arith_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut state = ReplState {
        dispatcher: Dispatcher::new(Arc::new(ToolRegistry::with_builtin_tools())),
        session: SessionState::new(),
        policy: SessionPolicy::strict(),
    };
    let prompt = " \x1b[36marith>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('{') {
                    cmd_rpc(line, &mut state);
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let mut parts = input.splitn(2, ' ');
                let cmd = parts.next().unwrap_or("");
                let args = parts.next().unwrap_or("").trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(&state),
                    "tools" => cmd_tools(state.dispatcher.registry()),
                    "calc" => cmd_calc(args, &state),
                    "call" => cmd_call(args, &state),
                    "mode" => cmd_mode(),
                    "reset" => {
                        state.session = SessionState::new();
                        eprintln!("  Session reset; send initialize first.");
                    }
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Example: {{\"jsonrpc\":\"2.0\",\"method\":\"initialize\",\"id\":1}}");
    eprintln!();
}

fn cmd_info(state: &ReplState) {
    eprintln!();
    eprintln!("  Server:  {SERVER_NAME} v{SERVER_VERSION}");
    eprintln!("  Tools:   {}", state.dispatcher.registry().len());
    match state.session.initialized_at {
        Some(at) if state.session.is_initialized() => {
            eprintln!("  Session: initialized at {}", at.to_rfc3339())
        }
        _ => eprintln!("  Session: not initialized"),
    }
    eprintln!();
}

fn cmd_tools(registry: &ToolRegistry) {
    let tools = registry.describe_all();
    eprintln!();
    eprintln!("  {} tool(s) registered:", tools.len());
    eprintln!();
    for tool in tools.values() {
        eprintln!("    {:<16} {}", tool.name, tool.description);
    }
    eprintln!();
}

fn cmd_calc(args: &str, state: &ReplState) {
    let mut words = args.split_whitespace();
    let Some(operation) = words.next() else {
        eprintln!("  Usage: /calc <add|subtract|multiply|divide> <n> <n> ...");
        return;
    };

    let mut numbers = Vec::new();
    for word in words {
        match serde_json::from_str::<Value>(word) {
            Ok(value @ Value::Number(_)) => numbers.push(value),
            _ => {
                eprintln!("  Not a number: {word}");
                return;
            }
        }
    }

    let mut parameters = Map::new();
    parameters.insert("operation".into(), Value::String(operation.to_string()));
    parameters.insert("numbers".into(), Value::Array(numbers));
    run_call(
        FunctionCall {
            name: crate::tools::calculator::NAME.to_string(),
            parameters,
        },
        state,
    );
}

fn cmd_call(args: &str, state: &ReplState) {
    let mut parts = args.splitn(2, ' ');
    let name = parts.next().unwrap_or("");
    if name.is_empty() {
        eprintln!("  Usage: /call <tool> <json parameters>");
        return;
    }
    let raw = parts.next().unwrap_or("{}").trim();

    let parameters = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            eprintln!("  Parameters must be a JSON object");
            return;
        }
        Err(e) => {
            eprintln!("  Invalid JSON: {e}");
            return;
        }
    };

    run_call(
        FunctionCall {
            name: name.to_string(),
            parameters,
        },
        state,
    );
}

fn run_call(call: FunctionCall, state: &ReplState) {
    for result in state.dispatcher.execute_calls(std::slice::from_ref(&call)) {
        print_json(&result);
    }
}

fn cmd_rpc(line: &str, state: &mut ReplState) {
    let dispatch = state
        .dispatcher
        .handle_text(&mut state.session, line, &state.policy);
    print_json(&dispatch.response);
    if dispatch.control == Control::Shutdown {
        eprintln!("  Session shut down; send initialize to start again.");
    }
}

fn cmd_mode() {
    match config::mode_from_env() {
        Ok(mode) => eprintln!("  Environment selects {mode} mode."),
        Err(e) => eprintln!("  {e}"),
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            for line in text.lines() {
                eprintln!("  {line}");
            }
        }
        Err(e) => eprintln!("  Error: {e}"),
    }
}
