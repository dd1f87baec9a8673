/*!
Interactive shell session.

One line = one command: the first token is the command name, the rest are
`key=value` arguments (shell quoting applies, so `title="My Page"` works).
Builtins handled locally: `help [command]`, `commands`, `reload`, and
`exit` / `quit`. Everything else goes through the dispatcher, so the shell
and the headless runner cannot drift apart in validation or error text.

Rendered output: success results to stdout, errors to stderr. Pooled
client handles are dropped when the session ends (exit, quit or EOF).
*/

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::cmd::envelope::ERROR_MARKER;
use crate::cmd::format::{self, Role, StyleOptions};
use crate::cmd::registry::{self, COMMANDS};
use crate::cmd::{ArgBag, Dispatcher, OutputFormat, ResultEnvelope};
use crate::config::ProfileConfig;
use crate::log_info;

pub struct Session {
    config_path: PathBuf,
    dispatcher: Dispatcher,
    profile_override: Option<String>,
    format_override: Option<OutputFormat>,
    style: StyleOptions,
}

enum LineOutcome {
    Continue,
    Exit,
}

impl Session {
    pub fn new(
        config_path: PathBuf,
        config: Arc<ProfileConfig>,
        profile_override: Option<String>,
        format_override: Option<OutputFormat>,
    ) -> Self {
        Self {
            config_path,
            dispatcher: Dispatcher::with_http_pool(config),
            profile_override,
            format_override,
            style: StyleOptions::detect(),
        }
    }

    #[cfg(test)]
    fn with_dispatcher(config_path: PathBuf, dispatcher: Dispatcher) -> Self {
        Self {
            config_path,
            dispatcher,
            profile_override: None,
            format_override: None,
            style: StyleOptions {
                use_color: false,
                term_width: 100,
            },
        }
    }

    /// Blocking prompt loop over stdin. Returns when the user exits or
    /// stdin reaches EOF.
    pub fn run(&mut self) -> Result<()> {
        let runtime = Runtime::new().context("failed to start async runtime")?;

        println!(
            "confluence-cli interactive shell (profile: {}). Type 'help' for usage, 'exit' to leave.",
            self.effective_profile()
        );

        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            print!("{} ", format::color(Role::Bold, "confluence>", &self.style));
            std::io::stdout().flush().ok();

            line.clear();
            let read = match stdin.lock().read_line(&mut line) {
                Ok(n) => n,
                Err(e) => {
                    crate::log_error!("failed to read input line: {e}");
                    break;
                }
            };
            if read == 0 {
                // EOF (ctrl-d)
                println!();
                break;
            }
            if let LineOutcome::Exit = self.handle_line(&runtime, &line) {
                break;
            }
        }

        self.dispatcher.teardown();
        log_info!("session closed");
        Ok(())
    }

    fn effective_profile(&self) -> &str {
        self.profile_override
            .as_deref()
            .unwrap_or(&self.dispatcher.config().default_profile)
    }

    fn handle_line(&mut self, runtime: &Runtime, line: &str) -> LineOutcome {
        let tokens = match shell_words::split(line) {
            Ok(t) => t,
            Err(e) => {
                self.print_error(&format!("{ERROR_MARKER} unbalanced quoting: {e}"));
                return LineOutcome::Continue;
            }
        };
        let Some((command, rest)) = tokens.split_first() else {
            return LineOutcome::Continue;
        };

        match command.as_str() {
            "exit" | "quit" => LineOutcome::Exit,
            "commands" => {
                println!("{}", commands_table(&self.style));
                LineOutcome::Continue
            }
            "help" => {
                println!("{}", help_text(rest.first().map(String::as_str), &self.style));
                LineOutcome::Continue
            }
            "reload" => {
                self.reload();
                LineOutcome::Continue
            }
            _ => {
                self.dispatch_tokens(runtime, command, rest);
                LineOutcome::Continue
            }
        }
    }

    fn dispatch_tokens(&mut self, runtime: &Runtime, command: &str, rest: &[String]) {
        let args = match ArgBag::from_pairs(rest) {
            Ok(bag) => bag,
            Err(e) => {
                self.print_error(&format!("{ERROR_MARKER} {e}"));
                return;
            }
        };
        let envelope = runtime.block_on(self.dispatcher.dispatch(
            command,
            &args,
            self.profile_override.as_deref(),
            self.format_override,
        ));
        self.render(&envelope);
    }

    fn render(&self, envelope: &ResultEnvelope) {
        if envelope.success {
            if let Some(result) = envelope.result.as_deref() {
                if !result.is_empty() {
                    println!("{result}");
                }
            }
        } else if let Some(error) = envelope.error.as_deref() {
            self.print_error(error);
        }
    }

    fn print_error(&self, message: &str) {
        eprintln!("{}", format::color(Role::Error, message, &self.style));
    }

    /// Re-read the config file. On failure the running session keeps its
    /// current profiles; the pool is only dropped on success.
    fn reload(&mut self) {
        match ProfileConfig::load(&self.config_path) {
            Ok(config) => {
                self.dispatcher.teardown();
                self.dispatcher = Dispatcher::with_http_pool(Arc::new(config));
                println!(
                    "reloaded {} ({} profile(s))",
                    self.config_path.display(),
                    self.dispatcher.config().profile_names().len()
                );
            }
            Err(e) => self.print_error(&format!("{ERROR_MARKER} reload failed: {e}")),
        }
    }
}

/// Table of every dispatchable command plus the shell builtins.
pub fn commands_table(style: &StyleOptions) -> String {
    let mut rows: Vec<Vec<String>> = COMMANDS
        .iter()
        .map(|spec| {
            vec![
                spec.name.to_string(),
                usage_line(spec),
                spec.summary.to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        "help".into(),
        "help [command]".into(),
        "Show usage for one command or this list".into(),
    ]);
    rows.push(vec![
        "reload".into(),
        "reload".into(),
        "Re-read the config file".into(),
    ]);
    rows.push(vec![
        "exit".into(),
        "exit | quit".into(),
        "Leave the shell".into(),
    ]);
    format::table(&["COMMAND", "USAGE", "SUMMARY"], &rows, style)
}

fn usage_line(spec: &registry::CommandSpec) -> String {
    let mut parts = vec![spec.name.to_string()];
    for req in spec.required {
        parts.push(format!("{req}=<{req}>"));
    }
    for opt in spec.optional {
        parts.push(format!("[{opt}=...]"));
    }
    parts.join(" ")
}

/// Help for one command, or the full table when no name is given.
pub fn help_text(command: Option<&str>, style: &StyleOptions) -> String {
    let Some(name) = command else {
        return commands_table(style);
    };
    match registry::find(name) {
        Some(spec) => {
            let mut out = String::new();
            out.push_str(&format::color(Role::Bold, spec.name, style));
            out.push_str(&format!(" - {}\n", spec.summary));
            out.push_str(&format!("usage: {}\n", usage_line(spec)));
            out.push_str(spec.detail);
            out
        }
        None => format!("unknown command '{name}' (run 'commands' to see what is available)"),
    }
}
