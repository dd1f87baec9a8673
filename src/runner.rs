/*!
Headless one-shot runner.

`confluence-cli run <command> ['{"k":"v"}']` performs exactly one dispatch
and exits: result to stdout and exit 0 on success, error to stderr and
exit 1 on failure. Argument-string parse failures use the same envelope
channel as every other user-triggerable error, and pooled client handles
are dropped before returning either way.
*/

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use crate::cmd::{ArgBag, Dispatcher, OutputFormat, ResultEnvelope};

/// Dispatch one command and report it. Returns the process exit code.
pub fn run_once(
    dispatcher: &mut Dispatcher,
    command: &str,
    args_json: Option<&str>,
    profile_override: Option<&str>,
    format_override: Option<OutputFormat>,
) -> Result<i32> {
    let envelope = match ArgBag::from_json_str(args_json.unwrap_or("")) {
        Ok(args) => {
            let runtime = Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(dispatcher.dispatch(
                command,
                &args,
                profile_override,
                format_override,
            ))
        }
        Err(e) => ResultEnvelope::failure(e),
    };
    dispatcher.teardown();

    if envelope.success {
        if let Some(result) = envelope.result.as_deref() {
            if !result.is_empty() {
                println!("{result}");
            }
        }
        Ok(0)
    } else {
        if let Some(error) = envelope.error.as_deref() {
            eprintln!("{error}");
        }
        Ok(1)
    }
}
