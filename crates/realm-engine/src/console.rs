//! Operator console on standard input.
//!
//! One command per line: `pause`, `resume`, `speed <ms>`, `stop`, `status`.

use std::sync::Arc;

use realm_core::{OperatorCommand, OperatorState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Apply one console line. Returns the reply, or `None` for a blank line.
pub fn handle_line(operator: &OperatorState, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(OperatorCommand::parse(line).map_or_else(
        || format!("Unknown command {line:?}; expected pause, resume, speed <ms>, stop or status"),
        |command| operator.apply(command),
    ))
}

/// Read commands from stdin until it closes.
pub async fn run(operator: Arc<OperatorState>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reply) = handle_line(&operator, &line) {
                    info!(command = line.trim(), reply = %reply, "Operator command");
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Operator console read failed");
                break;
            }
        }
    }
}
