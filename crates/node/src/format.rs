//! Pretty-printing for command replies.
//!
//! Output style matches redis-cli conventions:
//! - status replies: bare text
//! - errors: `(error)` prefix
//! - integers: `(integer)` prefix
//! - byte strings: quoted, hex if not UTF-8
//! - nil: `(nil)`
//! - arrays: numbered list

use storage::{CommandResult, StoreError};

/// Formats a successful reply for terminal display.
pub fn format_result(result: &CommandResult) -> String {
    match result {
        CommandResult::Ok => "OK".to_string(),
        CommandResult::Pong => "PONG".to_string(),
        CommandResult::Status(s) => s.clone(),
        CommandResult::Integer(n) => format!("(integer) {}", n),
        CommandResult::Value(None) => "(nil)".to_string(),
        CommandResult::Value(Some(data)) => format_bytes(data),
        CommandResult::Array(items) if items.is_empty() => "(empty array)".to_string(),
        CommandResult::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}) {}", i + 1, format_bytes(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        CommandResult::Error(msg) => format!("(error) {}", msg),
    }
}

/// Formats a failed command.
pub fn format_error(err: &StoreError) -> String {
    format!("(error) {}", err)
}

fn format_bytes(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => format!("{:?}", s),
        Err(_) => data.iter().map(|b| format!("{b:02x}")).collect(),
    }
}
