//! Command session
//!
//! Tracks the selected database and turns input lines into commands. SELECT
//! is handled here; everything else goes through the store's command table.

use crate::format::{format_error, format_result};
use bytes::Bytes;
use storage::{CommandResult, RedisStore, StoreError, StoreResult, DATABASE_COUNT};
use tracing::debug;

pub struct Session<'a, S: RedisStore> {
    store: &'a S,
    db: usize,
}

impl<'a, S: RedisStore> Session<'a, S> {
    pub fn new(store: &'a S, db: usize) -> StoreResult<Self> {
        if db >= DATABASE_COUNT {
            return Err(StoreError::DatabaseOutOfRange(db));
        }
        Ok(Self { store, db })
    }

    /// Currently selected database
    pub fn db(&self) -> usize {
        self.db
    }

    /// Execute one command given as separate arguments
    pub fn execute(&mut self, argv: &[Bytes]) -> StoreResult<CommandResult> {
        let Some((name, args)) = argv.split_first() else {
            return Err(StoreError::InvalidArgument("empty command".to_string()));
        };

        if name.eq_ignore_ascii_case(b"SELECT") {
            return self.select(args);
        }
        self.store.execute_args(self.db, name, args)
    }

    /// Execute one input line and render the reply
    ///
    /// Returns None for blank lines.
    pub fn execute_line(&mut self, line: &str) -> Option<String> {
        let tokens = match tokenize(line) {
            Ok(tokens) if tokens.is_empty() => return None,
            Ok(tokens) => tokens,
            Err(e) => return Some(format!("(error) ERR {}", e)),
        };
        let argv: Vec<Bytes> = tokens.into_iter().map(Bytes::from).collect();

        let reply = match self.execute(&argv) {
            Ok(result) => format_result(&result),
            Err(e) => {
                debug!("command failed on db {}: {}", self.db, e);
                format_error(&e)
            }
        };
        Some(reply)
    }

    fn select(&mut self, args: &[Bytes]) -> StoreResult<CommandResult> {
        let [index] = args else {
            return Err(StoreError::WrongArity("SELECT".to_string()));
        };
        let index: i64 = std::str::from_utf8(index)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(StoreError::NotANumber)?;
        if !(0..DATABASE_COUNT as i64).contains(&index) {
            return Err(StoreError::InvalidArgument(
                "DB index is out of range".to_string(),
            ));
        }
        self.db = index as usize;
        Ok(CommandResult::Ok)
    }
}

/// Splits an input line into arguments, honouring quotes.
///
/// Double quotes allow backslash escapes; single quotes are literal.
pub fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        None => return Err("unbalanced quotes in request".into()),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err("unbalanced quotes in request".into()),
                        },
                        Some(c) => current.push(c),
                    }
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        None => return Err("unbalanced quotes in request".into()),
                        Some('\'') => break,
                        Some(c) => current.push(c),
                    }
                }
            }
            _ => {
                in_token = true;
                current.push(ch);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{DiskStore, MemoryBackend};
    use tempfile::TempDir;

    #[test]
    fn tokenize_quotes() {
        assert_eq!(tokenize("set  k v").unwrap(), vec!["set", "k", "v"]);
        assert_eq!(
            tokenize(r#"set k "hello \"world\"""#).unwrap(),
            vec!["set", "k", "hello \"world\""]
        );
        assert_eq!(tokenize("set k 'a b'").unwrap(), vec!["set", "k", "a b"]);
        assert_eq!(tokenize("echo \"\"").unwrap(), vec!["echo", ""]);
        assert!(tokenize("get \"k").is_err());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn select_switches_database() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
        let mut session = Session::new(&store, 0).unwrap();

        assert_eq!(session.execute_line("set k zero").unwrap(), "OK");
        assert_eq!(session.execute_line("select 3").unwrap(), "OK");
        assert_eq!(session.db(), 3);
        assert_eq!(session.execute_line("get k").unwrap(), "(nil)");
        assert_eq!(
            session.execute_line("select 16").unwrap(),
            "(error) ERR DB index is out of range"
        );
        assert_eq!(session.execute_line("select 0").unwrap(), "OK");
        assert_eq!(session.execute_line("get k").unwrap(), "\"zero\"");
    }

    #[test]
    fn errors_are_rendered() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
        let mut session = Session::new(&store, 0).unwrap();

        assert_eq!(session.execute_line(""), None);
        assert_eq!(
            session.execute_line("bogus").unwrap(),
            "(error) ERR unknown command 'bogus'"
        );
        assert_eq!(
            session.execute_line("zadd z 1 a 2 b").unwrap(),
            "(integer) 2"
        );
        assert_eq!(
            session.execute_line("zrange z 0 -1 withscores").unwrap(),
            "1) \"a\"\n2) \"1\"\n3) \"b\"\n4) \"2\""
        );
        assert!(Session::new(&store, 16).is_err());
    }
}
