//! Redis command table and parsing
//!
//! Turns `(name, arguments)` into a type-safe `Command`. The table below is
//! the only place command names are recognised; the dispatcher and the
//! scripting bridge both go through it, so an unknown name is always
//! reported as `UnknownCommand`.

mod result;

pub use result::{format_score, CommandResult};

use crate::traits::{StoreError, StoreResult};
use bytes::Bytes;

/// Command type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// Only reads the keyspace
    Read,
    /// Mutates the keyspace
    Write,
}

/// Entry of the command table
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Upper-case command name
    pub name: &'static str,
    /// Minimum number of arguments (command name excluded)
    pub min_args: usize,
    /// Maximum number of arguments, None if unbounded
    pub max_args: Option<usize>,
    pub kind: CommandType,
}

const fn spec(
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    kind: CommandType,
) -> CommandSpec {
    CommandSpec {
        name,
        min_args,
        max_args,
        kind,
    }
}

use CommandType::{Read, Write};

/// Every supported command
pub const COMMAND_TABLE: &[CommandSpec] = &[
    // Connection/Management
    spec("PING", 0, Some(1), Read),
    spec("ECHO", 1, Some(1), Read),
    spec("DBSIZE", 0, Some(0), Read),
    spec("FLUSHDB", 0, Some(0), Write),
    spec("FLUSHALL", 0, Some(0), Write),
    spec("SAVE", 0, Some(0), Read),
    // Keys
    spec("DEL", 1, None, Write),
    spec("EXISTS", 1, None, Read),
    spec("TYPE", 1, Some(1), Read),
    spec("KEYS", 1, Some(1), Read),
    // String
    spec("GET", 1, Some(1), Read),
    spec("SET", 2, Some(2), Write),
    spec("INCR", 1, Some(1), Write),
    spec("INCRBY", 2, Some(2), Write),
    spec("DECR", 1, Some(1), Write),
    spec("DECRBY", 2, Some(2), Write),
    // Set
    spec("SADD", 2, None, Write),
    spec("SREM", 2, None, Write),
    spec("SISMEMBER", 2, Some(2), Read),
    spec("SMEMBERS", 1, Some(1), Read),
    spec("SCARD", 1, Some(1), Read),
    // Hash
    spec("HSET", 3, Some(3), Write),
    spec("HGET", 2, Some(2), Read),
    spec("HDEL", 2, None, Write),
    spec("HEXISTS", 2, Some(2), Read),
    spec("HLEN", 1, Some(1), Read),
    spec("HKEYS", 1, Some(1), Read),
    spec("HVALS", 1, Some(1), Read),
    spec("HGETALL", 1, Some(1), Read),
    // Sorted set
    spec("ZADD", 3, None, Write),
    spec("ZSCORE", 2, Some(2), Read),
    spec("ZCARD", 1, Some(1), Read),
    spec("ZRANGE", 3, Some(4), Read),
    spec("ZREM", 2, None, Write),
];

/// Find a command by name, case-insensitively
pub fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMAND_TABLE
        .iter()
        .find(|spec| spec.name.as_bytes().eq_ignore_ascii_case(name))
}

/// Redis command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ==================== Connection/Management Commands ====================
    /// PING [message]
    Ping { message: Option<Bytes> },
    /// ECHO message
    Echo { message: Bytes },
    /// DBSIZE
    DbSize,
    /// FLUSHDB
    FlushDb,
    /// FLUSHALL
    FlushAll,
    /// SAVE
    Save,

    // ==================== Key Commands ====================
    /// DEL key [key ...]
    Del { keys: Vec<Bytes> },
    /// EXISTS key [key ...]
    Exists { keys: Vec<Bytes> },
    /// TYPE key
    Type { key: Bytes },
    /// KEYS pattern
    Keys { pattern: Bytes },

    // ==================== String Commands ====================
    /// GET key
    Get { key: Bytes },
    /// SET key value
    Set { key: Bytes, value: Bytes },
    /// INCR key
    Incr { key: Bytes },
    /// INCRBY key delta
    IncrBy { key: Bytes, delta: i64 },
    /// DECR key
    Decr { key: Bytes },
    /// DECRBY key delta
    DecrBy { key: Bytes, delta: i64 },

    // ==================== Set Commands ====================
    /// SADD key member [member ...]
    SAdd { key: Bytes, members: Vec<Bytes> },
    /// SREM key member [member ...]
    SRem { key: Bytes, members: Vec<Bytes> },
    /// SISMEMBER key member
    SIsMember { key: Bytes, member: Bytes },
    /// SMEMBERS key
    SMembers { key: Bytes },
    /// SCARD key
    SCard { key: Bytes },

    // ==================== Hash Commands ====================
    /// HSET key field value
    HSet {
        key: Bytes,
        field: Bytes,
        value: Bytes,
    },
    /// HGET key field
    HGet { key: Bytes, field: Bytes },
    /// HDEL key field [field ...]
    HDel { key: Bytes, fields: Vec<Bytes> },
    /// HEXISTS key field
    HExists { key: Bytes, field: Bytes },
    /// HLEN key
    HLen { key: Bytes },
    /// HKEYS key
    HKeys { key: Bytes },
    /// HVALS key
    HVals { key: Bytes },
    /// HGETALL key
    HGetAll { key: Bytes },

    // ==================== Sorted Set Commands ====================
    /// ZADD key score member [score member ...]
    ZAdd {
        key: Bytes,
        members: Vec<(f64, Bytes)>,
    },
    /// ZSCORE key member
    ZScore { key: Bytes, member: Bytes },
    /// ZCARD key
    ZCard { key: Bytes },
    /// ZRANGE key start stop [WITHSCORES]
    ZRange {
        key: Bytes,
        start: i64,
        stop: i64,
        with_scores: bool,
    },
    /// ZREM key member [member ...]
    ZRem { key: Bytes, members: Vec<Bytes> },
}

impl Command {
    /// Parse a command from its name and arguments
    pub fn parse(name: &[u8], args: &[Bytes]) -> StoreResult<Command> {
        let spec = lookup(name).ok_or_else(|| {
            StoreError::UnknownCommand(String::from_utf8_lossy(name).into_owned())
        })?;
        check_arity(spec, args)?;
        parse_command(spec.name, args)
    }

    /// Upper-case command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping { .. } => "PING",
            Command::Echo { .. } => "ECHO",
            Command::DbSize => "DBSIZE",
            Command::FlushDb => "FLUSHDB",
            Command::FlushAll => "FLUSHALL",
            Command::Save => "SAVE",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Type { .. } => "TYPE",
            Command::Keys { .. } => "KEYS",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Incr { .. } => "INCR",
            Command::IncrBy { .. } => "INCRBY",
            Command::Decr { .. } => "DECR",
            Command::DecrBy { .. } => "DECRBY",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SCard { .. } => "SCARD",
            Command::HSet { .. } => "HSET",
            Command::HGet { .. } => "HGET",
            Command::HDel { .. } => "HDEL",
            Command::HExists { .. } => "HEXISTS",
            Command::HLen { .. } => "HLEN",
            Command::HKeys { .. } => "HKEYS",
            Command::HVals { .. } => "HVALS",
            Command::HGetAll { .. } => "HGETALL",
            Command::ZAdd { .. } => "ZADD",
            Command::ZScore { .. } => "ZSCORE",
            Command::ZCard { .. } => "ZCARD",
            Command::ZRange { .. } => "ZRANGE",
            Command::ZRem { .. } => "ZREM",
        }
    }

    /// Get command type (read/write)
    pub fn command_type(&self) -> CommandType {
        lookup(self.name().as_bytes())
            .map(|spec| spec.kind)
            .unwrap_or(CommandType::Write)
    }

    pub fn is_write(&self) -> bool {
        self.command_type() == CommandType::Write
    }
}

/// Parse integer argument
fn parse_int(arg: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(StoreError::NotANumber)
}

/// Parse score argument
///
/// Accepts `inf`, `+inf` and `-inf`; rejects NaN. `-0` is stored as `0`.
pub fn parse_score(arg: &[u8]) -> StoreResult<f64> {
    let invalid = || StoreError::InvalidArgument("value is not a valid float".to_string());
    let s = std::str::from_utf8(arg).map_err(|_| invalid())?;
    let score = match s.to_ascii_lowercase().as_str() {
        "inf" | "+inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        other => other.parse::<f64>().map_err(|_| invalid())?,
    };
    if score.is_nan() {
        return Err(invalid());
    }
    Ok(if score == 0.0 { 0.0 } else { score })
}

/// Check argument count
fn check_arity(spec: &CommandSpec, args: &[Bytes]) -> StoreResult<()> {
    let too_many = spec.max_args.map_or(false, |max| args.len() > max);
    if args.len() < spec.min_args || too_many {
        return Err(StoreError::WrongArity(spec.name.to_string()));
    }
    Ok(())
}

fn syntax_error() -> StoreError {
    StoreError::InvalidArgument("syntax error".to_string())
}

/// Parse command
fn parse_command(cmd: &str, args: &[Bytes]) -> StoreResult<Command> {
    let key = || args[0].clone();
    let command = match cmd {
        "PING" => Command::Ping {
            message: args.first().cloned(),
        },
        "ECHO" => Command::Echo { message: key() },
        "DBSIZE" => Command::DbSize,
        "FLUSHDB" => Command::FlushDb,
        "FLUSHALL" => Command::FlushAll,
        "SAVE" => Command::Save,

        "DEL" => Command::Del {
            keys: args.to_vec(),
        },
        "EXISTS" => Command::Exists {
            keys: args.to_vec(),
        },
        "TYPE" => Command::Type { key: key() },
        "KEYS" => Command::Keys { pattern: key() },

        "GET" => Command::Get { key: key() },
        "SET" => Command::Set {
            key: key(),
            value: args[1].clone(),
        },
        "INCR" => Command::Incr { key: key() },
        "INCRBY" => Command::IncrBy {
            key: key(),
            delta: parse_int(&args[1])?,
        },
        "DECR" => Command::Decr { key: key() },
        "DECRBY" => Command::DecrBy {
            key: key(),
            delta: parse_int(&args[1])?,
        },

        "SADD" => Command::SAdd {
            key: key(),
            members: args[1..].to_vec(),
        },
        "SREM" => Command::SRem {
            key: key(),
            members: args[1..].to_vec(),
        },
        "SISMEMBER" => Command::SIsMember {
            key: key(),
            member: args[1].clone(),
        },
        "SMEMBERS" => Command::SMembers { key: key() },
        "SCARD" => Command::SCard { key: key() },

        "HSET" => Command::HSet {
            key: key(),
            field: args[1].clone(),
            value: args[2].clone(),
        },
        "HGET" => Command::HGet {
            key: key(),
            field: args[1].clone(),
        },
        "HDEL" => Command::HDel {
            key: key(),
            fields: args[1..].to_vec(),
        },
        "HEXISTS" => Command::HExists {
            key: key(),
            field: args[1].clone(),
        },
        "HLEN" => Command::HLen { key: key() },
        "HKEYS" => Command::HKeys { key: key() },
        "HVALS" => Command::HVals { key: key() },
        "HGETALL" => Command::HGetAll { key: key() },

        "ZADD" => {
            let pairs = &args[1..];
            if pairs.len() % 2 != 0 {
                return Err(syntax_error());
            }
            let members = pairs
                .chunks_exact(2)
                .map(|pair| Ok((parse_score(&pair[0])?, pair[1].clone())))
                .collect::<StoreResult<Vec<_>>>()?;
            Command::ZAdd {
                key: key(),
                members,
            }
        }
        "ZSCORE" => Command::ZScore {
            key: key(),
            member: args[1].clone(),
        },
        "ZCARD" => Command::ZCard { key: key() },
        "ZRANGE" => {
            let with_scores = match args.get(3) {
                None => false,
                Some(flag) if flag.eq_ignore_ascii_case(b"WITHSCORES") => true,
                Some(_) => return Err(syntax_error()),
            };
            Command::ZRange {
                key: key(),
                start: parse_int(&args[1])?,
                stop: parse_int(&args[2])?,
                with_scores,
            }
        }
        "ZREM" => Command::ZRem {
            key: key(),
            members: args[1..].to_vec(),
        },

        other => return Err(StoreError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<Bytes> {
        items.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    #[test]
    fn test_every_table_entry_parses() {
        for spec in COMMAND_TABLE {
            let mut input = vec!["1"; spec.min_args];
            if spec.name == "ZADD" {
                input = vec!["z", "1", "m"];
            }
            let command = Command::parse(spec.name.as_bytes(), &args(&input))
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", spec.name, e));
            assert_eq!(command.name(), spec.name);
            assert_eq!(command.command_type(), spec.kind);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let cmd = Command::parse(b"zAdd", &args(&["z", "1.5", "a", "-inf", "b"])).unwrap();
        assert_eq!(
            cmd,
            Command::ZAdd {
                key: Bytes::from("z"),
                members: vec![
                    (1.5, Bytes::from("a")),
                    (f64::NEG_INFINITY, Bytes::from("b"))
                ],
            }
        );
        assert!(cmd.is_write());
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse(b"LPUSH", &args(&["l", "x"])),
            Err(StoreError::UnknownCommand("LPUSH".to_string()))
        );
    }

    #[test]
    fn test_arity() {
        assert_eq!(
            Command::parse(b"get", &[]),
            Err(StoreError::WrongArity("GET".to_string()))
        );
        assert_eq!(
            Command::parse(b"ping", &args(&["a", "b"])),
            Err(StoreError::WrongArity("PING".to_string()))
        );
        assert!(Command::parse(b"sadd", &args(&["s", "a", "b", "c"])).is_ok());
    }

    #[test]
    fn test_zadd_requires_pairs() {
        assert_eq!(
            Command::parse(b"ZADD", &args(&["z", "1", "a", "2"])),
            Err(syntax_error())
        );
        assert!(matches!(
            Command::parse(b"ZADD", &args(&["z", "nan", "a"])),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zrange_withscores_flag() {
        let cmd = Command::parse(b"ZRANGE", &args(&["z", "0", "-1", "withscores"])).unwrap();
        assert!(matches!(cmd, Command::ZRange { with_scores: true, .. }));
        assert_eq!(
            Command::parse(b"ZRANGE", &args(&["z", "0", "-1", "nope"])),
            Err(syntax_error())
        );
    }

    #[test]
    fn test_incrby_requires_integer() {
        assert_eq!(
            Command::parse(b"INCRBY", &args(&["k", "1.5"])),
            Err(StoreError::NotANumber)
        );
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score(b"+inf").unwrap(), f64::INFINITY);
        assert_eq!(parse_score(b"-0").unwrap().to_bits(), 0.0f64.to_bits());
        assert_eq!(parse_score(b"2.5").unwrap(), 2.5);
        assert!(parse_score(b"abc").is_err());
    }
}
