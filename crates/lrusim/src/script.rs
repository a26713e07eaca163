//! Command script parser using nom
//!
//! Script format, one command per line (keywords are case-insensitive):
//! ```text
//! # comment
//! put <key> <value...>
//! get <key>
//! peek <key>
//! dump
//! len
//! stats
//! check
//! ```
//!
//! Keys are unsigned 64-bit integers. A value is the rest of the line.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, not_line_ending, space0, space1},
    combinator::{all_consuming, map, map_res, value, verify},
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// Keywords accepted at the start of a line
const KEYWORDS: [&str; 7] = ["put", "get", "peek", "dump", "len", "stats", "check"];

/// One parsed script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert unless present
    Put {
        /// Cache key
        key: u64,
        /// Stored value
        value: String,
    },
    /// Lookup that refreshes recency
    Get(u64),
    /// Lookup that leaves recency alone
    Peek(u64),
    /// Print values, most recent first
    Dump,
    /// Print entry count
    Len,
    /// Print hit/miss counters
    Stats,
    /// Verify index and list consistency
    Check,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Put { key, value } => write!(f, "put {} {}", key, value),
            Command::Get(key) => write!(f, "get {}", key),
            Command::Peek(key) => write!(f, "peek {}", key),
            Command::Dump => f.write_str("dump"),
            Command::Len => f.write_str("len"),
            Command::Stats => f.write_str("stats"),
            Command::Check => f.write_str("check"),
        }
    }
}

/// Line that is not a valid command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// First word is not a keyword
    UnknownCommand(String),
    /// Keyword with missing or malformed arguments
    WrongArguments(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownCommand(word) => write!(f, "unknown command '{}'", word),
            ScriptError::WrongArguments(cmd) => {
                write!(f, "wrong arguments for '{}' command", cmd)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

fn key(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse)(input)
}

fn keyed<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, u64> {
    preceded(tuple((tag_no_case(name), space1)), key)
}

fn put(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            tag_no_case("put"),
            space1,
            key,
            space1,
            verify(not_line_ending, |text: &str| !text.is_empty()),
        )),
        |(_, _, key, _, text)| Command::Put {
            key,
            value: text.to_string(),
        },
    )(input)
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        put,
        map(keyed("get"), Command::Get),
        map(keyed("peek"), Command::Peek),
        value(Command::Dump, tag_no_case("dump")),
        value(Command::Len, tag_no_case("len")),
        value(Command::Stats, tag_no_case("stats")),
        value(Command::Check, tag_no_case("check")),
    ))(input)
}

/// Parse one script line
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    match all_consuming(terminated(command, space0))(line) {
        Ok((_, cmd)) => Ok(Some(cmd)),
        Err(_) => {
            let word = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if KEYWORDS.contains(&word.as_str()) {
                Err(ScriptError::WrongArguments(word))
            } else {
                Err(ScriptError::UnknownCommand(word))
            }
        }
    }
}
