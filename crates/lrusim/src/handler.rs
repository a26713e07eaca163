//! Command handler for cache scripts

use std::fmt;
use std::io::{self, BufRead, Write};

use lrucache::SharedCache;
use tracing::{debug, warn};

use crate::script::{parse_line, Command};

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Outcome of a put
    Bool(bool),
    /// Looked-up value, `None` on a miss
    Value(Option<String>),
    /// Values, most recent first
    List(Vec<String>),
    /// Count
    Integer(usize),
    /// Free-form status line
    Status(String),
    /// Rejected line or failed check
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Bool(b) => write!(f, "{}", b),
            Reply::Value(Some(v)) => f.write_str(v),
            Reply::Value(None) => f.write_str("(nil)"),
            Reply::List(items) => write!(f, "[{}]", items.join(", ")),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Status(s) => f.write_str(s),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

/// Counts from one script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands executed, whatever their reply
    pub commands: usize,
    /// Lines rejected by the parser
    pub errors: usize,
}

/// What one script line turned into
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Blank line or comment
    Skipped,
    /// Parsed and executed
    Executed(Reply),
    /// Not a valid command
    Rejected(Reply),
}

/// Executes commands against one cache
pub struct CommandHandler {
    cache: SharedCache<u64, String>,
}

impl CommandHandler {
    pub fn new(cache: SharedCache<u64, String>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &SharedCache<u64, String> {
        &self.cache
    }

    pub fn handle(&self, cmd: Command) -> Reply {
        match cmd {
            Command::Put { key, value } => Reply::Bool(self.cache.put(key, value)),
            Command::Get(key) => Reply::Value(self.cache.get(&key)),
            Command::Peek(key) => {
                Reply::Value(self.cache.with_lock(|cache| cache.peek(&key).cloned()))
            }
            Command::Dump => Reply::List(self.cache.dump()),
            Command::Len => Reply::Integer(self.cache.len()),
            Command::Stats => Reply::Status(self.cache.stats().snapshot().to_string()),
            Command::Check => match self.cache.check_invariants() {
                Ok(()) => Reply::Status("ok".to_string()),
                Err(e) => Reply::Error(e.to_string()),
            },
        }
    }

    /// Parse and execute one line
    pub fn execute_line(&self, line_no: usize, line: &str) -> LineOutcome {
        match parse_line(line) {
            Ok(Some(cmd)) => {
                debug!(line = line_no, command = %cmd, "executing");
                LineOutcome::Executed(self.handle(cmd))
            }
            Ok(None) => LineOutcome::Skipped,
            Err(e) => {
                warn!(line = line_no, "Parse error: {}", e);
                LineOutcome::Rejected(Reply::Error(format!("line {}: {}", line_no, e)))
            }
        }
    }

    /// Parse and execute one line; `None` for blank lines and comments
    pub fn handle_line(&self, line_no: usize, line: &str) -> Option<Reply> {
        match self.execute_line(line_no, line) {
            LineOutcome::Skipped => None,
            LineOutcome::Executed(reply) | LineOutcome::Rejected(reply) => Some(reply),
        }
    }

    /// Execute a whole script, writing one reply per command
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (i, line) in input.lines().enumerate() {
            let line = line?;
            let reply = match self.execute_line(i + 1, &line) {
                LineOutcome::Skipped => continue,
                LineOutcome::Executed(reply) => {
                    summary.commands += 1;
                    reply
                }
                LineOutcome::Rejected(reply) => {
                    summary.errors += 1;
                    reply
                }
            };
            writeln!(output, "{}", reply)?;
        }

        output.flush()?;
        Ok(summary)
    }
}
