//! Walkthrough that prints the recency list after every step

use std::io::Write;

use anyhow::Result;
use lrucache::SharedCache;

use crate::handler::{CommandHandler, Reply};
use crate::script::Command;

fn put(key: u64, value: &str) -> Command {
    Command::Put {
        key,
        value: value.to_string(),
    }
}

/// Fill the cache, touch a few keys, miss once, then force an eviction
pub fn steps() -> Vec<Command> {
    vec![
        put(1, "A"),
        put(2, "B"),
        put(3, "C"),
        put(4, "D"),
        Command::Get(1),
        Command::Get(2),
        Command::Get(4),
        Command::Get(5),
        put(5, "E"),
        Command::Get(3),
    ]
}

pub fn run<W: Write>(capacity: usize, mut out: W) -> Result<()> {
    let handler = CommandHandler::new(SharedCache::new(capacity)?);

    writeln!(out, "{}", handler.handle(Command::Dump))?;
    for step in steps() {
        let shown = step.to_string();
        let reply = handler.handle(step);
        writeln!(out, "{} -> {}", shown, reply)?;
        writeln!(out, "{}", handler.handle(Command::Dump))?;
    }

    if let Reply::Status(stats) = handler.handle(Command::Stats) {
        writeln!(out, "{}", stats)?;
    }
    Ok(())
}
