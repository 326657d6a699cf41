//! Line-oriented command scripts.
//!
//! One command per line, optionally followed by a repeat count (`move 3`).
//! `place_beepers` takes coordinates instead. `#` starts a comment.

use crate::command::{self, Answer, Command, Query};
use karel_core::{Karel, KarelError, SnapshotRenderer};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Parse failure with the offending (1-based) line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}: `{text}`")]
pub struct ScriptError {
    pub line: usize,
    pub message: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub line: usize,
    pub command: Command,
    pub repeat: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    instructions: Vec<Instruction>,
}

/// Answer recorded for a query line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryRecord {
    pub line: usize,
    pub query: Query,
    pub answer: Answer,
}

/// Command that stopped the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub line: usize,
    pub error: KarelError,
}

/// Outcome of running a script. Execution stops at the first failing command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Commands applied successfully, counting each repetition.
    pub executed: usize,
    pub queries: Vec<QueryRecord>,
    pub failure: Option<Failure>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut instructions = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let body = raw.split('#').next().unwrap_or_default().trim();
            if body.is_empty() {
                continue;
            }
            let error = |message| ScriptError {
                line,
                message,
                text: body.to_string(),
            };
            let body = body.trim_end_matches("()");
            let mut words = body.split_whitespace();
            let Some(word) = words.next() else {
                continue;
            };
            let name = command::lookup(word.trim_end_matches("()"))
                .ok_or_else(|| error("unknown command"))?
                .name;
            let numbers = words
                .map(str::parse::<u32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| error("arguments must be non-negative integers"))?;

            let (args, repeat) = match (name, numbers.as_slice()) {
                ("place_beepers", args) => (args, 1),
                (_, []) => (&[][..], 1),
                (_, [times]) => (&[][..], *times),
                _ => return Err(error("expected at most one repeat count")),
            };
            let command = Command::from_parts(name, args).map_err(error)?;
            instructions.push(Instruction {
                line,
                command,
                repeat,
            });
        }
        debug!(instructions = instructions.len(), "script parsed");
        Ok(Self { instructions })
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Applies every instruction in order, stopping at the first error.
    pub fn run<R: SnapshotRenderer>(&self, karel: &mut Karel<R>) -> RunReport {
        let mut report = RunReport::default();
        for instruction in &self.instructions {
            for _ in 0..instruction.repeat {
                match instruction.command.apply(karel) {
                    Ok(answer) => {
                        report.executed += 1;
                        if let (Command::Query(query), Some(answer)) = (instruction.command, answer)
                        {
                            info!(line = instruction.line, ?query, %answer, "query");
                            report.queries.push(QueryRecord {
                                line: instruction.line,
                                query,
                                answer,
                            });
                        }
                    }
                    Err(error) => {
                        info!(line = instruction.line, %error, "script stopped");
                        report.failure = Some(Failure {
                            line: instruction.line,
                            error,
                        });
                        return report;
                    }
                }
            }
        }
        report
    }
}
