//! Process script interpreter.
//!
//! A script has one line per process:
//!
//! ```text
//! p0: s1 r1 l r1
//! p1: s0 s2 r0 l s2 s0 l r2
//! p2: l s1 r1 r1
//! ```
//!
//! `l` is a local event, `s<N>` sends to process `N` and `r<N>` receives from
//! process `N`. Lines that do not start with `p<digits>: ` are skipped, so a
//! bare `p3:` is not a process while `p3: ` is an idle one. Process
//! ids follow line order; the declared `p<N>` index is not checked against it.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::abstractions::process::Operation;
use crate::abstractions::ProcessId;
use crate::error::ScriptError;

fn process_line() -> &'static Regex {
    static PROCESS_LINE: OnceLock<Regex> = OnceLock::new();
    PROCESS_LINE.get_or_init(|| Regex::new(r"^\s*p\d+: (.*)$").expect("valid process line pattern"))
}

/// Per-process operation lists, indexed by process id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    processes: Vec<Vec<Operation>>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let lines: Vec<(usize, &str, &str)> = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.trim_end_matches('\r');
                let captures = process_line().captures(line)?;
                let ops = captures.get(1).map_or("", |ops| ops.as_str());
                Some((index + 1, line.trim(), ops))
            })
            .collect();

        if lines.is_empty() {
            return Err(ScriptError::NoProcesses);
        }

        let process_count = lines.len();
        let processes = lines
            .into_iter()
            .map(|(line_number, line, ops)| {
                ops.split_whitespace()
                    .map(|op| parse_operation(op, process_count, line_number, line))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { processes })
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn operations(&self, id: ProcessId) -> Option<&[Operation]> {
        self.processes.get(id).map(Vec::as_slice)
    }

    pub fn processes(&self) -> &[Vec<Operation>] {
        &self.processes
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_operation(
    op: &str,
    process_count: usize,
    line_number: usize,
    line: &str,
) -> Result<Operation, ScriptError> {
    let unknown = || ScriptError::UnknownOperation {
        op: op.to_owned(),
        line_number,
        line: line.to_owned(),
    };

    let (build, digits): (fn(ProcessId) -> Operation, &str) = if op == "l" {
        return Ok(Operation::Local);
    } else if let Some(digits) = op.strip_prefix('s') {
        (Operation::Send, digits)
    } else if let Some(digits) = op.strip_prefix('r') {
        (Operation::Receive, digits)
    } else {
        return Err(unknown());
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unknown());
    }

    match digits.parse::<ProcessId>() {
        Ok(id) if id < process_count => Ok(build(id)),
        _ => Err(ScriptError::ProcessOutOfRange {
            op: op.to_owned(),
            line_number,
            line: line.to_owned(),
            process_count,
        }),
    }
}
