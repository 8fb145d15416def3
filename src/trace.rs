//! Plain-text access traces for driving a [`TagStore`].
//!
//! One op per line, fields separated by whitespace, `#` starts a comment:
//!
//! ```text
//! install <line> <tag> <secure> <requester> <task> <tick>
//! fill    <line> <tag> <secure> <requester> <task> <tick>
//! read    <line> <offset> <len>
//! write   <line> <offset> <len>
//! reset | invalidate | evict | valid | writable | dirty | print  <line>
//! ```
//!
//! Numbers are decimal or `0x` hex; `secure` is `0` or `1`.

use crate::blk::{Addr, CacheBlk, Tick};
use crate::error::TraceError;
use crate::tags::TagStore;
use crate::touch::Direction;

use std::convert::TryFrom;
use std::io::{BufRead, Write};
use std::str::SplitWhitespace;

use tracing::{info, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Install {
    pub tag: Addr,
    pub is_secure: bool,
    pub src_requester_id: i32,
    pub task_id: u32,
    pub tick: Tick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOp {
    Install { line: usize, install: Install },
    Fill { line: usize, install: Install },
    Access { line: usize, direction: Direction, offset: u32, length: u32 },
    Reset { line: usize },
    Invalidate { line: usize },
    Evict { line: usize },
    SetValid { line: usize },
    SetWritable { line: usize },
    SetDirty { line: usize },
    Print { line: usize },
}

impl TraceOp {
    /// Index of the cache line the op targets.
    pub fn line(&self) -> usize {
        match *self {
            TraceOp::Install { line, .. }
            | TraceOp::Fill { line, .. }
            | TraceOp::Access { line, .. }
            | TraceOp::Reset { line }
            | TraceOp::Invalidate { line }
            | TraceOp::Evict { line }
            | TraceOp::SetValid { line }
            | TraceOp::SetWritable { line }
            | TraceOp::SetDirty { line }
            | TraceOp::Print { line } => line,
        }
    }
}

struct Fields<'a> {
    line: usize,
    parts: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn next(&mut self, field: &'static str) -> Result<&'a str, TraceError> {
        self.parts.next().ok_or(TraceError::MissingField { line: self.line, field })
    }

    fn bad(&self, field: &'static str, value: &str) -> TraceError {
        TraceError::BadValue { line: self.line, field, value: value.to_string() }
    }

    fn number<T: TryFrom<u64>>(&mut self, field: &'static str) -> Result<T, TraceError> {
        let text = self.next(field)?;
        parse_u64(text)
            .and_then(|n| T::try_from(n).ok())
            .ok_or_else(|| self.bad(field, text))
    }

    // requester ids may be negative (-1 is "no requester")
    fn signed(&mut self, field: &'static str) -> Result<i32, TraceError> {
        let text = self.next(field)?;
        let value = match text.strip_prefix('-') {
            Some(magnitude) => parse_u64(magnitude).and_then(|n| i64::try_from(n).ok()).map(|n| -n),
            None => parse_u64(text).and_then(|n| i64::try_from(n).ok()),
        };
        value
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| self.bad(field, text))
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, TraceError> {
        let text = self.next(field)?;
        match text {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(self.bad(field, text)),
        }
    }

    fn install(&mut self) -> Result<Install, TraceError> {
        Ok(Install {
            tag: self.number("tag")?,
            is_secure: self.flag("secure")?,
            src_requester_id: self.signed("requester")?,
            task_id: self.number("task")?,
            tick: Tick(self.number("tick")?),
        })
    }

    fn finish(mut self) -> Result<(), TraceError> {
        match self.parts.next() {
            Some(rest) => Err(TraceError::TrailingInput { line: self.line, rest: rest.to_string() }),
            None => Ok(()),
        }
    }
}

fn parse_u64(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

/// Parses one trace line. Blank and comment-only lines give `Ok(None)`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<TraceOp>, TraceError> {
    let text = match text.find('#') {
        Some(i) => &text[..i],
        None => text,
    };
    let mut fields = Fields { line, parts: text.split_whitespace() };
    let op = match fields.parts.next() {
        Some(op) => op,
        None => return Ok(None),
    };
    let index: usize = fields.number("line")?;

    let op = match op {
        "install" => TraceOp::Install { line: index, install: fields.install()? },
        "fill" => TraceOp::Fill { line: index, install: fields.install()? },
        "read" | "write" => TraceOp::Access {
            line: index,
            direction: if op == "read" { Direction::Read } else { Direction::Write },
            offset: fields.number("offset")?,
            length: fields.number("len")?,
        },
        "reset" => TraceOp::Reset { line: index },
        "invalidate" => TraceOp::Invalidate { line: index },
        "evict" => TraceOp::Evict { line: index },
        "valid" => TraceOp::SetValid { line: index },
        "writable" => TraceOp::SetWritable { line: index },
        "dirty" => TraceOp::SetDirty { line: index },
        "print" => TraceOp::Print { line: index },
        _ => return Err(TraceError::UnknownOp { line, op: op.to_string() }),
    };
    fields.finish()?;
    Ok(Some(op))
}

/// Applies every op in `input` to `store`, writing `print` output to `out`.
/// Returns the number of ops applied.
pub fn replay<R: BufRead, W: Write>(store: &mut TagStore, input: R, out: &mut W) -> Result<usize, TraceError> {
    let mut applied = 0;
    for (i, text) in input.lines().enumerate() {
        let line = i + 1;
        let op = match parse_line(line, &text?)? {
            Some(op) => op,
            None => continue,
        };
        trace!(line, ?op, "applying");
        apply(store, op, out).map_err(|e| match e {
            ApplyError::OutOfRange => TraceError::LineOutOfRange { line, index: op.line(), lines: store.len() },
            ApplyError::Io(e) => TraceError::Io(e),
        })?;
        applied += 1;
    }
    info!(applied, lines = store.len(), "trace replayed");
    Ok(applied)
}

enum ApplyError {
    OutOfRange,
    Io(std::io::Error),
}

fn apply<W: Write>(store: &mut TagStore, op: TraceOp, out: &mut W) -> Result<(), ApplyError> {
    let index = op.line();
    match op {
        TraceOp::Install { install: i, .. } => {
            blk_mut(store, index)?.install(i.tag, i.is_secure, i.src_requester_id, i.task_id, i.tick);
        },
        TraceOp::Fill { install: i, .. } => {
            store
                .fill(index, i.tag, i.is_secure, i.src_requester_id, i.task_id, i.tick)
                .ok_or(ApplyError::OutOfRange)?;
        },
        TraceOp::Access { direction, offset, length, .. } => {
            store.access(index, direction, offset, length).ok_or(ApplyError::OutOfRange)?;
        },
        TraceOp::Reset { .. } => blk_mut(store, index)?.reset(),
        TraceOp::Invalidate { .. } => blk_mut(store, index)?.invalidate(),
        TraceOp::Evict { .. } => {
            store.evict(index).ok_or(ApplyError::OutOfRange)?;
        },
        TraceOp::SetValid { .. } => {
            let blk = blk_mut(store, index)?;
            blk.set_valid();
            blk.set_readable();
        },
        TraceOp::SetWritable { .. } => blk_mut(store, index)?.set_writable(),
        TraceOp::SetDirty { .. } => blk_mut(store, index)?.set_dirty(),
        TraceOp::Print { .. } => {
            let blk = store.blk(index).ok_or(ApplyError::OutOfRange)?;
            let prefix = format!("{:>3}: ", index);
            writeln!(out, "{}", blk.print(&prefix)).map_err(ApplyError::Io)?;
        },
    }
    Ok(())
}

fn blk_mut(store: &mut TagStore, index: usize) -> Result<&mut CacheBlk, ApplyError> {
    store.blk_mut(index).ok_or(ApplyError::OutOfRange)
}
