//! # Event Log
//!
//! The append-only output stream of a run. One line per event:
//!
//! ```text
//! 1: O 1: started
//! 2: H 1: started
//! 3: O 1: going to queue
//! ...
//! 14: O 1: molecule 1 created
//! ```
//!
//! Sequence numbers are assigned under the log's own lock, so they are
//! global, 1-based and strictly increasing no matter how many units append
//! at once. The log never touches the coordinator lock.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

/// The two kinds of worker unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// One per molecule.
    Oxygen,
    /// Two per molecule.
    Hydrogen,
}

impl UnitKind {
    /// Single-letter tag used in the log.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Oxygen => "O",
            Self::Hydrogen => "H",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of one unit: its kind and 1-based index within that kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    /// Oxygen or hydrogen.
    pub kind: UnitKind,
    /// 1-based index within `kind`.
    pub index: u32,
}

impl UnitId {
    /// Creates a unit id.
    #[must_use]
    pub const fn new(kind: UnitKind, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}

/// Something a unit reports to the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The unit entered the system.
    Started,
    /// The unit finished preparing and is about to seek admission.
    GoingToQueue,
    /// Shutdown cascade exit: no further molecule can form.
    NotEnough,
    /// The unit joined the creation party of molecule `n`.
    Creating(u32),
    /// Molecule `n` is complete.
    Created(u32),
}

impl Event {
    /// Renders the message part of a line for a unit of `kind`.
    #[must_use]
    pub fn message(self, kind: UnitKind) -> String {
        match self {
            Self::Started => "started".to_string(),
            Self::GoingToQueue => "going to queue".to_string(),
            Self::NotEnough => match kind {
                UnitKind::Oxygen => "not enough H".to_string(),
                UnitKind::Hydrogen => "not enough O or H".to_string(),
            },
            Self::Creating(n) => format!("creating molecule {n}"),
            Self::Created(n) => format!("molecule {n} created"),
        }
    }

    /// Position of this event in a single unit's timeline.
    ///
    /// `NotEnough` and `Creating` share a rank: a unit logs one or the other.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Started => 0,
            Self::GoingToQueue => 1,
            Self::NotEnough | Self::Creating(_) => 2,
            Self::Created(_) => 3,
        }
    }
}

struct LogInner<W> {
    writer: W,
    next_seq: u64,
    failure: Option<io::Error>,
}

/// Append-only, sequence-numbered event log.
///
/// Writes are flushed line by line. The first write error is kept and all
/// later appends still consume a sequence number, so a failing sink never
/// stalls the protocol; the run reports the failure once every unit is done.
pub struct EventLog<W: Write + Send> {
    inner: Mutex<LogInner<W>>,
}

impl<W: Write + Send> EventLog<W> {
    /// Wraps a writer. The first line gets sequence number 1.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(LogInner {
                writer,
                next_seq: 1,
                failure: None,
            }),
        }
    }

    /// Appends one event line and returns its sequence number.
    pub fn append(&self, unit: UnitId, event: Event) -> u64 {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        if inner.failure.is_none() {
            let line = format!("{seq}: {unit}: {}\n", event.message(unit.kind));
            let writer = &mut inner.writer;
            let result = writer.write_all(line.as_bytes()).and_then(|()| writer.flush());
            if let Err(err) = result {
                tracing::warn!("event log write failed at line {}: {}", seq, err);
                inner.failure = Some(err);
            }
        }
        seq
    }

    /// Number of lines handed out so far.
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.inner.lock().next_seq - 1
    }

    /// Takes the first write error, if any occurred.
    pub fn take_failure(&self) -> Option<io::Error> {
        self.inner.lock().failure.take()
    }
}

/// Cloneable in-memory sink. Every clone writes into the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Returns the written lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One parsed line of the event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Sequence number.
    pub seq: u64,
    /// Unit that logged the line.
    pub unit: UnitId,
    /// What happened.
    pub event: Event,
}

/// Why a log line could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed log line {line:?}")]
pub struct ParseLineError {
    /// The offending line.
    pub line: String,
}

impl FromStr for LogLine {
    type Err = ParseLineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseLineError {
            line: line.to_string(),
        };

        let (seq, rest) = line.split_once(": ").ok_or_else(malformed)?;
        let seq = seq.parse().map_err(|_| malformed())?;
        let (unit, message) = rest.split_once(": ").ok_or_else(malformed)?;

        let (kind, index) = unit.split_once(' ').ok_or_else(malformed)?;
        let kind = match kind {
            "O" => UnitKind::Oxygen,
            "H" => UnitKind::Hydrogen,
            _ => return Err(malformed()),
        };
        let index = index.parse().map_err(|_| malformed())?;

        let event = match message {
            "started" => Event::Started,
            "going to queue" => Event::GoingToQueue,
            "not enough H" if kind == UnitKind::Oxygen => Event::NotEnough,
            "not enough O or H" if kind == UnitKind::Hydrogen => Event::NotEnough,
            _ => {
                if let Some(n) = message.strip_prefix("creating molecule ") {
                    Event::Creating(n.parse().map_err(|_| malformed())?)
                } else if let Some(n) = message
                    .strip_prefix("molecule ")
                    .and_then(|m| m.strip_suffix(" created"))
                {
                    Event::Created(n.parse().map_err(|_| malformed())?)
                } else {
                    return Err(malformed());
                }
            }
        };

        Ok(Self {
            seq,
            unit: UnitId::new(kind, index),
            event,
        })
    }
}
