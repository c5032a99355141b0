//! Serial frame reader for the Arduino `JSON_START`/`JSON_END` protocol.
//!
//! The device writes newline-delimited text. A parking update is framed as:
//!
//! ```text
//! JSON_START
//! {"parkingLotId":"...","totalSlots":12,"availableSlots":7}
//! JSON_END
//! ```
//!
//! Payloads may span multiple lines between the markers. Any line outside a
//! frame is device log output and is surfaced to the operator console, not
//! parsed. All framing state lives in one [`FrameReader`] owned by the
//! connection that feeds it, so several devices could be read concurrently
//! with one reader each.

use tracing::warn;

use crate::models::RawParkingUpdate;

/// Start-of-frame marker line.
pub const FRAME_START: &str = "JSON_START";
/// End-of-frame marker line.
pub const FRAME_END: &str = "JSON_END";

// ---

/// What a pushed line produced, if anything.
#[derive(Debug)]
pub enum FrameEvent {
    /// A complete frame parsed into a parking update.
    Record(RawParkingUpdate),
    /// A line outside any frame; device log output for the operator.
    DeviceLog(String),
}

#[derive(Debug)]
enum State {
    Idle,
    Collecting { buffer: String },
}

/// Line-at-a-time frame assembler.
///
/// Two states: `Idle` until a `JSON_START` line arrives, then `Collecting`
/// until the matching `JSON_END`. A second `JSON_START` while collecting
/// resets the buffer, resynchronizing after a missed `JSON_END`. A payload
/// that fails to parse is logged with its raw text and dropped; the reader
/// keeps going. Framing errors are never fatal.
#[derive(Debug)]
pub struct FrameReader {
    state: State,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    // ---
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Feed one line from the serial stream.
    ///
    /// Returns `Some(FrameEvent::Record)` when a frame completes with a
    /// parseable payload, `Some(FrameEvent::DeviceLog)` for out-of-frame
    /// lines, and `None` for marker lines, buffered payload lines, and
    /// dropped malformed frames.
    pub fn push_line(&mut self, line: &str) -> Option<FrameEvent> {
        // ---
        let line = line.trim();

        if line == FRAME_START {
            // Also resyncs if the previous frame's END was lost
            self.state = State::Collecting {
                buffer: String::new(),
            };
            return None;
        }

        if line == FRAME_END {
            let finished = std::mem::replace(&mut self.state, State::Idle);
            return match finished {
                State::Collecting { buffer } if !buffer.is_empty() => {
                    match serde_json::from_str::<RawParkingUpdate>(&buffer) {
                        Ok(update) => Some(FrameEvent::Record(update)),
                        Err(e) => {
                            warn!("Dropping malformed frame payload: {}", e);
                            warn!("  Raw data: {}", buffer);
                            None
                        }
                    }
                }
                // END without a frame in progress, or an empty frame
                _ => None,
            };
        }

        match &mut self.state {
            State::Collecting { buffer } => {
                buffer.push_str(line);
                None
            }
            State::Idle => {
                if line.is_empty() {
                    None
                } else {
                    Some(FrameEvent::DeviceLog(line.to_string()))
                }
            }
        }
    }
}
