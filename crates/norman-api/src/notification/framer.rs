// Brace-depth framer for the notification stream
//
// The hub writes concatenated JSON objects into one long-lived response
// body with no delimiters. Objects are recovered by counting braces;
// text between objects is dropped.

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::{NOTIFICATION_MARKER, Notification};

/// Objects larger than this are abandoned and the framer resynchronizes.
const MAX_OBJECT_BYTES: usize = 1 << 20;

/// Reassembles complete top-level JSON objects from arbitrary byte chunks.
///
/// Feed it chunks in arrival order with [`feed`](Self::feed). Object
/// boundaries may fall anywhere, including inside a multi-byte UTF-8
/// sequence: an incomplete trailing sequence is carried over to the next
/// chunk, and bytes that can never decode are discarded.
///
/// Only objects carrying the `PeripheralList` key are returned; the hub's
/// connection acknowledgements and unparseable objects are dropped.
#[derive(Debug, Default)]
pub struct StreamFramer {
    buffer: String,
    depth: usize,
    in_string: bool,
    escaped: bool,
    carry: Vec<u8>,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all partial state. Called at the start of every session.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        self.carry.clear();
    }

    /// `true` when no partial object is buffered.
    pub fn is_idle(&self) -> bool {
        self.depth == 0 && self.buffer.is_empty()
    }

    /// Consume one chunk and return every notification it completes,
    /// in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Notification> {
        let text = self.decode(chunk);
        let mut complete = Vec::new();

        for ch in text.chars() {
            if self.depth == 0 {
                if ch == '{' {
                    self.depth = 1;
                    self.buffer.push(ch);
                }
                continue;
            }

            self.buffer.push(ch);

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
            } else {
                match ch {
                    '"' => self.in_string = true,
                    '{' => self.depth += 1,
                    '}' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            complete.extend(self.take_object());
                        }
                    }
                    _ => {}
                }
            }

            if self.buffer.len() > MAX_OBJECT_BYTES {
                warn!(
                    bytes = self.buffer.len(),
                    "notification object exceeds size limit, resynchronizing"
                );
                self.buffer.clear();
                self.depth = 0;
                self.in_string = false;
                self.escaped = false;
            }
        }

        complete
    }

    /// Parse the buffered object and clear the buffer either way.
    fn take_object(&mut self) -> Option<Notification> {
        let raw = std::mem::take(&mut self.buffer);

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) if map.contains_key(NOTIFICATION_MARKER) => {
                Some(Notification::from_map(map))
            }
            Ok(_) => {
                trace!(raw, "skipping acknowledgement object");
                None
            }
            Err(e) => {
                debug!(error = %e, raw, "failed to parse notification JSON");
                None
            }
        }
    }

    /// Best-effort UTF-8 decoding with carry-over of a split trailing
    /// sequence. Invalid bytes are dropped.
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            trace!(len, "dropping undecodable bytes");
                            rest = after.get(len..).unwrap_or_default();
                        }
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        text
    }
}
