//! Decoding of newline-delimited streaming responses.
//!
//! Decoding is split from I/O: [`decode_line`] turns one line into events,
//! [`StreamEvents`] pulls events out of any line iterator, and
//! [`StreamAccumulator`] folds events into the final text and counters. The HTTP
//! client feeds network lines into the same accumulator that tests feed with
//! canned lines.

use super::dto::StreamChunk;
use saga_error::{GenerationError, GenerationErrorKind};
use std::collections::VecDeque;

/// One decoded event of a streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment to append
    Fragment(String),
    /// Final object with the call's counters
    Done {
        /// Generated units
        eval_count: u64,
        /// Prompt units
        prompt_eval_count: u64,
    },
    /// The endpoint reported an error in-band
    Failed(String),
    /// A line that could not be decoded; skipped
    Malformed(String),
}

/// Decode one line into zero, one or two events.
///
/// Blank lines yield nothing. A line carrying both a fragment and `done` yields
/// the fragment first.
///
/// # Examples
///
/// ```
/// use saga_models::{StreamEvent, decode_line};
///
/// let events = decode_line(r#"{"response":"Once","done":false}"#);
/// assert_eq!(events, vec![StreamEvent::Fragment("Once".to_string())]);
///
/// let events = decode_line("not json");
/// assert!(matches!(events[0], StreamEvent::Malformed(_)));
/// ```
pub fn decode_line(line: &str) -> Vec<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    let chunk: StreamChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(error = %e, line_length = line.len(), "Skipping malformed stream line");
            return vec![StreamEvent::Malformed(line.to_string())];
        }
    };

    if let Some(error) = chunk.error {
        return vec![StreamEvent::Failed(error)];
    }

    let mut events = Vec::with_capacity(2);
    if let Some(fragment) = chunk.response.filter(|f| !f.is_empty()) {
        events.push(StreamEvent::Fragment(fragment));
    }
    if chunk.done {
        events.push(StreamEvent::Done {
            eval_count: chunk.eval_count.unwrap_or_default(),
            prompt_eval_count: chunk.prompt_eval_count.unwrap_or_default(),
        });
    }
    events
}

/// Pull iterator of events over a sequence of lines.
///
/// # Examples
///
/// ```
/// use saga_models::{StreamEvent, StreamEvents};
///
/// let lines = [
///     r#"{"response":"A","done":false}"#,
///     r#"{"response":"B","done":true,"eval_count":2,"prompt_eval_count":5}"#,
/// ];
/// let events: Vec<_> = StreamEvents::new(lines.iter().copied()).collect();
/// assert_eq!(events.len(), 3);
/// assert!(matches!(events[2], StreamEvent::Done { eval_count: 2, .. }));
/// ```
#[derive(Debug)]
pub struct StreamEvents<I> {
    lines: I,
    pending: VecDeque<StreamEvent>,
}

impl<I> StreamEvents<I> {
    /// Wrap a line iterator.
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            pending: VecDeque::new(),
        }
    }
}

impl<I, S> Iterator for StreamEvents<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let line = self.lines.next()?;
            self.pending.extend(decode_line(line.as_ref()));
        }
    }
}

/// Folds stream events into the final text and counters.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    fragments: usize,
    decoded_lines: usize,
    malformed_lines: usize,
    counters: Option<(u64, u64)>,
}

impl StreamAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line and apply its events.
    ///
    /// Returns `true` once the final object has been seen.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint reported a failure in-band.
    pub fn push_line(&mut self, line: &str) -> Result<bool, GenerationError> {
        let events = decode_line(line);
        if events.is_empty() {
            return Ok(self.is_done());
        }
        if !events.iter().any(|e| matches!(e, StreamEvent::Malformed(_))) {
            self.decoded_lines += 1;
        }
        for event in events {
            self.apply(event)?;
        }
        Ok(self.is_done())
    }

    /// Apply a single event.
    ///
    /// # Errors
    ///
    /// Returns an error for [`StreamEvent::Failed`].
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), GenerationError> {
        match event {
            StreamEvent::Fragment(fragment) => {
                self.fragments += 1;
                self.text.push_str(&fragment);
            }
            StreamEvent::Done {
                eval_count,
                prompt_eval_count,
            } => {
                self.counters = Some((eval_count, prompt_eval_count));
            }
            StreamEvent::Failed(message) => {
                return Err(GenerationError::new(GenerationErrorKind::Transport(format!(
                    "endpoint reported: {message}"
                ))));
            }
            StreamEvent::Malformed(_) => {
                self.malformed_lines += 1;
            }
        }
        Ok(())
    }

    /// Whether the final object has been seen.
    pub fn is_done(&self) -> bool {
        self.counters.is_some()
    }

    /// Fragments received so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Characters accumulated so far.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Lines skipped because they could not be decoded.
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Consume the accumulator, yielding `(text, eval_count, prompt_eval_count)`.
    ///
    /// A stream that ends without its final object keeps the text and reports
    /// zero counters.
    ///
    /// # Errors
    ///
    /// Returns `EmptyGeneration` if no line ever decoded successfully.
    pub fn finish(self) -> Result<(String, u64, u64), GenerationError> {
        if self.decoded_lines == 0 {
            return Err(GenerationError::new(GenerationErrorKind::EmptyGeneration(
                format!(
                    "none of {} stream lines could be decoded",
                    self.malformed_lines
                ),
            )));
        }
        let (eval_count, prompt_eval_count) = self.counters.unwrap_or_else(|| {
            tracing::warn!(
                fragments = self.fragments,
                "Stream ended without a final object; counters unavailable"
            );
            (0, 0)
        });
        Ok((self.text, eval_count, prompt_eval_count))
    }
}
