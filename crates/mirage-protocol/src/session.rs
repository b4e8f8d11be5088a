//! # Session State
//!
//! The navigation cursor shared by the command parser and the response
//! formatter.
//!
//! [`SessionState`] holds the selected frame and the current source line. It
//! is written only by `frame` responses and by break/exception events, and is
//! read by `source` (to pick a default window) and by the source listing (to
//! mark the current line). [`Session`] bundles that state with the request
//! sequence counter for callers that drive a whole conversation.

use tracing::{debug, info};

use crate::command::{translate, Translation};
use crate::error::CommandResult;
use crate::event::{event_to_text, DebugEvent};
use crate::response::{format_response, ResponseDetails};

/// Current frame and source line of one debugging session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState
{
    /// `None` means no frame is selected
    pub current_frame: Option<usize>,
    /// Zero-based line of the selected frame, `None` when unknown
    pub current_source_line: Option<u32>,
}

impl SessionState
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Point the cursor at `frame`, stopped on `line`.
    pub fn select(&mut self, frame: usize, line: Option<u32>)
    {
        self.current_frame = Some(frame);
        self.current_source_line = line;
    }

    /// Forget the selected frame (e.g. after an exception with an empty stack).
    pub fn reset(&mut self)
    {
        *self = Self::default();
    }
}

/// One logical debugging session: state plus request numbering
#[derive(Debug, Clone, Default)]
pub struct Session
{
    state: SessionState,
    next_seq: u64,
    number_requests: bool,
}

impl Session
{
    /// A session whose requests all carry sequence number 0.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Number requests consecutively, starting at `first`.
    #[must_use]
    pub const fn numbered_from(first: u64) -> Self
    {
        Self {
            state: SessionState {
                current_frame: None,
                current_source_line: None,
            },
            next_seq: first,
            number_requests: true,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState
    {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState
    {
        &mut self.state
    }

    /// Translate one line of user input.
    ///
    /// ## Errors
    ///
    /// Any [`CommandError`](crate::CommandError); the sequence counter only
    /// advances when a request is produced.
    pub fn translate(&mut self, line: &str) -> CommandResult<Translation>
    {
        let seq = if self.number_requests { self.next_seq } else { 0 };
        let translation = translate(line, &self.state, seq)?;
        if self.number_requests && matches!(translation, Translation::Request(_)) {
            self.next_seq += 1;
        }
        Ok(translation)
    }

    /// Render a JSON response, updating the cursor on `frame` responses.
    pub fn render_response(&mut self, json: &str) -> ResponseDetails
    {
        let details = format_response(json, &mut self.state);
        debug!(running = details.running, "rendered response");
        details
    }

    /// Render a debug event, updating the cursor on break and exception events.
    pub fn render_event(&mut self, event: &DebugEvent<'_>) -> String
    {
        let text = event_to_text(event, &mut self.state);
        info!(state = ?self.state, "debug event");
        text
    }
}
