//! # Debug Events
//!
//! Text rendering of the events the engine raises while the debuggee is
//! suspended.
//!
//! Only break and exception events are rendered; both point the session
//! cursor at the top frame. Everything else renders as
//! `Unknown debug event <code>`.

use mirage_core::mirror::{ExecutionState, FrameMirror, FunctionMirror, Mirror};
use mirage_core::MirrorResult;
use tracing::warn;

use crate::session::SessionState;

/// Engine event codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DebugEventType
{
    Break = 1,
    Exception = 2,
    NewFunction = 3,
    BeforeCompile = 4,
    AfterCompile = 5,
}

impl DebugEventType
{
    #[must_use]
    pub const fn code(self) -> u32
    {
        self as u32
    }

    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self>
    {
        match code {
            1 => Some(Self::Break),
            2 => Some(Self::Exception),
            3 => Some(Self::NewFunction),
            4 => Some(Self::BeforeCompile),
            5 => Some(Self::AfterCompile),
            _ => None,
        }
    }
}

/// A break point that caused a break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPointHit
{
    pub number: u32,
    /// Number of the script break point this one was created from
    pub script_break_point: Option<u32>,
}

impl BreakPointHit
{
    /// Number shown to the user; script break points take precedence.
    #[must_use]
    pub fn display_number(&self) -> u32
    {
        self.script_break_point.unwrap_or(self.number)
    }
}

/// An event raised by the engine
#[derive(Debug, Clone)]
pub enum DebugEvent<'h>
{
    Break
    {
        state: ExecutionState<'h>,
        /// Empty for a plain `debugger` statement or a step
        break_points_hit: Vec<BreakPointHit>,
    },
    Exception
    {
        state: ExecutionState<'h>,
        exception: Mirror<'h>,
        uncaught: bool,
    },
    /// Any other engine event, by code
    Other
    {
        code: u32,
    },
}

impl DebugEvent<'_>
{
    #[must_use]
    pub const fn code(&self) -> u32
    {
        match self {
            Self::Break { .. } => DebugEventType::Break.code(),
            Self::Exception { .. } => DebugEventType::Exception.code(),
            Self::Other { code } => *code,
        }
    }
}

/// Caret line under `position` of `source_text`, appended to the text.
///
/// Tabs in the text before the position are kept so the caret lines up.
/// Returns `None` for empty text.
#[must_use]
pub fn source_underline(source_text: &str, position: usize) -> Option<String>
{
    if source_text.is_empty() {
        return None;
    }
    let mut chars = source_text.chars();
    let underline: String = (0..position)
        .map(|_| if chars.next() == Some('\t') { '\t' } else { ' ' })
        .chain(std::iter::once('^'))
        .collect();
    Some(format!("{source_text}\n{underline}"))
}

fn frame_source_underline(frame: &FrameMirror<'_>) -> MirrorResult<Option<String>>
{
    Ok(frame
        .source_location()?
        .and_then(|location| source_underline(&location.source_text, location.offset_in_line())))
}

/// Render `event`, pointing `state` at its top frame.
///
/// An engine failure while rendering (e.g. the break is already over) is
/// rendered into the text and leaves `state` unchanged.
pub fn event_to_text(event: &DebugEvent<'_>, state: &mut SessionState) -> String
{
    let mut updated = *state;
    match try_event_to_text(event, &mut updated) {
        Ok(text) => {
            *state = updated;
            text
        }
        Err(error) => {
            warn!(%error, code = event.code(), "failed to format event");
            format!("Error: \"{error}\" formatting event")
        }
    }
}

fn try_event_to_text(event: &DebugEvent<'_>, state: &mut SessionState) -> MirrorResult<String>
{
    match event {
        DebugEvent::Break {
            state: execution,
            break_points_hit,
        } => {
            let mut details = match break_points_hit.as_slice() {
                [] => "break".to_string(),
                hits => {
                    let numbers: Vec<String> = hits
                        .iter()
                        .map(|hit| format!("#{}", hit.display_number()))
                        .collect();
                    let plural = if hits.len() > 1 { "s" } else { "" };
                    format!("breakpoint{plural} {}", numbers.join(", "))
                }
            };

            let frame = execution.frame(0)?;
            details.push_str(" in ");
            details.push_str(&frame.invocation_text()?);
            details.push_str(" at ");
            details.push_str(&frame.source_and_position_text()?);
            details.push('\n');
            let has_script = frame
                .func()?
                .as_function()
                .and_then(FunctionMirror::script)
                .is_some();
            if has_script {
                details.push_str(&frame_source_underline(&frame)?.unwrap_or_default());
            }
            state.select(0, frame.source_line()?);
            Ok(details)
        }
        DebugEvent::Exception {
            state: execution,
            exception,
            uncaught,
        } => {
            let mut details = if *uncaught { "Uncaught: " } else { "Exception: " }.to_string();
            details.push('"');
            details.push_str(&exception.to_text()?);
            details.push('"');

            if execution.frame_count()? > 0 {
                let frame = execution.frame(0)?;
                details.push_str(" at ");
                details.push_str(&frame.source_and_position_text()?);
                details.push('\n');
                details.push_str(&frame_source_underline(&frame)?.unwrap_or_default());
                state.select(0, frame.source_line()?);
            } else {
                details.push_str(" (empty stack)");
                state.reset();
            }
            Ok(details)
        }
        DebugEvent::Other { code } => Ok(format!("Unknown debug event {code}")),
    }
}
