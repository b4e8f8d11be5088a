//! # Response Formatting
//!
//! Renders JSON protocol responses as user-facing text.
//!
//! Responses are parsed with `serde_json` into a loose envelope first, then
//! the body is decoded into the shape its `command` tag calls for. Any
//! failure along the way (malformed JSON, missing body, missing field) is
//! rendered into the text instead of being returned:
//!
//! ```text
//! Error: "missing field `breakpoint`" formatting response
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mirage_protocol::response::format_response;
//! use mirage_protocol::SessionState;
//!
//! let mut state = SessionState::default();
//! let details = format_response(
//!     r#"{"success":true,"running":false,"command":"setbreakpoint","body":{"breakpoint":7}}"#,
//!     &mut state,
//! );
//! assert_eq!(details.text, "set breakpoint #7");
//! assert!(!details.running);
//! ```

use std::fmt::Write as _;

use mirage_core::script::ScriptType;
use mirage_core::text::{char_length, truncate_chars};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FormatError;
use crate::event::source_underline;
use crate::session::SessionState;

const MIN_LINE_NUMBER_DIGITS: usize = 3;
const SCRIPT_SOURCE_START_LIMIT: usize = 40;
const SCRIPT_SOURCE_START_CUT: usize = 37;

/// Rendered response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDetails
{
    pub text: String,
    /// The debuggee resumed execution
    pub running: bool,
}

#[derive(Debug, Deserialize)]
struct ResponsePacket
{
    success: bool,
    #[serde(default)]
    running: bool,
    #[serde(default)]
    command: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BreakpointBody
{
    breakpoint: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BacktraceBody
{
    from_frame: i64,
    to_frame: i64,
    total_frames: i64,
    #[serde(default)]
    frames: Vec<FrameText>,
}

#[derive(Debug, Deserialize)]
struct FrameText
{
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameBody
{
    index: usize,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<usize>,
    #[serde(default)]
    source_line_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvaluateBody
{
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceBody
{
    source: String,
    from_line: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptEntry
{
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source_start: String,
    source_lines: u64,
    source_length: u64,
    #[serde(rename = "type")]
    script_type: u32,
}

/// Render one JSON response.
///
/// A failed response renders as its `message` and leaves `state` alone. A
/// `frame` response moves the cursor in `state`.
pub fn format_response(json: &str, state: &mut SessionState) -> ResponseDetails
{
    match try_format_response(json, state) {
        Ok(details) => details,
        Err(error) => {
            warn!(%error, "failed to format response");
            ResponseDetails {
                text: format!("Error: \"{error}\" formatting response"),
                running: false,
            }
        }
    }
}

fn try_format_response(json: &str, state: &mut SessionState) -> Result<ResponseDetails, FormatError>
{
    let response: ResponsePacket = serde_json::from_str(json)?;
    debug!(command = %response.command, success = response.success, "formatting response");

    if !response.success {
        return Ok(ResponseDetails {
            text: response.message.unwrap_or_default(),
            running: false,
        });
    }

    let text = match response.command.as_str() {
        "setbreakpoint" => {
            let body: BreakpointBody = body_of(&response)?;
            format!("set breakpoint #{}", body.breakpoint)
        }
        "clearbreakpoint" => {
            let body: BreakpointBody = body_of(&response)?;
            format!("cleared breakpoint #{}", body.breakpoint)
        }
        "backtrace" => backtrace_text(&body_of(&response)?),
        "frame" => {
            let body: FrameBody = body_of(&response)?;
            state.select(body.index, body.line);
            body.source_line_text
                .zip(body.column)
                .and_then(|(line, column)| source_underline(&line, column))
                .unwrap_or_default()
        }
        "evaluate" => body_of::<EvaluateBody>(&response)?.text,
        "source" => source_listing(&body_of(&response)?, state),
        "scripts" => scripts_listing(&body_of::<Vec<ScriptEntry>>(&response)?),
        other => format!("Response for unknown command '{other}'"),
    };

    Ok(ResponseDetails {
        text,
        running: response.running,
    })
}

fn body_of<T: DeserializeOwned>(response: &ResponsePacket) -> Result<T, FormatError>
{
    let body = response
        .body
        .clone()
        .ok_or_else(|| FormatError::MissingBody(response.command.clone()))?;
    Ok(serde_json::from_value(body)?)
}

fn backtrace_text(body: &BacktraceBody) -> String
{
    if body.total_frames == 0 {
        return "(empty stack)".to_string();
    }
    let frames: Vec<&str> = body.frames.iter().map(|frame| frame.text.as_str()).collect();
    format!(
        "Frames #{} to #{} of {}\n{}",
        body.from_frame,
        body.to_frame - 1,
        body.total_frames,
        frames.join("\n")
    )
}

fn digits(value: usize) -> usize
{
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Line-numbered listing; the current line gets a `>>>` marker.
fn source_listing(body: &SourceBody, state: &SessionState) -> String
{
    let from_line = body.from_line as usize + 1;
    let mut lines: Vec<&str> = body.source.split('\n').collect();
    let width = digits(from_line + lines.len()).max(MIN_LINE_NUMBER_DIGITS);

    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let current = state.current_source_line.map(|line| line as usize + 1);
    let mut listing = String::new();
    for (offset, line) in lines.iter().enumerate() {
        let number = from_line + offset;
        if current == Some(number) {
            listing.push_str(&">".repeat(width));
            listing.push_str("  ");
        } else {
            let _ = write!(listing, "{number:>width$}: ");
        }
        listing.push_str(line);
        listing.push('\n');
    }
    listing
}

fn scripts_listing(scripts: &[ScriptEntry]) -> String
{
    let lines: Vec<String> = scripts
        .iter()
        .map(|script| {
            let mut line = match script.name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    let start = if char_length(&script.source_start) > SCRIPT_SOURCE_START_LIMIT {
                        format!("{}...", truncate_chars(&script.source_start, SCRIPT_SOURCE_START_CUT))
                    } else {
                        script.source_start.clone()
                    };
                    format!("[unnamed] {start}")
                }
            };
            let _ = write!(
                line,
                " (lines: {}, length: {}",
                script.source_lines, script.source_length
            );
            match ScriptType::from_code(script.script_type) {
                Some(ScriptType::Native) => line.push_str(", native"),
                Some(ScriptType::Extension) => line.push_str(", extension"),
                _ => {}
            }
            line.push(')');
            line
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn render(json: &str) -> ResponseDetails
    {
        format_response(json, &mut SessionState::default())
    }

    #[test]
    fn test_breakpoint_responses()
    {
        let set = render(r#"{"success":true,"running":false,"command":"setbreakpoint","body":{"breakpoint":7}}"#);
        assert_eq!(set.text, "set breakpoint #7");
        assert!(!set.running);

        let cleared =
            render(r#"{"success":true,"running":true,"command":"clearbreakpoint","body":{"breakpoint":3}}"#);
        assert_eq!(cleared.text, "cleared breakpoint #3");
        assert!(cleared.running);
    }

    #[test]
    fn test_failed_response_shows_message()
    {
        let mut state = SessionState::default();
        state.select(4, Some(9));
        let details = format_response(
            r#"{"success":false,"running":true,"command":"frame","message":"No frames"}"#,
            &mut state,
        );
        assert_eq!(details.text, "No frames");
        assert!(!details.running);
        assert_eq!(state.current_frame, Some(4));
    }

    #[test]
    fn test_backtrace()
    {
        let details = render(
            r##"{"success":true,"running":false,"command":"backtrace","body":{"fromFrame":0,"toFrame":2,"totalFrames":5,"frames":[{"text":"#00 f()"},{"text":"#01 g()"}]}}"##,
        );
        assert_eq!(details.text, "Frames #0 to #1 of 5\n#00 f()\n#01 g()");

        let empty = render(
            r#"{"success":true,"running":false,"command":"backtrace","body":{"fromFrame":0,"toFrame":0,"totalFrames":0}}"#,
        );
        assert_eq!(empty.text, "(empty stack)");
    }

    #[test]
    fn test_frame_underlines_and_selects()
    {
        let mut state = SessionState::default();
        let details = format_response(
            r#"{"success":true,"running":false,"command":"frame","body":{"index":2,"line":11,"column":3,"sourceLineText":"\tx = 1;"}}"#,
            &mut state,
        );
        assert_eq!(details.text, "\tx = 1;\n\t  ^");
        assert_eq!(state.current_frame, Some(2));
        assert_eq!(state.current_source_line, Some(11));
    }

    #[test]
    fn test_frame_without_source_text()
    {
        let mut state = SessionState::default();
        let details = format_response(
            r#"{"success":true,"running":false,"command":"frame","body":{"index":0,"line":3,"column":0}}"#,
            &mut state,
        );
        assert_eq!(details.text, "");
        assert_eq!(state.current_source_line, Some(3));
    }

    #[test]
    fn test_frame_without_location_still_selects()
    {
        let mut state = SessionState {
            current_frame: Some(0),
            current_source_line: Some(8),
        };
        let details = format_response(
            r##"{"success":true,"running":false,"command":"frame","body":{"type":"frame","index":1,"receiver":{"ref":1},"func":{"ref":2},"text":"#01 native_fn()"}}"##,
            &mut state,
        );
        assert_eq!(details.text, "");
        assert_eq!(state.current_frame, Some(1));
        assert_eq!(state.current_source_line, None);
    }

    #[test]
    fn test_evaluate()
    {
        let details =
            render(r#"{"success":true,"running":false,"command":"evaluate","body":{"type":"number","value":3,"text":"3"}}"#);
        assert_eq!(details.text, "3");
    }

    #[test]
    fn test_source_listing_marks_current_line()
    {
        let mut state = SessionState::default();
        state.select(0, Some(1));
        let details = format_response(
            r#"{"success":true,"running":false,"command":"source","body":{"source":"a\nb\nc\n","fromLine":0,"toLine":3}}"#,
            &mut state,
        );
        assert_eq!(details.text, "  1: a\n>>>  b\n  3: c\n");
    }

    #[test]
    fn test_source_listing_widens_numbers()
    {
        let source: Vec<String> = (0..3).map(|i| format!("l{i}")).collect();
        let json = format!(
            r#"{{"success":true,"running":false,"command":"source","body":{{"source":"{}","fromLine":998}}}}"#,
            source.join("\\n")
        );
        assert_eq!(render(&json).text, " 999: l0\n1000: l1\n1001: l2\n");
    }

    #[test]
    fn test_scripts_listing()
    {
        let details = render(
            r#"{"success":true,"running":false,"command":"scripts","body":[
                {"name":"app.js","sourceStart":"var a","sourceLines":12,"sourceLength":340,"type":2},
                {"name":"natives.js","sourceStart":"","sourceLines":3,"sourceLength":40,"type":0},
                {"sourceStart":"function veryLongFunctionName(withArguments) {","sourceLines":1,"sourceLength":48,"type":1},
                {"name":"","sourceStart":"1+1","sourceLines":1,"sourceLength":3,"type":2}
            ]}"#,
        );
        assert_eq!(
            details.text,
            "app.js (lines: 12, length: 340)\n\
             natives.js (lines: 3, length: 40, native)\n\
             [unnamed] function veryLongFunctionName(withArg... (lines: 1, length: 48, extension)\n\
             [unnamed] 1+1 (lines: 1, length: 3)"
        );
    }

    #[test]
    fn test_unknown_command()
    {
        let details = render(r#"{"success":true,"running":false,"command":"version","body":{}}"#);
        assert_eq!(details.text, "Response for unknown command 'version'");
    }

    #[test]
    fn test_malformed_responses_degrade_to_text()
    {
        let garbage = render("{not json");
        assert!(garbage.text.starts_with("Error: \""));
        assert!(garbage.text.ends_with("\" formatting response"));

        let missing = render(r#"{"success":true,"running":false,"command":"setbreakpoint"}"#);
        assert_eq!(
            missing.text,
            "Error: \"response to 'setbreakpoint' has no body\" formatting response"
        );

        let wrong = render(r#"{"success":true,"running":false,"command":"setbreakpoint","body":{}}"#);
        assert!(wrong.text.contains("breakpoint"));
        assert!(wrong.text.ends_with("formatting response"));
    }
}
