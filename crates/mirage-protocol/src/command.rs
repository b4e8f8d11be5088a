//! # Text Commands
//!
//! Parses one line of user input into a [`DebugCommand`] and lowers it to a
//! [`RequestPacket`].
//!
//! Parsing is complete before any request is built, so a syntax error never
//! yields a partial request. Arguments are separated by runs of spaces and
//! are never quote-aware.
//!
//! ## Grammar
//!
//! | command | aliases | arguments |
//! |---------|---------|-----------|
//! | `continue` | `c` | |
//! | `step` | `s` | `[in\|i\|min\|m\|next\|n\|out\|o] [count]` |
//! | `backtrace` | `bt` | `[from to]` |
//! | `frame` | `f` | `[number]` |
//! | `print` | `p` | `<expression>` |
//! | `source` | | `[from line [num lines]]` |
//! | `scripts` | | `[natives\|extensions\|all]` |
//! | `break` | `b` | `<target> [condition]` |
//! | `clear` | | `<breakpoint #>` |
//! | `help` | `?` | |
//!
//! A line starting with `{` is taken to be an already encoded request and is
//! passed through untouched.

use bitflags::bitflags;
use mirage_core::script::ScriptType;
use tracing::debug;

use crate::error::{CommandError, CommandResult};
use crate::json::ProtocolValue;
use crate::request::RequestPacket;
use crate::session::SessionState;

/// Usage summary printed by `help`.
pub const HELP_LINES: &[&str] = &[
    "break location [condition]",
    "clear <breakpoint #>",
    "backtrace [from frame #] [to frame #]]",
    "frame <frame #>",
    "step [in | next | out| min [step count]]",
    "print <expression>",
    "source [from line [num lines]]",
    "scripts",
    "continue",
    "help",
];

/// Printed before the usage summary when `help` is given arguments.
pub const HELP_ARGUMENTS_IGNORED: &str = "warning: arguments to 'help' are ignored";

const DEFAULT_SOURCE_LINES: i64 = 10;
const SOURCE_LINES_BEFORE_CURRENT: i64 = 5;

bitflags! {
    /// Script type filter of the `scripts` request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScriptTypes: u32 {
        const NATIVE = ScriptType::Native.flag();
        const EXTENSION = ScriptType::Extension.flag();
        const NORMAL = ScriptType::Normal.flag();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepAction
{
    In,
    Min,
    Next,
    Out,
}

impl StepAction
{
    #[must_use]
    pub const fn as_str(self) -> &'static str
    {
        match self {
            Self::In => "in",
            Self::Min => "min",
            Self::Next => "next",
            Self::Out => "out",
        }
    }

    fn parse(token: &str) -> CommandResult<Self>
    {
        match token {
            "in" | "i" => Ok(Self::In),
            "min" | "m" => Ok(Self::Min),
            "next" | "n" => Ok(Self::Next),
            "out" | "o" => Ok(Self::Out),
            _ => Err(CommandError::InvalidArgument {
                what: "step",
                value: token.to_string(),
            }),
        }
    }
}

/// A parsed text command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugCommand
{
    Continue,
    Step
    {
        action: StepAction,
        count: Option<u32>,
    },
    /// Inclusive frame range
    Backtrace
    {
        range: Option<(u32, u32)>,
    },
    Frame
    {
        number: Option<u32>,
    },
    Print
    {
        expression: String,
    },
    /// Line numbers as typed by the user (1-based)
    Source
    {
        from_line: Option<i64>,
        count: Option<i64>,
    },
    Scripts
    {
        types: Option<ScriptTypes>,
    },
    Break
    {
        target: String,
        condition: Option<String>,
    },
    Clear
    {
        breakpoint: u32,
    },
    Help
    {
        arguments_ignored: bool,
    },
    /// Pre-encoded JSON request
    Raw(String),
}

impl DebugCommand
{
    /// Parse one line of user input.
    ///
    /// ## Errors
    ///
    /// Any [`CommandError`]; nothing is produced for a malformed command.
    pub fn parse(line: &str) -> CommandResult<Self>
    {
        let line = line.trim();
        if line.starts_with('{') {
            return Ok(Self::Raw(line.to_string()));
        }

        let (command, arguments) = match line.split_once(' ') {
            Some((command, arguments)) => (command, arguments.trim()),
            None => (line, ""),
        };
        let tokens: Vec<&str> = arguments.split(' ').filter(|t| !t.is_empty()).collect();

        let parsed = match command {
            "continue" | "c" => Self::Continue,
            "step" | "s" => parse_step(&tokens)?,
            "backtrace" | "bt" => parse_backtrace(&tokens)?,
            "frame" | "f" => Self::Frame {
                number: tokens
                    .first()
                    .map(|token| parse_number("frame", token))
                    .transpose()?,
            },
            "print" | "p" => {
                if arguments.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "print",
                        what: "expression",
                    });
                }
                Self::Print {
                    expression: arguments.to_string(),
                }
            }
            "source" => parse_source(&tokens)?,
            "scripts" => parse_scripts(&tokens)?,
            "break" | "b" => {
                if arguments.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "break",
                        what: "location",
                    });
                }
                let (target, condition) = match arguments.split_once(' ') {
                    Some((target, condition)) => (target, Some(condition.trim().to_string())),
                    None => (arguments, None),
                };
                Self::Break {
                    target: target.to_string(),
                    condition: condition.filter(|c| !c.is_empty()),
                }
            }
            "clear" => {
                let Some(token) = tokens.first() else {
                    return Err(CommandError::MissingArgument {
                        command: "clear",
                        what: "breakpoint number",
                    });
                };
                Self::Clear {
                    breakpoint: parse_number("breakpoint", token)?,
                }
            }
            "help" | "?" => Self::Help {
                arguments_ignored: !arguments.is_empty(),
            },
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };

        debug!(?parsed, "parsed command");
        Ok(parsed)
    }

    /// Lower the command to a protocol request.
    ///
    /// `source` without explicit lines reads the session's current line.
    /// Returns `None` for `help` and for pre-encoded requests, which have no
    /// packet form.
    #[must_use]
    pub fn to_request(&self, state: &SessionState) -> Option<RequestPacket>
    {
        let request = match self {
            Self::Continue => RequestPacket::new("continue"),
            Self::Step { action, count } => RequestPacket::new("continue").with_arguments(
                ProtocolValue::object()
                    .with("stepaction", action.as_str())
                    .with("stepcount", *count),
            ),
            Self::Backtrace { range } => {
                let request = RequestPacket::new("backtrace");
                match range {
                    Some((from, to)) => request.with_arguments(
                        ProtocolValue::object()
                            .with("fromFrame", *from)
                            .with("toFrame", to + 1),
                    ),
                    None => request,
                }
            }
            Self::Frame { number } => {
                let request = RequestPacket::new("frame");
                match number {
                    Some(number) => request.with_arguments(ProtocolValue::object().with("number", *number)),
                    None => request,
                }
            }
            Self::Print { expression } => RequestPacket::new("evaluate")
                .with_arguments(ProtocolValue::object().with("expression", expression.as_str())),
            Self::Source { from_line, count } => {
                let current = state.current_source_line.map_or(-1, i64::from);
                let mut from = from_line.map_or(current - SOURCE_LINES_BEFORE_CURRENT, |line| line - 1);
                let mut lines = count.unwrap_or(DEFAULT_SOURCE_LINES);
                if from < 0 {
                    from = 0;
                }
                if lines < 0 {
                    lines = DEFAULT_SOURCE_LINES;
                }
                RequestPacket::new("source").with_arguments(
                    ProtocolValue::object()
                        .with("fromLine", from)
                        .with("toLine", from + lines),
                )
            }
            Self::Scripts { types } => {
                let request = RequestPacket::new("scripts");
                match types {
                    Some(types) => request.with_arguments(ProtocolValue::object().with("types", types.bits())),
                    None => request,
                }
            }
            Self::Break { target, condition } => RequestPacket::new("setbreakpoint").with_arguments(
                ProtocolValue::object()
                    .with("type", "function")
                    .with("target", target.as_str())
                    .with("condition", condition.clone()),
            ),
            Self::Clear { breakpoint } => RequestPacket::new("clearbreakpoint")
                .with_arguments(ProtocolValue::object().with("breakpoint", *breakpoint)),
            Self::Help { .. } | Self::Raw(_) => return None,
        };
        Some(request)
    }
}

/// Outcome of translating one line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation
{
    /// JSON request text to send to the engine
    Request(String),
    /// Text to show the user; nothing is sent
    Help(Vec<String>),
}

/// Usage text, preceded by a warning when arguments were passed to `help`.
#[must_use]
pub fn help_text(arguments_ignored: bool) -> Vec<String>
{
    let warning = arguments_ignored.then(|| HELP_ARGUMENTS_IGNORED.to_string());
    warning
        .into_iter()
        .chain(HELP_LINES.iter().map(|line| (*line).to_string()))
        .collect()
}

/// Translate one line of input with sequence number 0.
///
/// ## Errors
///
/// Any [`CommandError`] from parsing.
pub fn command_to_json_request(line: &str, state: &SessionState) -> CommandResult<Translation>
{
    translate(line, state, 0)
}

pub(crate) fn translate(line: &str, state: &SessionState, seq: u64) -> CommandResult<Translation>
{
    let command = DebugCommand::parse(line)?;
    Ok(match command {
        DebugCommand::Raw(json) => Translation::Request(json),
        DebugCommand::Help { arguments_ignored } => Translation::Help(help_text(arguments_ignored)),
        other => match other.to_request(state) {
            Some(request) => Translation::Request(request.with_seq(seq).to_json_protocol()),
            None => Translation::Help(Vec::new()),
        },
    })
}

fn parse_number(what: &'static str, token: &str) -> CommandResult<u32>
{
    token.parse::<u32>().map_err(|_| CommandError::InvalidArgument {
        what,
        value: token.to_string(),
    })
}

fn parse_line(what: &'static str, token: &str) -> CommandResult<i64>
{
    token.parse::<i64>().map_err(|_| CommandError::InvalidArgument {
        what,
        value: token.to_string(),
    })
}

fn parse_step(tokens: &[&str]) -> CommandResult<DebugCommand>
{
    match tokens {
        [] => Ok(DebugCommand::Step {
            action: StepAction::Next,
            count: None,
        }),
        [action] => Ok(DebugCommand::Step {
            action: StepAction::parse(action)?,
            count: None,
        }),
        [action, count] => {
            let count = match count.parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(CommandError::InvalidArgument {
                        what: "step count",
                        value: (*count).to_string(),
                    })
                }
            };
            Ok(DebugCommand::Step {
                action: StepAction::parse(action)?,
                count: Some(count),
            })
        }
        _ => Err(CommandError::TooManyArguments("step")),
    }
}

fn parse_backtrace(tokens: &[&str]) -> CommandResult<DebugCommand>
{
    let range = match tokens {
        [from, to] => {
            let from = parse_number("start frame", from)?;
            let to = parse_number("end frame", to)?;
            if from > to {
                return Err(CommandError::InvalidRange { from, to });
            }
            Some((from, to))
        }
        _ => None,
    };
    Ok(DebugCommand::Backtrace { range })
}

fn parse_source(tokens: &[&str]) -> CommandResult<DebugCommand>
{
    let from_line = tokens.first().map(|token| parse_line("from line", token)).transpose()?;
    let count = tokens.get(1).map(|token| parse_line("line count", token)).transpose()?;
    Ok(DebugCommand::Source { from_line, count })
}

fn parse_scripts(tokens: &[&str]) -> CommandResult<DebugCommand>
{
    let types = match tokens {
        [] => None,
        ["natives"] => Some(ScriptTypes::NATIVE),
        ["extensions"] => Some(ScriptTypes::EXTENSION),
        ["all"] => Some(ScriptTypes::all()),
        [other] => {
            return Err(CommandError::InvalidArgument {
                what: "scripts",
                value: (*other).to_string(),
            })
        }
        _ => return Err(CommandError::TooManyArguments("scripts")),
    };
    Ok(DebugCommand::Scripts { types })
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn request(line: &str) -> String
    {
        request_with(line, &SessionState::default())
    }

    fn request_with(line: &str, state: &SessionState) -> String
    {
        match command_to_json_request(line, state).unwrap() {
            Translation::Request(json) => json,
            Translation::Help(_) => panic!("expected a request for {line:?}"),
        }
    }

    #[test]
    fn test_continue()
    {
        assert_eq!(request("continue"), r#"{"seq":0,"type":"request","command":"continue"}"#);
        assert_eq!(request("  c  "), r#"{"seq":0,"type":"request","command":"continue"}"#);
    }

    #[test]
    fn test_step_defaults_to_next()
    {
        assert_eq!(
            request("step"),
            r#"{"seq":0,"type":"request","command":"continue","arguments":{"stepaction":"next"}}"#
        );
    }

    #[test]
    fn test_step_with_action_and_count()
    {
        assert_eq!(
            request("s  in   3"),
            r#"{"seq":0,"type":"request","command":"continue","arguments":{"stepaction":"in","stepcount":3}}"#
        );
        assert_eq!(
            request("step o"),
            r#"{"seq":0,"type":"request","command":"continue","arguments":{"stepaction":"out"}}"#
        );
    }

    #[test]
    fn test_step_rejects_bad_arguments()
    {
        assert!(matches!(
            DebugCommand::parse("step sideways"),
            Err(CommandError::InvalidArgument { what: "step", .. })
        ));
        assert!(matches!(
            DebugCommand::parse("step in 0"),
            Err(CommandError::InvalidArgument { what: "step count", .. })
        ));
        assert!(matches!(
            DebugCommand::parse("step in x"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert_eq!(
            DebugCommand::parse("step in 1 2"),
            Err(CommandError::TooManyArguments("step"))
        );
    }

    #[test]
    fn test_backtrace_range()
    {
        assert_eq!(
            request("bt 2 5"),
            r#"{"seq":0,"type":"request","command":"backtrace","arguments":{"fromFrame":2,"toFrame":6}}"#
        );
        assert_eq!(request("backtrace"), r#"{"seq":0,"type":"request","command":"backtrace"}"#);
        assert_eq!(request("backtrace 3"), r#"{"seq":0,"type":"request","command":"backtrace"}"#);
        assert_eq!(
            DebugCommand::parse("bt 5 2"),
            Err(CommandError::InvalidRange { from: 5, to: 2 })
        );
        assert!(DebugCommand::parse("bt -1 2").is_err());
    }

    #[test]
    fn test_frame_number_is_numeric()
    {
        assert_eq!(
            request("f 3"),
            r#"{"seq":0,"type":"request","command":"frame","arguments":{"number":3}}"#
        );
        assert_eq!(request("frame"), r#"{"seq":0,"type":"request","command":"frame"}"#);
        assert!(DebugCommand::parse("frame top").is_err());
    }

    #[test]
    fn test_print_keeps_whole_expression()
    {
        assert_eq!(
            request("p  a + \"b\""),
            r#"{"seq":0,"type":"request","command":"evaluate","arguments":{"expression":"a + \"b\""}}"#
        );
        assert_eq!(
            DebugCommand::parse("print"),
            Err(CommandError::MissingArgument {
                command: "print",
                what: "expression"
            })
        );
    }

    #[test]
    fn test_source_defaults_around_current_line()
    {
        let state = SessionState {
            current_frame: Some(0),
            current_source_line: Some(20),
        };
        assert_eq!(
            request_with("source", &state),
            r#"{"seq":0,"type":"request","command":"source","arguments":{"fromLine":15,"toLine":25}}"#
        );
        assert_eq!(
            request("source"),
            r#"{"seq":0,"type":"request","command":"source","arguments":{"fromLine":0,"toLine":10}}"#
        );
    }

    #[test]
    fn test_source_explicit_lines_are_one_based()
    {
        assert_eq!(
            request("source 10"),
            r#"{"seq":0,"type":"request","command":"source","arguments":{"fromLine":9,"toLine":19}}"#
        );
        assert_eq!(
            request("source 10 3"),
            r#"{"seq":0,"type":"request","command":"source","arguments":{"fromLine":9,"toLine":12}}"#
        );
        assert_eq!(
            request("source 1 -4"),
            r#"{"seq":0,"type":"request","command":"source","arguments":{"fromLine":0,"toLine":10}}"#
        );
    }

    #[test]
    fn test_scripts_filters()
    {
        assert_eq!(request("scripts"), r#"{"seq":0,"type":"request","command":"scripts"}"#);
        assert_eq!(
            request("scripts natives"),
            r#"{"seq":0,"type":"request","command":"scripts","arguments":{"types":1}}"#
        );
        assert_eq!(
            request("scripts extensions"),
            r#"{"seq":0,"type":"request","command":"scripts","arguments":{"types":2}}"#
        );
        assert_eq!(
            request("scripts all"),
            r#"{"seq":0,"type":"request","command":"scripts","arguments":{"types":7}}"#
        );
        assert!(DebugCommand::parse("scripts some").is_err());
        assert_eq!(
            DebugCommand::parse("scripts all natives"),
            Err(CommandError::TooManyArguments("scripts"))
        );
    }

    #[test]
    fn test_break_with_condition()
    {
        assert_eq!(
            request("break foo  x > 1 "),
            r#"{"seq":0,"type":"request","command":"setbreakpoint","arguments":{"type":"function","target":"foo","condition":"x > 1"}}"#
        );
        assert_eq!(
            request("b foo"),
            r#"{"seq":0,"type":"request","command":"setbreakpoint","arguments":{"type":"function","target":"foo"}}"#
        );
        assert!(matches!(
            DebugCommand::parse("break"),
            Err(CommandError::MissingArgument { command: "break", .. })
        ));
    }

    #[test]
    fn test_clear()
    {
        assert_eq!(
            request("clear 4"),
            r#"{"seq":0,"type":"request","command":"clearbreakpoint","arguments":{"breakpoint":4}}"#
        );
        assert!(DebugCommand::parse("clear").is_err());
        assert!(DebugCommand::parse("clear four").is_err());
    }

    #[test]
    fn test_help_produces_no_request()
    {
        let state = SessionState::default();
        let Translation::Help(lines) = command_to_json_request("help", &state).unwrap() else {
            panic!("help must not produce a request");
        };
        assert_eq!(lines.len(), HELP_LINES.len());

        let Translation::Help(lines) = command_to_json_request("? me", &state).unwrap() else {
            panic!("help must not produce a request");
        };
        assert_eq!(lines[0], HELP_ARGUMENTS_IGNORED);
    }

    #[test]
    fn test_raw_json_passes_through()
    {
        let raw = r#"{"seq":9,"type":"request","command":"version"}"#;
        assert_eq!(request(&format!("  {raw}")), raw);
    }

    #[test]
    fn test_unknown_command()
    {
        assert_eq!(
            DebugCommand::parse("jump 3"),
            Err(CommandError::UnknownCommand("jump".to_string()))
        );
        assert_eq!(
            DebugCommand::parse("jump 3").unwrap_err().to_string(),
            "Unknown command \"jump\""
        );
    }
}
