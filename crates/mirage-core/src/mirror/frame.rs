//! # Frame Mirrors
//!
//! Stack frames of a suspended debuggee.
//!
//! A frame is addressed by `(break_id, index)`. The break id scopes the frame
//! to one suspended-execution episode: once the debuggee resumes, every query
//! on the frame fails with [`MirrorError::StaleBreak`] instead of describing
//! whatever happens to sit at that index now.
//!
//! ## Rendering
//!
//! Frames render as one line:
//!
//! ```text
//! #01 #<a Point>.move(dx=1, dy=2) geometry.js line 12 column 5 (position 310)
//! ```
//!
//! optionally followed by one `var name = value` line per local.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{mirror_for, FunctionMirror, Mirror};
use crate::debuggee::{Debuggee, ObjectShape};
use crate::details::FrameDetails;
use crate::error::{MirrorError, MirrorResult};
use crate::script::{Script, SourceLocation};
use crate::text::number_to_string;
use crate::value::{BreakId, HostValue};

/// Entry point to the frames of one break episode.
#[derive(Clone, Copy)]
pub struct ExecutionState<'h>
{
    debuggee: &'h dyn Debuggee,
    break_id: BreakId,
}

impl fmt::Debug for ExecutionState<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ExecutionState")
            .field("break_id", &self.break_id)
            .finish_non_exhaustive()
    }
}

impl<'h> ExecutionState<'h>
{
    #[must_use]
    pub const fn new(debuggee: &'h dyn Debuggee, break_id: BreakId) -> Self
    {
        Self { debuggee, break_id }
    }

    #[must_use]
    pub const fn break_id(&self) -> BreakId
    {
        self.break_id
    }

    /// Number of frames on the suspended stack.
    ///
    /// ## Errors
    ///
    /// Fails when the break episode is over.
    pub fn frame_count(&self) -> MirrorResult<usize>
    {
        self.debuggee.check_break(self.break_id)?;
        self.debuggee.frame_count(self.break_id)
    }

    /// Mirror of frame `index` (0 is the innermost frame).
    ///
    /// ## Errors
    ///
    /// - `StaleBreak` when the break episode is over
    /// - `FrameOutOfRange` when there is no such frame
    pub fn frame(&self, index: usize) -> MirrorResult<FrameMirror<'h>>
    {
        let count = self.frame_count()?;
        if index >= count {
            return Err(MirrorError::FrameOutOfRange { index, count });
        }
        FrameMirror::new(self.debuggee, self.break_id, index)
    }
}

/// Mirror of one stack frame.
#[derive(Clone)]
pub struct FrameMirror<'h>
{
    debuggee: &'h dyn Debuggee,
    index: usize,
    details: FrameDetails<'h>,
}

impl fmt::Debug for FrameMirror<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("FrameMirror")
            .field("index", &self.index)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

impl<'h> FrameMirror<'h>
{
    /// Fetch frame `index` of break `break_id` from the engine.
    ///
    /// ## Errors
    ///
    /// Propagates the engine's rejection of the break id or frame index.
    pub fn new(debuggee: &'h dyn Debuggee, break_id: BreakId, index: usize) -> MirrorResult<Self>
    {
        let details = FrameDetails::fetch(debuggee, break_id, index)?;
        trace!(%break_id, index, "fetched frame details");
        Ok(Self {
            debuggee,
            index,
            details,
        })
    }

    #[must_use]
    pub const fn index(&self) -> usize
    {
        self.index
    }

    #[must_use]
    pub const fn break_id(&self) -> BreakId
    {
        self.details.break_id()
    }

    #[must_use]
    pub const fn details(&self) -> &FrameDetails<'h>
    {
        &self.details
    }

    /// The invoked function
    ///
    /// Anything other than a function object (typically the bare name the
    /// engine reports for a function it could not materialise) becomes an
    /// unresolved function mirror.
    pub fn func(&self) -> MirrorResult<Mirror<'h>>
    {
        let value = self.details.func()?;
        if let Some(object) = value.as_object() {
            if self.debuggee.shape(object).contains(ObjectShape::FUNCTION) {
                return Ok(mirror_for(self.debuggee, value));
            }
        }
        let name = match value {
            HostValue::String(name) => name,
            HostValue::Number(n) => number_to_string(n),
            _ => String::new(),
        };
        Ok(Mirror::Function(FunctionMirror::Unresolved { name }))
    }

    pub fn receiver(&self) -> MirrorResult<Mirror<'h>>
    {
        Ok(mirror_for(self.debuggee, self.details.receiver()?))
    }

    pub fn is_construct_call(&self) -> MirrorResult<bool>
    {
        self.details.is_construct_call()
    }

    pub fn is_debugger_frame(&self) -> MirrorResult<bool>
    {
        self.details.is_debugger_frame()
    }

    pub fn argument_count(&self) -> MirrorResult<usize>
    {
        self.details.argument_count()
    }

    pub fn argument_name(&self, index: usize) -> MirrorResult<Option<String>>
    {
        self.details.argument_name(index)
    }

    pub fn argument_value(&self, index: usize) -> MirrorResult<Mirror<'h>>
    {
        Ok(mirror_for(self.debuggee, self.details.argument_value(index)?))
    }

    pub fn local_count(&self) -> MirrorResult<usize>
    {
        self.details.local_count()
    }

    pub fn local_name(&self, index: usize) -> MirrorResult<Option<String>>
    {
        self.details.local_name(index)
    }

    pub fn local_value(&self, index: usize) -> MirrorResult<Mirror<'h>>
    {
        Ok(mirror_for(self.debuggee, self.details.local_value(index)?))
    }

    pub fn source_position(&self) -> MirrorResult<Option<usize>>
    {
        self.details.source_position()
    }

    /// Script of the invoked function, if it is resolved and has one.
    pub fn script(&self) -> MirrorResult<Option<Arc<Script>>>
    {
        Ok(self.func()?.as_function().and_then(FunctionMirror::script))
    }

    /// Source position resolved against the function's script.
    pub fn source_location(&self) -> MirrorResult<Option<SourceLocation>>
    {
        let Some(script) = self.script()? else {
            return Ok(None);
        };
        Ok(self
            .source_position()?
            .and_then(|position| script.location_from_position(position)))
    }

    pub fn source_line(&self) -> MirrorResult<Option<u32>>
    {
        Ok(self.source_location()?.map(|location| location.line))
    }

    pub fn source_column(&self) -> MirrorResult<Option<u32>>
    {
        Ok(self.source_location()?.map(|location| location.column))
    }

    pub fn source_line_text(&self) -> MirrorResult<Option<String>>
    {
        Ok(self.source_location()?.map(|location| location.source_text))
    }

    /// Evaluate `source` in this frame.
    ///
    /// ## Errors
    ///
    /// `StaleBreak` when the break episode is over, or the engine's
    /// evaluation failure.
    pub fn evaluate(&self, source: &str, disable_break: bool) -> MirrorResult<Mirror<'h>>
    {
        let frame_id = self.details.frame_id()?;
        let value = self
            .debuggee
            .evaluate(self.details.break_id(), frame_id, source, disable_break)?;
        Ok(mirror_for(self.debuggee, value))
    }

    /// Receiver, function and arguments, e.g. `#<a Point>.move(dx=1)`.
    pub fn invocation_text(&self) -> MirrorResult<String>
    {
        let mut result = String::new();
        let func = self.func()?;
        let func_name = func.as_function().map(FunctionMirror::name).unwrap_or_default();
        let is_debugger_frame = self.is_debugger_frame()?;

        if self.is_construct_call()? {
            result.push_str("new ");
            result.push_str(display_name(&func_name));
        } else if is_debugger_frame {
            result.push_str("[debugger]");
        } else {
            let receiver = self.receiver()?;
            let display_receiver = receiver.class_name().is_none_or(|class| class != "global");
            if display_receiver {
                result.push_str(&receiver.to_text()?);
            }

            let property = find_on_prototype_chain(&receiver, &func);
            match property.as_property() {
                Some(property) => {
                    if property.is_indexed() {
                        result.push('[');
                        result.push_str(property.name());
                        result.push(']');
                    } else {
                        if display_receiver {
                            result.push('.');
                        }
                        result.push_str(property.name());
                    }
                    if !func_name.is_empty() && func_name != property.name() {
                        result.push_str(&format!("(aka {func_name})"));
                    }
                }
                None => {
                    if display_receiver {
                        result.push('.');
                    }
                    result.push_str(display_name(&func_name));
                }
            }
        }

        if !is_debugger_frame {
            result.push('(');
            for i in 0..self.argument_count()? {
                if i != 0 {
                    result.push_str(", ");
                }
                if let Some(name) = self.argument_name(i)? {
                    result.push_str(&name);
                    result.push('=');
                }
                result.push_str(&self.argument_value(i)?.to_text()?);
            }
            result.push(')');
        }

        Ok(result)
    }

    /// Script name and 1-based position, e.g. `app.js line 3 column 7 (position 41)`.
    pub fn source_and_position_text(&self) -> MirrorResult<String>
    {
        let func = self.func()?;
        let Some(function) = func.as_function().filter(|f| f.resolved()) else {
            return Ok("[unresolved]".to_string());
        };
        let Some(script) = function.script() else {
            return Ok("[no source]".to_string());
        };

        let mut result = script.name().unwrap_or("[unnamed]").to_string();
        if !self.is_debugger_frame()? {
            let location = self.source_location()?;
            let line = location.as_ref().map_or_else(|| "?".to_string(), |l| (l.line + 1).to_string());
            let column = location.as_ref().map_or_else(|| "?".to_string(), |l| (l.column + 1).to_string());
            result.push_str(&format!(" line {line} column {column}"));
            if let Some(position) = self.source_position()? {
                result.push_str(&format!(" (position {})", position + 1));
            }
        }
        Ok(result)
    }

    /// One `      var name = value` line per local.
    pub fn locals_text(&self) -> MirrorResult<String>
    {
        let mut lines = Vec::new();
        for i in 0..self.local_count()? {
            let name = self.local_name(i)?.unwrap_or_default();
            lines.push(format!("      var {name} = {}", self.local_value(i)?.to_text()?));
        }
        Ok(lines.join("\n"))
    }

    pub fn to_text(&self, with_locals: bool) -> MirrorResult<String>
    {
        let mut result = format!(
            "#{:02} {} {}",
            self.index,
            self.invocation_text()?,
            self.source_and_position_text()?
        );
        if with_locals {
            result.push('\n');
            result.push_str(&self.locals_text()?);
        }
        Ok(result)
    }
}

fn display_name(name: &str) -> &str
{
    if name.is_empty() { "[anonymous]" } else { name }
}

/// Property under which `func` is reachable from `receiver`, walking the
/// prototype chain. Each object is visited at most once.
fn find_on_prototype_chain<'h>(receiver: &Mirror<'h>, func: &Mirror<'_>) -> Mirror<'h>
{
    let mut seen = HashSet::new();
    let mut current = receiver.clone();
    while let Some(object) = current.as_object().copied() {
        if !seen.insert(object.object()) {
            break;
        }
        let property = object.lookup_property(func);
        if !property.is_undefined() {
            return property;
        }
        current = object.proto_object();
    }
    Mirror::Undefined
}
