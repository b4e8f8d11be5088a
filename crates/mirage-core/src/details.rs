//! Decoders for the raw descriptor tuples reported by the execution engine.
//!
//! The engine describes properties with a bit-packed word and frames with a
//! flat array. All knowledge about those layouts lives here so the mirror and
//! serialization code only ever sees named accessors.

use bitflags::bitflags;

use crate::debuggee::Debuggee;
use crate::error::{MirrorError, MirrorResult};
use crate::value::{BreakId, HostValue};

bitflags! {
    /// Which properties to enumerate on an object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyKind: u8 {
        /// Properties with string names
        const NAMED = 1;
        /// Integer-indexed elements
        const INDEXED = 2;
    }
}

impl Default for PropertyKind
{
    fn default() -> Self
    {
        Self::NAMED | Self::INDEXED
    }
}

bitflags! {
    /// Attribute bits of a property as defined by the engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u32 {
        const READ_ONLY = 1;
        const DONT_ENUM = 2;
        const DONT_DELETE = 4;
    }
}

impl PropertyAttributes
{
    /// No attribute bits set.
    pub const NONE: Self = Self::empty();
}

/// Storage kind of a property
///
/// The transition markers are engine internals; they are carried through to
/// the protocol untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyType
{
    #[default]
    Normal = 0,
    Field = 1,
    ConstantFunction = 2,
    /// Accessor pair (getter and/or setter)
    Callbacks = 3,
    /// Value computed by an interceptor trap
    Interceptor = 4,
    MapTransition = 5,
    ConstantTransition = 6,
    NullDescriptor = 7,
}

impl PropertyType
{
    /// Decode a 3-bit type code. Every code maps to a variant.
    #[must_use]
    pub const fn from_code(code: u32) -> Self
    {
        match code & 0x7 {
            1 => Self::Field,
            2 => Self::ConstantFunction,
            3 => Self::Callbacks,
            4 => Self::Interceptor,
            5 => Self::MapTransition,
            6 => Self::ConstantTransition,
            7 => Self::NullDescriptor,
            _ => Self::Normal,
        }
    }

    /// Numeric code used on the wire.
    #[must_use]
    pub const fn code(self) -> u32
    {
        self as u32
    }
}

const TYPE_SHIFT: u32 = 0;
const TYPE_MASK: u32 = 0x7;
const ATTRIBUTES_SHIFT: u32 = 3;
const ATTRIBUTES_MASK: u32 = 0x7;
const INDEX_SHIFT: u32 = 6;

/// Bit-packed property details word
///
/// Layout (least significant bit first):
///
/// | bits | field |
/// |------|-------|
/// | 0-2  | [`PropertyType`] |
/// | 3-5  | [`PropertyAttributes`] |
/// | 6-31 | insertion index |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyDetails(u32);

impl PropertyDetails
{
    /// Wrap a raw details word exactly as the engine reported it.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self
    {
        Self(raw)
    }

    /// Pack a details word from its parts.
    #[must_use]
    pub const fn new(property_type: PropertyType, attributes: PropertyAttributes, index: u32) -> Self
    {
        Self(
            (property_type.code() & TYPE_MASK) << TYPE_SHIFT
                | (attributes.bits() & ATTRIBUTES_MASK) << ATTRIBUTES_SHIFT
                | index << INDEX_SHIFT,
        )
    }

    /// Details of a property synthesized from an interceptor trap.
    #[must_use]
    pub const fn interceptor() -> Self
    {
        Self::new(PropertyType::Interceptor, PropertyAttributes::NONE, 0)
    }

    #[must_use]
    pub const fn raw(self) -> u32
    {
        self.0
    }

    #[must_use]
    pub const fn property_type(self) -> PropertyType
    {
        PropertyType::from_code((self.0 >> TYPE_SHIFT) & TYPE_MASK)
    }

    #[must_use]
    pub const fn attributes(self) -> PropertyAttributes
    {
        PropertyAttributes::from_bits_truncate((self.0 >> ATTRIBUTES_SHIFT) & ATTRIBUTES_MASK)
    }

    #[must_use]
    pub const fn insertion_index(self) -> u32
    {
        self.0 >> INDEX_SHIFT
    }
}

const FRAME_ID_INDEX: usize = 0;
const RECEIVER_INDEX: usize = 1;
const FUNCTION_INDEX: usize = 2;
const ARGUMENT_COUNT_INDEX: usize = 3;
const LOCAL_COUNT_INDEX: usize = 4;
const SOURCE_POSITION_INDEX: usize = 5;
const CONSTRUCT_CALL_INDEX: usize = 6;
const DEBUGGER_FRAME_INDEX: usize = 7;
const FIRST_DYNAMIC_INDEX: usize = 8;

const NAME_OFFSET: usize = 0;
const VALUE_OFFSET: usize = 1;
const NAME_VALUE_SIZE: usize = 2;

/// Frame details tuple for one frame of one break episode
///
/// The engine reports a frame as a flat array:
///
/// | index | content |
/// |-------|---------|
/// | 0 | frame id |
/// | 1 | receiver |
/// | 2 | function (object, or a name string when unresolved) |
/// | 3 | argument count |
/// | 4 | local count |
/// | 5 | source position (`undefined` when unknown) |
/// | 6 | construct call flag |
/// | 7 | debugger frame flag |
/// | 8.. | argument name/value pairs, then local name/value pairs |
///
/// Every accessor re-validates the break id with the engine first, so a
/// details object kept past its break episode fails instead of answering
/// with stale data.
#[derive(Clone)]
pub struct FrameDetails<'h>
{
    debuggee: &'h dyn Debuggee,
    break_id: BreakId,
    details: Vec<HostValue>,
    argument_count: usize,
    local_count: usize,
}

impl std::fmt::Debug for FrameDetails<'_>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("FrameDetails")
            .field("break_id", &self.break_id)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

impl<'h> FrameDetails<'h>
{
    /// Fetch and validate the details of frame `index` in break `break_id`.
    ///
    /// ## Errors
    ///
    /// - `StaleBreak` / `NotSuspended` if the engine rejects the break id
    /// - `FrameOutOfRange` if the frame does not exist
    /// - `MalformedFrameDetails` if the tuple is shorter than its counts claim
    pub fn fetch(debuggee: &'h dyn Debuggee, break_id: BreakId, index: usize) -> MirrorResult<Self>
    {
        debuggee.check_break(break_id)?;
        let details = debuggee.frame_details(break_id, index)?;
        Self::decode(debuggee, break_id, details)
    }

    fn decode(debuggee: &'h dyn Debuggee, break_id: BreakId, details: Vec<HostValue>) -> MirrorResult<Self>
    {
        let count_at = |slot: usize, what: &str| -> MirrorResult<usize> {
            match details.get(slot).and_then(HostValue::as_number) {
                Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
                _ => Err(MirrorError::MalformedFrameDetails(format!("{what} is not a count"))),
            }
        };
        let argument_count = count_at(ARGUMENT_COUNT_INDEX, "argument count")?;
        let local_count = count_at(LOCAL_COUNT_INDEX, "local count")?;
        let required = FIRST_DYNAMIC_INDEX + (argument_count + local_count) * NAME_VALUE_SIZE;
        if details.len() < required {
            return Err(MirrorError::MalformedFrameDetails(format!(
                "expected at least {required} slots, got {}",
                details.len()
            )));
        }

        Ok(Self {
            debuggee,
            break_id,
            details,
            argument_count,
            local_count,
        })
    }

    fn slot(&self, index: usize) -> MirrorResult<&HostValue>
    {
        self.debuggee.check_break(self.break_id)?;
        Ok(&self.details[index])
    }

    #[must_use]
    pub const fn break_id(&self) -> BreakId
    {
        self.break_id
    }

    /// Engine-side frame id, used to address the frame when evaluating.
    pub fn frame_id(&self) -> MirrorResult<u64>
    {
        Ok(self.slot(FRAME_ID_INDEX)?.as_number().map_or(0, |n| n as u64))
    }

    pub fn receiver(&self) -> MirrorResult<HostValue>
    {
        self.slot(RECEIVER_INDEX).cloned()
    }

    pub fn func(&self) -> MirrorResult<HostValue>
    {
        self.slot(FUNCTION_INDEX).cloned()
    }

    pub fn is_construct_call(&self) -> MirrorResult<bool>
    {
        Ok(self.slot(CONSTRUCT_CALL_INDEX)?.is_true())
    }

    pub fn is_debugger_frame(&self) -> MirrorResult<bool>
    {
        Ok(self.slot(DEBUGGER_FRAME_INDEX)?.is_true())
    }

    pub fn argument_count(&self) -> MirrorResult<usize>
    {
        self.debuggee.check_break(self.break_id)?;
        Ok(self.argument_count)
    }

    pub fn local_count(&self) -> MirrorResult<usize>
    {
        self.debuggee.check_break(self.break_id)?;
        Ok(self.local_count)
    }

    /// Source position, `None` when the engine does not know it.
    pub fn source_position(&self) -> MirrorResult<Option<usize>>
    {
        Ok(self
            .slot(SOURCE_POSITION_INDEX)?
            .as_number()
            .filter(|n| *n >= 0.0)
            .map(|n| n as usize))
    }

    /// Name of argument `index`; `None` for anonymous arguments or out of range.
    pub fn argument_name(&self, index: usize) -> MirrorResult<Option<String>>
    {
        if index >= self.argument_count {
            return Ok(None);
        }
        let slot = FIRST_DYNAMIC_INDEX + index * NAME_VALUE_SIZE + NAME_OFFSET;
        Ok(self.slot(slot)?.as_str().filter(|s| !s.is_empty()).map(str::to_string))
    }

    /// Value of argument `index`; `undefined` when out of range.
    pub fn argument_value(&self, index: usize) -> MirrorResult<HostValue>
    {
        if index >= self.argument_count {
            return Ok(HostValue::Undefined);
        }
        self.slot(FIRST_DYNAMIC_INDEX + index * NAME_VALUE_SIZE + VALUE_OFFSET).cloned()
    }

    pub fn local_name(&self, index: usize) -> MirrorResult<Option<String>>
    {
        if index >= self.local_count {
            return Ok(None);
        }
        let slot = self.locals_offset() + index * NAME_VALUE_SIZE + NAME_OFFSET;
        Ok(self.slot(slot)?.as_str().map(str::to_string))
    }

    pub fn local_value(&self, index: usize) -> MirrorResult<HostValue>
    {
        if index >= self.local_count {
            return Ok(HostValue::Undefined);
        }
        self.slot(self.locals_offset() + index * NAME_VALUE_SIZE + VALUE_OFFSET).cloned()
    }

    const fn locals_offset(&self) -> usize
    {
        FIRST_DYNAMIC_INDEX + self.argument_count * NAME_VALUE_SIZE
    }
}

/// Build a raw frame details tuple in the engine's layout.
///
/// Engines that keep frames as structured data use this to produce the flat
/// array [`FrameDetails`] decodes.
#[must_use]
pub fn encode_frame_details(frame: &RawFrame) -> Vec<HostValue>
{
    let mut details = vec![
        HostValue::Number(frame.frame_id as f64),
        frame.receiver.clone(),
        frame.function.clone(),
        HostValue::Number(frame.arguments.len() as f64),
        HostValue::Number(frame.locals.len() as f64),
        frame
            .source_position
            .map_or(HostValue::Undefined, |p| HostValue::Number(p as f64)),
        HostValue::Boolean(frame.construct_call),
        HostValue::Boolean(frame.debugger_frame),
    ];
    for (name, value) in &frame.arguments {
        details.push(name.clone().map_or(HostValue::Undefined, HostValue::String));
        details.push(value.clone());
    }
    for (name, value) in &frame.locals {
        details.push(HostValue::String(name.clone()));
        details.push(value.clone());
    }
    details
}

/// Structured description of one stack frame, before packing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame
{
    pub frame_id: u64,
    pub receiver: HostValue,
    /// Function object, or the function name as a string when unresolved
    pub function: HostValue,
    pub arguments: Vec<(Option<String>, HostValue)>,
    pub locals: Vec<(String, HostValue)>,
    pub source_position: Option<usize>,
    pub construct_call: bool,
    pub debugger_frame: bool,
}
