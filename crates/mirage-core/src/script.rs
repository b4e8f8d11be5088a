//! Script descriptors and source position resolution.
//!
//! Positions are character offsets into the script source. Lines and columns
//! are 0-based and include the script's own line/column offset (scripts can
//! be embedded somewhere inside a larger resource).

/// Origin of a script, matching the engine's script type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptType
{
    /// Built into the engine
    Native = 0,
    /// Engine extension
    Extension = 1,
    /// Regular user script
    #[default]
    Normal = 2,
}

impl ScriptType
{
    /// Numeric tag used on the wire.
    #[must_use]
    pub const fn code(self) -> u32
    {
        self as u32
    }

    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self>
    {
        match code {
            0 => Some(Self::Native),
            1 => Some(Self::Extension),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    /// Bit used for this type in script filter masks (`1 << code`).
    #[must_use]
    pub const fn flag(self) -> u32
    {
        1 << self.code()
    }
}

/// A resolved source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation
{
    /// Character offset the location was resolved from
    pub position: usize,
    /// Line, including the script's line offset
    pub line: u32,
    /// Column, including the column offset on the script's first line
    pub column: u32,
    /// Character offset of the start of the line
    pub start: usize,
    /// Character offset of the end of the line (the newline itself)
    pub end: usize,
    /// Text of the whole line without its line terminator
    pub source_text: String,
}

impl SourceLocation
{
    /// Offset of `position` within its own line, ignoring script offsets.
    #[must_use]
    pub const fn offset_in_line(&self) -> usize
    {
        self.position - self.start
    }
}

/// A contiguous range of lines cut out of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSlice
{
    pub from_line: u32,
    pub to_line: u32,
    pub from_position: usize,
    pub to_position: usize,
    pub source_text: String,
}

/// A named (or anonymous) unit of source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script
{
    id: u32,
    name: Option<String>,
    source: String,
    line_offset: u32,
    column_offset: u32,
    script_type: ScriptType,
    /// Character offset of every line end (newline or end of source)
    line_ends: Vec<usize>,
}

impl Script
{
    /// Create a normal script with no offsets.
    #[must_use]
    pub fn new(id: u32, name: Option<&str>, source: impl Into<String>) -> Self
    {
        let source = source.into();
        let line_ends = compute_line_ends(&source);
        Self {
            id,
            name: name.map(str::to_string),
            source,
            line_offset: 0,
            column_offset: 0,
            script_type: ScriptType::Normal,
            line_ends,
        }
    }

    /// Place the script at a line/column offset inside its resource.
    #[must_use]
    pub const fn with_offset(mut self, line_offset: u32, column_offset: u32) -> Self
    {
        self.line_offset = line_offset;
        self.column_offset = column_offset;
        self
    }

    #[must_use]
    pub const fn with_type(mut self, script_type: ScriptType) -> Self
    {
        self.script_type = script_type;
        self
    }

    #[must_use]
    pub const fn id(&self) -> u32
    {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str>
    {
        self.name.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> &str
    {
        &self.source
    }

    #[must_use]
    pub const fn line_offset(&self) -> u32
    {
        self.line_offset
    }

    #[must_use]
    pub const fn column_offset(&self) -> u32
    {
        self.column_offset
    }

    #[must_use]
    pub const fn script_type(&self) -> ScriptType
    {
        self.script_type
    }

    #[must_use]
    pub fn line_count(&self) -> u32
    {
        u32::try_from(self.line_ends.len()).unwrap_or(u32::MAX)
    }

    /// Resolve a character position to its line, column and line text.
    ///
    /// Returns `None` for positions past the end of the source.
    #[must_use]
    pub fn location_from_position(&self, position: usize) -> Option<SourceLocation>
    {
        let line_index = self.line_ends.partition_point(|end| *end < position);
        let end = *self.line_ends.get(line_index)?;
        let start = if line_index == 0 {
            0
        } else {
            self.line_ends[line_index - 1] + 1
        };

        let mut column = u32::try_from(position - start).unwrap_or(u32::MAX);
        if line_index == 0 {
            column = column.saturating_add(self.column_offset);
        }
        let line = u32::try_from(line_index).unwrap_or(u32::MAX).saturating_add(self.line_offset);

        let mut source_text = char_slice(&self.source, start, end);
        if source_text.ends_with('\r') {
            source_text.pop();
        }

        Some(SourceLocation {
            position,
            line,
            column,
            start,
            end,
            source_text,
        })
    }

    /// Slice out lines `[from_line, to_line)` (resource line numbers).
    ///
    /// `None` bounds default to the first and one-past-last line. Returns
    /// `None` when the range is empty or lies outside the script.
    #[must_use]
    pub fn source_slice(&self, from_line: Option<u32>, to_line: Option<u32>) -> Option<SourceSlice>
    {
        let line_count = i64::from(self.line_count());
        let offset = i64::from(self.line_offset);
        let mut from = i64::from(from_line.unwrap_or(self.line_offset)) - offset;
        let mut to = to_line.map_or(line_count, |l| i64::from(l) - offset);

        if from < 0 {
            from = 0;
        }
        if to > line_count {
            to = line_count;
        }
        if from >= line_count || to < 0 || from > to {
            return None;
        }

        let position_of = |line: i64| -> usize {
            if line == 0 {
                0
            } else {
                self.line_ends[(line - 1) as usize] + 1
            }
        };
        let char_len = self.source.chars().count();
        let from_position = position_of(from).min(char_len);
        let to_position = position_of(to).min(char_len);

        Some(SourceSlice {
            from_line: (from + offset) as u32,
            to_line: (to + offset) as u32,
            from_position,
            to_position,
            source_text: char_slice(&self.source, from_position, to_position),
        })
    }

    /// One-line summary: `name (lines: N)` or `name (lines: a-b)` for
    /// scripts placed at a line offset.
    #[must_use]
    pub fn to_text(&self) -> String
    {
        let lines = if self.line_offset > 0 {
            format!("{}-{}", self.line_offset, self.line_offset + self.line_count() - 1)
        } else {
            self.line_count().to_string()
        };
        format!("{} (lines: {lines})", self.name().unwrap_or("[unnamed]"))
    }
}

fn compute_line_ends(source: &str) -> Vec<usize>
{
    let mut line_ends = Vec::new();
    let mut len = 0;
    for (index, c) in source.chars().enumerate() {
        if c == '\n' {
            line_ends.push(index);
        }
        len = index + 1;
    }
    if !source.ends_with('\n') {
        line_ends.push(len);
    }
    line_ends
}

fn char_slice(source: &str, start: usize, end: usize) -> String
{
    source.chars().skip(start).take(end.saturating_sub(start)).collect()
}
