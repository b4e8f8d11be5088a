//! Request envelope.

use crate::json::{string_to_json, ProtocolValue};

/// `{"seq":N,"type":"request","command":...,"arguments":{...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPacket
{
    pub seq: u64,
    pub command: String,
    /// Omitted from the JSON when `None`
    pub arguments: Option<ProtocolValue>,
}

impl RequestPacket
{
    /// A request with sequence number 0 and no arguments.
    #[must_use]
    pub fn new(command: &str) -> Self
    {
        Self {
            seq: 0,
            command: command.to_string(),
            arguments: None,
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: ProtocolValue) -> Self
    {
        self.arguments = Some(arguments);
        self
    }

    #[must_use]
    pub const fn with_seq(mut self, seq: u64) -> Self
    {
        self.seq = seq;
        self
    }

    #[must_use]
    pub fn to_json_protocol(&self) -> String
    {
        let mut json = format!("{{\"seq\":{},\"type\":\"request\"", self.seq);
        json.push_str(",\"command\":");
        json.push_str(&string_to_json(&self.command));
        if let Some(arguments) = &self.arguments {
            json.push_str(",\"arguments\":");
            json.push_str(&arguments.to_json());
        }
        json.push('}');
        json
    }
}
