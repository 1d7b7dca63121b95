use super::{ParseEnumError, normalize};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Input widget kind for a category's custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            _ => Err(ParseEnumError {
                expected: "field type",
                got: s.to_string(),
            }),
        }
    }
}

/// One custom field a category asks for on its tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_id: String,
    pub label: String,
    pub field_type: FieldType,
    pub is_required: bool,
}

/// A support category with its SLA budget and field definitions.
///
/// The engine reads a category exactly once, at ticket creation, and
/// never re-reads it for an existing ticket. Category rows are owned by
/// an external configuration store; this core only consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub sla_first_response_hours: i64,
    pub sla_resolution_hours: i64,
    pub field_definitions: Vec<FieldDefinition>,
}
