//! Structured output schemas
//!
//! Static descriptions of the shapes the extractors ask a language model
//! to produce. They are rendered into format instructions; conformance is
//! checked by deserializing into the matching model type.

use serde_json::{json, Map, Value};

/// JSON type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

/// A single field of an output schema
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    const fn required(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            field_type,
            required: true,
            description,
        }
    }

    const fn optional(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            field_type,
            required: false,
            description,
        }
    }
}

/// Target shape for a structured extraction
#[derive(Debug, Clone, Copy)]
pub struct OutputSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Shape of [`crate::LegalEntity`]
pub const LEGAL_ENTITY: OutputSchema = OutputSchema {
    name: "LegalEntity",
    fields: &[
        FieldSpec::required(
            "article_number",
            FieldType::String,
            "Article number, e.g. 제1조, 제2조의2, 제3조제1항",
        ),
        FieldSpec::required("concept", FieldType::String, "Core concept of the article"),
        FieldSpec::optional("subject", FieldType::String, "Who bears the duty or right"),
        FieldSpec::optional("action", FieldType::String, "What the subject does or must do"),
        FieldSpec::optional("object", FieldType::String, "What the action is about"),
        FieldSpec::required("full_text", FieldType::String, "The article text as given"),
    ],
};

/// Shape of [`crate::GraphTriplet`]
pub const GRAPH_TRIPLET: OutputSchema = OutputSchema {
    name: "GraphTriplet",
    fields: &[
        FieldSpec::required("subject", FieldType::String, "Source concept"),
        FieldSpec::required("relation", FieldType::String, "Relation label"),
        FieldSpec::required("object", FieldType::String, "Target concept"),
        FieldSpec::required(
            "article_number",
            FieldType::String,
            "Article the relation was found in",
        ),
        FieldSpec::optional("confidence", FieldType::Number, "Certainty between 0.0 and 1.0"),
    ],
};

impl OutputSchema {
    /// JSON-schema style description of a single object
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({
                    "type": field.field_type.as_str(),
                    "description": field.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Format instructions appended to a prompt
    ///
    /// With `as_list` the model is asked for a JSON array of objects.
    pub fn format_instructions(&self, as_list: bool) -> String {
        let schema = if as_list {
            json!({ "type": "array", "items": self.to_json_schema() })
        } else {
            self.to_json_schema()
        };

        let shape = if as_list {
            format!("a JSON array of {} objects", self.name)
        } else {
            format!("a single JSON object ({}), not an array", self.name)
        };

        format!(
            "The output must be {shape} conforming to this JSON schema:\n```\n{}\n```\nReturn only the JSON, without commentary.",
            serde_json::to_string_pretty(&schema).unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_schema_required_fields() {
        let schema = LEGAL_ENTITY.to_json_schema();
        let required = schema["required"].as_array().unwrap();

        assert_eq!(required.len(), 3);
        assert!(required.contains(&json!("full_text")));
        assert!(!required.contains(&json!("subject")));
    }

    #[test]
    fn test_list_instructions_wrap_in_array() {
        let text = GRAPH_TRIPLET.format_instructions(true);
        assert!(text.contains("JSON array of GraphTriplet"));
        assert!(text.contains("\"type\": \"array\""));
        assert!(text.contains("confidence"));
    }

    #[test]
    fn test_object_instructions_forbid_array() {
        let text = LEGAL_ENTITY.format_instructions(false);
        assert!(text.contains("not an array"));
        assert!(text.contains("article_number"));
    }
}
