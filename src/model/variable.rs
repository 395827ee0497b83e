//! Terraform input variable model.

use super::terraform_type::{unwrap_interpolation, BaseType, TerraformType};
use crate::err;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// A `validation` block attached to a variable. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRule {
    pub condition: String,
    pub error_message: String,
}

/// A module input variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerraformVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: TerraformType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    required: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,
}

/// A variable flattened into a command-line style argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Only present for optional variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl TerraformVariable {
    /// Creates a variable. Requiredness follows from `default`.
    #[must_use]
    pub fn new(name: impl Into<String>, var_type: TerraformType, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            var_type,
            description: None,
            required: default.is_none(),
            default,
            sensitive: false,
            validation_rules: Vec::new(),
        }
    }

    /// Builds a variable from the converted JSON body of a `variable` block.
    ///
    /// A `default` key marks the variable optional even when its value is
    /// `null` or empty. A missing `type` is treated as `string`.
    ///
    /// # Errors
    ///
    /// Returns `VariableDefinition` when the block is not an object or one of
    /// its attributes has the wrong JSON shape.
    pub fn from_raw(name: &str, raw: &Value) -> Result<Self> {
        let invalid = |message: String| {
            err!(VariableDefinition {
                name: name.to_string(),
                message,
            })
        };

        let Value::Object(block) = raw else {
            return Err(invalid(format!("expected an object, found {}", json_kind(raw))));
        };

        let var_type = match block.get("type") {
            None | Some(Value::Null) => TerraformType::string(),
            Some(ty) if ty.is_string() || ty.is_object() => TerraformType::from_json(ty),
            Some(other) => {
                return Err(invalid(format!("'type' must be a string, found {}", json_kind(other))));
            }
        };

        let description = match block.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                return Err(invalid(format!(
                    "'description' must be a string, found {}",
                    json_kind(other)
                )));
            }
        };

        let sensitive = match block.get("sensitive") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => unwrap_interpolation(text) == "true",
            Some(other) => {
                return Err(invalid(format!(
                    "'sensitive' must be a bool, found {}",
                    json_kind(other)
                )));
            }
        };

        let validation_rules = match block.get("validation") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(blocks)) => blocks.iter().filter_map(|b| validation_rule(name, b)).collect(),
            Some(single) if single.is_object() => validation_rule(name, single).into_iter().collect(),
            Some(other) => {
                return Err(invalid(format!(
                    "'validation' must be a block, found {}",
                    json_kind(other)
                )));
            }
        };

        let default = block.get("default").cloned();

        Ok(Self {
            name: name.to_string(),
            var_type,
            description,
            required: default.is_none(),
            default,
            sensitive,
            validation_rules,
        })
    }

    /// Whether the caller must supply a value.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Example value rendered for display.
    ///
    /// Compound types are pretty-printed JSON; primitives are plain text.
    #[must_use]
    pub fn get_example_value(&self) -> String {
        let example = self.var_type.generate_example();
        if self.var_type.base_type().is_compound() {
            serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string())
        } else {
            match example {
                Value::String(text) => text,
                other => other.to_string(),
            }
        }
    }

    /// Human-readable description of the expected input shape.
    #[must_use]
    pub fn get_input_format(&self) -> String {
        let nested = || {
            self.var_type
                .nested_type()
                .map_or_else(|| BaseType::String.to_string(), |t| t.base_type().to_string())
        };
        match self.var_type.base_type() {
            BaseType::Object => self.get_example_value(),
            BaseType::List | BaseType::Set => format!("JSON array of {}s", nested()),
            BaseType::Map => format!("JSON object with string keys and {} values", nested()),
            base => base.to_string(),
        }
    }

    /// Flattens the variable into an argument description.
    #[must_use]
    pub fn to_argument(&self) -> VariableArgument {
        let mut description = self.description.clone().unwrap_or_default();
        if let Some(default) = &self.default {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(&format!("(default: {default})"));
        }

        VariableArgument {
            name: self.name.clone(),
            description,
            required: self.required,
            default: self.default.clone(),
        }
    }
}

fn validation_rule(variable: &str, block: &Value) -> Option<ValidationRule> {
    let Some(condition) = block.get("condition") else {
        tracing::debug!(variable = %variable, "Skipping validation block without a condition");
        return None;
    };
    let condition = match condition {
        Value::String(text) => unwrap_interpolation(text).to_string(),
        other => other.to_string(),
    };
    let error_message = block
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(ValidationRule { condition, error_message })
}

/// Short JSON type name for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_required_inference() {
        let var = TerraformVariable::from_raw("name", &json!({ "type": "${string}" })).unwrap();
        assert!(var.required());

        let var = TerraformVariable::from_raw("name", &json!({ "default": null })).unwrap();
        assert!(!var.required());
        assert_eq!(var.default, Some(Value::Null));

        let var = TerraformVariable::from_raw("name", &json!({ "default": "" })).unwrap();
        assert!(!var.required());
    }

    #[test]
    fn test_missing_type_defaults_to_string() {
        let var = TerraformVariable::from_raw("region", &json!({ "default": "us-east-1" })).unwrap();
        assert_eq!(var.var_type.base_type(), BaseType::String);
    }

    #[test]
    fn test_full_block() {
        let raw = json!({
            "type": "${map(string)}",
            "description": "Resource tags",
            "sensitive": "${true}",
            "validation": [
                { "condition": "${length(var.tags) > 0}", "error_message": "Tags must not be empty." },
                { "error_message": "dangling" }
            ]
        });
        let var = TerraformVariable::from_raw("tags", &raw).unwrap();

        assert_eq!(var.var_type.to_string(), "map(string)");
        assert_eq!(var.description.as_deref(), Some("Resource tags"));
        assert!(var.sensitive);
        assert_eq!(
            var.validation_rules,
            vec![ValidationRule {
                condition: "length(var.tags) > 0".to_string(),
                error_message: "Tags must not be empty.".to_string(),
            }]
        );
    }

    #[test]
    fn test_single_validation_block() {
        let raw = json!({ "validation": { "condition": "${var.x != \"\"}" } });
        let var = TerraformVariable::from_raw("x", &raw).unwrap();
        assert_eq!(var.validation_rules.len(), 1);
        assert_eq!(var.validation_rules[0].error_message, "");
    }

    #[test]
    fn test_structural_errors() {
        let err = TerraformVariable::from_raw("bad", &json!("nope")).unwrap_err();
        assert!(err.to_string().contains("bad"));
        assert!(!err.is_fatal());

        assert!(TerraformVariable::from_raw("bad", &json!({ "description": 12 })).is_err());
        assert!(TerraformVariable::from_raw("bad", &json!({ "type": [1] })).is_err());
        assert!(TerraformVariable::from_raw("bad", &json!({ "sensitive": 1 })).is_err());
    }

    #[test]
    fn test_example_value_rendering() {
        let var = TerraformVariable::new("replicas", TerraformType::number(), None);
        assert_eq!(var.get_example_value(), "42");

        let var = TerraformVariable::new("name", TerraformType::string(), None);
        assert_eq!(var.get_example_value(), "example_value");

        let var = TerraformVariable::new("zones", TerraformType::parse("list(string)", None), None);
        assert_eq!(var.get_example_value(), "[\n  \"example_value\"\n]");
    }

    #[test]
    fn test_input_format() {
        let list = TerraformVariable::new("a", TerraformType::parse("list(number)", None), None);
        assert_eq!(list.get_input_format(), "JSON array of numbers");

        let map = TerraformVariable::new("b", TerraformType::map(None), None);
        assert_eq!(map.get_input_format(), "JSON object with string keys and string values");

        let flag = TerraformVariable::new("c", TerraformType::bool(), None);
        assert_eq!(flag.get_input_format(), "bool");

        let object = TerraformVariable::new("d", TerraformType::parse("object({a = bool})", None), None);
        assert_eq!(object.get_input_format(), "{\n  \"a\": true\n}");
    }

    #[test]
    fn test_to_argument() {
        let mut var = TerraformVariable::new("region", TerraformType::string(), Some(json!("us-east-1")));
        var.description = Some("AWS region".to_string());
        let arg = var.to_argument();
        assert_eq!(arg.description, "AWS region (default: \"us-east-1\")");
        assert!(!arg.required);
        assert_eq!(arg.default, Some(json!("us-east-1")));

        let var = TerraformVariable::new("tags", TerraformType::map(None), None);
        let arg = var.to_argument();
        assert!(arg.required);
        assert_eq!(arg.default, None);
        assert_eq!(arg.description, "");
    }
}
