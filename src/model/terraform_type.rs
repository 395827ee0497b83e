//! Recursive Terraform type model.
//!
//! [`TerraformType`] mirrors Terraform's type grammar closely enough to
//! synthesize a representative example value and to emit a JSON Schema
//! fragment for validating user input. Parsing never fails: malformed or
//! unknown expressions degrade to `string`.
//!
//! # Example
//!
//! ```rust
//! use tfinputs::model::{BaseType, TerraformType};
//!
//! let ty = TerraformType::parse("${list(map(string))}", None);
//! assert_eq!(ty.base_type(), BaseType::List);
//! assert_eq!(ty.to_string(), "list(map(string))");
//! assert_eq!(ty.generate_example(), serde_json::json!([{ "key": "example_value" }]));
//! ```

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Nesting depth past which an expression is treated as malformed.
const MAX_TYPE_DEPTH: usize = 64;

/// The discriminant of a [`TerraformType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    String,
    Number,
    Bool,
    List,
    Set,
    Map,
    Object,
}

impl BaseType {
    /// Terraform keyword for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Object => "object",
        }
    }

    /// Whether values of this type are rendered as JSON documents.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map | Self::Object)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a type, with the nested data each variant needs.
///
/// Collections carry an optional element type; a missing element type
/// behaves like `string` for example and schema generation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    String,
    Number,
    Bool,
    List(Option<Box<TerraformType>>),
    Set(Option<Box<TerraformType>>),
    Map(Option<Box<TerraformType>>),
    Object(Vec<ObjectAttribute>),
}

/// A named attribute of an `object(...)` type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttribute {
    pub name: String,
    pub ty: TerraformType,
    /// `false` for attributes declared with `optional(...)`.
    pub required: bool,
}

impl ObjectAttribute {
    #[must_use]
    pub fn required(name: impl Into<String>, ty: TerraformType) -> Self {
        Self { name: name.into(), ty, required: true }
    }

    #[must_use]
    pub fn optional(name: impl Into<String>, ty: TerraformType) -> Self {
        Self { name: name.into(), ty, required: false }
    }
}

/// A Terraform type expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TerraformType {
    kind: TypeKind,
    example_value: Option<Value>,
}

impl Default for TerraformType {
    fn default() -> Self {
        Self::string()
    }
}

impl From<TypeKind> for TerraformType {
    fn from(kind: TypeKind) -> Self {
        Self { kind, example_value: None }
    }
}

impl TerraformType {
    #[must_use]
    pub fn string() -> Self {
        TypeKind::String.into()
    }

    #[must_use]
    pub fn number() -> Self {
        TypeKind::Number.into()
    }

    #[must_use]
    pub fn bool() -> Self {
        TypeKind::Bool.into()
    }

    #[must_use]
    pub fn list(element: Option<TerraformType>) -> Self {
        TypeKind::List(element.map(Box::new)).into()
    }

    #[must_use]
    pub fn set(element: Option<TerraformType>) -> Self {
        TypeKind::Set(element.map(Box::new)).into()
    }

    #[must_use]
    pub fn map(value: Option<TerraformType>) -> Self {
        TypeKind::Map(value.map(Box::new)).into()
    }

    #[must_use]
    pub fn object(attributes: Vec<ObjectAttribute>) -> Self {
        TypeKind::Object(attributes).into()
    }

    /// Overrides the synthesized example with a literal value.
    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example_value = Some(example);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[must_use]
    pub fn base_type(&self) -> BaseType {
        match &self.kind {
            TypeKind::String => BaseType::String,
            TypeKind::Number => BaseType::Number,
            TypeKind::Bool => BaseType::Bool,
            TypeKind::List(_) => BaseType::List,
            TypeKind::Set(_) => BaseType::Set,
            TypeKind::Map(_) => BaseType::Map,
            TypeKind::Object(_) => BaseType::Object,
        }
    }

    /// Element type of a list or set, value type of a map.
    #[must_use]
    pub fn nested_type(&self) -> Option<&TerraformType> {
        match &self.kind {
            TypeKind::List(nested) | TypeKind::Set(nested) | TypeKind::Map(nested) => {
                nested.as_deref()
            }
            _ => None,
        }
    }

    /// Attributes of an object type, in declaration order.
    #[must_use]
    pub fn object_attributes(&self) -> Option<&[ObjectAttribute]> {
        match &self.kind {
            TypeKind::Object(attributes) => Some(attributes),
            _ => None,
        }
    }

    #[must_use]
    pub fn example_value(&self) -> Option<&Value> {
        self.example_value.as_ref()
    }

    /// Parses a raw type expression as produced by the HCL converter.
    ///
    /// `type_info` is an optional structured description used when the
    /// converter emits object attributes as a mapping instead of an
    /// expression string. Unknown or malformed input yields `string`.
    #[must_use]
    pub fn parse(type_str: &str, type_info: Option<&Value>) -> Self {
        parse_expr(type_str, type_info, 0).unwrap_or_else(|| {
            tracing::debug!(type_expr = %type_str, "Malformed type expression, falling back to string");
            Self::string()
        })
    }

    /// Builds a type from the JSON value of a variable's `type` attribute.
    ///
    /// Strings are parsed as expressions. Objects are either structured
    /// descriptions (`{"type": "list", "items": ...}`) or attribute mappings.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        from_json_at_depth(value, 0)
    }

    /// Returns the example override, or synthesizes one from the shape.
    #[must_use]
    pub fn generate_example(&self) -> Value {
        if let Some(example) = &self.example_value {
            return example.clone();
        }
        match &self.kind {
            TypeKind::String => json!("example_value"),
            TypeKind::Number => json!(42),
            TypeKind::Bool => json!(true),
            TypeKind::List(nested) | TypeKind::Set(nested) => match nested {
                Some(element) => json!([element.generate_example()]),
                None => json!(["example"]),
            },
            TypeKind::Map(nested) => match nested {
                Some(value) => json!({ "key": value.generate_example() }),
                None => json!({ "key": "value" }),
            },
            TypeKind::Object(attributes) => {
                let fields: Map<String, Value> = attributes
                    .iter()
                    .map(|attr| (attr.name.clone(), attr.ty.generate_example()))
                    .collect();
                Value::Object(fields)
            }
        }
    }

    /// JSON Schema fragment validating values of this type.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let nested_schema = |nested: &Option<Box<TerraformType>>| {
            nested
                .as_ref()
                .map_or_else(|| json!({ "type": "string" }), |t| t.to_json_schema())
        };

        match &self.kind {
            TypeKind::String => json!({ "type": "string" }),
            TypeKind::Number => json!({ "type": "number" }),
            TypeKind::Bool => json!({ "type": "boolean" }),
            TypeKind::List(nested) | TypeKind::Set(nested) => {
                json!({ "type": "array", "items": nested_schema(nested) })
            }
            TypeKind::Map(nested) => {
                json!({ "type": "object", "additionalProperties": nested_schema(nested) })
            }
            TypeKind::Object(attributes) => {
                let properties: Map<String, Value> = attributes
                    .iter()
                    .map(|attr| (attr.name.clone(), attr.ty.to_json_schema()))
                    .collect();
                let required: Vec<&str> = attributes
                    .iter()
                    .filter(|attr| attr.required)
                    .map(|attr| attr.name.as_str())
                    .collect();
                json!({ "type": "object", "properties": properties, "required": required })
            }
        }
    }
}

impl fmt::Display for TerraformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::String | TypeKind::Number | TypeKind::Bool => {
                f.write_str(self.base_type().as_str())
            }
            TypeKind::List(nested) | TypeKind::Set(nested) | TypeKind::Map(nested) => {
                match nested {
                    Some(inner) => write!(f, "{}({inner})", self.base_type()),
                    None => f.write_str(self.base_type().as_str()),
                }
            }
            TypeKind::Object(attributes) => {
                f.write_str("object({")?;
                for (i, attr) in attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if is_identifier(&attr.name) {
                        f.write_str(&attr.name)?;
                    } else {
                        write!(f, "{:?}", attr.name)?;
                    }
                    if attr.required {
                        write!(f, " = {}", attr.ty)?;
                    } else {
                        write!(f, " = optional({})", attr.ty)?;
                    }
                }
                f.write_str("})")
            }
        }
    }
}

impl Serialize for TerraformType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Strips `${ ... }` wrappers left by the HCL-to-JSON conversion.
pub(crate) fn unwrap_interpolation(raw: &str) -> &str {
    let mut expr = raw.trim();
    while let Some(inner) = expr.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        // `${a} == ${b}` starts and ends with braces but is not one interpolation
        if matching_close(expr, 1) != Some(expr.len() - 1) {
            break;
        }
        expr = inner.trim();
    }
    expr
}

fn parse_expr(raw: &str, type_info: Option<&Value>, depth: usize) -> Option<TerraformType> {
    if depth > MAX_TYPE_DEPTH {
        return None;
    }
    let expr = unwrap_interpolation(raw);

    if let Some(inner) = call_args(expr, "list") {
        return Some(TerraformType::list(Some(parse_expr(inner, type_info, depth + 1)?)));
    }
    if let Some(inner) = call_args(expr, "set") {
        return Some(TerraformType::set(Some(parse_expr(inner, type_info, depth + 1)?)));
    }
    if let Some(inner) = call_args(expr, "map") {
        return Some(TerraformType::map(Some(parse_expr(inner, type_info, depth + 1)?)));
    }

    match expr {
        "string" => return Some(TerraformType::string()),
        "number" => return Some(TerraformType::number()),
        "bool" => return Some(TerraformType::bool()),
        _ => {}
    }

    if let Some(info) = type_info.filter(|info| info.is_object()) {
        return Some(from_json_at_depth(info, depth + 1));
    }

    if let Some(inner) = call_args(expr, "object") {
        return parse_object_body(inner, depth + 1);
    }
    if let Some(inner) = call_args(expr, "tuple") {
        let elements = inner.trim().strip_prefix('[')?.strip_suffix(']')?;
        let first = split_top_level(elements)?.into_iter().next();
        return match first {
            Some(element) => Some(TerraformType::list(Some(parse_expr(element, None, depth + 1)?))),
            None => Some(TerraformType::list(None)),
        };
    }

    match expr {
        "list" => Some(TerraformType::list(None)),
        "set" => Some(TerraformType::set(None)),
        "map" => Some(TerraformType::map(None)),
        "object" => Some(TerraformType::object(Vec::new())),
        "any" => Some(TerraformType::string()),
        other => {
            // Unbalanced input is malformed; anything else is an unknown primitive
            split_top_level(other)?;
            tracing::trace!(type_expr = %other, "Unknown type, using string");
            Some(TerraformType::string())
        }
    }
}

fn from_json_at_depth(value: &Value, depth: usize) -> TerraformType {
    if depth > MAX_TYPE_DEPTH {
        return TerraformType::string();
    }
    match value {
        Value::String(expr) => parse_expr(expr, None, depth).unwrap_or_default(),
        Value::Object(fields) => match fields.get("type") {
            Some(Value::String(base)) => {
                let nested = |key: &str| {
                    fields
                        .get(key)
                        .or_else(|| fields.get("nested_type"))
                        .map(|v| from_json_at_depth(v, depth + 1))
                };
                match unwrap_interpolation(base) {
                    "list" => TerraformType::list(nested("items")),
                    "set" => TerraformType::set(nested("items")),
                    "map" => TerraformType::map(nested("elem")),
                    "object" => {
                        let attributes = fields
                            .get("attributes")
                            .or_else(|| fields.get("nested_type"))
                            .map(|attrs| attributes_from_info(attrs, depth + 1))
                            .unwrap_or_default();
                        TerraformType::object(attributes)
                    }
                    expr => parse_expr(expr, fields.get("nested_type"), depth + 1)
                        .unwrap_or_default(),
                }
            }
            _ => TerraformType::object(attributes_from_info(value, depth + 1)),
        },
        _ => TerraformType::string(),
    }
}

fn attributes_from_info(info: &Value, depth: usize) -> Vec<ObjectAttribute> {
    let Value::Object(fields) = info else {
        return Vec::new();
    };
    fields
        .iter()
        .map(|(name, spec)| {
            let required = spec.get("required").and_then(Value::as_bool).unwrap_or(false);
            ObjectAttribute {
                name: name.clone(),
                ty: from_json_at_depth(spec, depth),
                required,
            }
        })
        .collect()
}

fn parse_object_body(body: &str, depth: usize) -> Option<TerraformType> {
    let fields = body.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut attributes = Vec::new();

    for entry in split_top_level(fields)? {
        let sep = find_top_level(entry, &['=', ':'])?;
        let name = entry[..sep].trim().trim_matches('"');
        if name.is_empty() {
            return None;
        }
        let value = entry[sep + 1..].trim();

        let attribute = match call_args(value, "optional") {
            Some(args) => {
                let inner = split_top_level(args)?.into_iter().next()?;
                ObjectAttribute::optional(name, parse_expr(inner, None, depth + 1)?)
            }
            None => ObjectAttribute::required(name, parse_expr(value, None, depth + 1)?),
        };
        attributes.push(attribute);
    }
    Some(TerraformType::object(attributes))
}

/// Returns the argument text of `name(...)` when the call spans all of `expr`.
fn call_args<'a>(expr: &'a str, name: &str) -> Option<&'a str> {
    let rest = expr.strip_prefix(name)?;
    let open = expr.len() - rest.trim_start().len();
    if !expr[open..].starts_with('(') || !expr.ends_with(')') {
        return None;
    }
    if matching_close(expr, open)? != expr.len() - 1 {
        return None;
    }
    Some(expr[open + 1..expr.len() - 1].trim())
}

/// Byte index of the bracket closing the one at `open`.
fn matching_close(expr: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in expr.char_indices().skip_while(|(i, _)| *i < open) {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas and newlines outside brackets and quotes.
///
/// Returns `None` when brackets or quotes are unbalanced.
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.checked_sub(1)?,
            ',' | '\n' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_string {
        return None;
    }
    parts.push(&s[start..]);
    Some(parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect())
}

fn find_top_level(s: &str, targets: &[char]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && targets.contains(&c) => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
