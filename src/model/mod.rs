//! Type and variable models built from converted module files.
//!
//! - [`TerraformType`]: recursive type with example and JSON Schema generation
//! - [`TerraformVariable`]: a module input bound to its type and metadata

mod terraform_type;
mod variable;

pub use terraform_type::{BaseType, ObjectAttribute, TerraformType, TypeKind};
pub use variable::{TerraformVariable, ValidationRule, VariableArgument};
pub(crate) use variable::json_kind;
