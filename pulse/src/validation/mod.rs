//! JSON Schema validation (Draft 7).
//!
//! Used to check configuration documents before they are deserialized, so
//! a typo in a field name fails loudly instead of silently falling back to
//! a default.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use casting_pulse::validation::validate;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": { "name": { "type": "string" } }
//! });
//!
//! assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
//! assert!(validate(&schema, &json!({ "age": 42 })).is_err());
//! ```

use serde_json::Value;

/// Validate a JSON document against a schema.
///
/// Returns every violation message.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick yes/no check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}
