//! # Composite Keys
//!
//! Keys have the form `U+0000 objectType U+0000 (attribute U+0000)*`, the
//! layout used by Fabric peers. Keys in this namespace can never collide
//! with plain keys, and distinct attribute lists always produce distinct
//! keys because the delimiter is forbidden inside components.

use crate::error::LedgerError;

const DELIMITER: char = '\u{0000}';
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Build a composite key from an object type and its attributes.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidKey`] if the object type is empty or any
/// component contains `U+0000` or `U+10FFFF`.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String, LedgerError> {
    if object_type.is_empty() {
        return Err(LedgerError::InvalidKey(
            "composite key object type must not be empty".to_string(),
        ));
    }
    validate_component(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(DELIMITER);
    key.push_str(object_type);
    key.push(DELIMITER);
    for attr in attributes {
        validate_component(attr)?;
        key.push_str(attr);
        key.push(DELIMITER);
    }
    Ok(key)
}

fn validate_component(component: &str) -> Result<(), LedgerError> {
    if component.contains(DELIMITER) || component.contains(MAX_UNICODE_RUNE) {
        return Err(LedgerError::InvalidKey(format!(
            "component {component:?} contains a reserved code point"
        )));
    }
    Ok(())
}
