//! Key case conversion between `snake_case` and `camelCase`.
//!
//! Both directions only accept ASCII letters, digits and underscores. They are
//! deliberately not exact inverses: digits break uppercase runs and repeated
//! or trailing underscores survive as literal `_` characters, so payloads
//! produced by older clients keep decoding to the same field names.

use crate::error::CodecError;

fn check_identifier(value: &str) -> Result<(), CodecError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(CodecError::InvalidIdentifier(value.to_string()))
    }
}

/// Convert a `camelCase` identifier to `snake_case`.
///
/// An uppercase letter opens a new word unless it continues a run of
/// uppercase letters (or starts the string), so `KEY` becomes `key` and
/// `manyKeyWord` becomes `many_key_word`.
pub fn snake_case(value: &str) -> Result<String, CodecError> {
    check_identifier(value)?;
    let mut output = String::with_capacity(value.len() + 4);
    // Start "inside" a run so a leading capital does not emit '_'.
    let mut uppercase = true;

    for c in value.chars() {
        if !c.is_ascii_alphabetic() || c.is_ascii_lowercase() {
            output.push(c);
            uppercase = false;
        } else {
            if !uppercase {
                output.push('_');
            }
            output.push(c.to_ascii_lowercase());
            uppercase = true;
        }
    }

    Ok(output)
}

/// Convert a `snake_case` identifier to `camelCase`.
///
/// Every empty segment (leading, trailing or doubled underscore) is kept as a
/// literal `_`; the first non-empty segment is emitted lowercase and each
/// later segment is capitalised.
pub fn camel_case(value: &str) -> Result<String, CodecError> {
    check_identifier(value)?;
    let lowered = value.to_ascii_lowercase();
    let mut output = String::with_capacity(value.len());
    let mut first_word = true;

    for word in lowered.split('_') {
        if word.is_empty() {
            output.push('_');
        } else if first_word {
            output.push_str(word);
            first_word = false;
        } else {
            let mut chars = word.chars();
            if let Some(head) = chars.next() {
                output.push(head.to_ascii_uppercase());
                output.push_str(chars.as_str());
            }
        }
    }

    // `"".split('_')` yields one empty segment.
    if value.is_empty() {
        output.clear();
    }
    Ok(output)
}
