//! Ordinal placeholder substitution (`?N`).

use crate::domain::parameters::ParamValue;
use crate::errors::BindingError;

/// Replaces every `?N` with the string form of `values[N]`.
///
/// Digits are read greedily. Substituted text is not rescanned, and a `?`
/// not followed by a digit is copied as is.
pub fn replace_placeholders(template: &str, values: &[ParamValue]) -> Result<String, BindingError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('?') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        if digits == 0 {
            out.push('?');
            rest = after;
            continue;
        }

        let raw = &after[..digits];
        let index: usize = raw
            .parse()
            .map_err(|_| BindingError::InvalidIndex(raw.to_string()))?;
        let value = values.get(index).ok_or(BindingError::IndexOutOfBounds {
            index,
            len: values.len(),
        })?;

        out.push_str(&value.to_arg_string());
        rest = &after[digits..];
    }

    out.push_str(rest);
    Ok(out)
}
