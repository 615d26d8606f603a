//! Decoding of submitted draft fields.
//!
//! Form transports deliver values with quotes and backslashes escaped. They
//! are decoded here, at the host boundary, before the synchronizer compares
//! them with stored values.

use revmeta_model::DraftFields;

/// Reverses backslash escaping.
///
/// `\x` becomes `x`, `\\` becomes `\`, `\0` becomes NUL, and a trailing lone
/// backslash is dropped.
pub fn unslash(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(escaped) => out.push(escaped),
            None => {}
        }
    }
    out
}

/// Decodes raw submitted `(key, value)` pairs into draft fields.
pub fn decode_fields<I, K, V>(raw: I) -> DraftFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    raw.into_iter()
        .map(|(k, v)| (k, unslash(v.as_ref())))
        .collect()
}
