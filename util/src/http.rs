use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched when encoding an RFC 5987 `filename*` value.
const FILENAME_STAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Replaces everything outside printable ASCII with `_`, and drops quotes and backslashes so the
/// value can sit inside a quoted header parameter.
pub fn ascii_header_fallback(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' '..='~' => c,
            _ => '_',
        })
        .collect()
}

/// Builds an inline `Content-Disposition` value.
///
/// `filename` carries an ASCII-only rendering of `fallback`, `filename*` the UTF-8 `file_name`.
pub fn content_disposition(file_name: &str, fallback: &str) -> String {
    let ascii = ascii_header_fallback(fallback);
    let encoded = utf8_percent_encode(file_name, FILENAME_STAR);
    format!("inline; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
