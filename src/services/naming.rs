//! File name handling for uploads: sanitizing client names, the extension
//! filter, and the on-disk naming scheme.

/// Suffix every uploaded file name must end with (compared case-insensitively).
pub const ALLOWED_SUFFIX: &str = ".txt.gz";

/// Reduce a client-supplied file name to a single safe path component.
///
/// Keeps only the last segment after `/` or `\` (trailing separators are
/// ignored, like a basename) and replaces each whitespace run with one `_`.
/// Nothing else is filtered. An empty input yields an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let trimmed = name.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);

    let mut out = String::with_capacity(base.len());
    let mut in_space = false;
    for c in base.chars() {
        if is_space(c) {
            if !in_space {
                out.push('_');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Whitespace as the upload clients' `\s` class sees it: Unicode White_Space
/// minus NEL (U+0085), plus the byte-order mark (U+FEFF).
fn is_space(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// True when `name` ends with `.txt.gz`, ignoring ASCII case.
pub fn has_allowed_extension(name: &str) -> bool {
    let suffix_len = ALLOWED_SUFFIX.len();
    name.len() >= suffix_len
        && name.is_char_boundary(name.len() - suffix_len)
        && name[name.len() - suffix_len..].eq_ignore_ascii_case(ALLOWED_SUFFIX)
}

/// `<epoch-millis>-<sanitized name>`
pub fn stored_file_name(epoch_millis: i64, original_name: &str) -> String {
    format!("{}-{}", epoch_millis, sanitize_filename(original_name))
}
