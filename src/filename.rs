//! Filename safety encoder
//!
//! Turns arbitrary note text into a single path segment that is legal on
//! Windows, macOS and Linux file systems. The encoder is pure and
//! deterministic, and applying it twice gives the same result as applying it
//! once.
//!
//! Output characters are ASCII letters, digits, `-`, `_` and interior `.`.
//! Path separators are never produced, so the result is always one segment.

/// Replacement for any character that is not allowed in a filename
pub const DEFAULT_REPLACEMENT: char = '_';

/// Maximum length of an encoded name before truncation
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Name used when nothing survives encoding
pub const FALLBACK_NAME: &str = "unname_file";

/// Appended to a truncated name so it can be spotted for manual review
pub const TRUNCATION_MARKER: &str = "__";

/// Device names reserved by Windows, with or without an extension
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "NULL", "COM0", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6",
    "COM7", "COM8", "COM9", "LPT0", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8",
    "LPT9",
];

/// Encode `text` with the default replacement character and length limit
///
/// The output uses ASCII letters, digits, `-`, `_` and interior `.`; leading
/// and trailing dots are trimmed.
///
/// # Examples
/// ```
/// use simplenote_export::safe_filename;
///
/// assert_eq!(safe_filename("My Note!!"), "My_Note");
/// assert_eq!(safe_filename("CON"), "CON_");
/// assert_eq!(safe_filename("con.txt"), "con_.txt");
/// assert_eq!(safe_filename(""), "unname_file");
/// assert_eq!(safe_filename("v1.2 notes."), "v1.2_notes");
/// ```
pub fn safe_filename(text: &str) -> String {
    safe_filename_with(text, DEFAULT_REPLACEMENT, DEFAULT_MAX_LENGTH)
}

/// Encode `text` into a cross-platform filename
///
/// # Arguments
/// * `text` - Arbitrary input, expected to be a single line
/// * `replacement` - Character substituted for anything not allowed
/// * `max_length` - Names longer than this are cut and get [`TRUNCATION_MARKER`]
///
/// # Returns
/// A non-empty name. Reserved device names get a separator appended
/// (`CON` becomes `CON_`, `con.txt` becomes `con_.txt`).
pub fn safe_filename_with(text: &str, replacement: char, max_length: usize) -> String {
    if is_truncated_form(text, replacement, max_length) {
        return text.to_string();
    }

    let collapsed = replace_and_collapse(text, replacement);
    let trimmed = collapsed.trim_matches(|c| is_separator(c, replacement) || c == '.');
    let named = if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    };
    let guarded = guard_reserved(named, replacement);

    if guarded.chars().count() > max_length {
        let mut truncated: String = guarded.chars().take(max_length).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        guarded
    }
}

/// Whether the encoded name was cut and needs manual review
pub fn is_truncated(name: &str, max_length: usize) -> bool {
    name.strip_suffix(TRUNCATION_MARKER)
        .is_some_and(|stem| stem.chars().count() == max_length)
}

fn is_separator(c: char, replacement: char) -> bool {
    c == replacement || c == '-' || c == '_'
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// Substitute disallowed characters and drop separators that follow a separator
fn replace_and_collapse(text: &str, replacement: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_separator = false;
    for c in text.chars() {
        let c = if is_allowed(c) { c } else { replacement };
        let separator = is_separator(c, replacement);
        if separator && last_was_separator {
            continue;
        }
        last_was_separator = separator;
        out.push(c);
    }
    out
}

/// Recognize output that a previous run already truncated
fn is_truncated_form(text: &str, replacement: char, max_length: usize) -> bool {
    let Some(stem) = text.strip_suffix(TRUNCATION_MARKER) else {
        return false;
    };
    stem.chars().count() == max_length
        && stem
            .chars()
            .next()
            .is_some_and(|c| !is_separator(c, replacement) && c != '.')
        && replace_and_collapse(stem, replacement) == stem
}

fn guard_reserved(name: String, replacement: char) -> String {
    let upper = name.to_ascii_uppercase();
    for reserved in RESERVED_NAMES {
        if upper == *reserved {
            let mut guarded = name;
            guarded.push(replacement);
            return guarded;
        }
        if upper.starts_with(reserved) && upper[reserved.len()..].starts_with('.') {
            let (head, tail) = name.split_at(reserved.len());
            return format!("{head}{replacement}{tail}");
        }
    }
    name
}
