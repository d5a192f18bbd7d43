//! Upload filename sanitization

use unicode_normalization::UnicodeNormalization;

/// Device names that cannot be used as file names on Windows
const WINDOWS_DEVICE_FILES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a client supplied filename to a safe single path component.
///
/// Accented characters are decomposed (NFKD) and reduced to their ASCII base
/// letters. Separators become underscores, everything outside `[A-Za-z0-9_.-]` is
/// dropped, and leading/trailing dots and underscores are stripped, so the
/// result never contains a directory traversal segment. The result may be
/// empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced
        .split(is_separator_space)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect();
    let mut name = kept.trim_matches(|c: char| c == '.' || c == '_').to_string();

    let stem = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if !name.is_empty() && WINDOWS_DEVICE_FILES.contains(&stem.as_str()) {
        name.insert(0, '_');
    }

    name
}

/// Whitespace plus the ASCII file/group/record/unit separators
fn is_separator_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}
