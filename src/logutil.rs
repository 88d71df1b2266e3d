//! Logging helpers for persisted text blobs so log lines stay single-line.

use std::fmt::Write;

/// Longest blob preview written to the log.
pub const MAX_PREVIEW: usize = 120;

/// Escape a stored blob for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Other control characters become `\xNN`. Blobs longer than
/// [`MAX_PREVIEW`] characters are cut with an ellipsis and their full
/// length appended.
pub fn preview_blob(blob: &str) -> String {
    let mut out = String::with_capacity(blob.len().min(MAX_PREVIEW) + 16);
    for (count, ch) in blob.chars().enumerate() {
        if count >= MAX_PREVIEW {
            let _ = write!(&mut out, "… ({} chars)", blob.chars().count());
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
