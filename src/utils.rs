// ABOUTME: Small text helpers for the embedding surface.
// ABOUTME: File-import preview truncation, char-boundary safe.

/// Maximum number of characters of imported file content placed in the
/// composer.
pub const IMPORT_PREVIEW_LIMIT: usize = 500;

/// Build the composer text for an imported file: a filename header and the
/// leading slice of its content.
pub fn import_preview(filename: &str, content: &str) -> String {
    let preview: String = content.chars().take(IMPORT_PREVIEW_LIMIT).collect();
    format!("[File: {}]\n{}...", filename, preview)
}
