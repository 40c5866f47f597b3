//! Parser for the legacy `Program: <name>` line some waitlist entries carry
//! in their free-text notes instead of a real program reference.
//!
//! Kept apart from the scorer so it can be removed once every entry has an
//! explicit program reference.

const LABEL: &str = "program:";

/// Extract the program name from the first `Program: <name>` line in `notes`.
///
/// The label must start the line (leading whitespace allowed) and is matched
/// case-insensitively. Returns `None` when no line carries the label or the
/// name after it is blank.
pub fn parse_program_name(notes: &str) -> Option<&str> {
    notes.lines().find_map(|line| {
        let line = line.trim_start();
        let head = line.get(..LABEL.len())?;
        if !head.eq_ignore_ascii_case(LABEL) {
            return None;
        }
        let name = line[LABEL.len()..].trim();
        (!name.is_empty()).then_some(name)
    })
}

/// True when `notes` names `program_name` through the legacy label.
pub fn notes_reference_program(notes: &str, program_name: &str) -> bool {
    let wanted = program_name.trim();
    if wanted.is_empty() {
        return false;
    }
    parse_program_name(notes)
        .map(|name| name.to_lowercase() == wanted.to_lowercase())
        .unwrap_or(false)
}
