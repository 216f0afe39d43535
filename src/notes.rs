use std::collections::BTreeMap;

use crate::grid::DayKey;

/// In-memory notes of the session, keyed by day.
///
/// Entries are created on first write and never pruned; writing the empty string is
/// the only way to "delete" a note.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: BTreeMap<DayKey, String>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: DayKey, text: String) {
        self.notes.insert(key, text);
    }

    /// Appends `line` as a new line of the note under `key`.
    pub fn append_line(&mut self, key: DayKey, line: &str) {
        let note = self.notes.entry(key).or_default();
        if !note.is_empty() {
            note.push('\n');
        }
        note.push_str(line);
    }

    pub fn get(&self, key: &DayKey) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    /// Note text, empty for days that were never touched.
    pub fn text(&self, key: &DayKey) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Whether any note has content other than whitespace.
    pub fn has_content(&self) -> bool {
        self.notes.values().any(|note| !note.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DayKey, &str)> {
        self.notes.iter().map(|(key, note)| (key, note.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(y: i32, m: u32, d: u32) -> DayKey {
        DayKey::from(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn set_and_read_back() {
        let mut notes = NoteStore::new();
        notes.set(key(2024, 2, 14), "Hello\nWorld".to_owned());
        assert_eq!(notes.get(&key(2024, 2, 14)), Some("Hello\nWorld"));

        notes.set(key(2024, 2, 14), "".to_owned());
        assert_eq!(notes.text(&key(2024, 2, 14)), "");
        assert_eq!(notes.text(&key(2024, 2, 15)), "");
    }

    #[test]
    fn content_ignores_whitespace() {
        let mut notes = NoteStore::new();
        assert!(!notes.has_content());

        notes.set(key(2024, 1, 1), "  \n\t".to_owned());
        assert!(!notes.has_content());

        notes.set(key(2024, 1, 2), " dentist ".to_owned());
        assert!(notes.has_content());

        notes.set(key(2024, 1, 2), String::new());
        assert!(!notes.has_content());
    }

    #[test]
    fn append_lines() {
        let mut notes = NoteStore::new();
        notes.append_line(key(2024, 3, 1), "first");
        notes.append_line(key(2024, 3, 1), "second");
        assert_eq!(notes.text(&key(2024, 3, 1)), "first\nsecond");
        assert_eq!(notes.iter().count(), 1);
    }
}
