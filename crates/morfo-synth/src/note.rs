//! Inline note identifiers.
//!
//! Hosts identify notes by string ("C4", "pad-3", a MIDI hash) and the
//! engine must carry those keys through the command queue and into voice
//! slots without touching the heap on the render thread. [`NoteId`] stores
//! up to 23 bytes inline and is `Copy`; longer keys are truncated at a
//! character boundary, which keeps distinct short keys distinct and never
//! allocates.

use core::fmt;

const INLINE_CAP: usize = 23;

/// A fixed-capacity, copyable note key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId {
    len: u8,
    bytes: [u8; INLINE_CAP],
}

impl NoteId {
    /// Build from a string, truncating past 23 bytes on a char boundary.
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(INLINE_CAP);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0u8; INLINE_CAP];
        bytes[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self {
            len: end as u8,
            bytes,
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever sliced at validated char boundaries
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    /// True for the empty key (used for vacated voice slots).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self {
            len: 0,
            bytes: [0; INLINE_CAP],
        }
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({:?})", self.as_str())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_keys() {
        let id = NoteId::new("C#4/osc");
        assert_eq!(id.as_str(), "C#4/osc");
    }

    #[test]
    fn truncates_long_keys() {
        let id = NoteId::new("a-very-long-note-identifier-string");
        assert_eq!(id.as_str().len(), 23);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 23 bytes would split the final multibyte char
        let id = NoteId::new("0123456789012345678901é");
        assert!(id.as_str().is_char_boundary(id.as_str().len()));
    }

    #[test]
    fn equality_is_by_content() {
        assert_eq!(NoteId::new("n1"), NoteId::new("n1"));
        assert_ne!(NoteId::new("n1"), NoteId::new("n2"));
    }

    #[test]
    fn default_is_empty() {
        assert!(NoteId::default().is_empty());
        assert_eq!(NoteId::default().as_str(), "");
    }
}
