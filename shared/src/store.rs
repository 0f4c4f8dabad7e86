use std::collections::HashMap;

use crate::landmark::{CoordinateId, LandmarkType};

/// The user's classification per coordinate. Unmarked coordinates are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandmarkStore {
    marks: HashMap<CoordinateId, LandmarkType>,
}

impl LandmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coordinate: CoordinateId) -> LandmarkType {
        self.marks.get(&coordinate).copied().unwrap_or_default()
    }

    /// Returns true when the stored value changed.
    pub fn set(&mut self, coordinate: CoordinateId, mark: LandmarkType) -> bool {
        if mark.is_marked() {
            self.marks.insert(coordinate, mark) != Some(mark)
        } else {
            self.marks.remove(&coordinate).is_some()
        }
    }

    /// Church ⇄ unmarked. Any other mark is replaced by church.
    pub fn toggle_church(&mut self, coordinate: CoordinateId) -> LandmarkType {
        let next = match self.get(coordinate) {
            LandmarkType::Church => LandmarkType::Unmarked,
            _ => LandmarkType::Church,
        };
        self.set(coordinate, next);
        next
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn marked_count(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmarked_is_the_default_state() {
        let store = LandmarkStore::new();
        assert_eq!(store.get(42), LandmarkType::Unmarked);
        assert!(store.is_empty());
    }

    #[test]
    fn setting_unmarked_removes_the_entry() {
        let mut store = LandmarkStore::new();
        assert!(store.set(5, LandmarkType::Township));
        assert_eq!(store.marked_count(), 1);
        assert!(store.set(5, LandmarkType::Unmarked));
        assert_eq!(store.marked_count(), 0);
        assert!(!store.set(5, LandmarkType::Unmarked));
    }

    #[test]
    fn absent_is_distinct_from_unmarked() {
        let mut store = LandmarkStore::new();
        store.set(3, LandmarkType::Absent);
        assert_eq!(store.get(3), LandmarkType::Absent);
        assert_eq!(store.marked_count(), 1);
    }

    #[test]
    fn repeated_set_reports_no_change() {
        let mut store = LandmarkStore::new();
        assert!(store.set(9, LandmarkType::Church));
        assert!(!store.set(9, LandmarkType::Church));
        assert!(store.set(9, LandmarkType::SorcererTower));
    }

    #[test]
    fn toggle_church_cycles_between_church_and_unmarked() {
        let mut store = LandmarkStore::new();
        assert_eq!(store.toggle_church(1), LandmarkType::Church);
        assert_eq!(store.toggle_church(1), LandmarkType::Unmarked);
        store.set(1, LandmarkType::Absent);
        assert_eq!(store.toggle_church(1), LandmarkType::Church);
    }
}
