//! Bounded undo/redo history of selection sets.

use std::collections::{BTreeSet, VecDeque};

use crate::types::MbsCode;

/// Maximum number of prior selections kept for undo.
pub const MAX_HISTORY_DEPTH: usize = 50;

/// Undo and redo stacks of selection sets. Only code sets are stored; the
/// manager re-derives full state from whichever set it restores.
#[derive(Debug, Clone, Default)]
pub struct SelectionHistory {
    undo: VecDeque<BTreeSet<MbsCode>>,
    redo: Vec<BTreeSet<MbsCode>>,
}

impl SelectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selection that is about to be replaced. Clears redo.
    pub fn record(&mut self, previous: BTreeSet<MbsCode>) {
        self.push_undo(previous);
        self.redo.clear();
    }

    /// Step back, returning the selection to restore.
    pub fn undo(&mut self, current: &BTreeSet<MbsCode>) -> Option<BTreeSet<MbsCode>> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &BTreeSet<MbsCode>) -> Option<BTreeSet<MbsCode>> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, set: BTreeSet<MbsCode>) {
        self.undo.push_back(set);
        while self.undo.len() > MAX_HISTORY_DEPTH {
            self.undo.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[&str]) -> BTreeSet<MbsCode> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn undo_then_redo() {
        let mut history = SelectionHistory::new();
        history.record(set(&[]));
        let current = set(&["23"]);

        let restored = history.undo(&current).unwrap();
        assert!(restored.is_empty());
        assert!(history.can_redo());

        let again = history.redo(&restored).unwrap();
        assert_eq!(again, current);
        assert!(history.can_undo());
    }

    #[test]
    fn undo_on_empty_history_is_none() {
        let mut history = SelectionHistory::new();
        assert!(history.undo(&set(&["23"])).is_none());
        assert!(!history.can_redo());
    }

    #[test]
    fn record_clears_redo() {
        let mut history = SelectionHistory::new();
        history.record(set(&[]));
        history.undo(&set(&["23"]));
        history.record(set(&[]));
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut history = SelectionHistory::new();
        for i in 0..(MAX_HISTORY_DEPTH + 10) {
            history.record(set(&[&i.to_string()]));
        }
        let mut steps = 0;
        let mut current = set(&[]);
        while let Some(prev) = history.undo(&current) {
            current = prev;
            steps += 1;
        }
        assert_eq!(steps, MAX_HISTORY_DEPTH);
        // Oldest surviving entry is the 11th recorded.
        assert_eq!(current, set(&["10"]));
    }
}
