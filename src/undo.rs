//! Undo/Redo history for mask edits.
//!
//! Every edit (stroke, clear, refinement) snapshots the whole mask before it
//! mutates it. Undo swaps the current mask with the most recent snapshot and
//! keeps the replaced mask for redo.

use std::collections::VecDeque;

use crate::constants::HISTORY_CAPACITY;
use crate::mask::RasterMask;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the history stack
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of snapshots kept in each direction
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_history: HISTORY_CAPACITY,
        }
    }
}

// ============================================================================
// History Stack
// ============================================================================

/// Bounded undo/redo log of mask snapshots.
///
/// Maintains two deques:
/// - `history`: states that can be restored by undo (most recent at the back)
/// - `future`: states that can be restored by redo (most recent at the back)
///
/// Both are capped at `max_history`; when full the oldest entry is dropped.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    history: VecDeque<RasterMask>,
    future: VecDeque<RasterMask>,
    config: UndoConfig,
}

impl HistoryStack {
    /// Create a new empty history stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record the state before an edit.
    /// This clears the redo stack (can't redo after a new edit).
    pub fn save_state(&mut self, current: &RasterMask) {
        self.future.clear();
        push_bounded(&mut self.history, current.clone(), self.config.max_history);
        log::debug!("📝 History: saved state ({} undo steps)", self.history.len());
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Replace `current` with the previous state.
    /// Returns false (and leaves `current` alone) if there is nothing to undo.
    pub fn undo(&mut self, current: &mut RasterMask) -> bool {
        let Some(previous) = self.history.pop_back() else {
            return false;
        };
        let replaced = std::mem::replace(current, previous);
        push_bounded(&mut self.future, replaced, self.config.max_history);
        log::debug!("⏪ Undo ({} left)", self.history.len());
        true
    }

    /// Replace `current` with the most recently undone state.
    /// Returns false (and leaves `current` alone) if there is nothing to redo.
    pub fn redo(&mut self, current: &mut RasterMask) -> bool {
        let Some(next) = self.future.pop_back() else {
            return false;
        };
        let replaced = std::mem::replace(current, next);
        push_bounded(&mut self.history, replaced, self.config.max_history);
        log::debug!("⏩ Redo ({} left)", self.future.len());
        true
    }

    /// Drop all undo and redo states.
    /// Used when switching images or categories so history never crosses masks.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.future.clear();
        log::debug!("🗑️ History cleared");
    }

    /// Get the number of snapshots in undo history
    pub fn undo_count(&self) -> usize {
        self.history.len()
    }

    /// Get the number of snapshots in redo history
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }
}

/// Push to the back, evicting from the front once `capacity` is exceeded.
fn push_bounded(deque: &mut VecDeque<RasterMask>, mask: RasterMask, capacity: usize) {
    deque.push_back(mask);
    while deque.len() > capacity {
        deque.pop_front();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Channel;

    fn mask_with_marker(marker: u32) -> RasterMask {
        let mut mask = RasterMask::new(16, 2).unwrap();
        mask.set_pixel(marker % 16, marker / 16, Channel::Foreground.pixel_value());
        mask
    }

    /// Apply an edit the way the session does: snapshot, then mutate.
    fn edit(stack: &mut HistoryStack, current: &mut RasterMask, marker: u32) {
        stack.save_state(current);
        current.set_pixel(marker % 16, marker / 16, Channel::Background.pixel_value());
    }

    #[test]
    fn test_history_stack_basic() {
        let mut stack = HistoryStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        let mut current = mask_with_marker(0);
        let original = current.clone();
        edit(&mut stack, &mut current, 1);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        let edited = current.clone();
        assert!(stack.undo(&mut current));
        assert_eq!(current, original);
        assert!(stack.can_redo());

        assert!(stack.redo(&mut current));
        assert_eq!(current, edited);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut stack = HistoryStack::new();
        let mut current = mask_with_marker(3);
        let before = current.clone();

        assert!(!stack.undo(&mut current));
        assert!(!stack.redo(&mut current));
        assert_eq!(current, before);
    }

    #[test]
    fn test_n_edits_then_n_undos_restore_start() {
        for n in 1..=HISTORY_CAPACITY as u32 {
            let mut stack = HistoryStack::new();
            let mut current = RasterMask::new(16, 2).unwrap();
            let start = current.clone();

            for i in 0..n {
                edit(&mut stack, &mut current, i);
            }
            for _ in 0..n {
                assert!(stack.undo(&mut current));
            }
            assert_eq!(current, start, "failed for {} edits", n);
        }
    }

    #[test]
    fn test_undo_stops_at_oldest_retained_snapshot() {
        let mut stack = HistoryStack::new();
        let mut current = RasterMask::new(16, 2).unwrap();
        let mut states = vec![current.clone()];

        for i in 0..15 {
            edit(&mut stack, &mut current, i);
            states.push(current.clone());
        }
        assert_eq!(stack.undo_count(), HISTORY_CAPACITY);

        let mut undone = 0;
        while stack.undo(&mut current) {
            undone += 1;
        }
        assert_eq!(undone, HISTORY_CAPACITY);
        // 15 edits, 10 undos: back to the state after the 5th edit
        assert_eq!(current, states[5]);
        assert_eq!(stack.redo_count(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut stack = HistoryStack::new();
        let mut current = RasterMask::new(16, 2).unwrap();

        edit(&mut stack, &mut current, 1);
        edit(&mut stack, &mut current, 2);
        stack.undo(&mut current);
        assert!(stack.can_redo());

        edit(&mut stack, &mut current, 3);
        assert!(!stack.can_redo());
        assert!(!stack.redo(&mut current));
    }

    #[test]
    fn test_clear_history_empties_both_stacks() {
        let mut stack = HistoryStack::new();
        let mut current = RasterMask::new(16, 2).unwrap();
        edit(&mut stack, &mut current, 1);
        edit(&mut stack, &mut current, 2);
        stack.undo(&mut current);

        stack.clear_history();
        assert_eq!(stack.undo_count(), 0);
        assert_eq!(stack.redo_count(), 0);
    }

    #[test]
    fn test_custom_capacity() {
        let mut stack = HistoryStack::with_config(UndoConfig { max_history: 3 });
        let mut current = RasterMask::new(16, 2).unwrap();
        for i in 0..5 {
            edit(&mut stack, &mut current, i);
        }
        assert_eq!(stack.undo_count(), 3);
    }
}
