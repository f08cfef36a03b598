// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo stacks of executed operators.

use crate::config::DEFAULT_MAX_HISTORY;
use crate::operators::Operator;
use std::collections::VecDeque;

/// Undo and redo stacks
#[derive(Debug)]
pub struct History {
    /// Undo stack
    undo_stack: VecDeque<Box<dyn Operator>>,
    /// Redo stack
    redo_stack: VecDeque<Box<dyn Operator>>,
    /// Maximum history depth, `0` for unbounded
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
        }
    }

    /// Record a freshly executed operator
    pub fn push(&mut self, operator: Box<dyn Operator>) {
        // Clear redo stack
        self.redo_stack.clear();
        self.push_undo(operator);
    }

    /// Put an operator back on the undo stack without touching redo
    pub fn push_undo(&mut self, operator: Box<dyn Operator>) {
        self.undo_stack.push_back(operator);

        // Enforce history limit
        while self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                tracing::debug!(op = dropped.description(), "History limit reached, dropping oldest entry");
            }
        }
    }

    /// Put an operator on the redo stack
    pub fn push_redo(&mut self, operator: Box<dyn Operator>) {
        self.redo_stack.push_back(operator);
    }

    /// Take the most recent operator to undo
    pub fn pop_undo(&mut self) -> Option<Box<dyn Operator>> {
        self.undo_stack.pop_back()
    }

    /// Take the most recent operator to redo
    pub fn pop_redo(&mut self) -> Option<Box<dyn Operator>> {
        self.redo_stack.pop_back()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo description
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|op| op.description())
    }

    /// Get redo description
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|op| op.description())
    }

    /// Descriptions on the undo stack, most recent first
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(|op| op.description()).collect()
    }

    /// Undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum undo depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::scene::Scene;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Operator for Named {
        fn description(&self) -> &str {
            self.0
        }

        fn execute(&mut self, _scene: &mut Scene) -> Result<bool, SceneError> {
            Ok(true)
        }

        fn undo(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
            Ok(())
        }

        fn redo(&mut self, _scene: &mut Scene) -> Result<(), SceneError> {
            Ok(())
        }
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new();
        history.push(Box::new(Named("a")));
        let op = history.pop_undo().unwrap();
        history.push_redo(op);
        assert!(history.can_redo());

        history.push(Box::new(Named("b")));
        assert!(!history.can_redo());
        assert_eq!(history.undo_description(), Some("b"));
    }

    #[test]
    fn test_history_limit() {
        let mut history = History::with_max_depth(2);
        for name in ["a", "b", "c"] {
            history.push(Box::new(Named(name)));
        }
        assert_eq!(history.undo_descriptions(), ["c", "b"]);
    }

    #[test]
    fn test_zero_depth_is_unbounded() {
        let mut history = History::with_max_depth(0);
        for _ in 0..500 {
            history.push(Box::new(Named("x")));
        }
        assert_eq!(history.undo_depth(), 500);
    }
}
