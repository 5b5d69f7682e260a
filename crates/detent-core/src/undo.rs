//! Undo/redo log for parameter edits.
//!
//! Entries are plain data: replaying one means publishing the recorded
//! values back through the store. Edits made inside a change gesture are
//! grouped into one transaction; nesting is tracked by depth so only the
//! outermost end closes the group.

use std::collections::VecDeque;

/// One recorded change.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// A parameter value changed (plain units, table index).
    Value {
        /// Index into the parameter table.
        index: usize,
        /// Value before the edit.
        before: f64,
        /// Value after the edit.
        after: f64,
    },
    /// The preset was renamed.
    PresetName {
        /// Name before the edit.
        before: String,
        /// Name after the edit.
        after: String,
    },
}

/// Edits undone and redone together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    /// Edits in the order they were made.
    pub edits: Vec<Edit>,
}

impl Transaction {
    fn push(&mut self, edit: Edit) {
        // Consecutive moves of the same parameter collapse into one edit
        if let (
            Some(Edit::Value {
                index: last_index,
                after: last_after,
                ..
            }),
            Edit::Value { index, after, .. },
        ) = (self.edits.last_mut(), &edit)
        {
            if *last_index == *index {
                *last_after = *after;
                return;
            }
        }
        self.edits.push(edit);
    }
}

/// Bounded undo/redo history with gesture grouping.
#[derive(Debug)]
pub struct UndoLog {
    undo_stack: VecDeque<Transaction>,
    redo_stack: Vec<Transaction>,
    max_history: usize,
    group_depth: usize,
    group: Transaction,
}

impl UndoLog {
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: Vec::new(),
            max_history,
            group_depth: 0,
            group: Transaction::default(),
        }
    }

    /// Open (or nest into) a group.
    pub fn begin_group(&mut self) {
        self.group_depth += 1;
    }

    /// Close one nesting level. Returns false if no group was open.
    pub fn end_group(&mut self) -> bool {
        if self.group_depth == 0 {
            return false;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 {
            let group = std::mem::take(&mut self.group);
            if !group.edits.is_empty() {
                self.push_transaction(group);
            }
        }
        true
    }

    /// Whether a gesture group is open.
    pub fn in_group(&self) -> bool {
        self.group_depth > 0
    }

    /// Record an edit. Clears the redo stack.
    pub fn record(&mut self, edit: Edit) {
        self.redo_stack.clear();
        if self.group_depth > 0 {
            self.group.push(edit);
        } else {
            self.push_transaction(Transaction { edits: vec![edit] });
        }
    }

    fn push_transaction(&mut self, transaction: Transaction) {
        while self.undo_stack.len() >= self.max_history {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(transaction);
    }

    /// Move the newest transaction to the redo stack and return it.
    ///
    /// The caller applies each edit's `before` value in reverse order.
    pub fn undo(&mut self) -> Option<Transaction> {
        let transaction = self.undo_stack.pop_back()?;
        self.redo_stack.push(transaction.clone());
        Some(transaction)
    }

    /// Move the newest undone transaction back and return it.
    ///
    /// The caller applies each edit's `after` value in order.
    pub fn redo(&mut self) -> Option<Transaction> {
        let transaction = self.redo_stack.pop()?;
        self.undo_stack.push_back(transaction.clone());
        Some(transaction)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history, including any open group.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group_depth = 0;
        self.group = Transaction::default();
    }
}
