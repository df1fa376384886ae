//! Descent stack.
//!
//! The field-class tree carries no parent pointers; the resolver supplies
//! the ancestor chain itself while it recurses. Each frame borrows one
//! compound class and records the index of the child currently under
//! visit within it, so at any point the stack's indices spell the field
//! path from the current root scope down to the node being resolved.

use tracewalk_meta::{FieldClass, FieldPath, Scope};

/// One stack frame: a compound class and the index of the child currently
/// being visited within it (the element sentinel for arrays and
/// sequences).
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame<'a> {
    pub class: &'a FieldClass,
    pub index: i64,
}

/// The ancestor chain of the field class under visit, outermost first.
#[derive(Debug, Default)]
pub(crate) struct ClassStack<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> ClassStack<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, class: &'a FieldClass) {
        self.frames.push(Frame { class, index: 0 });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn at(&self, index: usize) -> Frame<'a> {
        self.frames[index]
    }

    /// Top frame: the innermost enclosing compound.
    pub fn peek(&self) -> Frame<'a> {
        self.at(self.len() - 1)
    }

    /// Records which child of the top compound is about to be visited.
    pub fn set_top_index(&mut self, index: i64) {
        if let Some(frame) = self.frames.last_mut() {
            frame.index = index;
        }
    }

    /// The field path equivalent of the current descent, rooted at
    /// `root`: the location of the field class under visit.
    pub fn field_path(&self, root: Scope) -> FieldPath {
        let mut path = FieldPath::new(root);
        for frame in &self.frames {
            path.push(frame.index);
        }
        path
    }
}
