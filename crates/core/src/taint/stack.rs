use crate::model::{Operand, OperandSet};

/// Stack model that tracks only whether each pushed slot is tainted.
///
/// The top of the stack is the most recent push. Popping an empty stack
/// yields an untainted value: whatever was there was pushed before the block
/// started and is not known to depend on the fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct VirtualStack {
    slots: Vec<bool>,
}

impl VirtualStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the value of `operand`, tainted if it is in `tainted`.
    pub fn push(&mut self, operand: &Operand, tainted: &OperandSet) {
        self.slots.push(tainted.contains_operand(operand));
    }

    /// Push one value computed from several operands (e.g. a memory operand
    /// addressed through them); tainted if any of them is.
    pub fn push_any(&mut self, operands: &OperandSet, tainted: &OperandSet) {
        self.slots.push(operands.intersects(tainted));
    }

    pub fn push_constant(&mut self) {
        self.slots.push(false);
    }

    /// Pop the top slot, returning whether it was tainted.
    pub fn pop(&mut self) -> bool {
        self.slots.pop().unwrap_or(false)
    }

    pub fn has_tainted_elements(&self) -> bool {
        self.slots.iter().any(|tainted| *tainted)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots from bottom to top.
    pub fn slots(&self) -> &[bool] {
        &self.slots
    }
}
