//! Host mutable-slot mechanism.
//!
//! A [`SlotApplier`] owns the actual placeholders a page's output is written
//! into. The coordinator only ever creates, clears and appends to slots; it
//! never removes them, since the host keeps placeholders for the whole
//! session.

use std::cell::RefCell;
use std::rc::Rc;

use crate::element::Element;
use crate::error::SlotError;
use crate::target::TargetId;

pub type SlotHandle = usize;

pub trait SlotApplier {
    fn create_slot(&mut self, target: &TargetId) -> SlotHandle;
    fn clear_slot(&mut self, slot: SlotHandle) -> Result<(), SlotError>;
    fn append(&mut self, slot: SlotHandle, element: Element) -> Result<(), SlotError>;
}

struct MemorySlot {
    target: TargetId,
    elements: Vec<Element>,
}

/// In-memory slots. Clones share storage, so a host can keep one clone for
/// inspection while the session owns another.
#[derive(Clone, Default)]
pub struct MemorySlotApplier {
    slots: Rc<RefCell<Vec<MemorySlot>>>,
}

impl MemorySlotApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Contents of the slot created for `target`, empty if there is none.
    pub fn elements(&self, target: &TargetId) -> Vec<Element> {
        self.slots
            .borrow()
            .iter()
            .find(|slot| slot.target == *target)
            .map(|slot| slot.elements.clone())
            .unwrap_or_default()
    }

    pub fn texts(&self, target: &TargetId) -> Vec<String> {
        self.elements(target)
            .into_iter()
            .filter_map(|element| match element {
                Element::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of elements visible across every slot.
    pub fn visible_elements(&self) -> usize {
        self.slots.borrow().iter().map(|slot| slot.elements.len()).sum()
    }

    pub fn dump(&self) -> String {
        let slots = self.slots.borrow();
        if slots.is_empty() {
            return "(no slots)\n".to_string();
        }
        let mut output = String::new();
        for (handle, slot) in slots.iter().enumerate() {
            output.push_str(&format!("#{handle} {}\n", slot.target));
            for element in &slot.elements {
                output.push_str(&format!("  {element}\n"));
            }
        }
        output
    }
}

impl SlotApplier for MemorySlotApplier {
    fn create_slot(&mut self, target: &TargetId) -> SlotHandle {
        let mut slots = self.slots.borrow_mut();
        slots.push(MemorySlot {
            target: target.clone(),
            elements: Vec::new(),
        });
        slots.len() - 1
    }

    fn clear_slot(&mut self, slot: SlotHandle) -> Result<(), SlotError> {
        let mut slots = self.slots.borrow_mut();
        let entry = slots
            .get_mut(slot)
            .ok_or(SlotError::Missing { handle: slot })?;
        entry.elements.clear();
        Ok(())
    }

    fn append(&mut self, slot: SlotHandle, element: Element) -> Result<(), SlotError> {
        let mut slots = self.slots.borrow_mut();
        let entry = slots
            .get_mut(slot)
            .ok_or(SlotError::Missing { handle: slot })?;
        entry.elements.push(element);
        Ok(())
    }
}
