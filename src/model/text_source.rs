use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use ropey::Rope;

/// A two-way bound value shared between the external state owner and
/// the reconciliation layer.
///
/// Clones share the same slot. Single-threaded by construction.
pub struct Binding<T> {
    slot: Rc<RefCell<T>>,
}

impl<T> Binding<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(value)),
        }
    }

    /// Replace the bound value.
    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = value;
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.slot.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.slot.borrow_mut()
    }

    /// Whether two bindings refer to the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T: Clone> Binding<T> {
    pub fn get(&self) -> T {
        self.slot.borrow().clone()
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Default> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&*self.slot.borrow()).finish()
    }
}

/// An externally-owned text buffer the surface edits in place.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    rope: Rc<RefCell<Rope>>,
}

impl SharedBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rc::new(RefCell::new(Rope::from_str(text))),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Rope> {
        self.rope.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Rope> {
        self.rope.borrow_mut()
    }

    pub fn text(&self) -> String {
        self.rope.borrow().to_string()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.rope, &other.rope)
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedBuffer({} lines)", self.rope.borrow().len_lines())
    }
}

/// Where the surface's text comes from.
///
/// The variant is fixed for the lifetime of a surface: with `Binding`
/// the surface owns a copy and edits flow back through the binding,
/// with `ExternalBuffer` the surface edits the shared buffer directly.
#[derive(Debug, Clone)]
pub enum TextSource {
    Binding(Binding<String>),
    ExternalBuffer(SharedBuffer),
}

impl TextSource {
    /// The current text, whichever variant is active.
    pub fn text(&self) -> String {
        match self {
            Self::Binding(binding) => binding.get(),
            Self::ExternalBuffer(buffer) => buffer.text(),
        }
    }

    pub const fn is_binding(&self) -> bool {
        matches!(self, Self::Binding(_))
    }
}
