//! Handles onto values owned by the host simulation.
//!
//! The engine never owns the lifetime of a live target: it receives shared
//! handles from a [`LiveTargetResolver`] and writes through them while the
//! corresponding field is bound.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::value_field::Transmission;

/// Shared, cloneable cell mirroring a host-owned value.
pub struct Live<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Live<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// A cell that no host shares; used for engine-owned values such as the
    /// override amount or the stepper size.
    pub fn detached(value: T) -> Self {
        Self::new(value)
    }

    pub fn set(&self, value: T) {
        *self.cell.write() = value;
    }

    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.cell.write(), value)
    }

    pub fn shares_cell_with(&self, other: &Live<T>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Clone> Live<T> {
    pub fn get(&self) -> T {
        self.cell.read().clone()
    }
}

impl<T> Clone for Live<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Default> Default for Live<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Live").field(&*self.cell.read()).finish()
    }
}

/// An external behaviour that an override can switch off while it is active.
pub trait HookSwitch: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

impl HookSwitch for Live<bool> {
    fn set_enabled(&self, enabled: bool) {
        self.set(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.get()
    }
}

/// Capability supplied by the host for locating live targets by path.
///
/// Every lookup is fallible and returns `None` when the host cannot (yet)
/// provide the reference; callers degrade to a no-op instead of failing.
pub trait LiveTargetResolver: Send + Sync {
    fn float(&self, path: &str) -> Option<Live<f32>>;
    fn flag(&self, path: &str) -> Option<Live<bool>>;
    fn array(&self, path: &str) -> Option<Live<Vec<f32>>>;
    fn transmission(&self, path: &str) -> Option<Live<Transmission>>;
    fn hook(&self, path: &str) -> Option<Arc<dyn HookSwitch>>;
    /// Whether the named host subsystem is currently active.
    fn is_ready(&self, subsystem: &str) -> bool;
}
