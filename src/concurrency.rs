//! Concurrency policy for the device model.
//!
//! Two policies, chosen once at construction by type parameter, so there is
//! no per-call branching. [`Serialized`] guards every public model
//! operation with a single mutex: full linearizability of the public
//! surface, zero read parallelism. [`Unsynchronized`] replaces the lock
//! with a `RefCell` for exclusive single-owner use; the cell is `!Sync`,
//! so handing an unsynchronized model to another thread is a compile error
//! rather than a data race.
//!
//! Holding a guard across another model call deadlocks under [`Serialized`]
//! and panics under [`Unsynchronized`]; one guard spans one operation.

use parking_lot::{Mutex, MutexGuard};
use std::cell::{RefCell, RefMut};
use std::ops::{Deref, DerefMut};

/// Selects how the device document is guarded.
pub trait Policy {
    type Lock<T>: DocumentLock<T>;
}

/// A lock wrapping the document. Guards release on every exit path,
/// including failure.
pub trait DocumentLock<T> {
    type Guard<'a>: Deref<Target = T> + DerefMut
    where
        Self: 'a,
        T: 'a;

    fn new(value: T) -> Self;
    fn lock(&self) -> Self::Guard<'_>;
    fn into_inner(self) -> T;
}

/// Whole-model mutual exclusion.
pub struct Serialized;

impl Policy for Serialized {
    type Lock<T> = Mutex<T>;
}

impl<T> DocumentLock<T> for Mutex<T> {
    type Guard<'a>
        = MutexGuard<'a, T>
    where
        Self: 'a,
        T: 'a;

    fn new(value: T) -> Self {
        Mutex::new(value)
    }

    fn lock(&self) -> Self::Guard<'_> {
        self.lock()
    }

    fn into_inner(self) -> T {
        Mutex::into_inner(self)
    }
}

/// No locking; valid only for a single exclusive owner with no concurrent
/// callers.
pub struct Unsynchronized;

impl Policy for Unsynchronized {
    type Lock<T> = RefCell<T>;
}

impl<T> DocumentLock<T> for RefCell<T> {
    type Guard<'a>
        = RefMut<'a, T>
    where
        Self: 'a,
        T: 'a;

    fn new(value: T) -> Self {
        RefCell::new(value)
    }

    fn lock(&self) -> Self::Guard<'_> {
        self.borrow_mut()
    }

    fn into_inner(self) -> T {
        RefCell::into_inner(self)
    }
}
