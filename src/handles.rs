// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Integer handles for backend objects.

Recorded commands refer to textures, buffers, programs and friends by a small integer rather than
by reference, so a command buffer stays plain bytes.  At replay time each integer is resolved
through a [HandleTable].

There is one table per object kind.  Handles carry their kind in the type, so a texture handle
cannot be looked up in the buffer table, but the integer values of two kinds are unrelated and
may well coincide.
*/

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::NonZeroU32;

/**
An opaque reference to a live object of kind `T`.

Values start at 1 and grow monotonically per table; 0 is never issued.
*/
pub struct Handle<T> {
    id: NonZeroU32,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Reconstructs a handle from its encoded value, or `None` for the reserved value 0.
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(|id| Handle {
            id,
            _kind: PhantomData,
        })
    }

    /// The integer value used in the command wire format.
    pub fn raw(&self) -> u32 {
        self.id.get()
    }
}

// Boilerplate implementations; derive would put bounds on T.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = std::any::type_name::<T>().rsplit("::").next().unwrap_or("?");
        write!(f, "Handle<{}>({})", kind, self.id)
    }
}

/**
Maps handles to owned objects of one kind.

The table does not reference-count.  Whoever allocated a handle is responsible for releasing it
exactly once; the object is handed back on release so the caller can tear it down.
*/
#[derive(Debug)]
pub struct HandleTable<T> {
    mapping: HashMap<u32, T>,
    next_id: u32,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        HandleTable {
            mapping: HashMap::new(),
            next_id: 1,
        }
    }

    /// Stores `object` under a fresh handle.
    pub fn allocate(&mut self, object: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .expect("handle space exhausted for this object kind");
        self.mapping.insert(id, object);
        Handle::from_raw(id).expect("handle counter starts at 1")
    }

    /**
    Removes the mapping and returns the object.

    # Panics
    If the handle is not currently allocated in this table.
    */
    pub fn release(&mut self, handle: Handle<T>) -> T {
        match self.mapping.remove(&handle.raw()) {
            Some(object) => object,
            None => panic!("release of a handle that is not live: {:?}", handle),
        }
    }

    /**
    Resolves a handle.

    Looking up a released or never-allocated handle is a programming error.

    # Panics
    If the handle is not currently allocated in this table.
    */
    pub fn get(&self, handle: Handle<T>) -> &T {
        match self.mapping.get(&handle.raw()) {
            Some(object) => object,
            None => panic!("lookup of a handle that is not live: {:?}", handle),
        }
    }

    /// Mutable version of [Self::get].
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.mapping.get_mut(&handle.raw()) {
            Some(object) => object,
            None => panic!("lookup of a handle that is not live: {:?}", handle),
        }
    }

    /// Non-panicking lookup, for debug tooling and tests.
    pub fn try_get(&self, handle: Handle<T>) -> Option<&T> {
        self.mapping.get(&handle.raw())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.mapping.contains_key(&handle.raw())
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
