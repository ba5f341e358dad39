//! Where a map keeps its values.
//!
//! A [`RobinMap`](crate::RobinMap) stores `(K, P)` pairs in its table, where
//! `P` is one of the two [`ValueSlot`] implementations:
//!
//! - [`Inline<V>`] keeps the value inside the bucket. Robin Hood displacement,
//!   backward shifts and resizes move it along with the key.
//! - [`ValueCell<V>`] keeps the value in its own heap cell and the bucket only
//!   holds the pointer. The value never moves for as long as its key stays in
//!   the map.

use core::alloc::Layout;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::error::Fallibility;
use crate::error::TryReserveError;

mod private {
    pub trait Sealed {}
}

/// Storage for a single map value.
///
/// This trait is sealed; [`Inline`] and [`ValueCell`] are the only
/// implementations.
pub trait ValueSlot<V>: private::Sealed + Sized {
    /// Stores `value`, aborting via [`handle_alloc_error`] if storage cannot
    /// be allocated.
    ///
    /// [`handle_alloc_error`]: alloc::alloc::handle_alloc_error
    fn new(value: V) -> Self;

    /// Stores `value`, reporting allocation failure instead of aborting.
    ///
    /// The value is dropped on failure.
    fn try_new(value: V) -> Result<Self, TryReserveError>;

    /// Returns a reference to the stored value.
    fn get(&self) -> &V;

    /// Returns a mutable reference to the stored value.
    fn get_mut(&mut self) -> &mut V;

    /// Consumes the slot, returning the value and releasing any storage.
    fn into_inner(self) -> V;

    /// Replaces the stored value in place, returning the old one.
    #[inline]
    fn replace(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }
}

/// A value stored directly in its bucket.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Inline<V>(V);

impl<V: Debug> Debug for Inline<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl<V> private::Sealed for Inline<V> {}

impl<V> ValueSlot<V> for Inline<V> {
    #[inline(always)]
    fn new(value: V) -> Self {
        Inline(value)
    }

    #[inline(always)]
    fn try_new(value: V) -> Result<Self, TryReserveError> {
        Ok(Inline(value))
    }

    #[inline(always)]
    fn get(&self) -> &V {
        &self.0
    }

    #[inline(always)]
    fn get_mut(&mut self) -> &mut V {
        &mut self.0
    }

    #[inline(always)]
    fn into_inner(self) -> V {
        self.0
    }
}

/// A value stored in its own heap allocation.
///
/// Moving a `ValueCell` moves only the pointer, so [`as_ptr`] stays the same
/// for the cell's whole life. The cell is freed when it is dropped or
/// unwrapped with [`ValueSlot::into_inner`].
///
/// Zero-sized values are not allocated.
///
/// [`as_ptr`]: ValueCell::as_ptr
pub struct ValueCell<V> {
    ptr: NonNull<V>,
    _owns: PhantomData<V>,
}

// SAFETY: The cell uniquely owns its value, like `Box<V>`.
unsafe impl<V: Send> Send for ValueCell<V> {}
// SAFETY: Shared access only hands out `&V`, like `Box<V>`.
unsafe impl<V: Sync> Sync for ValueCell<V> {}

impl<V> ValueCell<V> {
    fn allocate(value: V, fallibility: Fallibility) -> Result<Self, TryReserveError> {
        let layout = Layout::new::<V>();
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: The layout has a non-zero size.
            let raw = unsafe { alloc::alloc::alloc(layout) };
            match NonNull::new(raw.cast::<V>()) {
                Some(ptr) => ptr,
                None => return Err(fallibility.alloc_err(layout)),
            }
        };

        // SAFETY: `ptr` is valid for writes of `V` and suitably aligned.
        unsafe { ptr.as_ptr().write(value) };

        Ok(Self {
            ptr,
            _owns: PhantomData,
        })
    }

    /// Returns the address of the value.
    ///
    /// The pointer is valid until the cell is dropped or unwrapped. It is
    /// only safe to write through it while no reference to the value is
    /// live.
    #[inline]
    pub fn as_ptr(&self) -> NonNull<V> {
        self.ptr
    }

    /// # Safety
    ///
    /// The value must already have been moved out or dropped.
    unsafe fn deallocate(&mut self) {
        let layout = Layout::new::<V>();
        if layout.size() != 0 {
            // SAFETY: Non-zero sized cells were allocated with this layout.
            unsafe { alloc::alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) }
        }
    }
}

impl<V> private::Sealed for ValueCell<V> {}

impl<V> ValueSlot<V> for ValueCell<V> {
    fn new(value: V) -> Self {
        match Self::allocate(value, Fallibility::Infallible) {
            Ok(cell) => cell,
            Err(_) => unreachable!(),
        }
    }

    fn try_new(value: V) -> Result<Self, TryReserveError> {
        Self::allocate(value, Fallibility::Fallible)
    }

    #[inline(always)]
    fn get(&self) -> &V {
        // SAFETY: The cell owns an initialized value.
        unsafe { self.ptr.as_ref() }
    }

    #[inline(always)]
    fn get_mut(&mut self) -> &mut V {
        // SAFETY: The cell owns an initialized value and `&mut self` is
        // unique.
        unsafe { self.ptr.as_mut() }
    }

    fn into_inner(self) -> V {
        let mut this = core::mem::ManuallyDrop::new(self);
        // SAFETY: The value is read out exactly once and the cell is freed
        // without running `Drop`.
        unsafe {
            let value = this.ptr.as_ptr().read();
            this.deallocate();
            value
        }
    }
}

impl<V> Drop for ValueCell<V> {
    fn drop(&mut self) {
        // SAFETY: The value is initialized and dropped exactly once before
        // the cell is freed.
        unsafe {
            core::ptr::drop_in_place(self.ptr.as_ptr());
            self.deallocate();
        }
    }
}

impl<V: Clone> Clone for ValueCell<V> {
    fn clone(&self) -> Self {
        Self::new(self.get().clone())
    }
}

impl<V: Debug> Debug for ValueCell<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.get().fmt(f)
    }
}
