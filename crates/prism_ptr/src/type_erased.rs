use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

// -----------------------------------------------------------------------------
// Common methods

macro_rules! impl_ptr {
    ($ptr:ident) => {
        impl From<$ptr<'_>> for NonNull<u8> {
            #[inline(always)]
            fn from(ptr: $ptr<'_>) -> Self {
                ptr.0
            }
        }

        impl $ptr<'_> {
            /// Check if the pointer is aligned to type `T`.
            #[inline]
            pub fn is_aligned<T>(&self) -> bool {
                self.0.as_ptr().cast::<T>().is_aligned()
            }

            /// Check if the pointer is aligned to `align` bytes.
            #[inline]
            pub fn is_aligned_to(&self, align: usize) -> bool {
                debug_assert!(align.is_power_of_two());
                self.0.as_ptr().addr() & (align - 1) == 0
            }

            /// A function that only checks alignment in debug mode.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub fn debug_assert_aligned<T>(&self) {
                debug_assert!(
                    self.is_aligned::<T>(),
                    "pointer is not aligned. Address {:p} does not have alignment {} for type {}",
                    self.0,
                    align_of::<T>(),
                    core::any::type_name::<T>(),
                );
            }

            /// Calculates the offset from a pointer.
            ///
            /// As the pointer is type-erased, `count` parameter is in raw bytes.
            ///
            /// # Safety
            /// - The offset cannot make the existing ptr null or invalid target.
            /// - The resulting pointer must stay inside the allocation the pointer
            ///   was derived from.
            #[inline]
            pub const unsafe fn byte_add(self, count: usize) -> Self {
                Self(
                    // SAFETY: The caller upholds safety for `add` and ensures the result is not null.
                    unsafe { self.0.add(count) },
                    PhantomData,
                )
            }
        }

        impl fmt::Pointer for $ptr<'_> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Pointer::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $ptr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ptr), self.0)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Ptr

/// A fully type-erased pointer, similar to `&'a dyn Any`.
///
/// The element type is described elsewhere (usually by a property descriptor),
/// so alignment cannot be checked statically. Accessors are `unsafe` and the
/// caller must pick the type the memory actually holds.
///
/// Its target must not be changed while this pointer is alive.
///
/// # Examples
///
/// ```
/// # use prism_ptr::Ptr;
/// let pair = [3i32, 4i32];
/// let ptr = Ptr::from_ref(&pair);
///
/// let second = unsafe { ptr.byte_add(4).as_ref::<i32>() };
/// assert_eq!(*second, 4);
/// ```
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<u8>, PhantomData<&'a u8>);

impl_ptr!(Ptr);

impl<'a> Ptr<'a> {
    /// Create a `Ptr` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    ///
    /// - The provided lifetime `'a` must be valid for the pointee.
    /// - `ptr` must point to a valid object of the intended pointee type.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> Ptr<'a> {
        Ptr(ptr, PhantomData)
    }

    /// Creates a `Ptr` from a reference with same lifetime.
    #[inline(always)]
    pub const fn from_ref<T: ?Sized>(val: &'a T) -> Ptr<'a> {
        Ptr(NonNull::from_ref(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Convert this [`Ptr`] into a `&T` with the same lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `Ptr` points to a valid object.
    /// - `T` must match the actual type of the pointee.
    /// - `Ptr` must be properly aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(self) -> &'a T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }

    /// Reads a bitwise copy of the pointee.
    ///
    /// # Safety
    ///
    /// Same as [`as_ref`](Self::as_ref).
    #[inline(always)]
    pub const unsafe fn read<T: Copy>(self) -> T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { ptr::read(self.0.as_ptr().cast::<T>()) }
    }
}

impl<'a, T: ?Sized> From<&'a T> for Ptr<'a> {
    #[inline]
    fn from(val: &'a T) -> Self {
        Self::from_ref(val)
    }
}

// -----------------------------------------------------------------------------
// PtrMut

/// A fully type-erased pointer, similar to `&'a mut dyn Any`.
///
/// It cannot be cloned. Use [`reborrow`](Self::reborrow) to hand a shorter
/// lived copy to a callee and [`borrow`](Self::borrow) to read through it.
///
/// # Examples
///
/// ```
/// # use prism_ptr::PtrMut;
/// let mut x = 8i32;
/// let mut ptr = PtrMut::from_mut(&mut x);
///
/// ptr.debug_assert_aligned::<i32>();
/// let rx = unsafe { ptr.as_mut::<i32>() };
/// *rx += 2;
/// assert_eq!(x, 10);
/// ```
#[repr(transparent)]
pub struct PtrMut<'a>(NonNull<u8>, PhantomData<&'a mut u8>);

impl_ptr!(PtrMut);

impl<'a> PtrMut<'a> {
    /// Create a `PtrMut` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    ///
    /// - The data pointed to by this `ptr` must be valid for writes.
    /// - The provided lifetime `'a` must be valid for the pointee.
    /// - No other pointer may access the pointee while this one is alive.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> PtrMut<'a> {
        PtrMut(ptr, PhantomData)
    }

    /// Creates a `PtrMut` from a mutable reference with same lifetime.
    #[inline(always)]
    pub const fn from_mut<T: ?Sized>(val: &'a mut T) -> PtrMut<'a> {
        PtrMut(NonNull::from_mut(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Get a `&T` with the lifetime of `&self`.
    ///
    /// # Safety
    /// - Self must be properly aligned for type `T`.
    /// - `T` must be the correct compatible type pointed to by self.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(&self) -> &'_ T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }

    /// Get a `&mut T` with the lifetime of `&mut self`.
    ///
    /// # Safety
    /// - Self must be properly aligned for type `T`.
    /// - `T` must be the correct compatible type pointed to by self.
    #[inline(always)]
    pub const unsafe fn as_mut<T>(&mut self) -> &'_ mut T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &mut *self.0.as_ptr().cast::<T>() }
    }

    /// Gets a [`Ptr`] from self with a **smaller** lifetime.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prism_ptr::{PtrMut, Ptr};
    /// fn peek(ptr: Ptr<'_>) -> i32 { unsafe { ptr.read::<i32>() } }
    ///
    /// let mut x = 5;
    /// let pm = PtrMut::from(&mut x);
    /// assert_eq!(peek(pm.borrow()), 5);
    /// ```
    #[inline(always)]
    pub const fn borrow(&self) -> Ptr<'_> {
        Ptr(self.0, PhantomData)
    }

    /// Gets a [`PtrMut`] from self with a **smaller** lifetime.
    #[inline(always)]
    pub const fn reborrow(&mut self) -> PtrMut<'_> {
        PtrMut(self.0, PhantomData)
    }

    /// Convert this [`PtrMut`] into a `&mut T` with the **same** lifetime.
    ///
    /// # Safety
    /// - Self must be properly aligned for type `T`.
    /// - `T` must be the correct compatible type pointed to by self.
    #[inline(always)]
    pub const unsafe fn consume<T>(self) -> &'a mut T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &mut *self.0.as_ptr().cast::<T>() }
    }

    /// Moves `value` into the pointee without dropping the previous content.
    ///
    /// This is how uninitialized slots are brought to life.
    ///
    /// # Safety
    /// - Self must be properly aligned for type `T` and valid for writes of `size_of::<T>()` bytes.
    /// - Whatever the pointee held before is leaked, not dropped.
    #[inline(always)]
    pub unsafe fn write<T>(self, value: T) {
        // SAFETY: aligned and valid for writes, guaranteed by the caller.
        unsafe { ptr::write(self.0.as_ptr().cast::<T>(), value) }
    }

    /// Sets `count` bytes starting at the pointee to `byte`.
    ///
    /// # Safety
    /// The range `[self, self + count)` must be valid for writes.
    #[inline(always)]
    pub unsafe fn write_bytes(&mut self, byte: u8, count: usize) {
        // SAFETY: the range is valid for writes, guaranteed by the caller.
        unsafe { ptr::write_bytes(self.0.as_ptr(), byte, count) }
    }

    /// Copies `count` bytes from `src` into the pointee.
    ///
    /// # Safety
    /// Both ranges must be valid for `count` bytes and must not overlap.
    #[inline(always)]
    pub unsafe fn copy_from(&mut self, src: Ptr<'_>, count: usize) {
        // SAFETY: valid, non-overlapping ranges, guaranteed by the caller.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), self.0.as_ptr(), count) }
    }
}

impl<'a, T: ?Sized> From<&'a mut T> for PtrMut<'a> {
    #[inline]
    fn from(val: &'a mut T) -> Self {
        Self::from_mut(val)
    }
}

#[cfg(test)]
mod tests {
    use super::{Ptr, PtrMut};

    #[repr(C)]
    struct Pair {
        a: u16,
        b: u32,
    }

    #[test]
    fn field_offsets() {
        let pair = Pair { a: 7, b: 9 };
        let ptr = Ptr::from_ref(&pair);
        let b = unsafe { ptr.byte_add(core::mem::offset_of!(Pair, b)).read::<u32>() };
        assert_eq!(b, 9);
        assert_eq!(unsafe { ptr.read::<u16>() }, 7);
    }

    #[test]
    fn write_and_reborrow() {
        let mut pair = Pair { a: 0, b: 0 };
        let mut ptr = PtrMut::from_mut(&mut pair);
        unsafe {
            ptr.reborrow().write(5u16);
            ptr.reborrow()
                .byte_add(core::mem::offset_of!(Pair, b))
                .write(11u32);
        }
        assert!(ptr.is_aligned_to(4));
        assert_eq!(pair.a, 5);
        assert_eq!(pair.b, 11);
    }

    #[test]
    fn write_bytes_and_copy() {
        let src = [1u8, 2, 3, 4];
        let mut dst = [9u8; 4];
        let mut ptr = PtrMut::from_mut(&mut dst);
        unsafe {
            ptr.write_bytes(0, 4);
            ptr.copy_from(Ptr::from_ref(&src), 2);
        }
        assert_eq!(dst, [1, 2, 0, 0]);
    }
}
