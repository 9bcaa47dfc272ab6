use core::fmt;

// -----------------------------------------------------------------------------
// ObjectRef

/// An opaque, pointer-sized handle to a live object.
///
/// The engine never dereferences it. The binary archive copies the raw value,
/// which is only meaningful for in-process duplication; JSON writes `null`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectRef(usize);

impl ObjectRef {
    pub const NULL: ObjectRef = ObjectRef(0);

    #[inline]
    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("ObjectRef(null)")
        } else {
            write!(f, "ObjectRef({:#x})", self.0)
        }
    }
}

// -----------------------------------------------------------------------------
// WeakObjectRef

/// A weak handle: slot index plus serial number of the slot's occupant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct WeakObjectRef {
    pub object_index: i32,
    pub serial_number: i32,
}

impl WeakObjectRef {
    #[inline]
    pub const fn new(object_index: i32, serial_number: i32) -> Self {
        Self {
            object_index,
            serial_number,
        }
    }

    /// The default handle, which refers to nothing.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.object_index == 0 && self.serial_number == 0
    }
}

// -----------------------------------------------------------------------------
// SoftObjectPath

/// A lazily resolved object path such as `/Game/Props/Barrel.Barrel`.
///
/// Unlike the other references this is plain data, so every codec keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SoftObjectPath(String);

impl SoftObjectPath {
    #[inline]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SoftObjectPath {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

// -----------------------------------------------------------------------------
// InterfaceRef

/// An object handle plus the address of one of its interface tables.
///
/// JSON has no mapping for it; conversions of structs holding one fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct InterfaceRef {
    pub object: ObjectRef,
    pub interface: usize,
}

impl InterfaceRef {
    #[inline]
    pub const fn new(object: ObjectRef, interface: usize) -> Self {
        Self { object, interface }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.object.is_null()
    }
}
