use prism_ptr::{Ptr, PtrMut};

use crate::info::{BoolLayout, PropertyType};

/// Reads a boolean stored with `layout`.
///
/// # Safety
///
/// `ptr` must point to an initialized value of `layout`.
pub(crate) unsafe fn read_bool(layout: BoolLayout, ptr: Ptr<'_>) -> bool {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match layout {
            BoolLayout::Native(1) => ptr.read::<u8>() != 0,
            BoolLayout::Native(2) => ptr.read::<u16>() != 0,
            BoolLayout::Native(4) => ptr.read::<u32>() != 0,
            BoolLayout::Native(_) => ptr.read::<u64>() != 0,
            BoolLayout::Bitfield { mask } => ptr.read::<u8>() & mask != 0,
        }
    }
}

/// Writes a boolean as `0`/`1`, or sets or clears the bit of a bitfield.
///
/// # Safety
///
/// `ptr` must point to writable storage of `layout`.
pub(crate) unsafe fn write_bool(layout: BoolLayout, mut ptr: PtrMut<'_>, value: bool) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        match layout {
            BoolLayout::Native(1) => ptr.write(u8::from(value)),
            BoolLayout::Native(2) => ptr.write(u16::from(value)),
            BoolLayout::Native(4) => ptr.write(u32::from(value)),
            BoolLayout::Native(_) => ptr.write(u64::from(value)),
            BoolLayout::Bitfield { mask } => {
                let byte = ptr.as_mut::<u8>();
                if value {
                    *byte |= mask;
                } else {
                    *byte &= !mask;
                }
            }
        }
    }
}

/// Inclusive value range of an integer type, enums resolved to their storage.
pub(crate) fn integer_bounds(ty: &PropertyType) -> Option<(i128, i128)> {
    Some(match ty.storage() {
        PropertyType::Byte(_) => (0, u8::MAX as i128),
        PropertyType::Int8 => (i8::MIN as i128, i8::MAX as i128),
        PropertyType::Int16 => (i16::MIN as i128, i16::MAX as i128),
        PropertyType::Int32 => (i32::MIN as i128, i32::MAX as i128),
        PropertyType::Int64 => (i64::MIN as i128, i64::MAX as i128),
        PropertyType::UInt16 => (0, u16::MAX as i128),
        PropertyType::UInt32 => (0, u32::MAX as i128),
        PropertyType::UInt64 => (0, u64::MAX as i128),
        _ => return None,
    })
}

/// Reads an integer at its declared width and signedness.
///
/// Returns `None` if `ty` is not an integer or enum type.
///
/// # Safety
///
/// `ptr` must point to an initialized value of `ty`.
pub(crate) unsafe fn read_integer(ty: &PropertyType, ptr: Ptr<'_>) -> Option<i128> {
    // SAFETY: guaranteed by the caller.
    unsafe {
        Some(match ty.storage() {
            PropertyType::Byte(_) => ptr.read::<u8>() as i128,
            PropertyType::Int8 => ptr.read::<i8>() as i128,
            PropertyType::Int16 => ptr.read::<i16>() as i128,
            PropertyType::Int32 => ptr.read::<i32>() as i128,
            PropertyType::Int64 => ptr.read::<i64>() as i128,
            PropertyType::UInt16 => ptr.read::<u16>() as i128,
            PropertyType::UInt32 => ptr.read::<u32>() as i128,
            PropertyType::UInt64 => ptr.read::<u64>() as i128,
            _ => return None,
        })
    }
}

/// Writes an integer at its declared width.
///
/// Returns `false`, leaving memory untouched, if `ty` is not an integer type
/// or `value` does not fit.
///
/// # Safety
///
/// `ptr` must point to writable storage of `ty`.
pub(crate) unsafe fn write_integer(ty: &PropertyType, ptr: PtrMut<'_>, value: i128) -> bool {
    let Some((min, max)) = integer_bounds(ty) else {
        return false;
    };
    if value < min || value > max {
        return false;
    }
    // SAFETY: guaranteed by the caller, and the value fits the width.
    unsafe {
        match ty.storage() {
            PropertyType::Byte(_) => ptr.write(value as u8),
            PropertyType::Int8 => ptr.write(value as i8),
            PropertyType::Int16 => ptr.write(value as i16),
            PropertyType::Int32 => ptr.write(value as i32),
            PropertyType::Int64 => ptr.write(value as i64),
            PropertyType::UInt16 => ptr.write(value as u16),
            PropertyType::UInt32 => ptr.write(value as u32),
            PropertyType::UInt64 => ptr.write(value as u64),
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use prism_ptr::{Ptr, PtrMut};

    use super::{read_bool, read_integer, write_bool, write_integer};
    use crate::info::{BoolLayout, PropertyType};

    #[test]
    fn bitfield_keeps_neighbours() {
        let mut byte = 0b1010_0000u8;
        let layout = BoolLayout::Bitfield { mask: 0b0000_0100 };
        unsafe {
            write_bool(layout, PtrMut::from_mut(&mut byte), true);
            assert_eq!(byte, 0b1010_0100);
            assert!(read_bool(layout, Ptr::from_ref(&byte)));

            write_bool(layout, PtrMut::from_mut(&mut byte), false);
            assert_eq!(byte, 0b1010_0000);
        }
    }

    #[test]
    fn wide_native_bool_is_logical() {
        let wide = 0x0100u16;
        assert!(unsafe { read_bool(BoolLayout::Native(2), Ptr::from_ref(&wide)) });
    }

    #[test]
    fn integers_keep_declared_width() {
        let mut value = 0u16;
        unsafe {
            assert!(write_integer(&PropertyType::UInt16, PtrMut::from_mut(&mut value), 65535));
            assert!(!write_integer(&PropertyType::UInt16, PtrMut::from_mut(&mut value), 65536));
            assert!(!write_integer(&PropertyType::UInt16, PtrMut::from_mut(&mut value), -1));
            assert_eq!(read_integer(&PropertyType::UInt16, Ptr::from_ref(&value)), Some(65535));
            assert_eq!(read_integer(&PropertyType::Float, Ptr::from_ref(&value)), None);
        }
    }
}
