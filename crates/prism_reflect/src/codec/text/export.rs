use core::fmt::Write;

use prism_ptr::Ptr;

use super::TextOptions;

use crate::container::{ArrayView, MapView, SetView};
use crate::info::{EnumDescriptor, PropertyDescriptor, PropertyType, StructDescriptor};
use crate::ops::{read_bool, read_integer};
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

/// Written for an enum value without an entry.
pub(super) const INVALID_ENUM: &str = "(INVALID)";

/// Text of one element of `ty`.
///
/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
pub(crate) unsafe fn export_element(ty: &PropertyType, ptr: Ptr<'_>, options: &TextOptions) -> String {
    let mut out = String::new();
    // SAFETY: guaranteed by the caller.
    unsafe { write_element(&mut out, ty, ptr, options, options.delimited) };
    out
}

/// `(A=..,B=..)` text of a struct, or its hook text.
///
/// # Safety
///
/// `ptr` must hold an initialized instance of `descriptor`.
pub(crate) unsafe fn export_struct(
    descriptor: &StructDescriptor,
    ptr: Ptr<'_>,
    options: &TextOptions,
) -> String {
    let mut out = String::new();
    // SAFETY: guaranteed by the caller.
    unsafe { write_struct(&mut out, descriptor, ptr, options) };
    out
}

/// Text of all `array_dim` elements of a property, parenthesized when there
/// is more than one.
///
/// # Safety
///
/// `container` must hold an initialized instance owning `property`.
pub(super) unsafe fn write_property(
    out: &mut String,
    property: &PropertyDescriptor,
    container: Ptr<'_>,
    options: &TextOptions,
    nested: bool,
) {
    let dim = property.array_dim();
    // SAFETY (both branches): guaranteed by the caller, `index < array_dim`.
    if dim == 1 {
        unsafe {
            let ptr = property.value_ptr(container, 0);
            write_element(out, property.ty(), ptr, options, nested);
        }
    } else {
        out.push('(');
        for index in 0..dim {
            if index > 0 {
                out.push(',');
            }
            unsafe {
                let ptr = property.value_ptr(container, index);
                write_element(out, property.ty(), ptr, options, true);
            }
        }
        out.push(')');
    }
}

/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
unsafe fn write_element(
    out: &mut String,
    ty: &PropertyType,
    ptr: Ptr<'_>,
    options: &TextOptions,
    nested: bool,
) {
    // SAFETY: every arm reads the storage type of its kind, nested values are
    // reached through their views.
    unsafe {
        match ty {
            PropertyType::Bool(layout) => {
                out.push_str(if read_bool(*layout, ptr) { "True" } else { "False" });
            }
            PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
                let value = read_integer(ty, ptr).unwrap_or_default();
                write_enum(out, descriptor, value, options);
            }
            PropertyType::Byte(None)
            | PropertyType::Int8
            | PropertyType::Int16
            | PropertyType::Int32
            | PropertyType::Int64
            | PropertyType::UInt16
            | PropertyType::UInt32
            | PropertyType::UInt64 => {
                let _ = write!(out, "{}", read_integer(ty, ptr).unwrap_or_default());
            }
            PropertyType::Float => {
                let _ = write!(out, "{}", ptr.read::<f32>());
            }
            PropertyType::Double => {
                let _ = write!(out, "{}", ptr.read::<f64>());
            }
            PropertyType::Name => {
                let name = ptr.read::<Name>().to_string();
                write_token(out, &name, nested);
            }
            PropertyType::String => write_string(out, ptr.as_ref::<String>(), nested),
            PropertyType::Text => write_string(out, ptr.as_ref::<Text>().as_str(), nested),
            PropertyType::SoftObject => {
                let path = ptr.as_ref::<SoftObjectPath>();
                if path.is_null() {
                    out.push_str("None");
                } else {
                    write_token(out, path.as_str(), nested);
                }
            }
            PropertyType::Object => write_object(out, ptr.read::<ObjectRef>()),
            PropertyType::WeakObject => {
                let weak = ptr.read::<WeakObjectRef>();
                if weak.is_null() {
                    out.push_str("None");
                } else {
                    let _ = write!(out, "({},{})", weak.object_index, weak.serial_number);
                }
            }
            PropertyType::Interface => {
                let interface = ptr.read::<InterfaceRef>();
                if interface.is_null() {
                    out.push_str("None");
                } else {
                    let _ = write!(
                        out,
                        "({:#x},{:#x})",
                        interface.object.addr(),
                        interface.interface
                    );
                }
            }
            PropertyType::Struct(descriptor) => write_struct(out, descriptor, ptr, options),
            PropertyType::Array(_) => {
                let array = ArrayView::new(ty, ptr);
                let element = array.element();
                out.push('(');
                for (index, ptr) in array.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    write_element(out, element.ty(), ptr, options, true);
                }
                out.push(')');
            }
            PropertyType::Set(_) => {
                let set = SetView::new(ty, ptr);
                let element = set.element();
                out.push('(');
                for (position, slot) in set.slots().enumerate() {
                    if position > 0 {
                        out.push(',');
                    }
                    write_element(out, element.ty(), set.element_ptr(slot), options, true);
                }
                out.push(')');
            }
            PropertyType::Map { .. } => {
                let map = MapView::new(ty, ptr);
                let (key, value) = (map.key(), map.value());
                out.push('(');
                for (position, slot) in map.slots().enumerate() {
                    if position > 0 {
                        out.push(',');
                    }
                    out.push('(');
                    write_element(out, key.ty(), map.key_ptr(slot), options, true);
                    out.push(',');
                    write_element(out, value.ty(), map.value_ptr(slot), options, true);
                    out.push(')');
                }
                out.push(')');
            }
        }
    }
}

/// # Safety
///
/// `ptr` must hold an initialized instance of `descriptor`.
unsafe fn write_struct(
    out: &mut String,
    descriptor: &StructDescriptor,
    ptr: Ptr<'_>,
    options: &TextOptions,
) {
    if let Some(hooks) = descriptor.text_hooks() {
        // SAFETY: the hooks belong to this descriptor.
        out.push_str(&unsafe { (hooks.export)(ptr) });
        return;
    }

    out.push('(');
    for (position, property) in descriptor.serialized_fields().enumerate() {
        if position > 0 {
            out.push(',');
        }
        out.push_str(property.name());
        out.push('=');
        // SAFETY: the property belongs to this instance.
        unsafe { write_property(out, property, ptr, options, true) };
    }
    out.push(')');
}

fn write_enum(out: &mut String, descriptor: &EnumDescriptor, value: i128, options: &TextOptions) {
    let entry = i64::try_from(value)
        .ok()
        .and_then(|value| descriptor.entry_of(value));
    match entry {
        Some(entry) if options.display_names => out.push_str(entry.display_name()),
        Some(entry) => out.push_str(entry.name()),
        None if options.raw_values => {
            let _ = write!(out, "{value}");
        }
        None => out.push_str(INVALID_ENUM),
    }
}

fn write_object(out: &mut String, object: ObjectRef) {
    if object.is_null() {
        out.push_str("None");
    } else {
        let _ = write!(out, "{:#x}", object.addr());
    }
}

/// Strings are always quoted once nested.
fn write_string(out: &mut String, text: &str, nested: bool) {
    if nested {
        write_quoted(out, text);
    } else {
        out.push_str(text);
    }
}

/// Names and paths are only quoted when they would not read back as one
/// token.
fn write_token(out: &mut String, text: &str, nested: bool) {
    let plain = !text.starts_with(char::is_whitespace)
        && !text.ends_with(char::is_whitespace)
        && !text.contains(['"', ',', '(', ')']);
    if nested && !plain {
        write_quoted(out, text);
    } else {
        out.push_str(text);
    }
}

fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}
