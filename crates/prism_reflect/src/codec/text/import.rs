use alloc::borrow::Cow;

use prism_ptr::PtrMut;

use super::cursor::Cursor;
use super::error::{TextError, invalid, located, out_of_range};

use crate::Diagnostics;
use crate::container::{ArrayViewMut, MapViewMut, SetViewMut};
use crate::info::{EnumDescriptor, PropertyDescriptor, PropertyKind, PropertyType, StructDescriptor};
use crate::ops::{write_bool, write_integer};
use crate::path::PathGuard;
use crate::value::{InterfaceRef, Name, ObjectRef, SoftObjectPath, Text, WeakObjectRef};

/// Imports the whole of `text` into one element of `ty`.
///
/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
pub(crate) unsafe fn import_element(
    ty: &PropertyType,
    ptr: PtrMut<'_>,
    text: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(), TextError> {
    let mut cursor = Cursor::new(text);
    // SAFETY: guaranteed by the caller.
    unsafe { read_element(&mut cursor, ty, ptr, diagnostics, false)? };
    cursor.finish()
}

/// Reads all `array_dim` elements of a property.
///
/// More than one element must be parenthesized. Missing trailing elements
/// keep their value; extra ones are skipped with one warning.
///
/// # Safety
///
/// `container` must hold an initialized instance owning `property`.
pub(super) unsafe fn read_property(
    cursor: &mut Cursor<'_>,
    property: &PropertyDescriptor,
    mut container: PtrMut<'_>,
    diagnostics: &mut Diagnostics,
    nested: bool,
) -> Result<(), TextError> {
    let dim = property.array_dim();
    if dim == 1 {
        // SAFETY: guaranteed by the caller.
        return unsafe {
            let ptr = property.value_ptr_mut(container, 0);
            read_element(cursor, property.ty(), ptr, diagnostics, nested)
        };
    }

    cursor.expect('(', "`(`")?;
    if cursor.eat(')') {
        return Ok(());
    }

    let mut extra = 0usize;
    let mut index = 0;
    loop {
        if index < dim {
            let _guard = PathGuard::index(index);
            // SAFETY: `index < array_dim`.
            unsafe {
                let ptr = property.value_ptr_mut(container.reborrow(), index);
                read_element(cursor, property.ty(), ptr, diagnostics, true)?;
            }
        } else {
            cursor.skip_value()?;
            extra += 1;
        }
        index += 1;
        if cursor.list_separator()? {
            break;
        }
    }

    if extra > 0 {
        diagnostics.warn(format!(
            "ignored {extra} element(s) beyond the array dimension {dim}"
        ));
    }
    Ok(())
}

/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
unsafe fn read_element(
    cursor: &mut Cursor<'_>,
    ty: &PropertyType,
    mut ptr: PtrMut<'_>,
    diagnostics: &mut Diagnostics,
    nested: bool,
) -> Result<(), TextError> {
    // SAFETY (all arms): `ptr` holds a value of `ty`, written as the storage
    // type of its kind.
    match ty {
        PropertyType::Bool(layout) => {
            let token = cursor.token(nested)?;
            let value = parse_bool(token).ok_or_else(|| invalid(PropertyKind::Bool, token))?;
            unsafe { write_bool(*layout, ptr, value) };
        }
        PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
            let token = cursor.token(nested)?;
            unsafe { import_enum(descriptor, ty, ptr, token, diagnostics)? };
        }
        PropertyType::Byte(None)
        | PropertyType::Int8
        | PropertyType::Int16
        | PropertyType::Int32
        | PropertyType::Int64
        | PropertyType::UInt16
        | PropertyType::UInt32
        | PropertyType::UInt64 => {
            let token = cursor.token(nested)?;
            let value = parse_integer(token).ok_or_else(|| invalid(ty.kind(), token))?;
            if !unsafe { write_integer(ty, ptr, value) } {
                return Err(out_of_range(ty.kind(), token));
            }
        }
        PropertyType::Float => {
            let token = cursor.token(nested)?;
            let value = token
                .parse::<f32>()
                .map_err(|_| invalid(PropertyKind::Float, token))?;
            unsafe { ptr.write(value) };
        }
        PropertyType::Double => {
            let token = cursor.token(nested)?;
            let value = token
                .parse::<f64>()
                .map_err(|_| invalid(PropertyKind::Double, token))?;
            unsafe { ptr.write(value) };
        }
        PropertyType::Name => {
            let text = cursor.string(nested)?;
            unsafe { ptr.write(Name::new(&text)) };
        }
        PropertyType::String => {
            let text = cursor.string(nested)?;
            unsafe { *ptr.consume::<String>() = text.into_owned() };
        }
        PropertyType::Text => {
            let text = cursor.string(nested)?;
            unsafe { *ptr.consume::<Text>() = Text::new(text) };
        }
        PropertyType::SoftObject => {
            let quoted = peek_quoted(cursor);
            let text = cursor.string(nested)?;
            let path = if !quoted && is_none(&text) {
                SoftObjectPath::default()
            } else {
                SoftObjectPath::new(text)
            };
            unsafe { *ptr.consume::<SoftObjectPath>() = path };
        }
        PropertyType::Object => {
            let token = cursor.token(nested)?;
            let object = parse_object(token).ok_or_else(|| invalid(PropertyKind::Object, token))?;
            unsafe { ptr.write(object) };
        }
        PropertyType::WeakObject => {
            let weak = match read_pair(cursor, nested)? {
                None => WeakObjectRef::default(),
                Some((a, b)) => match (a.parse::<i32>(), b.parse::<i32>()) {
                    (Ok(index), Ok(serial)) => WeakObjectRef::new(index, serial),
                    _ => return Err(invalid(PropertyKind::WeakObject, &format!("({a},{b})"))),
                },
            };
            unsafe { ptr.write(weak) };
        }
        PropertyType::Interface => {
            let interface = match read_pair(cursor, nested)? {
                None => InterfaceRef::default(),
                Some((a, b)) => match (parse_address(a), parse_address(b)) {
                    (Some(object), Some(interface)) => {
                        InterfaceRef::new(ObjectRef::from_addr(object), interface)
                    }
                    _ => return Err(invalid(PropertyKind::Interface, &format!("({a},{b})"))),
                },
            };
            unsafe { ptr.write(interface) };
        }
        PropertyType::Struct(descriptor) => unsafe {
            read_struct(cursor, descriptor, ptr, diagnostics, nested)?;
        },
        PropertyType::Array(_) => {
            let mut array = unsafe { ArrayViewMut::new(ty, ptr.reborrow()) };
            let element = array.element();
            cursor.expect('(', "`(`")?;
            array.empty();
            if cursor.eat(')') {
                return Ok(());
            }
            loop {
                let index = array.add_default_slot();
                let _guard = PathGuard::index(index);
                unsafe {
                    read_element(cursor, element.ty(), array.element_ptr_mut(index), diagnostics, true)?;
                }
                if cursor.list_separator()? {
                    break;
                }
            }
        }
        PropertyType::Set(_) => {
            let mut set = unsafe { SetViewMut::new(ty, ptr.reborrow()) };
            cursor.expect('(', "`(`")?;
            set.empty();
            let result = fill_set(cursor, &mut set, diagnostics);
            set.rehash();
            result?;
        }
        PropertyType::Map { .. } => {
            let mut map = unsafe { MapViewMut::new(ty, ptr.reborrow()) };
            cursor.expect('(', "`(`")?;
            map.empty();
            let result = fill_map(cursor, &mut map, diagnostics);
            map.rehash();
            result?;
        }
    }
    Ok(())
}

/// Reads `(A=..,B=..)` or the hook token of a struct.
///
/// Unknown fields are skipped with a warning; fields not mentioned keep their
/// value.
///
/// # Safety
///
/// `ptr` must hold an initialized instance of `descriptor`.
unsafe fn read_struct(
    cursor: &mut Cursor<'_>,
    descriptor: &StructDescriptor,
    mut ptr: PtrMut<'_>,
    diagnostics: &mut Diagnostics,
    nested: bool,
) -> Result<(), TextError> {
    if let Some(hooks) = descriptor.text_hooks() {
        let text = if peek_quoted(cursor) {
            cursor.quoted()?
        } else {
            Cow::Borrowed(cursor.token(nested)?)
        };
        // SAFETY: the hooks belong to this descriptor.
        if unsafe { (hooks.import)(&text, ptr) } {
            return Ok(());
        }
        return Err(located(TextError::Rejected {
            structure: descriptor.name().into(),
            text: text.into_owned(),
        }));
    }

    cursor.expect('(', "`(`")?;
    if cursor.eat(')') {
        return Ok(());
    }
    loop {
        let name = cursor.field_name()?;
        match descriptor.field(name) {
            Some(property) => {
                let _guard = PathGuard::field(property);
                // SAFETY: the property belongs to this instance.
                unsafe { read_property(cursor, property, ptr.reborrow(), diagnostics, true)? };
            }
            None => {
                diagnostics.warn(format!(
                    "struct `{}` has no field `{name}`, value ignored",
                    descriptor.name()
                ));
                cursor.skip_value()?;
            }
        }
        if cursor.list_separator()? {
            return Ok(());
        }
    }
}

fn fill_set(
    cursor: &mut Cursor<'_>,
    set: &mut SetViewMut<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<(), TextError> {
    if cursor.eat(')') {
        return Ok(());
    }
    let element = set.element();
    let mut index = 0;
    loop {
        let slot = set.add_default_slot();
        let _guard = PathGuard::index(index);
        // SAFETY: the fresh slot holds an initialized default element.
        let read = unsafe { read_element(cursor, element.ty(), set.element_ptr_mut(slot), diagnostics, true) };
        if let Err(err) = read {
            set.remove_slot(slot);
            return Err(err);
        }
        index += 1;
        if cursor.list_separator()? {
            return Ok(());
        }
    }
}

fn fill_map(
    cursor: &mut Cursor<'_>,
    map: &mut MapViewMut<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<(), TextError> {
    if cursor.eat(')') {
        return Ok(());
    }
    let (key, value) = (map.key(), map.value());
    let mut index = 0;
    loop {
        let slot = map.add_default_slot();
        let _guard = PathGuard::index(index);
        let read = read_pair_into(cursor, map, slot, key.ty(), value.ty(), diagnostics);
        if let Err(err) = read {
            map.remove_slot(slot);
            return Err(err);
        }
        index += 1;
        if cursor.list_separator()? {
            return Ok(());
        }
    }
}

fn read_pair_into(
    cursor: &mut Cursor<'_>,
    map: &mut MapViewMut<'_>,
    slot: usize,
    key: &PropertyType,
    value: &PropertyType,
    diagnostics: &mut Diagnostics,
) -> Result<(), TextError> {
    cursor.expect('(', "`(`")?;
    // SAFETY: the fresh slot holds an initialized default pair.
    unsafe { read_element(cursor, key, map.key_ptr_mut(slot), diagnostics, true)? };
    cursor.expect(',', "`,`")?;
    unsafe { read_element(cursor, value, map.value_ptr_mut(slot), diagnostics, true)? };
    cursor.expect(')', "`)`")
}

/// Numeric text overrides the value. Otherwise the declared name, then the
/// display name with a warning, then the sentinel with a warning.
///
/// # Safety
///
/// `ptr` must hold an initialized value of `ty`.
unsafe fn import_enum(
    descriptor: &EnumDescriptor,
    ty: &PropertyType,
    ptr: PtrMut<'_>,
    text: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(), TextError> {
    let value = if let Some(value) = parse_integer(text) {
        value
    } else if let Some(value) = descriptor.value_of(text) {
        value as i128
    } else if let Some(value) = descriptor.value_of_display_name(text) {
        diagnostics.warn(format!(
            "`{text}` matched enum `{}` by display name",
            descriptor.name()
        ));
        value as i128
    } else {
        let sentinel = descriptor.sentinel();
        diagnostics.warn(format!(
            "`{text}` is not a valid name for enum `{}`, using `{}`",
            descriptor.name(),
            sentinel.name()
        ));
        sentinel.value() as i128
    };

    // SAFETY: guaranteed by the caller.
    if unsafe { write_integer(ty, ptr, value) } {
        Ok(())
    } else {
        Err(out_of_range(ty.kind(), text))
    }
}

/// `None`, or a parenthesized pair of tokens.
fn read_pair<'t>(
    cursor: &mut Cursor<'t>,
    nested: bool,
) -> Result<Option<(&'t str, &'t str)>, TextError> {
    cursor.skip_whitespace();
    if cursor.peek() != Some('(') {
        let token = cursor.token(nested)?;
        return if is_none(token) {
            Ok(None)
        } else {
            Err(cursor.syntax("`None` or `(a,b)`"))
        };
    }
    cursor.expect('(', "`(`")?;
    let a = cursor.token(true)?;
    cursor.expect(',', "`,`")?;
    let b = cursor.token(true)?;
    cursor.expect(')', "`)`")?;
    Ok(Some((a, b)))
}

fn peek_quoted(cursor: &mut Cursor<'_>) -> bool {
    cursor.skip_whitespace();
    cursor.peek() == Some('"')
}

fn is_none(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("null")
}

fn parse_bool(text: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "yes", "on", "1"];
    const FALSE: [&str; 4] = ["false", "no", "off", "0"];
    if TRUE.iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

fn parse_integer(text: &str) -> Option<i128> {
    text.parse::<i128>().ok()
}

fn parse_address(text: &str) -> Option<usize> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    usize::from_str_radix(hex, 16).ok()
}

fn parse_object(text: &str) -> Option<ObjectRef> {
    if is_none(text) {
        Some(ObjectRef::NULL)
    } else {
        parse_address(text).map(ObjectRef::from_addr)
    }
}
