//! Single-line text form of properties, as used by data-table cells and
//! diff views.
//!
//! | Kind | Text |
//! |---|---|
//! | Bool | `True` / `False` |
//! | Integers, floats | decimal |
//! | Enum | entry name, or display name on request |
//! | String, Text | as is, quoted with escapes once nested |
//! | Name, SoftObject | as is, quoted only if needed once nested |
//! | Object | `None` or a hex address |
//! | Struct | `(A=1,B="x")`, or the struct's hook text |
//! | Array, Set | `(1,2,3)` |
//! | Map | `((k,v),(k,v))` |
//!
//! A property with `array_dim > 1` is written as `(a,b,c)`. Reading tolerates
//! a length mismatch: missing elements keep their value and extra ones are
//! ignored with a warning.
//!
//! Import never fails on an unknown enum name. It tries a numeric value, the
//! declared name, then the display name with a warning, and finally stores the
//! `_MAX` sentinel with a warning.

// -----------------------------------------------------------------------------
// Modules

mod cursor;
mod error;
mod export;
mod import;

// -----------------------------------------------------------------------------
// Exports

pub use error::{CellError, TextError};

pub(crate) use export::{export_element, export_struct};
pub(crate) use import::import_element;

// -----------------------------------------------------------------------------
// TextOptions

use cursor::Cursor;
use export::write_property;
use import::read_property;

use crate::Diagnostics;
use crate::ops::{AccessError, StructMut, StructRef};
use crate::path::{self, PathGuard};

/// Switches for text export. Import accepts every form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Write enum display names instead of declared names.
    pub display_names: bool,
    /// Write enum values without an entry as their number instead of
    /// `(INVALID)`, so the text can be read back.
    pub raw_values: bool,
    /// Quote strings even at top level.
    pub delimited: bool,
}

// -----------------------------------------------------------------------------
// Entry points

/// Text of the property `property`, all of its fixed-array elements included.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::codec::text::{TextOptions, from_text, to_text};
/// use prism_reflect::info::{PropertyDescriptor, PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
///
/// let stats = Arc::new(
///     StructBuilder::new("Stats")
///         .property(PropertyDescriptor::new("Scores", PropertyType::Int32).with_array_dim(3))
///         .build(),
/// );
/// let mut value = StructInstance::new(stats);
///
/// let diagnostics = from_text(value.view_mut(), "Scores", "(1,2)").unwrap();
/// assert!(diagnostics.is_empty());
///
/// let text = to_text(value.view(), "Scores", &TextOptions::default()).unwrap();
/// assert_eq!(text, "(1,2,0)");
/// ```
pub fn to_text(
    value: StructRef<'_>,
    property: &str,
    options: &TextOptions,
) -> Result<String, TextError> {
    let descriptor = value.descriptor();
    let property = descriptor.field(property).ok_or_else(|| missing(value, property))?;
    let mut out = String::new();
    // SAFETY: the property belongs to this instance.
    unsafe { write_property(&mut out, property, value.as_ptr(), options, options.delimited) };
    Ok(out)
}

/// Reads the property `property` from `text`.
///
/// On error the property may be partially updated.
pub fn from_text(value: StructMut<'_>, property: &str, text: &str) -> Result<Diagnostics, TextError> {
    path::reset();
    let (descriptor, container) = value.into_raw();
    let Some(property) = descriptor.field(property) else {
        return Err(AccessError::MissingField {
            structure: descriptor.name().into(),
            field: property.into(),
        }
        .into());
    };

    let mut diagnostics = Diagnostics::new();
    let _guard = PathGuard::field(property);
    let mut cursor = Cursor::new(text);
    // SAFETY: the property belongs to this instance.
    unsafe { read_property(&mut cursor, property, container, &mut diagnostics, false)? };
    cursor.finish()?;
    Ok(diagnostics)
}

/// Text of element `index` of a property.
pub fn export_text(
    value: StructRef<'_>,
    property: &str,
    index: usize,
    options: &TextOptions,
) -> Result<String, TextError> {
    let (property, ptr) = value.field_ptr(property, index)?;
    // SAFETY: `field_ptr` returns an initialized element of the property.
    Ok(unsafe { export_element(property.ty(), ptr, options) })
}

/// Reads element `index` of a property from `text`.
pub fn import_text(
    mut value: StructMut<'_>,
    property: &str,
    index: usize,
    text: &str,
) -> Result<Diagnostics, TextError> {
    path::reset();
    let (property, ptr) = value.field_ptr_mut(property, index)?;
    let mut diagnostics = Diagnostics::new();
    let _guard = PathGuard::field(property);
    // SAFETY: `field_ptr_mut` returns an initialized element of the property.
    unsafe { import_element(property.ty(), ptr, text, &mut diagnostics)? };
    Ok(diagnostics)
}

/// One `(column, cell)` pair per serialized field, in declaration order.
pub fn export_row<'a>(value: StructRef<'a>, options: &TextOptions) -> Vec<(&'a str, String)> {
    let descriptor = value.descriptor();
    descriptor
        .serialized_fields()
        .map(|property| {
            let mut cell = String::new();
            // SAFETY: the property belongs to this instance.
            unsafe { write_property(&mut cell, property, value.as_ptr(), options, options.delimited) };
            (property.name(), cell)
        })
        .collect()
}

/// Reads a row of `(column, cell)` pairs.
///
/// Every cell is imported on its own. Failed cells, unknown columns
/// included, are collected into [`TextError::Row`] after the whole row was
/// processed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::codec::text::{TextError, import_row};
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
///
/// let row = Arc::new(
///     StructBuilder::new("Row")
///         .field("Health", PropertyType::Int32)
///         .field("Speed", PropertyType::Float)
///         .build(),
/// );
/// let mut value = StructInstance::new(row);
///
/// let result = import_row(value.view_mut(), [("Health", "12"), ("Speed", "fast")]);
/// let Err(TextError::Row(cells)) = result else { panic!() };
/// assert_eq!(cells.len(), 1);
/// assert_eq!(cells[0].field, "Speed");
/// assert_eq!(value.get::<i32>("Health"), Ok(&12));
/// ```
pub fn import_row<I, K, V>(value: StructMut<'_>, cells: I) -> Result<Diagnostics, TextError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    path::reset();
    let (descriptor, mut container) = value.into_raw();
    let mut diagnostics = Diagnostics::new();
    let mut errors = Vec::new();

    for (column, cell) in cells {
        let column = column.as_ref();
        let Some(property) = descriptor.field(column) else {
            errors.push(error::CellError {
                field: column.into(),
                error: AccessError::MissingField {
                    structure: descriptor.name().into(),
                    field: column.into(),
                }
                .into(),
            });
            continue;
        };

        let _guard = PathGuard::field(property);
        let mut cursor = Cursor::new(cell.as_ref());
        // SAFETY: the property belongs to this instance.
        let read = unsafe {
            read_property(&mut cursor, property, container.reborrow(), &mut diagnostics, false)
        };
        if let Err(error) = read.and_then(|()| cursor.finish()) {
            errors.push(error::CellError {
                field: column.into(),
                error,
            });
        }
    }

    if errors.is_empty() {
        Ok(diagnostics)
    } else {
        Err(TextError::Row(errors))
    }
}

fn missing(value: StructRef<'_>, field: &str) -> TextError {
    AccessError::MissingField {
        structure: value.descriptor().name().into(),
        field: field.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use prism_ptr::{Ptr, PtrMut};

    use super::{
        TextError, TextOptions, export_row, export_text, from_text, import_row, import_text,
        to_text,
    };
    use crate::info::{EnumDescriptor, EnumEntry, PropertyDescriptor, PropertyType};
    use crate::info::{StructBuilder, StructDescriptor, StructTextHooks};
    use crate::ops::StructInstance;
    use crate::value::Name;

    #[derive(Default)]
    #[repr(C)]
    struct Color {
        r: u8,
        g: u8,
        b: u8,
    }

    unsafe fn export_color(ptr: Ptr<'_>) -> String {
        let color = unsafe { ptr.as_ref::<Color>() };
        format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
    }

    unsafe fn import_color(text: &str, ptr: PtrMut<'_>) -> bool {
        let Some(hex) = text.strip_prefix('#').filter(|h| h.len() == 6) else {
            return false;
        };
        let Ok(rgb) = u32::from_str_radix(hex, 16) else {
            return false;
        };
        let color = unsafe { ptr.consume::<Color>() };
        color.r = (rgb >> 16) as u8;
        color.g = (rgb >> 8) as u8;
        color.b = rgb as u8;
        true
    }

    fn color() -> Arc<StructDescriptor> {
        Arc::new(
            StructBuilder::new("Color")
                .field("R", PropertyType::Byte(None))
                .field("G", PropertyType::Byte(None))
                .field("B", PropertyType::Byte(None))
                .text_hooks(StructTextHooks {
                    export: export_color,
                    import: import_color,
                })
                .build(),
        )
    }

    fn mood() -> Arc<EnumDescriptor> {
        Arc::new(EnumDescriptor::new(
            "EMood",
            [
                EnumEntry::new("Calm", 0),
                EnumEntry::new("Angry", 1).with_display_name("Furious"),
            ],
        ))
    }

    fn record() -> Arc<StructDescriptor> {
        let point = Arc::new(
            StructBuilder::new("Point")
                .field("X", PropertyType::Int32)
                .field("Label", PropertyType::String)
                .build(),
        );
        Arc::new(
            StructBuilder::new("Record")
                .field("Alive", PropertyType::bool())
                .field("Mood", PropertyType::byte_enum(mood()))
                .field("Title", PropertyType::String)
                .field("Id", PropertyType::Name)
                .field("Origin", PropertyType::structure(point))
                .field("Tint", PropertyType::structure(color()))
                .field("Tags", PropertyType::array(PropertyType::String))
                .field("Ids", PropertyType::set(PropertyType::Int32))
                .field("Costs", PropertyType::map(PropertyType::Name, PropertyType::Double))
                .property(PropertyDescriptor::new("Slots", PropertyType::Int16).with_array_dim(3))
                .build(),
        )
    }

    fn text(value: &StructInstance, property: &str) -> String {
        to_text(value.view(), property, &TextOptions::default()).unwrap()
    }

    #[test]
    fn scalars() {
        let mut value = StructInstance::new(record());
        assert_eq!(text(&value, "Alive"), "False");
        assert_eq!(text(&value, "Id"), "None");

        from_text(value.view_mut(), "Alive", "true").unwrap();
        from_text(value.view_mut(), "Title", "a, \"b\"").unwrap();
        from_text(value.view_mut(), "Id", "Spawn_2").unwrap();

        assert_eq!(value.get_bool("Alive"), Ok(true));
        assert_eq!(text(&value, "Title"), "a, \"b\"");
        assert_eq!(value.get::<Name>("Id"), Ok(&Name::new("Spawn_2")));

        let delimited = TextOptions {
            delimited: true,
            ..TextOptions::default()
        };
        let quoted = to_text(value.view(), "Title", &delimited).unwrap();
        assert_eq!(quoted, r#""a, \"b\"""#);

        let error = from_text(value.view_mut(), "Alive", "maybe").unwrap_err();
        assert!(error.to_string().contains("Alive"), "{error}");
    }

    #[test]
    fn enums() {
        let mut value = StructInstance::new(record());

        let diagnostics = from_text(value.view_mut(), "Mood", "EMood::Angry").unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(text(&value, "Mood"), "Angry");

        let display = TextOptions {
            display_names: true,
            ..TextOptions::default()
        };
        assert_eq!(to_text(value.view(), "Mood", &display).unwrap(), "Furious");

        from_text(value.view_mut(), "Mood", "Calm").unwrap();
        let diagnostics = from_text(value.view_mut(), "Mood", "Furious").unwrap();
        assert_eq!(value.get_enum("Mood"), Ok(Some("Angry")));
        assert_eq!(diagnostics.warnings().count(), 1);

        let diagnostics = from_text(value.view_mut(), "Mood", "Sleepy").unwrap();
        assert_eq!(value.get_enum("Mood"), Ok(Some("EMood_MAX")));
        assert_eq!(diagnostics.warnings().count(), 1);

        from_text(value.view_mut(), "Mood", "7").unwrap();
        assert_eq!(value.get::<u8>("Mood"), Ok(&7));
        assert_eq!(text(&value, "Mood"), "(INVALID)");
        let raw = TextOptions {
            raw_values: true,
            ..TextOptions::default()
        };
        assert_eq!(to_text(value.view(), "Mood", &raw).unwrap(), "7");
    }

    #[test]
    fn fixed_arrays() {
        let mut value = StructInstance::new(record());
        value.set_at("Slots", 2, 9i16).unwrap();

        let diagnostics = from_text(value.view_mut(), "Slots", "(1,2)").unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(text(&value, "Slots"), "(1,2,9)");

        let diagnostics = from_text(value.view_mut(), "Slots", "(4,5,6,7,8)").unwrap();
        assert_eq!(text(&value, "Slots"), "(4,5,6)");
        assert_eq!(diagnostics.warnings().count(), 1);

        assert_eq!(export_text(value.view(), "Slots", 1, &TextOptions::default()).unwrap(), "5");
        import_text(value.view_mut(), "Slots", 1, "-3").unwrap();
        assert_eq!(value.get_at::<i16>("Slots", 1), Ok(&-3));
        assert!(import_text(value.view_mut(), "Slots", 3, "1").is_err());
        assert!(from_text(value.view_mut(), "Slots", "(1,40000)").is_err());
    }

    #[test]
    fn structs_and_containers() {
        let mut value = StructInstance::new(record());
        from_text(value.view_mut(), "Origin", r#"(X=4, Label="(x, y)", Z=1)"#).unwrap();
        assert_eq!(text(&value, "Origin"), r#"(X=4,Label="(x, y)")"#);

        from_text(value.view_mut(), "Tint", "#FF8000").unwrap();
        assert_eq!(text(&value, "Tint"), "#FF8000");
        let error = from_text(value.view_mut(), "Tint", "orange").unwrap_err();
        assert!(matches!(error, TextError::At { .. }), "{error}");

        from_text(value.view_mut(), "Tags", r#"("a", b ,"")"#).unwrap();
        assert_eq!(text(&value, "Tags"), r#"("a","b","")"#);

        from_text(value.view_mut(), "Ids", "(3,1,2,3)").unwrap();
        let ids = value.set_view("Ids").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&1i32) && ids.contains(&2i32) && ids.contains(&3i32));

        from_text(value.view_mut(), "Costs", "((Gold,1.5),(Wood,2))").unwrap();
        let costs = value.map_view("Costs").unwrap();
        assert_eq!(costs.get::<Name, f64>(&Name::new("Wood")), Ok(Some(&2.0)));
        assert_eq!(text(&value, "Costs"), "((Gold,1.5),(Wood,2))");

        assert!(from_text(value.view_mut(), "Ids", "(1,x)").is_err());
        assert_eq!(value.set_view("Ids").unwrap().len(), 1);
    }

    #[test]
    fn struct_text_round_trip() {
        let mut value = StructInstance::new(record());
        from_text(value.view_mut(), "Tags", "(one,two)").unwrap();
        from_text(value.view_mut(), "Mood", "Angry").unwrap();
        value.set_at("Slots", 0, 5i16).unwrap();

        let row = export_row(value.view(), &TextOptions::default());
        assert_eq!(row[0], ("Alive", String::from("False")));

        let mut copy = StructInstance::new(value.descriptor().clone());
        let diagnostics = import_row(copy.view_mut(), row).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(copy, value);
    }

    #[test]
    fn rows_batch_errors() {
        let mut value = StructInstance::new(record());
        let result = import_row(
            value.view_mut(),
            [("Alive", "True"), ("Missing", "1"), ("Slots", "(1,"), ("Title", "ok")],
        );
        let Err(TextError::Row(cells)) = result else {
            panic!("expected row errors");
        };
        let fields: Vec<_> = cells.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["Missing", "Slots"]);
        assert_eq!(value.get_bool("Alive"), Ok(true));
        assert_eq!(value.get::<String>("Title"), Ok(&String::from("ok")));
    }
}
