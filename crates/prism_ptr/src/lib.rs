//! Borrowed, type-erased pointers into instance memory.
//!
//! Property values live inside instances whose layout is only known at runtime,
//! through a descriptor. Code that walks those values needs a pointer that
//! carries no element type but still carries a lifetime, so a value view can
//! never outlive the instance it was computed from.
//!
//! **Ptr** and **PtrMut**
//!
//! [`Ptr<'a>`] and [`PtrMut<'a>`] are type-erased `&T` and `&mut T` equivalents.
//! Offsets are applied in raw bytes with [`byte_add`](Ptr::byte_add), which is
//! how a field pointer is derived from its owning instance:
//! `instance + offset + index * element_size`.
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod type_erased;

// -----------------------------------------------------------------------------
// Top-level exports

pub use type_erased::{Ptr, PtrMut};
