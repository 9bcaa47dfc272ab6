use alloc::sync::Arc;

use prism_utils::hash::HashMap;

use super::RegistrationError;
use crate::info::{EnumDescriptor, PropertyDescriptor, PropertyType, StructDescriptor};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of struct and enum descriptors, keyed by name.
///
/// Build it once at startup and share it read-only afterwards. Conversions
/// never mutate it.
///
/// Registering a struct also registers the structs and enums it refers to,
/// through fields and container elements alike. Names already taken by a
/// dependency are kept as they are.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use prism_reflect::info::{EnumDescriptor, PropertyType, StructBuilder};
/// use prism_reflect::registry::TypeRegistry;
///
/// let state = Arc::new(EnumDescriptor::from_names("EMoveState", ["Idle", "Run"]));
/// let player = StructBuilder::new("Player")
///     .field("State", PropertyType::byte_enum(state))
///     .build();
///
/// let mut registry = TypeRegistry::new();
/// registry.register_struct(Arc::new(player)).unwrap();
///
/// assert!(registry.get_struct("Player").is_some());
/// // Its dependencies.
/// assert!(registry.get_enum("EMoveState").is_some());
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    structs: HashMap<Box<str>, Arc<StructDescriptor>>,
    enums: HashMap<Box<str>, Arc<EnumDescriptor>>,
    #[cfg(feature = "auto_register")]
    auto_registered: bool,
}

impl TypeRegistry {
    /// Create an empty [`TypeRegistry`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a struct and everything it refers to.
    ///
    /// Registering the same `Arc` twice is a no-op. The registry is left
    /// unchanged on error.
    pub fn register_struct(
        &mut self,
        descriptor: Arc<StructDescriptor>,
    ) -> Result<(), RegistrationError> {
        let mut stack = Vec::new();
        check_recursion(&descriptor, &mut stack)?;

        if let Some(existing) = self.structs.get(descriptor.name()) {
            if Arc::ptr_eq(existing, &descriptor) {
                return Ok(());
            }
            return Err(RegistrationError::AlreadyRegistered {
                what: "struct",
                name: descriptor.name().into(),
            });
        }

        let mut structs = Vec::new();
        let mut enums = Vec::new();
        for field in descriptor.fields() {
            collect_dependencies(field, &mut structs, &mut enums);
        }

        log::debug!(
            "registering struct `{}` with {} fields",
            descriptor.name(),
            descriptor.field_len()
        );
        self.structs.insert(descriptor.name().into(), descriptor);

        for dependency in structs {
            if !self.structs.contains_key(dependency.name()) {
                log::debug!("registering struct dependency `{}`", dependency.name());
                self.structs.insert(dependency.name().into(), dependency);
            }
        }
        for dependency in enums {
            if !self.enums.contains_key(dependency.name()) {
                log::debug!("registering enum dependency `{}`", dependency.name());
                self.enums.insert(dependency.name().into(), dependency);
            }
        }
        Ok(())
    }

    /// Registers an enum. Registering the same `Arc` twice is a no-op.
    pub fn register_enum(&mut self, descriptor: Arc<EnumDescriptor>) -> Result<(), RegistrationError> {
        if let Some(existing) = self.enums.get(descriptor.name()) {
            if Arc::ptr_eq(existing, &descriptor) {
                return Ok(());
            }
            return Err(RegistrationError::AlreadyRegistered {
                what: "enum",
                name: descriptor.name().into(),
            });
        }
        log::debug!(
            "registering enum `{}` with {} entries",
            descriptor.name(),
            descriptor.len()
        );
        self.enums.insert(descriptor.name().into(), descriptor);
        Ok(())
    }

    #[inline]
    pub fn get_struct(&self, name: &str) -> Option<&Arc<StructDescriptor>> {
        self.structs.get(name)
    }

    #[inline]
    pub fn get_enum(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(name)
    }

    #[inline]
    pub fn contains_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    #[inline]
    pub fn contains_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// All registered structs, in no particular order.
    pub fn structs(&self) -> impl Iterator<Item = &Arc<StructDescriptor>> {
        self.structs.values()
    }

    /// All registered enums, in no particular order.
    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumDescriptor>> {
        self.enums.values()
    }

    /// Runs every registration submitted with [`auto_register!`](crate::auto_register).
    ///
    /// Repeated calls do nothing. Failed submissions are logged and skipped.
    ///
    /// ## Return Value
    ///
    /// Returns `true` if at least one submission was collected, now or by an
    /// earlier call. Without the `auto_register` feature this always returns
    /// `false`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use prism_reflect::info::{PropertyType, StructBuilder};
    /// use prism_reflect::registry::{RegistrationError, TypeRegistry};
    ///
    /// fn register_point(registry: &mut TypeRegistry) -> Result<(), RegistrationError> {
    ///     let point = StructBuilder::new("Point").field("X", PropertyType::Int32).build();
    ///     registry.register_struct(Arc::new(point))
    /// }
    /// prism_reflect::auto_register!(register_point);
    ///
    /// let mut registry = TypeRegistry::new();
    /// assert!(registry.auto_register());
    /// assert!(registry.contains_struct("Point"));
    /// ```
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            if self.auto_registered {
                return true;
            }
            for submission in inventory::iter::<AutoRegistration> {
                self.auto_registered = true;
                if let Err(err) = (submission.register)(self) {
                    log::error!("auto registration failed: {err}");
                }
            }
            self.auto_registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

fn check_recursion<'a>(
    descriptor: &'a StructDescriptor,
    stack: &mut Vec<(&'a str, &'a str)>,
) -> Result<(), RegistrationError> {
    for field in descriptor.fields() {
        // Containers own heap storage, only direct struct fields nest by value.
        let PropertyType::Struct(nested) = field.ty() else {
            continue;
        };
        stack.push((descriptor.name(), field.name()));

        if let Some(start) = stack
            .iter()
            .position(|(owner, _)| owner.eq_ignore_ascii_case(nested.name()))
        {
            let path = stack[start..]
                .iter()
                .map(|(owner, field)| format!("{owner}.{field}"))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(RegistrationError::RecursiveStruct {
                name: nested.name().into(),
                path,
            });
        }

        check_recursion(nested, stack)?;
        stack.pop();
    }
    Ok(())
}

fn collect_dependencies(
    property: &PropertyDescriptor,
    structs: &mut Vec<Arc<StructDescriptor>>,
    enums: &mut Vec<Arc<EnumDescriptor>>,
) {
    match property.ty() {
        PropertyType::Byte(Some(descriptor)) | PropertyType::Enum { descriptor, .. } => {
            if !enums.iter().any(|e| Arc::ptr_eq(e, descriptor)) {
                enums.push(descriptor.clone());
            }
        }
        PropertyType::Struct(descriptor) => {
            if !structs.iter().any(|s| Arc::ptr_eq(s, descriptor)) {
                structs.push(descriptor.clone());
                for field in descriptor.fields() {
                    collect_dependencies(field, structs, enums);
                }
            }
        }
        PropertyType::Array(element) | PropertyType::Set(element) => {
            collect_dependencies(element, structs, enums);
        }
        PropertyType::Map { key, value } => {
            collect_dependencies(key, structs, enums);
            collect_dependencies(value, structs, enums);
        }
        _ => {}
    }
}

// -----------------------------------------------------------------------------
// AutoRegistration

/// One submission collected by [`TypeRegistry::auto_register`].
///
/// Created by [`auto_register!`](crate::auto_register).
pub struct AutoRegistration {
    #[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
    register: fn(&mut TypeRegistry) -> Result<(), RegistrationError>,
}

impl AutoRegistration {
    #[inline]
    pub const fn new(register: fn(&mut TypeRegistry) -> Result<(), RegistrationError>) -> Self {
        Self { register }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

/// Submits a registration function for [`TypeRegistry::auto_register`].
///
/// The function has the signature
/// `fn(&mut TypeRegistry) -> Result<(), RegistrationError>`. Without the
/// `auto_register` feature the macro expands to nothing.
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! auto_register {
    ($register:path) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration::new($register)
        }
    };
}

#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! auto_register {
    ($register:path) => {};
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::{RegistrationError, TypeRegistry};
    use crate::info::{EnumDescriptor, PropertyType, StructBuilder};

    #[test]
    fn dependencies_are_registered() {
        let state = Arc::new(EnumDescriptor::from_names("EState", ["A", "B"]));
        let stats = Arc::new(
            StructBuilder::new("Stats")
                .field("State", PropertyType::byte_enum(state.clone()))
                .build(),
        );
        let player = Arc::new(
            StructBuilder::new("Player")
                .field("History", PropertyType::array(PropertyType::structure(stats)))
                .build(),
        );

        let mut registry = TypeRegistry::new();
        registry.register_struct(player.clone()).unwrap();
        assert!(registry.contains_struct("Stats"));
        assert!(registry.contains_enum("EState"));

        // Idempotent for the same descriptor.
        registry.register_struct(player).unwrap();
        registry.register_enum(state).unwrap();
        assert_eq!(registry.structs().count(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = TypeRegistry::new();
        let a = StructBuilder::new("Point").field("X", PropertyType::Int32).build();
        let b = StructBuilder::new("Point").field("Y", PropertyType::Int32).build();
        registry.register_struct(Arc::new(a)).unwrap();
        assert!(matches!(
            registry.register_struct(Arc::new(b)),
            Err(RegistrationError::AlreadyRegistered { what: "struct", .. })
        ));
    }

    #[test]
    fn self_containing_struct_is_rejected() {
        let leaf = Arc::new(StructBuilder::new("Node").field("X", PropertyType::Int32).build());
        let middle = Arc::new(
            StructBuilder::new("Edge")
                .field("Target", PropertyType::structure(leaf))
                .build(),
        );
        let root = Arc::new(
            StructBuilder::new("Node")
                .field("Out", PropertyType::structure(middle))
                .build(),
        );

        let mut registry = TypeRegistry::new();
        let err = registry.register_struct(root).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::RecursiveStruct {
                name: "Node".into(),
                path: "Node.Out -> Edge.Target".into(),
            }
        );
        assert!(!registry.contains_struct("Edge"));
    }

    #[test]
    fn containers_break_recursion() {
        let leaf = Arc::new(StructBuilder::new("Tree").field("X", PropertyType::Int32).build());
        let tree = StructBuilder::new("Tree")
            .field("Children", PropertyType::array(PropertyType::structure(leaf)))
            .build();
        let mut registry = TypeRegistry::new();
        // The name is taken by the outer struct, the dependency is skipped.
        registry.register_struct(Arc::new(tree)).unwrap();
        assert_eq!(registry.get_struct("Tree").unwrap().field_len(), 1);
        assert!(registry.get_struct("Tree").unwrap().field("Children").is_some());
    }

    #[cfg(feature = "auto_register")]
    mod auto {
        use alloc::sync::Arc;

        use crate::info::{PropertyType, StructBuilder};
        use crate::registry::{RegistrationError, TypeRegistry};

        fn register_vector(registry: &mut TypeRegistry) -> Result<(), RegistrationError> {
            let vector = StructBuilder::new("AutoVector")
                .field("X", PropertyType::Float)
                .field("Y", PropertyType::Float)
                .build();
            registry.register_struct(Arc::new(vector))
        }

        crate::auto_register!(register_vector);

        #[test]
        fn submissions_are_collected_once() {
            let mut registry = TypeRegistry::new();
            assert!(registry.auto_register());
            assert!(registry.contains_struct("AutoVector"));
            assert!(registry.auto_register());
            assert_eq!(registry.structs().count(), 1);
        }
    }
}
