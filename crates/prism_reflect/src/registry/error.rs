use thiserror::Error;

/// Why [`TypeRegistry`](super::TypeRegistry) refused a descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    /// A struct holds itself by value, directly or through other structs.
    #[error("struct `{name}` contains itself by value through `{path}`")]
    RecursiveStruct { name: String, path: String },
    /// Another descriptor already uses the name.
    #[error("a {what} named `{name}` is already registered")]
    AlreadyRegistered { what: &'static str, name: String },
}
