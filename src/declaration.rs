//! Declarations lowered from Rust sources.
//!
//! These are the shapes the scanner hands to the core: type declarations with their
//! fields and raw attribute strings, annotated functions with their doc lines, and the
//! file-level comment lines of every scanned file.

use std::path::PathBuf;

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    /// Path of the file the declarations come from
    pub path: PathBuf,
    /// Module name used to qualify type declarations
    pub module: String,
    /// File-level (`//!`) comment lines
    pub file_comments: Vec<String>,
    /// Type declarations in source order
    pub types: Vec<TypeDecl>,
    /// Function declarations in source order
    pub functions: Vec<FunctionDecl>,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// The type's identifier
    pub name: String,
    /// Module the type is declared in
    pub module: String,
    /// File the type is declared in
    pub path: PathBuf,
    /// Shape of the declaration
    pub kind: TypeDeclKind,
}

/// Shape of a type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclKind {
    /// A struct with named fields (or a unit struct, with no fields)
    Record(Vec<FieldDecl>),
    /// A type alias or single-field tuple struct wrapping another type
    Alias(TypeDescriptor),
    /// An enum whose variants carry no data
    Enumeration(Vec<String>),
    /// Any other type (data-carrying enums, multi-field tuple structs)
    Opaque,
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Declared field name
    pub name: String,
    /// Declared field type
    pub ty: TypeDescriptor,
    /// Raw `key:"value"` attribute string
    pub attributes: String,
}

/// A function-like declaration with its doc comment lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Function identifier
    pub name: String,
    /// Doc comment lines in source order
    pub comments: Vec<String>,
}

/// The declared type of a field, reduced to what schema construction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A scalar type from the primitive table
    Primitive(String),
    /// Another declared type, by (possibly dotted) name
    Named(String),
    /// A sequence of elements
    Array(Box<TypeDescriptor>),
    /// Anything that maps to no schema kind
    Unknown,
}

impl TypeDecl {
    /// Fully qualified name, `module.Name`
    pub fn qualified_name(&self) -> String {
        qualify(&self.module, &self.name)
    }
}

/// Join a module and a type name into a qualified name.
pub fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", module, name)
    }
}

/// Normalize a type path (`crate::model::Foo`, `model.Foo`) to a referenced name: the
/// type itself, qualified by its innermost module when one is given.
pub fn normalize_type_name(path: &str) -> String {
    let segments: Vec<&str> = path
        .split("::")
        .flat_map(|s| s.split('.'))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !matches!(*s, "crate" | "self" | "super"))
        .collect();

    match segments.as_slice() {
        [.., module, name] => format!("{}.{}", module, name),
        [name] => name.to_string(),
        [] => String::new(),
    }
}

/// Map a scalar type name to its schema type.
///
/// Returns `None` for anything outside the primitive table.
pub fn map_primitive(type_name: &str) -> Option<&'static str> {
    match type_name {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" | "char" => Some("integer"),
        "f32" | "f64" => Some("number"),
        "String" | "str" => Some("string"),
        "bool" => Some("boolean"),
        _ => None,
    }
}
