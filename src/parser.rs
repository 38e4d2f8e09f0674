use crate::annotation::Directive;
use crate::declaration::{
    map_primitive, normalize_type_name, FieldDecl, FunctionDecl, SourceFile, TypeDecl,
    TypeDeclKind, TypeDescriptor,
};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::{self, Visit};
use syn::{Attribute, Expr, ExprLit, Fields, Lit, LitStr, Meta, Token};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code into an abstract syntax tree,
/// which is then lowered into the declarations the annotation engine works on.
///
/// # Example
///
/// ```no_run
/// use asyncapi_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/main.rs")).unwrap();
/// let source = AstParser::collect_declarations(&parsed);
/// println!("Found {} functions", source.functions.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

/// Serde attributes that change how a field appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerdeAttributes {
    /// Renamed field name
    pub rename: Option<String>,
    /// Whether the field is left out of the serialized form
    pub skip: bool,
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|source| Error::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let syntax_tree = syn::parse_file(&content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses multiple Rust source files, stopping at the first failure.
    ///
    /// A location whose files cannot all be parsed is treated as unparseable as a whole.
    pub fn parse_files(paths: &[PathBuf]) -> Result<Vec<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        paths
            .iter()
            .map(|path| {
                Self::parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {}", path.display(), e);
                })
            })
            .collect()
    }

    /// Lowers a parsed file into type declarations, functions and file-level comments.
    ///
    /// Declarations whose doc comments cannot be read are skipped with a warning.
    pub fn collect_declarations(parsed: &ParsedFile) -> SourceFile {
        let module = module_name(&parsed.path);
        debug!(
            "Collecting declarations from {} (module `{}`)",
            parsed.path.display(),
            module
        );

        let file_comments = match doc_lines(&parsed.syntax_tree.attrs) {
            Ok(lines) => lines,
            Err(message) => {
                warn!("Ignoring file comments of {}: {}", parsed.path.display(), message);
                Vec::new()
            }
        };

        let mut collector = DeclarationCollector {
            path: &parsed.path,
            modules: vec![module.clone()],
            types: Vec::new(),
            functions: Vec::new(),
        };
        collector.visit_file(&parsed.syntax_tree);

        debug!(
            "Collected {} types and {} functions",
            collector.types.len(),
            collector.functions.len()
        );

        SourceFile {
            path: parsed.path.clone(),
            module,
            file_comments,
            types: collector.types,
            functions: collector.functions,
        }
    }
}

/// Module name of a file: its stem, or the parent directory for `mod.rs`, `lib.rs`
/// and `main.rs`.
pub fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    if matches!(stem.as_str(), "mod" | "lib" | "main") {
        if let Some(dir) = path.parent().and_then(Path::file_name) {
            return dir.to_string_lossy().to_string();
        }
    }
    stem
}

/// Reduce a `syn::Type` to a [`TypeDescriptor`].
pub fn type_descriptor(ty: &syn::Type) -> TypeDescriptor {
    match ty {
        syn::Type::Path(type_path) if type_path.qself.is_none() => path_descriptor(&type_path.path),
        syn::Type::Reference(reference) => type_descriptor(&reference.elem),
        syn::Type::Paren(paren) => type_descriptor(&paren.elem),
        syn::Type::Group(group) => type_descriptor(&group.elem),
        syn::Type::Array(array) => TypeDescriptor::Array(Box::new(type_descriptor(&array.elem))),
        syn::Type::Slice(slice) => TypeDescriptor::Array(Box::new(type_descriptor(&slice.elem))),
        _ => TypeDescriptor::Unknown,
    }
}

fn path_descriptor(path: &syn::Path) -> TypeDescriptor {
    let Some(segment) = path.segments.last() else {
        return TypeDescriptor::Unknown;
    };
    let ident = segment.ident.to_string();

    let type_args: Vec<&syn::Type> = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    match (ident.as_str(), type_args.first()) {
        ("Option" | "Box" | "Rc" | "Arc" | "Cow", Some(inner)) => type_descriptor(inner),
        ("Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "LinkedList", Some(inner)) => {
            TypeDescriptor::Array(Box::new(type_descriptor(inner)))
        }
        (_, Some(_)) => TypeDescriptor::Unknown,
        (name, None) => match map_primitive(name) {
            Some(_) => TypeDescriptor::Primitive(name.to_string()),
            None => TypeDescriptor::Named(reference_name(path)),
        },
    }
}

/// Name a path refers to: `Foo` stays short, `model::Foo` becomes `model.Foo`.
fn reference_name(path: &syn::Path) -> String {
    let joined: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    normalize_type_name(&joined.join("::"))
}

/// Text lines of every `#[doc = "..."]` attribute, in order.
///
/// Fails on doc attributes that are not string literals (`#[doc = include_str!(..)]`),
/// since their text is unknown without expanding macros.
pub fn doc_lines(attrs: &[Attribute]) -> std::result::Result<Vec<String>, String> {
    let mut lines = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(name_value) = &attr.meta {
            match &name_value.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => lines.extend(text.value().lines().map(str::to_string)),
                _ => return Err("doc attribute is not a string literal".to_string()),
            }
        }
    }

    Ok(lines)
}

impl SerdeAttributes {
    /// Parse the `rename` and `skip` options out of `#[serde(...)]` attributes.
    pub fn parse(attrs: &[Attribute]) -> Self {
        let mut serde_attrs = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("serde") {
                continue;
            }

            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    debug!("Found serde rename: {}", value.value());
                    serde_attrs.rename = Some(value.value());
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    serde_attrs.skip = true;
                } else if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<Expr>()?;
                } else if meta.input.peek(syn::token::Paren) {
                    let _nested;
                    syn::parenthesized!(_nested in meta.input);
                }
                Ok(())
            });

            if let Err(e) = result {
                debug!("Ignoring unparsable serde attribute: {}", e);
            }
        }

        serde_attrs
    }
}

/// Visitor that collects type and function declarations, tracking inline modules
struct DeclarationCollector<'p> {
    path: &'p Path,
    modules: Vec<String>,
    types: Vec<TypeDecl>,
    functions: Vec<FunctionDecl>,
}

impl DeclarationCollector<'_> {
    fn push_type(&mut self, ident: &syn::Ident, kind: TypeDeclKind) {
        debug!("Found type declaration: {}", ident);
        self.types.push(TypeDecl {
            name: unraw(ident),
            module: self.modules.last().cloned().unwrap_or_default(),
            path: self.path.to_path_buf(),
            kind,
        });
    }

    fn push_function(&mut self, ident: &syn::Ident, attrs: &[Attribute]) {
        let name = unraw(ident);
        match doc_lines(attrs) {
            Ok(comments) => self.functions.push(FunctionDecl { name, comments }),
            Err(message) => warn!(
                "{}",
                Error::DirectiveError {
                    declaration: name,
                    message,
                }
            ),
        }
    }

    fn lower_field(&self, field: &syn::Field) -> Option<FieldDecl> {
        let name = unraw(field.ident.as_ref()?);
        let serde_attrs = SerdeAttributes::parse(&field.attrs);
        if serde_attrs.skip {
            debug!("Skipping field `{}` excluded from serialization", name);
            return None;
        }

        let mut attributes = Vec::new();
        if let Some(rename) = serde_attrs.rename {
            attributes.push(format!("json:\"{}\"", rename));
        }
        match doc_lines(&field.attrs) {
            Ok(lines) => {
                for line in &lines {
                    if let Some(directive) = Directive::parse(line) {
                        if directive.name == "tag" {
                            attributes.push(directive.value.to_string());
                        }
                    }
                }
            }
            Err(message) => warn!("Ignoring field tags of `{}`: {}", name, message),
        }

        Some(FieldDecl {
            name,
            ty: type_descriptor(&field.ty),
            attributes: attributes.join(" "),
        })
    }
}

impl<'ast> Visit<'ast> for DeclarationCollector<'_> {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        let kind = match &node.fields {
            Fields::Named(named) => TypeDeclKind::Record(
                named
                    .named
                    .iter()
                    .filter_map(|field| self.lower_field(field))
                    .collect(),
            ),
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                TypeDeclKind::Alias(type_descriptor(&unnamed.unnamed[0].ty))
            }
            Fields::Unnamed(_) => TypeDeclKind::Opaque,
            Fields::Unit => TypeDeclKind::Record(Vec::new()),
        };
        self.push_type(&node.ident, kind);
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        let unit_only = node
            .variants
            .iter()
            .all(|v| matches!(v.fields, Fields::Unit));

        let kind = if unit_only {
            TypeDeclKind::Enumeration(
                node.variants
                    .iter()
                    .map(|v| {
                        SerdeAttributes::parse(&v.attrs)
                            .rename
                            .unwrap_or_else(|| unraw(&v.ident))
                    })
                    .collect(),
            )
        } else {
            TypeDeclKind::Opaque
        };
        self.push_type(&node.ident, kind);
    }

    fn visit_item_type(&mut self, node: &'ast syn::ItemType) {
        self.push_type(&node.ident, TypeDeclKind::Alias(type_descriptor(&node.ty)));
    }

    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        // Bodies are not descended into
        self.push_function(&node.sig.ident, &node.attrs);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.push_function(&node.sig.ident, &node.attrs);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_some() {
            self.modules.push(unraw(&node.ident));
            visit::visit_item_mod(self, node);
            self.modules.pop();
        }
    }
}

fn unraw(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}
