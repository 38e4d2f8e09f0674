use crate::annotation::coerce_value;
use crate::declaration::{map_primitive, qualify, TypeDecl, TypeDeclKind, TypeDescriptor};
use crate::document::{Components, Schema};
use crate::error::{Error, Result};
use log::{debug, warn};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_]+):"([^"]*)""#).unwrap());

/// Schema resolver - materializes every referenced type into a schema.
///
/// Declarations are registered as the scanner finds them, and payload types are
/// requested as messages are built. [`SchemaResolver::resolve`] then drains a worklist of
/// declarations, building one schema per declaration and queueing whatever declarations
/// its fields reference. A declaration is queued at most once, so reference cycles
/// terminate.
///
/// Every declaration lands under one key however it was spelled: its short name when no
/// other module declares that name, `module.Name` otherwise.
#[derive(Debug, Default)]
pub struct SchemaResolver {
    /// Declarations keyed by qualified name (`module.Name`)
    declarations: BTreeMap<String, TypeDecl>,
    /// Short name -> qualified names declaring it
    short_names: HashMap<String, Vec<String>>,
    /// References requested before resolution, in request order
    requests: Vec<TypeRequest>,
    /// Every request ever made
    requested: HashSet<TypeRequest>,
    /// Qualified names waiting to be materialized
    pending: VecDeque<String>,
    /// Every qualified name ever queued
    queued: HashSet<String>,
}

/// A type name as written in module `scope`, optionally the payload of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeRequest {
    scope: String,
    name: String,
    message: Option<String>,
}

impl SchemaResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type declaration.
    ///
    /// Registering the same declaration from the same file again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateType`] when another file already declared the same
    /// qualified name.
    pub fn register(&mut self, decl: TypeDecl) -> Result<()> {
        let qualified = decl.qualified_name();

        if let Some(existing) = self.declarations.get(&qualified) {
            if existing.path == decl.path {
                debug!("Type {} already registered", qualified);
                return Ok(());
            }
            return Err(Error::DuplicateType {
                name: qualified,
                first: existing.path.clone(),
                second: decl.path,
            });
        }

        debug!("Registering type {}", qualified);
        self.short_names
            .entry(decl.name.clone())
            .or_default()
            .push(qualified.clone());
        self.declarations.insert(qualified, decl);
        Ok(())
    }

    /// Request a type name written at the root. Returns `false` if it was requested before.
    pub fn enqueue(&mut self, name: &str) -> bool {
        self.request(TypeRequest {
            scope: String::new(),
            name: name.to_string(),
            message: None,
        })
    }

    /// Request the payload type of message `message_key`, written in module `scope`.
    ///
    /// Once resolved, the message payload is pointed at the schema key of the
    /// declaration it names.
    pub fn enqueue_payload(&mut self, message_key: &str, scope: &str, name: &str) -> bool {
        self.request(TypeRequest {
            scope: scope.to_string(),
            name: name.to_string(),
            message: Some(message_key.to_string()),
        })
    }

    fn request(&mut self, request: TypeRequest) -> bool {
        if request.name.is_empty() || !self.requested.insert(request.clone()) {
            return false;
        }
        debug!("Queueing type reference {}", request.name);
        self.requests.push(request);
        true
    }

    /// Number of references waiting to be resolved
    pub fn pending_len(&self) -> usize {
        self.requests.len() + self.pending.len()
    }

    /// Number of registered declarations
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// Find the declaration `name` points at when written inside module `scope`.
    ///
    /// Dotted names must match a qualified name exactly. A short name prefers the
    /// declaration of `scope` itself, then falls back to the short-name index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousType`] when `scope` does not declare a short name and
    /// more than one other module does.
    pub fn lookup(&self, scope: &str, name: &str) -> Result<Option<&TypeDecl>> {
        if name.contains('.') {
            return Ok(self.declarations.get(name));
        }
        if let Some(decl) = self.declarations.get(&qualify(scope, name)) {
            return Ok(Some(decl));
        }

        match self.short_names.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([only]) => Ok(self.declarations.get(only)),
            Some(candidates) => Err(Error::AmbiguousType {
                name: name.to_string(),
                candidates: candidates.to_vec(),
            }),
        }
    }

    /// Key the schema of a registered declaration is stored under.
    pub fn schema_key(&self, decl: &TypeDecl) -> String {
        match self.short_names.get(&decl.name).map(Vec::as_slice) {
            Some([_]) => decl.name.clone(),
            _ => decl.qualified_name(),
        }
    }

    /// Like [`SchemaResolver::lookup`], but ambiguous names are logged and treated as
    /// undeclared.
    fn find(&self, scope: &str, name: &str) -> Option<&TypeDecl> {
        match self.lookup(scope, name) {
            Ok(Some(decl)) => Some(decl),
            Ok(None) => {
                debug!("Type {} is never declared", name);
                None
            }
            Err(e) => {
                warn!("Dropping reference: {}", e);
                None
            }
        }
    }

    fn queue(&mut self, qualified: String) {
        if self.queued.insert(qualified.clone()) {
            self.pending.push_back(qualified);
        }
    }

    /// Drain every request into `components.schemas` until nothing is pending.
    ///
    /// Payload references of requesting messages are rewritten to schema keys. Names
    /// that match no declaration, or more than one, keep their reference as written
    /// and produce no schema. Returns the number of schemas produced.
    pub fn resolve(&mut self, components: &mut Components) -> usize {
        for request in std::mem::take(&mut self.requests) {
            let Some(decl) = self.find(&request.scope, &request.name) else {
                continue;
            };
            if let Some(message) = request
                .message
                .as_ref()
                .and_then(|key| components.messages.get_mut(key))
            {
                message.payload = Schema::reference_to(&self.schema_key(decl));
            }
            let qualified = decl.qualified_name();
            self.queue(qualified);
        }

        let mut resolved = 0;
        while let Some(qualified) = self.pending.pop_front() {
            let Some(decl) = self.declarations.get(&qualified) else {
                continue;
            };

            debug!("Building schema for {}", qualified);
            let mut builder = SchemaBuilder {
                resolver: &*self,
                scope: &decl.module,
                discovered: Vec::new(),
            };
            let schema = builder.build(decl);
            let discovered = builder.discovered;

            components.schemas.insert(self.schema_key(decl), schema);
            resolved += 1;

            for name in discovered {
                self.queue(name);
            }
        }

        debug!("Resolved {} schemas", resolved);
        resolved
    }
}

/// Builds one schema, remembering every declaration it references
struct SchemaBuilder<'r> {
    resolver: &'r SchemaResolver,
    /// Module the built declaration lives in
    scope: &'r str,
    discovered: Vec<String>,
}

impl SchemaBuilder<'_> {
    fn build(&mut self, decl: &TypeDecl) -> Schema {
        match &decl.kind {
            TypeDeclKind::Record(fields) => {
                let mut object = Schema::of_type("object");
                for field in fields {
                    let name = json_name(&field.attributes).unwrap_or_else(|| field.name.clone());
                    let mut property = self.schema_for(&field.ty);
                    apply_tag_values(&mut object, &name, &mut property, &field.attributes);
                    object.properties.insert(name, property);
                }
                object
            }
            TypeDeclKind::Alias(ty) => self.schema_for(ty),
            TypeDeclKind::Enumeration(variants) => Schema {
                schema_type: Some("string".to_string()),
                enum_values: variants.iter().cloned().map(Value::String).collect(),
                ..Schema::default()
            },
            TypeDeclKind::Opaque => Schema::default(),
        }
    }

    fn schema_for(&mut self, ty: &TypeDescriptor) -> Schema {
        match ty {
            TypeDescriptor::Primitive(name) => {
                map_primitive(name).map(Schema::of_type).unwrap_or_default()
            }
            TypeDescriptor::Named(name) => {
                let resolver = self.resolver;
                match resolver.find(self.scope, name) {
                    Some(decl) => {
                        self.discovered.push(decl.qualified_name());
                        Schema::reference_to(&resolver.schema_key(decl))
                    }
                    None => Schema::reference_to(name),
                }
            }
            TypeDescriptor::Array(element) => Schema {
                schema_type: Some("array".to_string()),
                items: vec![self.schema_for(element)],
                ..Schema::default()
            },
            TypeDescriptor::Unknown => Schema::default(),
        }
    }
}

/// Serialized field name from a `json:"name,opts"` tag, if one is given.
fn json_name(attributes: &str) -> Option<String> {
    TAG_REGEX
        .captures_iter(attributes)
        .find(|caps| &caps[1] == "json")
        .and_then(|caps| caps[2].split(',').next().map(str::to_string))
        .filter(|name| !name.is_empty())
}

/// Apply `example`, `description` and `validate` tags to a property.
///
/// `required` lands on the owning object, everything else on the property itself.
fn apply_tag_values(object: &mut Schema, field_name: &str, property: &mut Schema, attributes: &str) {
    for caps in TAG_REGEX.captures_iter(attributes) {
        let value = &caps[2];
        match &caps[1] {
            "example" => property.example = coerce_value(value),
            "description" => property.description = Some(value.to_string()),
            "validate" => apply_validate(object, field_name, property, value),
            _ => {}
        }
    }
}

fn apply_validate(object: &mut Schema, field_name: &str, property: &mut Schema, validate: &str) {
    for rule in validate.split(',') {
        let rule = rule.trim();
        let (key, arg) = match rule.split_once('=') {
            Some((key, arg)) => (key, Some(arg)),
            None => (rule, None),
        };

        match (key, arg) {
            ("required", _) => object.require(field_name),
            ("min" | "gt", Some(arg)) => property.minimum = coerce_value(arg),
            ("max" | "lt", Some(arg)) => property.maximum = coerce_value(arg),
            ("oneof" | "oneOf", Some(arg)) => {
                property.enum_values = arg.split(' ').filter_map(coerce_value).collect();
            }
            _ => {}
        }
    }
}
