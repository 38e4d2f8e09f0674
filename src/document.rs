//! AsyncAPI document model.
//!
//! Every field that holds its empty value is left out of the serialized form, so a
//! document only carries what the annotations actually described.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// AsyncAPI version written into every generated document
pub const ASYNCAPI_VERSION: &str = "2.4.0";

/// Prefix of references into `components.schemas`
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Prefix of references into `components.messages`
pub const MESSAGE_REF_PREFIX: &str = "#/components/messages/";

/// Complete AsyncAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// AsyncAPI version
    pub asyncapi: String,
    /// API info
    #[serde(default, skip_serializing_if = "Info::is_empty")]
    pub info: Info,
    /// Channels keyed by queue name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, Channel>,
    /// Messages and schemas
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

/// AsyncAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Contact::is_empty")]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "License::is_empty")]
    pub license: License,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A named topic with independent subscribe and publish operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<Operation>,
}

/// Which side of a channel an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Subscribe,
    Publish,
}

/// One side of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub message: MessageSlot,
}

/// The message(s) an operation carries: one reference, or a union of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageSlot {
    OneOf {
        #[serde(rename = "oneOf")]
        one_of: Vec<Reference>,
    },
    Single(Reference),
}

/// A `$ref` to a named component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Messages and schemas shared by the whole document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, Message>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

/// AsyncAPI Message object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Schema::is_empty")]
    pub headers: Schema,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Schema::is_empty")]
    pub payload: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Schema definition
///
/// Dynamically typed values (`example`, `enum`, bounds) hold whatever the annotation
/// coerced to: an integer, a float or a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to another schema or message
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            asyncapi: ASYNCAPI_VERSION.to_string(),
            info: Info::default(),
            channels: BTreeMap::new(),
            components: Components::default(),
        }
    }

    /// Look up the schema a `#/components/schemas/...` reference points at
    pub fn schema_by_ref(&self, reference: &str) -> Option<&Schema> {
        let name = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
        self.components.schemas.get(name)
    }

    /// Look up the message a `#/components/messages/...` reference points at
    pub fn message_by_ref(&self, reference: &str) -> Option<&Message> {
        let name = reference.strip_prefix(MESSAGE_REF_PREFIX)?;
        self.components.messages.get(name)
    }

    /// Every `$ref` in the document that has no matching component, sorted.
    pub fn unresolved_references(&self) -> Vec<String> {
        let mut references = Vec::new();

        for channel in self.channels.values() {
            for operation in [&channel.subscribe, &channel.publish].into_iter().flatten() {
                references.extend(
                    operation
                        .message
                        .references()
                        .into_iter()
                        .map(|r| r.to_string()),
                );
            }
        }
        for message in self.components.messages.values() {
            message.headers.collect_references(&mut references);
            message.payload.collect_references(&mut references);
        }
        for schema in self.components.schemas.values() {
            schema.collect_references(&mut references);
        }

        let mut unresolved: Vec<String> = references
            .into_iter()
            .filter(|r| self.schema_by_ref(r).is_none() && self.message_by_ref(r).is_none())
            .collect();
        unresolved.sort();
        unresolved.dedup();
        unresolved
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Info {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl License {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.schemas.is_empty()
    }
}

impl Channel {
    /// Mutable access to the operation slot of the given side
    pub fn operation_mut(&mut self, kind: OperationKind) -> &mut Option<Operation> {
        match kind {
            OperationKind::Subscribe => &mut self.subscribe,
            OperationKind::Publish => &mut self.publish,
        }
    }
}

impl OperationKind {
    /// Parse the value of an `operation` directive; only `subscribe` selects subscribe.
    pub fn from_directive(value: &str) -> Self {
        if value.trim() == "subscribe" {
            OperationKind::Subscribe
        } else {
            OperationKind::Publish
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Subscribe => "subscribe",
            OperationKind::Publish => "publish",
        }
    }
}

impl MessageSlot {
    /// Add a reference, turning a single reference into a union on the second add.
    pub fn push(&mut self, reference: Reference) {
        match self {
            MessageSlot::OneOf { one_of } => one_of.push(reference),
            MessageSlot::Single(existing) => {
                let first = existing.clone();
                *self = MessageSlot::OneOf {
                    one_of: vec![first, reference],
                };
            }
        }
    }

    /// All references in this slot, in append order
    pub fn references(&self) -> Vec<&str> {
        match self {
            MessageSlot::OneOf { one_of } => one_of.iter().map(|r| r.reference.as_str()).collect(),
            MessageSlot::Single(reference) => vec![reference.reference.as_str()],
        }
    }
}

impl Reference {
    pub fn message(name: &str) -> Self {
        Self {
            reference: format!("{}{}", MESSAGE_REF_PREFIX, name),
        }
    }
}

impl Schema {
    /// A schema that only carries a reference to `components.schemas[name]`
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, name)),
            ..Self::default()
        }
    }

    /// A schema that only carries a type
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Append `name` to the required list unless it is already there
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }

    fn collect_references(&self, out: &mut Vec<String>) {
        if let Some(reference) = &self.reference {
            out.push(reference.clone());
        }
        for schema in self.items.iter().chain(self.properties.values()) {
            schema.collect_references(out);
        }
    }
}
