use crate::annotation::{assign_field, coerce_value, Directive, ParamValue, MESSAGE_FIELDS};
use crate::declaration::{normalize_type_name, FunctionDecl};
use crate::document::{
    Document, Message, MessageSlot, Operation, OperationKind, Reference, Schema, Tag,
};
use crate::error::{Error, Result};
use crate::schema_resolver::SchemaResolver;
use log::debug;

/// Doc marker that opts a function into extraction
pub const OPERATION_MARKER: &str = "asyncApi";

/// Turns annotated functions into messages on channel operations.
///
/// Messages land in `components.messages` under `{queue}.{side}.{function}` and are
/// referenced from the matching channel side. Payload types are queued on the
/// resolver once their message is committed, scoped to the module the functions live in.
pub struct OperationBuilder<'a> {
    document: &'a mut Document,
    resolver: &'a mut SchemaResolver,
    module: &'a str,
}

/// A message while its directives are being applied
#[derive(Debug, Default)]
struct MessageDraft {
    queue: Option<String>,
    kind: Option<OperationKind>,
    payload: Option<String>,
    message: Message,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(document: &'a mut Document, resolver: &'a mut SchemaResolver) -> Self {
        Self {
            document,
            resolver,
            module: "",
        }
    }

    /// Resolve payload type names as written inside `module`
    pub fn in_module(mut self, module: &'a str) -> Self {
        self.module = module;
        self
    }

    /// Add one function to the document.
    ///
    /// Returns the message key, or `None` when the function carries no marker.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingQueue`] when no `queue` directive names the channel
    /// - [`Error::DuplicateMessage`] when the message key is already taken
    ///
    /// In both cases the document is left untouched.
    pub fn add_function(&mut self, function: &FunctionDecl) -> Result<Option<String>> {
        if !is_marked(function) {
            return Ok(None);
        }
        debug!("Building operation from function: {}", function.name);

        let mut draft = MessageDraft::default();
        for line in &function.comments {
            if let Some(directive) = Directive::parse(line) {
                draft.apply(directive);
            }
        }

        let queue = draft
            .queue
            .filter(|queue| !queue.is_empty())
            .ok_or_else(|| Error::MissingQueue {
                function: function.name.clone(),
            })?;
        let kind = draft.kind.unwrap_or(OperationKind::Publish);
        let key = format!("{}.{}.{}", queue, kind.as_str(), function.name);

        if self.document.components.messages.contains_key(&key) {
            return Err(Error::DuplicateMessage(key));
        }

        debug!("Adding message {} to channel {}", key, queue);
        self.document
            .components
            .messages
            .insert(key.clone(), draft.message);

        let channel = self.document.channels.entry(queue).or_default();
        let reference = Reference::message(&key);
        let slot = channel.operation_mut(kind);
        if let Some(operation) = slot.as_mut() {
            operation.message.push(reference);
        } else {
            *slot = Some(Operation {
                message: MessageSlot::Single(reference),
            });
        }

        if let Some(payload) = draft.payload {
            self.resolver.enqueue_payload(&key, self.module, &payload);
        }

        Ok(Some(key))
    }
}

impl MessageDraft {
    fn apply(&mut self, directive: Directive<'_>) {
        match directive.name {
            "queue" => self.queue = Some(directive.value.to_string()),
            "operation" => self.kind = Some(OperationKind::from_directive(directive.value)),
            "header" => add_header(&mut self.message.headers, directive.value),
            "payload" => {
                let type_name = normalize_type_name(directive.value);
                if type_name.is_empty() {
                    debug!("Ignoring payload directive without a type");
                    return;
                }
                self.message.payload = Schema::reference_to(&type_name);
                self.payload = Some(type_name);
            }
            "tags" | "tag" => self
                .message
                .tags
                .extend(directive.value.split_whitespace().map(|name| Tag {
                    name: name.to_string(),
                    description: None,
                })),
            name => {
                assign_field(MESSAGE_FIELDS, &mut self.message, name, directive.value);
            }
        }
    }
}

fn is_marked(function: &FunctionDecl) -> bool {
    function
        .comments
        .first()
        .is_some_and(|line| line.contains(OPERATION_MARKER))
}

/// Add or overwrite one header property described by `name: type=..;description=..;`.
fn add_header(headers: &mut Schema, value: &str) {
    let header = ParamValue::parse(value);
    if header.name.is_empty() {
        debug!("Ignoring header directive without a name");
        return;
    }

    headers.schema_type = Some("object".to_string());

    let property = Schema {
        schema_type: header.get("type").map(str::to_string),
        description: header.get("description").map(str::to_string),
        example: header.get("example").and_then(coerce_value),
        format: header.get("format").map(str::to_string),
        ..Schema::default()
    };
    headers.properties.insert(header.name.clone(), property);

    if header.get("required") == Some("true") {
        headers.require(&header.name);
    }
}
