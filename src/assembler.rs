use crate::annotation::apply_info_directives;
use crate::declaration::SourceFile;
use crate::dependency::{DependencyEnumerator, ModuleDirEnumerator};
use crate::document::Document;
use crate::error::Result;
use crate::operation_builder::OperationBuilder;
use crate::scanner::{RustSourceScanner, SourceScanner};
use crate::schema_resolver::SchemaResolver;
use log::{debug, info, warn};
use std::path::Path;

/// Accumulates every scanned location into one [`Document`].
///
/// ```no_run
/// use asyncapi_from_source::assembler::DocumentAssembler;
/// use std::path::Path;
///
/// let mut assembler = DocumentAssembler::new();
/// assembler.extract(Path::new("./src"), 2).unwrap();
/// let document = assembler.finish();
/// println!("{} channels", document.channels.len());
/// ```
pub struct DocumentAssembler<S = RustSourceScanner, E = ModuleDirEnumerator> {
    document: Document,
    resolver: SchemaResolver,
    scanner: S,
    enumerator: E,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::with_collaborators(RustSourceScanner::new(), ModuleDirEnumerator::new())
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SourceScanner, E: DependencyEnumerator> DocumentAssembler<S, E> {
    pub fn with_collaborators(scanner: S, enumerator: E) -> Self {
        Self {
            document: Document::new(),
            resolver: SchemaResolver::new(),
            scanner,
            enumerator,
        }
    }

    /// Scan `root`, then its related locations down to `depth` levels.
    ///
    /// # Errors
    ///
    /// Fails only when `root` itself cannot be scanned. Related locations that fail
    /// are logged and skipped.
    pub fn extract(&mut self, root: &Path, depth: usize) -> Result<()> {
        info!("Scanning {}", root.display());
        let sources = self.scanner.scan(root)?;
        self.add_sources(sources);
        self.extract_related(root, depth);
        Ok(())
    }

    fn extract_related(&mut self, location: &Path, depth: usize) {
        if depth == 0 {
            return;
        }
        let remaining = depth - 1;

        let related = match self.enumerator.related_locations(location, remaining) {
            Ok(related) => related,
            Err(e) => {
                warn!(
                    "Cannot list locations related to {}: {}",
                    location.display(),
                    e
                );
                return;
            }
        };
        debug!(
            "{} related locations under {} ({} warnings)",
            related.locations.len(),
            location.display(),
            related.warnings.len()
        );

        for related_location in related.locations {
            match self.scanner.scan(&related_location) {
                Ok(sources) => {
                    info!("Scanning related location {}", related_location.display());
                    self.add_sources(sources);
                    self.extract_related(&related_location, remaining);
                }
                Err(e) => warn!("Skipping {}: {}", related_location.display(), e),
            }
        }
    }

    fn add_sources(&mut self, sources: Vec<SourceFile>) {
        for source in sources {
            self.add_source(source);
        }
    }

    /// Feed one already scanned file.
    ///
    /// File comments go to the document info, types to the resolver and marked
    /// functions to the operation builder. Rejected declarations are logged and skipped.
    pub fn add_source(&mut self, source: SourceFile) {
        debug!("Adding {} (module `{}`)", source.path.display(), source.module);

        apply_info_directives(&mut self.document.info, &source.file_comments);

        for decl in source.types {
            if let Err(e) = self.resolver.register(decl) {
                warn!("{}", e);
            }
        }

        let mut builder =
            OperationBuilder::new(&mut self.document, &mut self.resolver).in_module(&source.module);
        for function in &source.functions {
            match builder.add_function(function) {
                Ok(Some(key)) => debug!("Added message {}", key),
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", function.name, e),
            }
        }
    }

    /// Resolve every referenced type and hand over the document.
    ///
    /// References that stay unresolved are kept as written and logged.
    pub fn finish(mut self) -> Document {
        let resolved = self.resolver.resolve(&mut self.document.components);
        info!(
            "Built {} channels, {} messages and {} schemas",
            self.document.channels.len(),
            self.document.components.messages.len(),
            resolved
        );

        for reference in self.document.unresolved_references() {
            debug!("Unresolved reference: {}", reference);
        }

        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{FieldDecl, FunctionDecl, TypeDecl, TypeDeclKind, TypeDescriptor};
    use crate::dependency::RelatedLocations;
    use crate::document::Schema;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Serves canned sources per location and records what was scanned
    #[derive(Default)]
    struct FakeScanner {
        sources: HashMap<PathBuf, Vec<SourceFile>>,
        scanned: RefCell<Vec<PathBuf>>,
    }

    impl SourceScanner for FakeScanner {
        fn scan(&self, location: &Path) -> Result<Vec<SourceFile>> {
            self.scanned.borrow_mut().push(location.to_path_buf());
            self.sources.get(location).cloned().ok_or_else(|| Error::ReadError {
                path: location.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    /// Every location has the same single child, `<location>/sub`
    struct ChainEnumerator;

    impl DependencyEnumerator for ChainEnumerator {
        fn related_locations(&self, location: &Path, _: usize) -> Result<RelatedLocations> {
            Ok(RelatedLocations {
                locations: vec![location.join("sub")],
                warnings: Vec::new(),
            })
        }
    }

    struct FailingEnumerator;

    impl DependencyEnumerator for FailingEnumerator {
        fn related_locations(&self, location: &Path, _: usize) -> Result<RelatedLocations> {
            Err(Error::ReadError {
                path: location.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn source(module: &str, functions: Vec<FunctionDecl>, types: Vec<TypeDecl>) -> SourceFile {
        SourceFile {
            path: PathBuf::from(format!("{}.rs", module)),
            module: module.to_string(),
            file_comments: Vec::new(),
            types,
            functions,
        }
    }

    fn operation(name: &str, queue: &str, payload: &str) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            comments: vec![
                format!(" {} asyncApi", name),
                format!(" @queue {}", queue),
                format!(" @payload {}", payload),
            ],
        }
    }

    fn record(module: &str, name: &str, fields: Vec<FieldDecl>) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            module: module.to_string(),
            path: PathBuf::from(format!("{}.rs", module)),
            kind: TypeDeclKind::Record(fields),
        }
    }

    #[test]
    fn test_add_source_and_finish() {
        let mut assembler = DocumentAssembler::new();
        let mut events = source(
            "events",
            vec![operation("Started", "lifecycle", "Started")],
            vec![record(
                "events",
                "Started",
                vec![FieldDecl {
                    name: "at".to_string(),
                    ty: TypeDescriptor::Primitive("u64".to_string()),
                    attributes: r#"validate:"required""#.to_string(),
                }],
            )],
        );
        events.file_comments = vec![" @title Lifecycle".to_string(), " @version 1".to_string()];

        assembler.add_source(events);
        let document = assembler.finish();

        assert_eq!(document.info.title.as_deref(), Some("Lifecycle"));
        assert_eq!(document.info.version.as_deref(), Some("1"));
        assert_eq!(
            document
                .message_by_ref("#/components/messages/lifecycle.publish.Started")
                .unwrap()
                .payload,
            Schema::reference_to("Started")
        );
        assert_eq!(
            document.schema_by_ref("#/components/schemas/Started").unwrap().required,
            vec!["at"]
        );
        assert!(document.unresolved_references().is_empty());
    }

    #[test]
    fn test_payload_declared_in_later_source() {
        let mut assembler = DocumentAssembler::new();

        assembler.add_source(source("api", vec![operation("Ping", "health", "model.Ping")], vec![]));
        assembler.add_source(source("model", vec![], vec![record("model", "Ping", vec![])]));
        let document = assembler.finish();

        assert_eq!(
            document.components.messages["health.publish.Ping"].payload,
            Schema::reference_to("Ping")
        );
        assert!(document.components.schemas.contains_key("Ping"));
        assert!(document.unresolved_references().is_empty());
    }

    #[test]
    fn test_rejected_declarations_do_not_abort() {
        let mut assembler = DocumentAssembler::new();
        let no_queue = FunctionDecl {
            name: "Lost".to_string(),
            comments: vec![" asyncApi".to_string()],
        };

        assembler.add_source(source(
            "api",
            vec![no_queue, operation("Ok", "q", "Missing")],
            vec![record("api", "Dup", vec![])],
        ));
        let mut moved = record("api", "Dup", vec![]);
        moved.path = PathBuf::from("other/api.rs");
        assembler.add_source(source("api", vec![], vec![moved]));

        let document = assembler.finish();

        let keys: Vec<&String> = document.components.messages.keys().collect();
        assert_eq!(keys, vec!["q.publish.Ok"]);
        // `Missing` is never declared
        assert!(document.components.schemas.is_empty());
        assert_eq!(
            document.unresolved_references(),
            vec!["#/components/schemas/Missing"]
        );
    }

    #[test]
    fn test_payload_prefers_own_module() {
        let mut assembler = DocumentAssembler::new();

        assembler.add_source(source(
            "billing",
            vec![operation("Charge", "billing", "Config")],
            vec![record("billing", "Config", vec![])],
        ));
        assembler.add_source(source("shipping", vec![], vec![record("shipping", "Config", vec![])]));
        let document = assembler.finish();

        assert_eq!(
            document.components.messages["billing.publish.Charge"].payload,
            Schema::reference_to("billing.Config")
        );
        let keys: Vec<&String> = document.components.schemas.keys().collect();
        assert_eq!(keys, vec!["billing.Config"]);
    }

    #[test]
    fn test_ambiguous_payload_keeps_document() {
        let mut assembler = DocumentAssembler::new();

        assembler.add_source(source(
            "api",
            vec![
                operation("Charge", "billing", "Config"),
                operation("Tick", "clock", "Tick"),
            ],
            vec![record("api", "Tick", vec![])],
        ));
        assembler.add_source(source("billing", vec![], vec![record("billing", "Config", vec![])]));
        assembler.add_source(source("shipping", vec![], vec![record("shipping", "Config", vec![])]));
        let document = assembler.finish();

        assert_eq!(document.components.messages.len(), 2);
        assert!(document.components.schemas.contains_key("Tick"));
        assert_eq!(
            document.unresolved_references(),
            vec!["#/components/schemas/Config"]
        );
    }

    #[test]
    fn test_depth_limits_traversal() {
        let root = PathBuf::from("root");
        let mut scanner = FakeScanner::default();
        let mut location = root.clone();
        for level in 0..4 {
            let module = format!("level{}", level);
            scanner.sources.insert(
                location.clone(),
                vec![source(&module, vec![operation(&module, &module, "X")], vec![])],
            );
            location = location.join("sub");
        }

        let mut assembler = DocumentAssembler::with_collaborators(scanner, ChainEnumerator);
        assembler.extract(&root, 2).unwrap();

        let scanned = assembler.scanner.scanned.borrow().clone();
        assert_eq!(
            scanned,
            vec![
                PathBuf::from("root"),
                PathBuf::from("root/sub"),
                PathBuf::from("root/sub/sub"),
            ]
        );
        let channels: Vec<&String> = assembler.document.channels.keys().collect();
        assert_eq!(channels, vec!["level0", "level1", "level2"]);
    }

    #[test]
    fn test_zero_depth_scans_root_only() {
        let mut scanner = FakeScanner::default();
        scanner.sources.insert(PathBuf::from("root"), Vec::new());

        let mut assembler = DocumentAssembler::with_collaborators(scanner, ChainEnumerator);
        assembler.extract(Path::new("root"), 0).unwrap();

        assert_eq!(assembler.scanner.scanned.borrow().len(), 1);
    }

    #[test]
    fn test_unreadable_related_location_is_skipped() {
        let mut scanner = FakeScanner::default();
        scanner.sources.insert(
            PathBuf::from("root"),
            vec![source("root", vec![operation("Tick", "clock", "Tick")], vec![])],
        );

        let mut assembler = DocumentAssembler::with_collaborators(scanner, ChainEnumerator);
        assembler.extract(Path::new("root"), 2).unwrap();

        // root/sub is unknown to the scanner, so nothing below it is visited
        assert_eq!(assembler.scanner.scanned.borrow().len(), 2);
        assert!(assembler.document.channels.contains_key("clock"));
    }

    #[test]
    fn test_unreadable_root_is_fatal() {
        let mut assembler =
            DocumentAssembler::with_collaborators(FakeScanner::default(), ChainEnumerator);

        let result = assembler.extract(Path::new("nowhere"), 2);

        assert!(matches!(result, Err(Error::ReadError { .. })));
    }

    #[test]
    fn test_failing_enumerator_keeps_scanned_content() {
        let mut scanner = FakeScanner::default();
        scanner.sources.insert(
            PathBuf::from("root"),
            vec![source("root", vec![operation("Tick", "clock", "Tick")], vec![])],
        );

        let mut assembler = DocumentAssembler::with_collaborators(scanner, FailingEnumerator);
        assembler.extract(Path::new("root"), 2).unwrap();
        let document = assembler.finish();

        assert!(document.channels.contains_key("clock"));
    }
}
