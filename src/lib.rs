//! AsyncAPI Generator - AsyncAPI documents from annotated Rust sources.
//!
//! Message contracts are declared next to the code that produces or consumes them, as
//! directive lines in doc comments:
//!
//! ```text
//! //! @title System controller
//! //! @version Mark 1
//!
//! /// EmergencyButton asyncApi
//! /// @queue emergency
//! /// @summary initiates complete data destruction
//! /// @payload EmergencyCommand
//! fn EmergencyButton() {}
//! ```
//!
//! # Architecture
//!
//! 1. [`scanner`] - Lists the Rust files of a location and lowers them to declarations
//! 2. [`parser`] - Parses Rust source files with `syn` and collects declarations
//! 3. [`dependency`] - Finds the module directories related to a location
//! 4. [`annotation`] - Directive grammar, value coercion and generic field assignment
//! 5. [`operation_builder`] - Turns annotated functions into channels and messages
//! 6. [`schema_resolver`] - Builds schemas for every referenced type
//! 7. [`assembler`] - Drives the above into one [`document::Document`]
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use asyncapi_from_source::{assembler::DocumentAssembler, serializer::serialize_yaml};
//! use std::path::Path;
//!
//! let mut assembler = DocumentAssembler::new();
//! assembler.extract(Path::new("./src"), 2).unwrap();
//! let document = assembler.finish();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotation;
pub mod assembler;
pub mod cli;
pub mod declaration;
pub mod dependency;
pub mod document;
pub mod error;
pub mod operation_builder;
pub mod parser;
pub mod scanner;
pub mod schema_resolver;
pub mod serializer;
