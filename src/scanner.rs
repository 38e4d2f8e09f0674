use crate::declaration::SourceFile;
use crate::dependency::is_rust_file;
use crate::error::{Error, Result};
use crate::parser::AstParser;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for one source location.
///
/// The `FileScanner` lists the Rust source files directly inside a directory. Nested
/// directories are separate locations, reached through a
/// [`DependencyEnumerator`](crate::dependency::DependencyEnumerator).
///
/// # Example
///
/// ```no_run
/// use asyncapi_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service/src"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory listing.
pub struct ScanResult {
    /// Paths of the discovered `.rs` files, sorted
    pub rust_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be accessed
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Collects the `.rs` files directly inside the root directory.
    ///
    /// Inaccessible entries are logged and reported as warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        let metadata = fs::metadata(&self.root_path).map_err(|source| Error::ReadError {
            path: self.root_path.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(Error::ReadError {
                path: self.root_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) => {
                    if is_rust_file(entry.path()) {
                        rust_files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort();

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}

/// Turns a location into the declarations it contains.
pub trait SourceScanner {
    /// Scan one location.
    ///
    /// # Errors
    ///
    /// Fails when the location cannot be listed or one of its files cannot be parsed.
    fn scan(&self, location: &Path) -> Result<Vec<SourceFile>>;
}

/// Scans a directory of Rust sources with [`FileScanner`] and [`AstParser`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RustSourceScanner;

impl RustSourceScanner {
    pub fn new() -> Self {
        Self
    }
}

impl SourceScanner for RustSourceScanner {
    fn scan(&self, location: &Path) -> Result<Vec<SourceFile>> {
        let listing = FileScanner::new(location.to_path_buf()).scan()?;
        debug!(
            "Found {} Rust files in {}",
            listing.rust_files.len(),
            location.display()
        );

        let parsed = AstParser::parse_files(&listing.rust_files)?;
        Ok(parsed.iter().map(AstParser::collect_declarations).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .rust_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn test() {}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["lib.rs", "main.rs"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();

        assert!(result.rust_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_does_not_descend() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("models")).unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("models/user.rs"), "struct User {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["main.rs"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().join("nope"));

        assert!(matches!(scanner.scan(), Err(Error::ReadError { .. })));
    }

    #[test]
    fn test_rust_source_scanner_collects_declarations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(
            root.join("events.rs"),
            "/// Reset asyncApi\n/// @queue reset\npub fn reset() {}\npub struct Reset { pub at: u64 }",
        )
        .unwrap();
        fs::write(root.join("model.rs"), "pub struct User { pub id: u32 }").unwrap();

        let sources = RustSourceScanner::new().scan(root).unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].module, "events");
        assert_eq!(sources[0].functions.len(), 1);
        assert_eq!(sources[0].types[0].qualified_name(), "events.Reset");
        assert_eq!(sources[1].types[0].qualified_name(), "model.User");
    }

    #[test]
    fn test_rust_source_scanner_fails_on_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("good.rs"), "pub fn ok() {}").unwrap();
        fs::write(root.join("bad.rs"), "pub fn broken( {").unwrap();

        let result = RustSourceScanner::new().scan(root);

        assert!(matches!(result, Err(Error::ParseError { .. })));
    }
}
