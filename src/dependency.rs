use crate::error::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Locations related to a scanned location, plus anything skipped along the way.
#[derive(Debug, Default)]
pub struct RelatedLocations {
    /// Related locations, sorted by path
    pub locations: Vec<PathBuf>,
    /// Warning messages for entries that could not be inspected
    pub warnings: Vec<String>,
}

/// Lists the locations a location depends on.
pub trait DependencyEnumerator {
    /// Related locations of `location`. `remaining_depth` is the depth budget left
    /// for the locations returned.
    fn related_locations(&self, location: &Path, remaining_depth: usize)
        -> Result<RelatedLocations>;
}

/// Treats every immediate subdirectory holding Rust files as a related module.
///
/// Hidden directories and `target` are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleDirEnumerator;

impl ModuleDirEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl DependencyEnumerator for ModuleDirEnumerator {
    fn related_locations(
        &self,
        location: &Path,
        remaining_depth: usize,
    ) -> Result<RelatedLocations> {
        if !location.is_dir() {
            return Err(Error::ReadError {
                path: location.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        debug!(
            "Listing modules under {} (remaining depth {})",
            location.display(),
            remaining_depth
        );

        let mut related = RelatedLocations::default();

        for entry in WalkDir::new(location).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) if entry.file_type().is_dir() && !is_ignored(&entry) => {
                    if contains_rust_files(entry.path(), &mut related.warnings) {
                        related.locations.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    related.warnings.push(warning);
                }
            }
        }

        related.locations.sort();
        debug!("Found {} related modules", related.locations.len());
        Ok(related)
    }
}

fn is_ignored(entry: &DirEntry) -> bool {
    let file_name = entry.file_name().to_string_lossy();
    file_name.starts_with('.') || file_name == "target"
}

fn contains_rust_files(dir: &Path, warnings: &mut Vec<String>) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                })
                .ok()
        })
        .any(|entry| is_rust_file(entry.path()))
}

pub(crate) fn is_rust_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs")
}
