//! Filesystem adapters: manifest discovery, manifest reading, report output.
mod file_reader;
mod file_writer;
mod manifest_walker;

pub use file_reader::{read_manifest, read_sibling};
pub use file_writer::{FileSystemWriter, StdoutPresenter};
pub use manifest_walker::FileSystemManifestDetector;
