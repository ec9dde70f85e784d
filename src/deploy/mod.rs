//! Folder-to-archive deployment pipeline

pub mod archive;
pub mod filter;
pub mod manifest;
pub mod pipeline;

pub use archive::{encode_archive, read_file_entries, FileEntry};
pub use filter::{collect_files, should_exclude};
pub use manifest::{generate_slug, DeployManifest};
pub use pipeline::{deploy_folder, DeployOutcome};
