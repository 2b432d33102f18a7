//! Project synchronization between Dradis and a local file tree.
//!
//! - **Import**: remote project → one markup file per entity
//! - **Export**: local files → create-or-update calls against the project
//! - **Fields**: `#[Field]#` parsing shared by both directions
//! - **Attachments**: upload and path rewriting for `!path!` references
//!
//! # Architecture
//!
//! A [`SyncSession`] owns the remote client handle and the per-run caches
//! (nodes, issues, content blocks). The [`Exporter`] walks the tree and calls
//! into `reconcile` for each file; every item failure is recorded in
//! [`ExportStats`] and the walk continues.
//!
//! # Layout
//!
//! ```text
//! <project>/
//!   Content Blocks/<title>.textile
//!   document_properties.ini
//!   Issues/<title>.textile
//!   Nodes/<label>/Evidences/<issue>/Evidence-<n>-<issue>.textile
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dradismd::convert::PandocConverter;
//! use dradismd::sync::{Exporter, UploadedFilesHeuristic};
//!
//! let report = Exporter::new(&client, 47, &PandocConverter::new(), &UploadedFilesHeuristic)
//!     .export_path(Path::new("ACME"))?;
//! println!("{} items", report.stats.total());
//! ```

pub mod attachments;
mod export;
pub mod fields;
mod file;
mod import;
pub mod layout;
mod names;
mod reconcile;
mod resolve;
mod session;
mod types;

pub use export::Exporter;
pub use file::{atomic_write, dirs_in, files_in, properties_content, read_properties, read_text};
pub use import::{Importer, tree_entries};
pub use names::{find_by_name, local_stem, names_match, next_available_name, sanitize};
pub use reconcile::Reconciled;
pub use resolve::{NodeResolver, UploadedFilesHeuristic};
pub use session::SyncSession;
pub use types::{
    EntityStats, ExportReport, ExportStats, ImportReport, ImportStats, ItemFailure, Outcome,
    SyncError, SyncResult,
};
