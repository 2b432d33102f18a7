//! dradismd - Sync Dradis Pro projects with local markup files
//!
//! This crate provides the core functionality for the `dradismd` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Project, Node, Evidence, Issue, ContentBlock)
//! - [`remote`] - Dradis Pro API client
//! - [`sync`] - Import/export between a project and a local tree
//! - [`convert`] - Markup conversion through pandoc
//! - [`library`] - Issue library search
//! - [`scaffold`] - Local issue and evidence creation
//! - [`rename`] - Attachment renaming in markdown files
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod library;
pub mod model;
pub mod remote;
pub mod rename;
pub mod scaffold;
pub mod sync;

pub use error::{Error, Result};
