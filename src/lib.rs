//! # hyouji
//!
//! An interactive command-line tool for managing GitHub issue labels in a
//! single repository.
//!
//! ## Features
//! - Label creation, deletion and file import (JSON/YAML) with dry-run mode
//! - Credential persistence with at-rest token obfuscation
//! - Repository auto-detection from the local Git remotes

pub mod app;
pub mod credentials;
pub mod crypto;
pub mod detect;
pub mod error;
pub mod github;
pub mod labels;

pub use credentials::{CredentialStore, MigrationOutcome, StoredCredentials};
pub use detect::{detect_repository, DetectionMethod, DetectionResult, RepositoryReference};
pub use error::{Error, Result};
pub use github::{CreateOutcome, DeleteOutcome, LabelClient};
pub use labels::{ImportBatch, LabelRecord};
