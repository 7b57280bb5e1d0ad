//! # figsync-sync
//!
//! Reconciles locally produced artifacts with a remote collection.
//!
//! Call [`pipeline::run`] with a [`SyncRequest`] to process every requested
//! task × model pair; each task yields a [`TaskReport`].

pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use error::{RunFailure, SyncError};
pub use pipeline::{run, SyncRequest};
pub use reconcile::{remote_name, ModelSync, Reconciler};
pub use report::{FileAction, FileOutcome, TaskReport};
