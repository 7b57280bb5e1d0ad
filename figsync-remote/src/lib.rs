//! # figsync-remote
//!
//! The [`Repository`] trait the sync engine depends on, and its Figshare
//! implementation over a blocking HTTP agent with bounded retries.

pub mod backoff;
pub mod client;
pub mod error;
pub mod repository;

pub use backoff::{Backoff, RetryPolicy};
pub use client::FigshareClient;
pub use error::{ApiErrorClass, RemoteError};
pub use repository::{RemoteInventory, Repository, UploadReceipt};
