//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
//! Socrata Rust SDK
//!
//! This is a Rust client for the Socrata open data publishing API. It lets
//! applications create, import and delete datasets, manage their columns and
//! metadata, read and write rows, upload files, and send many write operations
//! to the service in a single request.
//!
//! This SDK supplies and uses Rust `async` methods throughout, using the [tokio](https://crates.io/crates/tokio) runtime. There is currently no blocking support.
//!
//! The general flow for an application using the SDK is:
//! - Create a [`HandleBuilder`] with all needed parameters
//! - Create a [`Handle`] from the [`HandleBuilder`] that will be used throughout the application
//! - Work with datasets using the [`Handle`], [`Dataset`] and Request structs such as [`CreateDatasetRequest`] and [`FindViewsRequest`]
//!
//! ## Simple Example
//! The following code creates a [`Handle`] from values in the current environment, creates a
//! dataset and adds a row to it.
//! ```no_run
//! use socrata_rust_sdk::{ColumnSpec, CreateDatasetRequest, Handle, Record};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let handle = Handle::builder()
//!         .from_environment()?
//!         .build().await?;
//!     let ds = CreateDatasetRequest::new("Nominations")
//!         .description("Who should win")
//!         .execute(&handle)
//!         .await?
//!         .completed()
//!         .ok_or("create was queued")?;
//!     ds.add_column(&handle, &ColumnSpec::new("Nominee")).await?;
//!     ds.add_row(&handle, &Record::new().column("Nominee", "Rust")).await?;
//!     println!("see {}", ds.short_url(&handle)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuring the SDK
//!
//! A [`Handle`] needs the API endpoint of the site to talk to and, for anything
//! but reading public data, a username and password. These can be given in code,
//! read from a config file, or taken from the environment:
//! ```no_run
//! # use socrata_rust_sdk::Handle;
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // In code
//! let handle = Handle::builder()
//!     .endpoint("https://data.example.com/api")?
//!     .basic_auth("publisher@example.com", "secret")?
//!     .build().await?;
//!
//! // From ~/.socrata/config
//! let handle = Handle::builder()
//!     .auth_from_file("~/.socrata/config")?
//!     .build().await?;
//!
//! // From SOCRATA_* environment variables
//! let handle = Handle::builder()
//!     .from_environment()?
//!     .build().await?;
//! # Ok(())
//! # }
//! ```
//! See [`HandleBuilder::auth_from_file()`] for the config file format and
//! [`HandleBuilder::from_environment()`] for the environment variables used.
//!
//! ## Batching
//!
//! Write operations issued inside [`Handle::with_batch()`] are not sent one by
//! one. They are queued, and sent together as one request when the batch ends.
//! Each queued operation returns [`Submitted::Queued`] holding its position in the
//! batch, and the results come back from `with_batch` in that order:
//! ```no_run
//! # use socrata_rust_sdk::{Dataset, Handle, Record, RowQuery, ROW_ID_FIELD};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! # let handle = Handle::builder().from_environment()?.build().await?;
//! let ds = Dataset::open(&handle, "n5m4-mism").await?;
//! // reads are never queued
//! let rows = ds.rows(&handle, &RowQuery::new()).await?;
//! let (h, d) = (&handle, &ds);
//! let results = handle
//!     .with_batch(|| async move {
//!         for row in &rows {
//!             if let Some(id) = row.get(ROW_ID_FIELD) {
//!                 let update = Record::new().column("Column 1", id.clone());
//!                 d.update_row(h, &id.to_string(), &update).await?;
//!             }
//!         }
//!         Ok(())
//!     })
//!     .await?;
//! println!("updated {} rows", results.len());
//! # Ok(())
//! # }
//! ```
//! The service is not transactional. If it rejects an operation, `with_batch`
//! returns a [`SocrataErrorCode::BatchOperationFailed`] error describing the
//! first rejected operation, and the others may or may not have been applied.
//!
//! Uploads ([`ImportRequest`], [`Dataset::upload_file()`], [`Dataset::append()`],
//! [`Dataset::replace()`] and [`Dataset::truncate()`]) cannot be batched and fail
//! with [`SocrataErrorCode::UnsupportedInBatch`] inside a batch.
//!
//! ## Logging
//!
//! The SDK logs through [tracing](https://crates.io/crates/tracing). Install any
//! subscriber, such as `tracing-subscriber`, to see requests (`trace`), handle
//! and batch activity (`debug`) and failed batches (`warn`).

pub(crate) mod auth_common;
pub use crate::auth_common::credentials::Credentials;

pub(crate) mod batch_response;
pub use crate::batch_response::BatchResult;

pub(crate) mod batch_session;
pub use crate::batch_session::BatchMode;

pub(crate) mod column;
pub use crate::column::{ColumnSpec, ColumnType};

pub(crate) mod dataset;
pub use crate::dataset::Dataset;

pub(crate) mod dataset_request;
pub use crate::dataset_request::{CreateDatasetRequest, FindViewsRequest, ImportRequest};

pub(crate) mod error;
pub use crate::error::{FailedOperation, SocrataError, SocrataErrorCode};

pub(crate) mod handle;
pub use crate::handle::Handle;

pub(crate) mod handle_builder;
pub use crate::handle_builder::HandleBuilder;

pub(crate) mod request_descriptor;
pub use crate::request_descriptor::{RequestDescriptor, RequestMethod};

pub(crate) mod row_query;
pub use crate::row_query::{ColumnKey, RowQuery, ROW_ID_FIELD};

pub mod types;
pub use crate::types::{Attachment, FourFour, Record, Submitted, User, View};
