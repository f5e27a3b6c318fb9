//! Metadata collaborators.
//!
//! This module defines how the schema core obtains metadata without knowing
//! where it comes from or how the document is encoded.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Schema::resolve                         │
//! └─────────────────────────────────────────────────────────────────┘
//!            │ fetch_metadata(cancel)            │ parse_metadata(payload)
//!            ▼                                   ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │  MetadataFetcher (async)     │   │  MetadataParser (sync)       │
//! │  - FileMetadataFetcher       │   │  - JsonRecordParser          │
//! │  - CachingFetcher<F, P>      │   │                              │
//! └──────────────────────────────┘   └──────────────────────────────┘
//!                                                │
//!                                                ▼
//!                                       MetadataRecords (flat)
//! ```

mod caching_fetcher;
mod error;
mod file_fetcher;
mod json_parser;
mod provider;
mod types;

pub use caching_fetcher::CachingFetcher;
pub use error::{MetadataError, MetadataResult};
pub use file_fetcher::FileMetadataFetcher;
pub use json_parser::JsonRecordParser;
pub use provider::{MetadataFetcher, MetadataParser};
pub use types::*;
