//! COTAHIST core: record schema, fixed-width decoder, artifact naming, storage
//! and source backends.
//!
//! - Schema registry for the 245-byte COTAHIST record layout
//! - Archive decoder producing a polars `DataFrame`, and its Parquet encoding
//! - Artifact naming and period classification
//! - Blob stores (local directory, S3-compatible bucket, in-memory)
//! - The exchange catalog/fetch source

pub mod decode;
pub mod naming;
pub mod sample;
pub mod schema;
pub mod source;
pub mod storage;

pub use decode::{decode, decode_file, encode_parquet, read_parquet, DecodeError};
pub use naming::{classify, to_converted_name, Artifact, Granularity, Period};
pub use source::{CatalogEntry, RemoteCatalog, SeriesSource, SourceError};
pub use storage::{open_store, BlobStore, StorageBackend, StorageError};
