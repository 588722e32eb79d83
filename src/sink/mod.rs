//! Object store sink (S3, R2, GCS, Azure, local)
//!
//! The write path depends only on the [`ObjectSink`] capability: open an
//! upload at a key, then commit or discard it. The concrete implementation
//! rides on `object_store` multipart uploads.

mod store;

pub use store::{output_object_key, CloudSink, ObjectSink, ObjectUpload};
