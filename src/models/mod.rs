//! Request-scoped data models for the ingestion service.
//!
//! Nothing here outlives a request: uploaded files are described after they
//! hit disk, and insert records exist only until their row is written.

pub mod record;
pub mod uploaded_file;
