//! Multipart uploads to S3 buckets, every request signed by a remote signing
//! authority.
//!
//! * [`upload::Coordinator`] runs one session per file, files concurrently
//! * [`upload::Session`] drives initiate, upload part and complete for a file
//! * [`s3::signer::Signer`] asks the authority for the `Authorization` header

pub mod cli;
pub mod s3;
pub mod upload;
