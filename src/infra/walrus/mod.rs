//! Blob store access: publishers for writes, aggregators for reads.

pub mod reader;
pub mod response;
pub mod uploader;

pub use reader::BlobReader;
pub use response::StoreResponse;
pub use uploader::BlobUploader;
