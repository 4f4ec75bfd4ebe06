mod memory_blob;

pub use memory_blob::{InMemoryBlobStore, StoredBlob};
