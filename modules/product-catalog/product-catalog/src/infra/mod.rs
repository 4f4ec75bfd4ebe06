pub mod blob;
pub mod storage;

pub use blob::InMemoryBlobStore;
pub use storage::InMemoryProductStore;
