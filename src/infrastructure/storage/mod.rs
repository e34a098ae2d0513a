mod local_relocator;
mod local_store;

pub use local_relocator::{LocalFileRelocator, suffixed_name};
pub use local_store::LocalStagingStore;
