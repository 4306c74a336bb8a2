pub mod analyzer;
pub mod cleaner;
pub mod dataset;
pub mod remote_sync;
pub mod store;
