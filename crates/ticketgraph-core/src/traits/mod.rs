pub mod source;
pub mod store;

pub use source::SourceRegistrar;
pub use store::{EntityStore, EntityTxn};
