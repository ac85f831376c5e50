pub mod json;
pub mod store;

pub use store::Store;
