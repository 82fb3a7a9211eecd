pub mod entity;

pub use entity::{CatalogEntry, CatalogId, MediaType};
