

pub mod catalog;
pub mod store;

pub use catalog::{Book, Catalog, InMemoryCatalog};
pub use store::{
    EmbeddingRecord, EmbeddingStore, EntityType, FlatIndex, IndexSnapshot, Neighbor, VectorIndex,
    neighbor_order,
};
