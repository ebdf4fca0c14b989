mod cache;

pub use cache::CollectionCache;
