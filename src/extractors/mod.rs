// src/extractors/mod.rs
pub mod classify;
pub mod coercion;
pub mod columns;
pub mod kinds;
pub mod record;
pub mod table;

// Re-export key extraction types for convenience
pub use coercion::CoercionRegistry;
pub use kinds::{KindCatalog, TableKind};
pub use record::Record;
pub use table::Extractor;
