// Thu Jan 15 2026 - Alex

pub mod described;
pub mod error;
pub mod offsets;
pub mod traits;

pub use described::{DescribedTypeSystem, LayoutBuilder, LayoutDescription};
pub use error::TypeSystemError;
pub use offsets::PointerOffsetTable;
pub use traits::TypeSystem;
