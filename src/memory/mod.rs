// Tue Jan 13 2026 - Alex

pub mod buffer;
pub mod error;
pub mod mmap;
pub mod native;
pub mod traits;
pub mod view;

pub use buffer::ByteBuffer;
pub use error::MemoryError;
pub use mmap::MappedFile;
pub use native::{NativeSize, NativeWord};
pub use traits::MemoryAccessor;
pub use view::MemoryView;
