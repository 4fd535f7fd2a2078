// Tue Jan 13 2026 - Alex

pub mod error;
pub mod interpreter;
pub mod layout;
pub mod pointer;
pub mod segment;
pub mod segments;

pub use error::HeapError;
pub use interpreter::{HeapInterpreter, TaggedReference, WeightedReference};
pub use layout::{FixedHeaderLayout, HeapLayout};
pub use pointer::{PointerFlags, PointerInfo, PointerKind, ARRAY_ELEMENT, ARRAY_SENTINEL};
pub use segment::HeapSegment;
pub use segments::SegmentedHeap;
