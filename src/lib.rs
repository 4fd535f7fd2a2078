// Thu Jan 15 2026 - Alex

pub mod config;
pub mod heap;
pub mod memory;
pub mod rules;
pub mod session;
pub mod typesystem;
pub mod utils;

pub use config::Config;
pub use heap::{HeapInterpreter, PointerFlags, PointerInfo, SegmentedHeap};
pub use rules::{BoundRuleset, RuleGroupStore};
pub use session::AnalysisSession;
pub use typesystem::{DescribedTypeSystem, PointerOffsetTable, TypeSystem};
