// Tue Jan 13 2026 - Alex

pub mod logging;
pub mod warnings;

pub use logging::{LoggingUtils, ScopedTimer};
pub use warnings::{WarningLog, BIND_PHASE};

pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
