use crate::generator::CodeGenerator;
use giftcode_core::RedemptionCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic codes like `TEST-000000`, `TEST-000001`, ...
///
/// Unique within one instance; meant for fixtures and dry runs.
#[derive(Debug)]
pub struct SequentialCodeGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SequentialCodeGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Starts counting from `offset`, e.g. to continue a previous batch.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl CodeGenerator for SequentialCodeGenerator {
    fn generate(&self) -> RedemptionCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        RedemptionCode::new_unchecked(format!("{}-{:06}", self.prefix, count))
    }
}
