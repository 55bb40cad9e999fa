pub mod random;
pub mod seq;

use giftcode_core::RedemptionCode;
use std::collections::HashSet;

/// Produces candidate gift codes.
///
/// Implementations do not consult the record store; uniqueness across
/// batches is enforced by the primary key on insert.
pub trait CodeGenerator: Send + Sync + 'static {
    fn generate(&self) -> RedemptionCode;
}

/// Draws `count` codes and drops duplicates, so the result may be shorter
/// than requested. Order follows first appearance.
pub fn generate_batch<G: CodeGenerator + ?Sized>(generator: &G, count: usize) -> Vec<RedemptionCode> {
    let mut seen = HashSet::with_capacity(count);
    (0..count)
        .map(|_| generator.generate())
        .filter(|code| seen.insert(code.as_str().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cycles through a fixed set of codes.
    struct Repeating {
        codes: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl CodeGenerator for Repeating {
        fn generate(&self) -> RedemptionCode {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            RedemptionCode::new_unchecked(self.codes[i % self.codes.len()])
        }
    }

    #[test]
    fn batch_drops_duplicates() {
        let generator = Repeating {
            codes: vec!["GFT-A", "GFT-B", "GFT-A"],
            next: AtomicUsize::new(0),
        };

        let batch = generate_batch(&generator, 5);
        let codes: Vec<&str> = batch.iter().map(RedemptionCode::as_str).collect();
        assert_eq!(codes, ["GFT-A", "GFT-B"]);
    }

    #[test]
    fn empty_batch() {
        let generator = seq::SequentialCodeGenerator::with_prefix("T");
        assert!(generate_batch(&generator, 0).is_empty());
    }
}
