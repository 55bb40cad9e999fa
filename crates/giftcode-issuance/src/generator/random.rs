use crate::generator::CodeGenerator;
use giftcode_core::RedemptionCode;
use rand::Rng;

pub const DEFAULT_PREFIX: &str = "GFT";
pub const DEFAULT_LENGTH: usize = 12;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random `PREFIX-XXXXXXXXXXXX` codes over `[A-Z0-9]`.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    prefix: String,
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> RedemptionCode {
        let mut rng = rand::rng();
        let body: String = (0..self.length)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect();
        RedemptionCode::new_unchecked(format!("{}-{}", self.prefix, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_batch;

    #[test]
    fn default_codes_have_expected_shape() {
        let code = RandomCodeGenerator::default().generate();
        let (prefix, body) = code.as_str().split_once('-').unwrap();

        assert_eq!(prefix, "GFT");
        assert_eq!(body.len(), 12);
        assert!(body
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn generated_codes_pass_validation() {
        let code = RandomCodeGenerator::new("PROMO", 8).generate();
        assert!(RedemptionCode::new(code.as_str()).is_ok());
        assert_eq!(code.as_str().len(), "PROMO-".len() + 8);
    }

    #[test]
    fn large_batch_is_unique() {
        let batch = generate_batch(&RandomCodeGenerator::default(), 1000);
        assert_eq!(batch.len(), 1000);
    }
}
