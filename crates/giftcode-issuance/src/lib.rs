//! Gift-code issuance: code generation and batch administration.

pub mod error;
pub mod generator;
pub mod service;

pub use error::IssuanceError;
pub use generator::random::RandomCodeGenerator;
pub use generator::seq::SequentialCodeGenerator;
pub use generator::{generate_batch, CodeGenerator};
pub use service::IssuanceService;
