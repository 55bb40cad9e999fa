//! Record-store backends for issued gift codes.

pub mod memory;
pub mod postgres;
pub mod postgrest;

pub use giftcode_core::error::StorageError;
pub use giftcode_core::repository::{AdminRepository, ReadRepository, Repository};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use postgrest::{PostgrestConfig, PostgrestRepository};
