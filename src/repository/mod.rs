//! Store contracts and their implementations

pub mod auth_repo;
pub mod memory;
pub mod user_repo;

pub use auth_repo::{AuthRepository, RefreshTokenStore};
pub use memory::MemoryStore;
pub use user_repo::{UserRepository, UserStore};
