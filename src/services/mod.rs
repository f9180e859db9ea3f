// Service exports
pub mod channel;
pub mod memory;
pub mod postgres;
pub mod profile_store;
pub mod store;

pub use channel::ConversationHub;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use profile_store::{HttpProfileStore, MemoryProfileStore, ProfileStore, ProfileStoreError};
pub use store::{EngineStore, StoreError};
