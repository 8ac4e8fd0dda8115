pub mod main;
pub mod memory;
pub mod models;
pub mod store;

pub use main::Db;
pub use memory::MemoryStore;
pub use store::{Event, EventDraft, Fight, FightUpsert, Store};
