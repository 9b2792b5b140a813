// Adapters layer: concrete implementations of the collaborator ports.

pub mod memory;

pub use memory::InMemoryStore;
