pub mod kv;
pub mod state;

pub use kv::KvStore;
pub use state::StateStore;
