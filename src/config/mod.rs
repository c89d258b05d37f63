pub mod loader;
mod types;
mod watcher;

pub use loader::{DB_URL_ENV, PORT_ENV};
pub use types::*;
pub use watcher::{SeedEvent, SeedWatcher};
