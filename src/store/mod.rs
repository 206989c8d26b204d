pub mod history;
pub mod models;

pub use history::HistoryStore;
pub use models::{History, Snapshot};
