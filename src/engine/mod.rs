pub mod error;
pub mod graph;
pub mod history;
pub mod interaction;
pub mod session;
pub mod templates;
pub mod types;
