pub mod config;
pub mod crud;
pub mod engine;
pub mod http;
pub mod schemas;
pub mod sync;

pub use crate::engine::error::GraphError;
pub use crate::engine::session::EditorSession;
pub use crate::http::ApiClient;
pub use crate::http::error::Error as SyncError;
pub use crate::sync::SyncGateway;
