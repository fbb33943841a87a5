pub mod http;
pub mod records;
pub mod storage;

pub use http::{AuthContext, HttpApi};
pub use records::UserRecord;
pub use storage::{FileStore, MemoryStore};
