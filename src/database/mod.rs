pub mod manager;
pub mod todos;

pub use manager::Db;
pub use todos::{PgTodoStore, RecordStore, StoreError};
