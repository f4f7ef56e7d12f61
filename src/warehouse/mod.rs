pub mod models;
pub mod schema;
mod store;

pub use models::{ConflictPolicy, Table, WarehouseRow};
pub use store::WarehouseStore;
