// Pipeline settings: types and JSON persistence.

pub mod store;
pub mod types;
