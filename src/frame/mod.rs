// Frame domain: geometry, owned pixel buffers, and boundary outcomes.

pub mod buffer;
pub mod error;
pub mod outcome;
pub mod types;
