pub mod error;
pub mod math;
pub mod types;

pub use error::*;
pub use math::*;
pub use types::*;
