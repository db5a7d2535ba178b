pub mod error;
pub mod frame;
pub mod planner;

pub use error::{Error as S7Error, Result as S7Result};
