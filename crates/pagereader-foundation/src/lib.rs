pub mod error;
pub mod shutdown;
pub mod tab;

pub use error::*;
pub use shutdown::*;
pub use tab::*;
