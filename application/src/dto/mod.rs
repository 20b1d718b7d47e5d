pub mod ask;
pub mod upload;

pub use ask::*;
pub use upload::*;
