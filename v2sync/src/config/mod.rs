mod error;
mod merge;
mod template;

pub use error::*;
pub use merge::*;
pub use template::*;
