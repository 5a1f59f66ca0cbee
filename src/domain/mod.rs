mod catalog;
mod labels;
mod resolve;
mod session_log;
mod timestamp;
mod types;

pub use catalog::*;
pub use labels::*;
pub use resolve::*;
pub use session_log::*;
pub use timestamp::*;
pub use types::*;
