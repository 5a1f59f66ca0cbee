mod catalog;
mod config;
mod labels;
mod reactivate;
mod session_index;
mod session_log;
mod staged_write;
#[cfg(test)]
pub mod test_fixtures;

pub use catalog::*;
pub use config::*;
pub use labels::*;
pub use reactivate::*;
pub use session_index::*;
pub use session_log::*;
pub use staged_write::*;
