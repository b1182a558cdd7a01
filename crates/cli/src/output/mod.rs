//! Result envelope printed by every command.

mod format;
mod model;

pub use format::OutputFormat;
pub use model::{CommandError, CommandResult, ErrorCode, ResultBuilder, print_result};
