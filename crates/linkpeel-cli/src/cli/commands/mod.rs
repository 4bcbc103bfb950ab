//! CLI command handlers, one file per subcommand.

mod decode;
mod resolve;
mod scan;
mod serve;

pub use decode::run_decode;
pub use resolve::{run_resolve, ResolveArgs};
pub use scan::run_scan;
pub use serve::run_serve;
