//! CLI command handlers, one per file.

mod abort;
mod add;
mod checksum;
mod describe;
mod fetch;
mod run;
mod shutdown;

pub use abort::run_abort;
pub use add::run_add;
pub use checksum::run_checksum;
pub use describe::run_describe;
pub use fetch::run_fetch;
pub use run::run_worker;
pub use shutdown::run_shutdown;
