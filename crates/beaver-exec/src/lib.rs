//! beaver-exec: Command execution abstraction
//!
//! Provides the trait and the local implementation used to drive host tools
//! (apt, service, juju hook tools) from the charm.

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::CommandLine;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
