//! Common utilities shared across textchunk crates
//!
//! Error classification, environment bootstrap and the identifier attached
//! to every chunking run in the logs.

pub mod error;
pub mod init;
pub mod run_id;

pub use error::{CommonError, ErrorKind};
pub use init::initialize_environment;
pub use run_id::RunId;
