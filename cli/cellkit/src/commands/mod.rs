//! CLI command implementations.

pub mod convert;
pub mod hash;
pub mod init;
pub mod inspect;
