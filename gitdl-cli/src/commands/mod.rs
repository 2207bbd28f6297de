pub mod init;
pub mod remove;
pub mod status;
pub mod sync;
