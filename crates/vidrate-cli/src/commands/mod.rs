pub mod export;
pub mod init;
pub mod ratings;
pub mod reset;
pub mod session;
pub mod status;
pub mod validate;
