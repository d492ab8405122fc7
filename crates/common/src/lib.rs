pub mod config;
pub mod content;
pub mod hash;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "s3")]
pub mod s3;
