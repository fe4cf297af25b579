pub mod artifact;
pub mod error;
pub mod fetch;
pub mod http;
pub mod install;
pub mod launch;
pub mod manifest;
pub mod platform;
pub mod runtime;
pub mod verify;
