pub mod cancel;
pub mod config;
pub mod logging;
pub mod sui;
pub mod walrus;
