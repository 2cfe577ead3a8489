//! Built-in lifecycle handlers, wired from the deployer file by
//! [`crate::application::services::setup::build_deployer`].

pub mod files;
pub mod launcher;
pub mod proxy;
pub mod source;

pub use files::FileInstaller;
pub use launcher::LauncherInstaller;
pub use proxy::ProxyRouter;
pub use source::SourceArchive;
