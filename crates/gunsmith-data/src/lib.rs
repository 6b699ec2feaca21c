//! Loading gun definitions from data files into a [`gunsmith_core::registry::GunRegistry`].

pub mod config;
pub mod loader;
pub mod source;

pub use config::LoaderConfig;
pub use loader::{Format, GunLoader, LoadError, PreparedGuns, ReloadSummary};
pub use source::{DirectorySource, MemorySource, ResourceSource};
