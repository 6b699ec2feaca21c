//! Reload pipeline: reads one definition per gun item, validates it, and
//! publishes the resulting snapshot.
//!
//! Loading runs in two phases. [`GunLoader::prepare`] reads resources and
//! builds a [`Snapshot`] without touching any shared state; every gun item
//! gets exactly one entry, the parsed gun or the fallback. [`GunLoader::apply`]
//! publishes that snapshot through the registry, which binds each gun to its
//! item. [`GunLoader::reload`] runs both.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use gunsmith_core::gun::Gun;
use gunsmith_core::id::Identifier;
use gunsmith_core::item::{BindingError, ItemHost};
use gunsmith_core::registry::GunRegistry;
use gunsmith_core::snapshot::Snapshot;
use gunsmith_core::validation::{ValidationError, validate};

use crate::config::LoaderConfig;
use crate::source::ResourceSource;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a single definition or a config file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No document exists for the gun in any probed format.
    #[error("resource {path} not found")]
    ResourceNotFound { path: String },

    /// Documents for the same gun exist in more than one format.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: String, b: String },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: String },

    /// The document is malformed.
    #[error("parse error in {path}: {detail}")]
    Parse { path: String, detail: String },

    /// The document parsed but a required property is unset.
    #[error("missing required properties for {path}: {source}")]
    Validation {
        path: String,
        #[source]
        source: ValidationError,
    },

    /// Reading the resource failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Ron,
    Toml,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Ron => "ron",
            Format::Toml => "toml",
        }
    }

    /// Deserialize `bytes`; `path` only labels errors.
    pub fn parse<T: DeserializeOwned>(self, bytes: &[u8], path: &str) -> Result<T, LoadError> {
        let parse_err = |detail: String| LoadError::Parse {
            path: path.to_string(),
            detail,
        };
        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| parse_err(e.to_string())),
            Format::Ron => ron::de::from_bytes(bytes).map_err(|e| parse_err(e.to_string())),
            Format::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| parse_err(e.to_string()))?;
                toml::from_str(text).map_err(|e| parse_err(e.to_string()))
            }
        }
    }
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, LoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        _ => Err(LoadError::UnsupportedFormat {
            file: path.display().to_string(),
        }),
    }
}

// ===========================================================================
// Loader
// ===========================================================================

/// Result of [`GunLoader::prepare`].
#[derive(Debug, Clone, Default)]
pub struct PreparedGuns {
    /// One entry per gun item.
    pub snapshot: Snapshot,
    /// Items whose definition failed and that got the fallback gun.
    pub fallbacks: BTreeSet<Identifier>,
}

/// Loads gun definitions for every gun item known to the host.
#[derive(Debug, Clone)]
pub struct GunLoader {
    config: LoaderConfig,
    fallback: Arc<Gun>,
}

impl Default for GunLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl GunLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let fallback = Arc::new(config.fallback_gun());
        Self { config, fallback }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The gun shared by every item whose definition failed.
    pub fn fallback(&self) -> &Arc<Gun> {
        &self.fallback
    }

    /// Find, parse, and validate the definition of one gun item.
    pub fn load_gun(
        &self,
        source: &dyn ResourceSource,
        id: &Identifier,
    ) -> Result<Gun, LoadError> {
        let mut found: Option<(Format, String, Vec<u8>)> = None;
        for &format in &self.config.formats {
            let path = id.resource_path(&self.config.directory, format.extension());
            let bytes = source.fetch(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let Some(bytes) = bytes else { continue };
            if let Some((_, existing, _)) = &found {
                return Err(LoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: path,
                });
            }
            found = Some((format, path, bytes));
        }

        let Some((format, path, bytes)) = found else {
            let extension = self
                .config
                .formats
                .first()
                .map_or(Format::Json.extension(), |f| f.extension());
            return Err(LoadError::ResourceNotFound {
                path: id.resource_path(&self.config.directory, extension),
            });
        };

        let gun: Gun = format.parse(&bytes, &path)?;
        validate(&gun).map_err(|source| LoadError::Validation { path, source })?;
        Ok(gun)
    }

    /// Load every item in `items`, substituting the fallback for failures.
    ///
    /// Items are independent; one failure never stops the others. Each
    /// failure is logged with the item's identifier.
    pub fn prepare(&self, source: &dyn ResourceSource, items: &[Identifier]) -> PreparedGuns {
        #[cfg(feature = "parallel")]
        let results: Vec<(Identifier, Result<Gun, LoadError>)> = {
            use rayon::prelude::*;
            items
                .par_iter()
                .map(|id| (id.clone(), self.load_gun(source, id)))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<(Identifier, Result<Gun, LoadError>)> = items
            .iter()
            .map(|id| (id.clone(), self.load_gun(source, id)))
            .collect();

        let mut fallbacks = BTreeSet::new();
        let snapshot = results
            .into_iter()
            .map(|(id, result)| {
                let gun = match result {
                    Ok(gun) => Arc::new(gun),
                    Err(error) => {
                        tracing::error!(%id, %error, "couldn't load gun data, using fallback");
                        fallbacks.insert(id.clone());
                        Arc::clone(&self.fallback)
                    }
                };
                (id, gun)
            })
            .collect();

        PreparedGuns {
            snapshot,
            fallbacks,
        }
    }

    /// Publish a prepared snapshot and bind its guns.
    pub fn apply<H: ItemHost + ?Sized>(
        &self,
        prepared: PreparedGuns,
        registry: &GunRegistry,
        host: &H,
    ) -> Result<(), BindingError> {
        registry
            .publish(Arc::new(prepared.snapshot), host)
            .inspect_err(|error| {
                tracing::error!(%error, "couldn't bind reloaded gun data");
            })
    }

    /// Load definitions for every gun item of `host` and publish them.
    pub fn reload<H: ItemHost + ?Sized>(
        &self,
        source: &dyn ResourceSource,
        registry: &GunRegistry,
        host: &H,
    ) -> Result<ReloadSummary, BindingError> {
        let items = host.gun_items();
        let prepared = self.prepare(source, &items);
        let summary = ReloadSummary {
            loaded: prepared.snapshot.len().saturating_sub(prepared.fallbacks.len()),
            fallbacks: prepared.fallbacks.len(),
        };
        self.apply(prepared, registry, host)?;
        tracing::info!(
            loaded = summary.loaded,
            fallbacks = summary.fallbacks,
            "reloaded gun data"
        );
        Ok(summary)
    }
}

/// Counts from a completed reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub loaded: usize,
    pub fallbacks: usize,
}

// ===========================================================================
// Tests
// ===========================================================================
