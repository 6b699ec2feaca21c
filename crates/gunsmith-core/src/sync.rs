//! Server-to-client gun synchronization.
//!
//! During the login handshake the server sends [`UpdateGuns`] carrying its
//! current snapshot. The client decodes it and hands the result to
//! [`apply_sync`], which installs the snapshot and rebinds every gun to the
//! client's own item with the same identifier.

use bytes::{Buf, BufMut};
use std::sync::Arc;

use crate::item::{BindingError, ItemHost};
use crate::registry::GunRegistry;
use crate::snapshot::Snapshot;
use crate::wire::{self, WireError};

/// Why a sync could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync message carried no gun snapshot")]
    MissingSnapshot,
    #[error("failed to decode gun snapshot: {0}")]
    Decode(#[from] WireError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// The handshake message replicating the server's gun snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateGuns {
    guns: Arc<Snapshot>,
}

impl UpdateGuns {
    pub fn new(guns: Arc<Snapshot>) -> Self {
        Self { guns }
    }

    /// A message carrying the registry's current snapshot.
    pub fn from_registry(registry: &GunRegistry) -> Self {
        Self::new(registry.snapshot())
    }

    pub fn guns(&self) -> &Arc<Snapshot> {
        &self.guns
    }

    pub fn into_guns(self) -> Arc<Snapshot> {
        self.guns
    }

    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), WireError> {
        wire::write_registered_guns(buf, &self.guns)
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, WireError> {
        let guns = wire::read_registered_guns(buf)?;
        Ok(Self::new(Arc::new(guns)))
    }
}

/// Install a decoded snapshot on the client and bind its guns.
///
/// `None` stands for a message whose snapshot could not be produced and
/// fails with [`SyncError::MissingSnapshot`] without touching the registry.
/// Otherwise the snapshot is installed first and guns are bound in
/// identifier order; the first identifier that does not resolve to a local
/// gun item aborts with [`SyncError::Binding`], leaving earlier bindings in
/// place. Whether that is fatal to the connection is the caller's call.
pub fn apply_sync<H: ItemHost + ?Sized>(
    registry: &GunRegistry,
    guns: Option<Arc<Snapshot>>,
    host: &H,
) -> Result<(), SyncError> {
    let Some(guns) = guns else {
        tracing::warn!("gun sync received without a snapshot");
        return Err(SyncError::MissingSnapshot);
    };
    let count = guns.len();
    registry.publish(guns, host).map_err(|e| {
        tracing::warn!(error = %e, "gun sync could not bind every entry");
        SyncError::Binding(e)
    })?;
    tracing::debug!(count, "applied gun sync");
    Ok(())
}

/// Decode an [`UpdateGuns`] frame from `buf` and apply it.
///
/// A frame that fails to decode leaves the registry untouched.
pub fn handle_update_guns<H: ItemHost + ?Sized>(
    registry: &GunRegistry,
    buf: &mut impl Buf,
    host: &H,
) -> Result<(), SyncError> {
    let message = UpdateGuns::decode(buf).map_err(|e| {
        tracing::warn!(error = %e, "dropping malformed gun sync");
        SyncError::Decode(e)
    })?;
    apply_sync(registry, Some(message.into_guns()), host)
}
