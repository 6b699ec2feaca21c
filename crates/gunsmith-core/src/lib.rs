//! Gunsmith Core -- data-driven gun configuration with network replication.
//!
//! Gun definitions are loaded per item (see the `gunsmith-data` crate),
//! validated, and published as an immutable [`snapshot::Snapshot`] through
//! a [`registry::GunRegistry`]. The server replicates its snapshot to
//! clients, which rebind each gun to their own item with the same
//! identifier.
//!
//! # Data Flow
//!
//! 1. **Load** -- one definition per gun item is parsed into a [`gun::Gun`].
//! 2. **Validate** -- [`validation::validate`] walks the gun's schema tables
//!    and rejects unset required fields.
//! 3. **Publish** -- the registry swaps in the new snapshot and binds each
//!    gun to its item through the host's [`item::ItemHost`].
//! 4. **Replicate** -- [`wire`] encodes the snapshot; [`sync::apply_sync`]
//!    installs it on the client.
//!
//! # Key Types
//!
//! - [`id::Identifier`] -- `namespace:path` key for items and definitions.
//! - [`gun::Gun`] -- typed gun configuration with default values.
//! - [`tag::Compound`] -- self-describing tagged tree used for the binary
//!   form of a gun.
//! - [`snapshot::Snapshot`] -- immutable identifier-to-gun mapping.
//! - [`registry::GunRegistry`] -- atomically replaceable current snapshot.
//! - [`sync::UpdateGuns`] -- handshake message carrying a snapshot.

pub mod gun;
pub mod id;
pub mod item;
pub mod registry;
pub mod snapshot;
pub mod sync;
pub mod tag;
pub mod validation;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
