//! Binary codec for replicating a [`Snapshot`] to clients.
//!
//! Frame layout:
//!
//! ```text
//! count: VarInt
//! count x {
//!     identifier: VarInt byte length + UTF-8 "namespace:path"
//!     gun:        root compound tag (see crate::tag)
//! }
//! ```
//!
//! Entries are written in identifier order. Decoding is one-shot over a
//! complete buffer and fails as a whole on any malformed or missing byte;
//! it never returns a partial snapshot.

use bytes::{Buf, BufMut};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::gun::Gun;
use crate::id::{Identifier, IdentifierError};
use crate::snapshot::Snapshot;
use crate::tag::{self, TagError};

/// Longest identifier accepted on the wire, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 32767;

const VAR_INT_MAX_BYTES: usize = 5;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors produced while encoding or decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("frame truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("VarInt longer than {VAR_INT_MAX_BYTES} bytes")]
    VarIntTooLong,
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("string of length {len} exceeds maximum {max}")]
    StringTooLong { len: usize, max: usize },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("{0} entries exceed the VarInt count")]
    TooManyEntries(usize),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
    #[error("duplicate entry for {0}")]
    DuplicateEntry(Identifier),
    #[error("gun tag for {id}: {source}")]
    Gun {
        id: Identifier,
        #[source]
        source: TagError,
    },
}

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), WireError> {
    let remaining = buf.remaining();
    if remaining < needed {
        Err(WireError::Truncated { needed, remaining })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Primitives
// ===========================================================================

/// Write a 32-bit VarInt: 7 bits per byte, least significant group first,
/// high bit set on every byte but the last.
pub fn write_var_int(buf: &mut impl BufMut, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

pub fn read_var_int(buf: &mut impl Buf) -> Result<i32, WireError> {
    let mut result: u32 = 0;
    for i in 0..VAR_INT_MAX_BYTES {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        result |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result as i32);
        }
    }
    Err(WireError::VarIntTooLong)
}

/// Write a VarInt byte length followed by UTF-8 bytes.
pub fn write_string(buf: &mut impl BufMut, s: &str, max_len: usize) -> Result<(), WireError> {
    let chars = s.chars().count();
    if chars > max_len {
        return Err(WireError::StringTooLong {
            len: chars,
            max: max_len,
        });
    }
    let len = i32::try_from(s.len()).map_err(|_| WireError::StringTooLong {
        len: s.len(),
        max: max_len,
    })?;
    write_var_int(buf, len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub fn read_string(buf: &mut impl Buf, max_len: usize) -> Result<String, WireError> {
    let len = read_var_int(buf)?;
    if len < 0 {
        return Err(WireError::NegativeLength(len));
    }
    let len = len as usize;
    // A character is at most four UTF-8 bytes.
    if len > max_len * 4 {
        return Err(WireError::StringTooLong {
            len,
            max: max_len * 4,
        });
    }
    ensure(buf, len)?;
    let mut bytes = vec![0; len];
    buf.copy_to_slice(&mut bytes);
    let s = String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
    let chars = s.chars().count();
    if chars > max_len {
        return Err(WireError::StringTooLong {
            len: chars,
            max: max_len,
        });
    }
    Ok(s)
}

pub fn write_identifier(buf: &mut impl BufMut, id: &Identifier) -> Result<(), WireError> {
    write_string(buf, &id.to_string(), MAX_IDENTIFIER_LEN)
}

pub fn read_identifier(buf: &mut impl Buf) -> Result<Identifier, WireError> {
    let s = read_string(buf, MAX_IDENTIFIER_LEN)?;
    Ok(Identifier::parse(&s)?)
}

// ===========================================================================
// Snapshot frames
// ===========================================================================

/// Encode every entry of `snapshot`.
pub fn write_registered_guns(buf: &mut impl BufMut, snapshot: &Snapshot) -> Result<(), WireError> {
    let count =
        i32::try_from(snapshot.len()).map_err(|_| WireError::TooManyEntries(snapshot.len()))?;
    write_var_int(buf, count);
    for (id, gun) in snapshot.iter() {
        write_identifier(buf, id)?;
        tag::write_compound(buf, &gun.to_tag()).map_err(|source| WireError::Gun {
            id: id.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Decode a snapshot frame. A count of zero yields an empty snapshot.
pub fn read_registered_guns(buf: &mut impl Buf) -> Result<Snapshot, WireError> {
    let count = read_var_int(buf)?;
    if count < 0 {
        return Err(WireError::NegativeLength(count));
    }
    let mut guns = BTreeMap::new();
    for _ in 0..count {
        let id = read_identifier(buf)?;
        let gun = tag::read_compound(buf)
            .and_then(|t| Gun::from_tag(&t))
            .map_err(|source| match source {
                TagError::Truncated { needed, remaining } => {
                    WireError::Truncated { needed, remaining }
                }
                source => WireError::Gun {
                    id: id.clone(),
                    source,
                },
            })?;
        match guns.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(gun));
            }
            Entry::Occupied(slot) => return Err(WireError::DuplicateEntry(slot.key().clone())),
        }
    }
    Ok(Snapshot::from(guns))
}
