//! Self-describing tagged binary trees.
//!
//! A [`Tag`] is a primitive, a string, a homogeneous list, or a
//! [`Compound`] (string-keyed map of tags). Gun definitions convert to and
//! from a compound, and the compound's binary form is what travels on the
//! wire.
//!
//! # Binary layout
//!
//! Every tag has a one-byte type id:
//!
//! | id | tag      | payload                                             |
//! |----|----------|-----------------------------------------------------|
//! | 0  | end      | none (terminates a compound)                        |
//! | 1  | byte     | `i8`                                                |
//! | 2  | short    | `i16` big-endian                                    |
//! | 3  | int      | `i32` big-endian                                    |
//! | 4  | long     | `i64` big-endian                                    |
//! | 5  | float    | `f32` big-endian                                    |
//! | 6  | double   | `f64` big-endian                                    |
//! | 8  | string   | `u16` byte length + UTF-8                           |
//! | 9  | list     | element id + `i32` length + payloads                |
//! | 10 | compound | (id, name as string payload, payload)* then end (0) |
//!
//! A root compound is written as id `10`, an empty name, and its payload.
//! Nesting deeper than [`MAX_DEPTH`] is rejected on read and write.

use bytes::{Buf, BufMut};
use std::collections::BTreeMap;

use crate::id::IdentifierError;

/// Maximum nesting of lists and compounds.
pub const MAX_DEPTH: usize = 512;

const END: u8 = 0;
const BYTE: u8 = 1;
const SHORT: u8 = 2;
const INT: u8 = 3;
const LONG: u8 = 4;
const FLOAT: u8 = 5;
const DOUBLE: u8 = 6;
const STRING: u8 = 8;
const LIST: u8 = 9;
const COMPOUND: u8 = 10;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors produced while encoding, decoding, or interpreting tags.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("tag data truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("unknown tag type id {0}")]
    UnknownType(u8),
    #[error("root tag must be a compound, found type id {0}")]
    RootNotCompound(u8),
    #[error("tag nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,
    #[error("list mixes {expected} and {found} elements")]
    MixedList {
        expected: &'static str,
        found: &'static str,
    },
    #[error("list of {0} elements exceeds the i32 length prefix")]
    ListTooLong(usize),
    #[error("list has negative length {0}")]
    NegativeLength(i32),
    #[error("string of {0} bytes exceeds the u16 length prefix")]
    StringTooLong(usize),
    #[error("string tag is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected a compound tag, found {found}")]
    NotCompound { found: &'static str },
    #[error("tag '{key}' holds an invalid identifier: {source}")]
    InvalidIdentifier {
        key: String,
        #[source]
        source: IdentifierError,
    },
}

// ===========================================================================
// Tag tree
// ===========================================================================

/// A node in a tagged tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
}

impl Tag {
    /// The binary type id of this tag.
    pub fn type_id(&self) -> u8 {
        match self {
            Tag::Byte(_) => BYTE,
            Tag::Short(_) => SHORT,
            Tag::Int(_) => INT,
            Tag::Long(_) => LONG,
            Tag::Float(_) => FLOAT,
            Tag::Double(_) => DOUBLE,
            Tag::String(_) => STRING,
            Tag::List(_) => LIST,
            Tag::Compound(_) => COMPOUND,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        kind_name(self.type_id())
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }
}

fn kind_name(type_id: u8) -> &'static str {
    match type_id {
        END => "end",
        BYTE => "byte",
        SHORT => "short",
        INT => "int",
        LONG => "long",
        FLOAT => "float",
        DOUBLE => "double",
        STRING => "string",
        LIST => "list",
        COMPOUND => "compound",
        _ => "unknown",
    }
}

impl From<bool> for Tag {
    fn from(v: bool) -> Self {
        Tag::Byte(i8::from(v))
    }
}

impl From<i8> for Tag {
    fn from(v: i8) -> Self {
        Tag::Byte(v)
    }
}

impl From<i16> for Tag {
    fn from(v: i16) -> Self {
        Tag::Short(v)
    }
}

impl From<i32> for Tag {
    fn from(v: i32) -> Self {
        Tag::Int(v)
    }
}

impl From<i64> for Tag {
    fn from(v: i64) -> Self {
        Tag::Long(v)
    }
}

impl From<f32> for Tag {
    fn from(v: f32) -> Self {
        Tag::Float(v)
    }
}

impl From<f64> for Tag {
    fn from(v: f64) -> Self {
        Tag::Double(v)
    }
}

impl From<String> for Tag {
    fn from(v: String) -> Self {
        Tag::String(v)
    }
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::String(v.to_string())
    }
}

impl From<Vec<Tag>> for Tag {
    fn from(v: Vec<Tag>) -> Self {
        Tag::List(v)
    }
}

impl From<Compound> for Tag {
    fn from(v: Compound) -> Self {
        Tag::Compound(v)
    }
}

// ===========================================================================
// Compound
// ===========================================================================

/// A string-keyed map of tags. Keys iterate in sorted order, so encoding
/// the same compound always yields the same bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound(BTreeMap<String, Tag>);

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the tag previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tag>) -> Option<Tag> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tag)> {
        self.0.iter()
    }

    // Typed getters return `None` when the key is absent or holds a
    // different kind of tag.

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Tag::Byte(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            Tag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Tag::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Tag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        self.get(key)?.as_compound()
    }
}

// ===========================================================================
// Encoding
// ===========================================================================

/// Write `root` as a root compound tag.
pub fn write_compound(buf: &mut impl BufMut, root: &Compound) -> Result<(), TagError> {
    buf.put_u8(COMPOUND);
    write_str(buf, "")?;
    write_compound_payload(buf, root, 0)
}

fn write_str(buf: &mut impl BufMut, s: &str) -> Result<(), TagError> {
    let len = u16::try_from(s.len()).map_err(|_| TagError::StringTooLong(s.len()))?;
    buf.put_u16(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn write_compound_payload(
    buf: &mut impl BufMut,
    compound: &Compound,
    depth: usize,
) -> Result<(), TagError> {
    if depth >= MAX_DEPTH {
        return Err(TagError::TooDeep);
    }
    for (name, tag) in compound.iter() {
        buf.put_u8(tag.type_id());
        write_str(buf, name)?;
        write_payload(buf, tag, depth + 1)?;
    }
    buf.put_u8(END);
    Ok(())
}

fn write_payload(buf: &mut impl BufMut, tag: &Tag, depth: usize) -> Result<(), TagError> {
    match tag {
        Tag::Byte(v) => buf.put_i8(*v),
        Tag::Short(v) => buf.put_i16(*v),
        Tag::Int(v) => buf.put_i32(*v),
        Tag::Long(v) => buf.put_i64(*v),
        Tag::Float(v) => buf.put_f32(*v),
        Tag::Double(v) => buf.put_f64(*v),
        Tag::String(v) => write_str(buf, v)?,
        Tag::List(items) => {
            if depth >= MAX_DEPTH {
                return Err(TagError::TooDeep);
            }
            let element = items.first().map_or(END, Tag::type_id);
            if let Some(odd) = items.iter().find(|t| t.type_id() != element) {
                return Err(TagError::MixedList {
                    expected: kind_name(element),
                    found: odd.kind_name(),
                });
            }
            let len =
                i32::try_from(items.len()).map_err(|_| TagError::ListTooLong(items.len()))?;
            buf.put_u8(element);
            buf.put_i32(len);
            for item in items {
                write_payload(buf, item, depth + 1)?;
            }
        }
        Tag::Compound(c) => write_compound_payload(buf, c, depth)?,
    }
    Ok(())
}

// ===========================================================================
// Decoding
// ===========================================================================

/// Read a root compound tag. Fails cleanly on truncated or malformed input;
/// the buffer position is unspecified after an error.
pub fn read_compound(buf: &mut impl Buf) -> Result<Compound, TagError> {
    ensure(buf, 1)?;
    let id = buf.get_u8();
    if id != COMPOUND {
        return Err(TagError::RootNotCompound(id));
    }
    read_str(buf)?;
    read_compound_payload(buf, 0)
}

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), TagError> {
    let remaining = buf.remaining();
    if remaining < needed {
        Err(TagError::Truncated { needed, remaining })
    } else {
        Ok(())
    }
}

fn read_str(buf: &mut impl Buf) -> Result<String, TagError> {
    ensure(buf, 2)?;
    let len = usize::from(buf.get_u16());
    ensure(buf, len)?;
    let mut bytes = vec![0; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| TagError::InvalidUtf8)
}

fn read_compound_payload(buf: &mut impl Buf, depth: usize) -> Result<Compound, TagError> {
    if depth >= MAX_DEPTH {
        return Err(TagError::TooDeep);
    }
    let mut compound = Compound::new();
    loop {
        ensure(buf, 1)?;
        let id = buf.get_u8();
        if id == END {
            return Ok(compound);
        }
        let name = read_str(buf)?;
        let tag = read_payload(buf, id, depth + 1)?;
        compound.insert(name, tag);
    }
}

fn read_payload(buf: &mut impl Buf, id: u8, depth: usize) -> Result<Tag, TagError> {
    let tag = match id {
        BYTE => {
            ensure(buf, 1)?;
            Tag::Byte(buf.get_i8())
        }
        SHORT => {
            ensure(buf, 2)?;
            Tag::Short(buf.get_i16())
        }
        INT => {
            ensure(buf, 4)?;
            Tag::Int(buf.get_i32())
        }
        LONG => {
            ensure(buf, 8)?;
            Tag::Long(buf.get_i64())
        }
        FLOAT => {
            ensure(buf, 4)?;
            Tag::Float(buf.get_f32())
        }
        DOUBLE => {
            ensure(buf, 8)?;
            Tag::Double(buf.get_f64())
        }
        STRING => Tag::String(read_str(buf)?),
        LIST => {
            if depth >= MAX_DEPTH {
                return Err(TagError::TooDeep);
            }
            ensure(buf, 5)?;
            let element = buf.get_u8();
            let len = buf.get_i32();
            if len < 0 {
                return Err(TagError::NegativeLength(len));
            }
            if len > 0 && element == END {
                return Err(TagError::UnknownType(END));
            }
            // Every element needs at least one byte, which bounds the
            // allocation by the bytes actually present.
            ensure(buf, len as usize)?;
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(read_payload(buf, element, depth + 1)?);
            }
            Tag::List(items)
        }
        COMPOUND => Tag::Compound(read_compound_payload(buf, depth)?),
        other => return Err(TagError::UnknownType(other)),
    };
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Compound {
        let mut inner = Compound::new();
        inner.insert("damage", 7.5f32);
        inner.insert("item", "cgm:basic_ammo");
        let mut root = Compound::new();
        root.insert("auto", true);
        root.insert("rate", 4);
        root.insert("speed", 13.5f64);
        root.insert("projectile", inner);
        root.insert("tags", vec![Tag::Int(1), Tag::Int(2)]);
        root.insert("empty", Vec::<Tag>::new());
        root
    }

    fn encode(c: &Compound) -> Vec<u8> {
        let mut buf = Vec::new();
        write_compound(&mut buf, c).unwrap();
        buf
    }

    #[test]
    fn roundtrip_nested() {
        let root = sample();
        let bytes = encode(&root);
        let back = read_compound(&mut bytes.as_slice()).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(&sample()), encode(&sample()));
    }

    #[test]
    fn root_header_layout() {
        let bytes = encode(&Compound::new());
        // compound id, empty name, end
        assert_eq!(bytes, vec![COMPOUND, 0, 0, END]);
    }

    #[test]
    fn typed_getters_check_kind() {
        let root = sample();
        assert_eq!(root.get_bool("auto"), Some(true));
        assert_eq!(root.get_int("rate"), Some(4));
        assert_eq!(root.get_float("rate"), None);
        assert_eq!(root.get_double("speed"), Some(13.5));
        assert_eq!(root.get_str("missing"), None);
        let inner = root.get_compound("projectile").unwrap();
        assert_eq!(inner.get_str("item"), Some("cgm:basic_ammo"));
    }

    #[test]
    fn every_truncation_fails() {
        let bytes = encode(&sample());
        for cut in 0..bytes.len() {
            let result = read_compound(&mut &bytes[..cut]);
            assert!(result.is_err(), "prefix of {cut} bytes decoded");
        }
    }

    #[test]
    fn mixed_list_rejected() {
        let mut root = Compound::new();
        root.insert("bad", vec![Tag::Int(1), Tag::Float(1.0)]);
        let mut buf = Vec::new();
        let result = write_compound(&mut buf, &root);
        assert!(matches!(
            result,
            Err(TagError::MixedList {
                expected: "int",
                found: "float"
            })
        ));
    }

    #[test]
    fn root_must_be_compound() {
        let bytes = [INT, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            read_compound(&mut &bytes[..]),
            Err(TagError::RootNotCompound(INT))
        ));
    }

    #[test]
    fn unknown_type_rejected() {
        // root, empty name, then a child with type id 42
        let bytes = [COMPOUND, 0, 0, 42, 0, 1, b'x'];
        assert!(matches!(
            read_compound(&mut &bytes[..]),
            Err(TagError::UnknownType(42))
        ));
    }

    #[test]
    fn negative_list_length_rejected() {
        let mut bytes = vec![COMPOUND, 0, 0, LIST, 0, 1, b'l', INT];
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            read_compound(&mut bytes.as_slice()),
            Err(TagError::NegativeLength(-1))
        ));
    }

    #[test]
    fn excessive_nesting_rejected() {
        let mut tag = Compound::new();
        for _ in 0..MAX_DEPTH + 1 {
            let mut outer = Compound::new();
            outer.insert("n", tag);
            tag = outer;
        }
        let mut buf = Vec::new();
        assert!(matches!(
            write_compound(&mut buf, &tag),
            Err(TagError::TooDeep)
        ));
    }
}
