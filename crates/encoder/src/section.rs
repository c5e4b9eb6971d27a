//! Tagged, length-prefixed section blocks.
//!
//! See <https://webassembly.github.io/spec/core/binary/modules.html#sections>

use alloc::vec::Vec;

use crate::{Result, leb};

/// Section discriminant, the first byte of every section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SectionId {
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Table = 4,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Element = 9,
    Code = 10,
    Data = 11,
}

impl SectionId {
    /// Position in the mandated module order, `None` for custom sections which may appear anywhere
    pub const fn order(self) -> Option<u8> {
        match self {
            Self::Custom => None,
            // the discriminants of all other sections happen to follow the mandated order
            other => Some(other as u8),
        }
    }
}

/// An encoded section: id plus opaque payload
///
/// The length prefix is never stored, it is derived from the payload when the
/// section is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub payload: Vec<u8>,
}

/// Create a section from its id and already encoded payload
pub fn build_section(id: SectionId, payload: Vec<u8>) -> Section {
    Section { id, payload }
}

impl Section {
    /// Append `[id] ++ len(payload) ++ payload` to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.push(self.id as u8);
        leb::write_len(buf, self.payload.len(), "section")?;
        buf.extend_from_slice(&self.payload);
        Ok(())
    }

    /// The encoded section as a fresh buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Total number of bytes [`Section::encode`] writes
    pub fn encoded_len(&self) -> usize {
        1 + leb::unsigned_len(self.payload.len() as u64) + self.payload.len()
    }
}

/// A typed section that knows its id and how to encode its payload
pub trait SectionEncoder {
    /// The section's discriminant
    const ID: SectionId;

    /// Append the section payload (without id and length) to `buf`
    fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()>;

    /// Encode the payload and wrap it into a [`Section`]
    fn to_section(&self) -> Result<Section> {
        let mut payload = Vec::new();
        self.encode_payload(&mut payload)?;
        Ok(build_section(Self::ID, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn length_prefix_is_computed() {
        let section = build_section(SectionId::Type, vec![0x01, 0x60, 0x00, 0x01, 0x7F]);
        assert_eq!(section.to_bytes().unwrap(), vec![0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7F]);
        assert_eq!(section.encoded_len(), 7);
    }

    #[test]
    fn long_payload_uses_multi_byte_length() {
        let section = build_section(SectionId::Custom, vec![0; 200]);
        let bytes = section.to_bytes().unwrap();
        assert_eq!(&bytes[..3], &[0x00, 0xC8, 0x01]);
        assert_eq!(bytes.len(), 203);
    }

    #[test]
    fn empty_payload() {
        let section = build_section(SectionId::Code, Vec::new());
        assert_eq!(section.to_bytes().unwrap(), vec![0x0A, 0x00]);
    }

    #[test]
    fn order_follows_discriminant() {
        assert_eq!(SectionId::Custom.order(), None);
        assert!(SectionId::Type.order() < SectionId::Import.order());
        assert!(SectionId::Export.order() < SectionId::Start.order());
        assert!(SectionId::Code.order() < SectionId::Data.order());
    }
}
