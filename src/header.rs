use std::borrow::Cow;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::Error;

/// The System Description Table header which starts every ACPI table.
///
/// All fields are little-endian. Only the signature is validated; the length,
/// checksum and OEM fields are parsed for diagnostics and left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Four ASCII bytes identifying the table, for example `FPDT` or `PPTT`.
    pub signature: [u8; 4],
    /// Total length of the table in bytes, including this header.
    pub length: u32,
    pub revision: u8,
    /// The whole table is supposed to sum to zero. Not checked.
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    /// Vendor ID of the tool which created the table, usually four ASCII characters.
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl TableHeader {
    pub const SIZE: usize = 36; // 36 bytes

    /// Validate the header at the start of `data` against `expected_signature`.
    ///
    /// Fails with [`Error::TooShort`] if `data` can't hold a header and with
    /// [`Error::BadSignature`] if the first four bytes don't match. No other
    /// header byte influences the outcome.
    pub fn parse(data: &[u8], expected_signature: &[u8; 4]) -> Result<Self, Error> {
        // Reading from a slice only fails when it runs out of bytes.
        let header = Self::parse_impl(data).map_err(|_| Error::TooShort { len: data.len() })?;
        if &header.signature != expected_signature {
            return Err(Error::BadSignature {
                expected: *expected_signature,
                found: header.signature,
            });
        }
        Ok(header)
    }

    fn parse_impl<R: Read>(mut reader: R) -> Result<Self, std::io::Error> {
        let mut signature = [0; 4];
        reader.read_exact(&mut signature)?;
        let length = reader.read_u32::<LittleEndian>()?;
        let revision = reader.read_u8()?;
        let checksum = reader.read_u8()?;
        let mut oem_id = [0; 6];
        reader.read_exact(&mut oem_id)?;
        let mut oem_table_id = [0; 8];
        reader.read_exact(&mut oem_table_id)?;
        let oem_revision = reader.read_u32::<LittleEndian>()?;
        let creator_id = reader.read_u32::<LittleEndian>()?;
        let creator_revision = reader.read_u32::<LittleEndian>()?;
        Ok(Self {
            signature,
            length,
            revision,
            checksum,
            oem_id,
            oem_table_id,
            oem_revision,
            creator_id,
            creator_revision,
        })
    }

    /// The OEM ID, cut at the first NUL byte and stripped of padding spaces.
    pub fn oem_id_str(&self) -> Cow<'_, str> {
        padded_ascii(&self.oem_id)
    }

    /// The OEM table ID, cut at the first NUL byte and stripped of padding spaces.
    pub fn oem_table_id_str(&self) -> Cow<'_, str> {
        padded_ascii(&self.oem_table_id)
    }

    /// The creator ID as its four-character tag, e.g. `"INTL"`.
    pub fn creator_id_tag(&self) -> String {
        String::from_utf8_lossy(&self.creator_id.to_le_bytes()).into_owned()
    }
}

/// Firmware pads these fields with either NULs or spaces.
fn padded_ascii(bytes: &[u8]) -> Cow<'_, str> {
    let len = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    match String::from_utf8_lossy(&bytes[..len]) {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(' ')),
        Cow::Owned(s) => Cow::Owned(s.trim_end_matches(' ').to_owned()),
    }
}

#[cfg(test)]
pub(crate) fn test_header(signature: &[u8; 4], total_len: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(TableHeader::SIZE);
    data.extend_from_slice(signature);
    data.extend_from_slice(&total_len.to_le_bytes());
    data.extend_from_slice(&[1, 0]);
    data.extend_from_slice(b"OEMID ");
    data.extend_from_slice(b"TABLE\0\0\0");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(b"INTL");
    data.extend_from_slice(&0x2023_0628u32.to_le_bytes());
    data
}
