//! Device identity types carried in firmware responses: the running
//! image's name and version, and the per-unit identifier.

use core::fmt;

/// Two four-character ASCII tags plus a version, as reported by a
/// `get_name_version` response.
///
/// The tags identify what is currently running (firmware vs. a loaded
/// app) independent of version; callers compare `name0`/`name1` and
/// ignore `version` when deciding what is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameVersion {
    pub name0: [u8; 4],
    pub name1: [u8; 4],
    pub version: u32,
}

impl NameVersion {
    /// Parse a `NameVersion` out of a response payload, starting at
    /// `raw[0]`. The caller is responsible for slicing off any leading
    /// header/status bytes first.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < 12 {
            return None;
        }
        let mut name0 = [0u8; 4];
        let mut name1 = [0u8; 4];
        name0.copy_from_slice(&raw[0..4]);
        name1.copy_from_slice(&raw[4..8]);
        let version = u32::from_le_bytes(raw[8..12].try_into().ok()?);
        Some(NameVersion {
            name0,
            name1,
            version,
        })
    }

    fn tag_str(tag: &[u8; 4]) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(tag)
    }
}

impl fmt::Display for NameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}",
            Self::tag_str(&self.name0),
            Self::tag_str(&self.name1),
            self.version
        )
    }
}

/// The Unique Device Identifier reported by `get_udi`: a vendor/product/
/// revision triple packed with a serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Udi {
    pub reserved: u8,
    pub vendor_id: u16,
    pub product_id: u8,
    pub revision: u8,
    pub serial: u32,
}

impl Udi {
    /// Parse a `Udi` out of a response payload, starting at `raw[0]`:
    /// one little-endian u32 of packed vendor/product/revision bits,
    /// followed by one little-endian u32 serial number.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < 8 {
            return None;
        }
        let vpr = u32::from_le_bytes(raw[0..4].try_into().ok()?);
        let serial = u32::from_le_bytes(raw[4..8].try_into().ok()?);
        Some(Udi {
            reserved: ((vpr >> 28) & 0xf) as u8,
            vendor_id: ((vpr >> 12) & 0xffff) as u16,
            product_id: ((vpr >> 4) & 0xff) as u8,
            revision: (vpr & 0xf) as u8,
            serial,
        })
    }
}

impl fmt::Display for Udi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:01x}{:04x}:{:02x}:{:01x}:{:08x}",
            self.reserved, self.vendor_id, self.product_id, self.revision, self.serial
        )
    }
}
