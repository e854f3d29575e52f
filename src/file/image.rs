//! The on-disk module image: a fixed header followed by a postcard payload.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "RFAM"
//! 4       2     format version
//! 6       2     reserved, zero
//! 8       8     payload length
//! 16      n     postcard-encoded module
//! ```
//!
//! All header fields are little-endian. Bytes after the payload are ignored.

use std::{fs, path::Path};

use log::debug;
use sha1::{Digest, Sha1};

use crate::{
    file::{
        io::{read_le_at, write_le_at},
        ModuleProvider, Physical,
    },
    model::Module,
    Error, Result,
};

const TARGET: &str = "refasm::image";

/// Image magic
pub const IMAGE_MAGIC: [u8; 4] = *b"RFAM";
/// Current image format version
pub const IMAGE_VERSION: u16 = 1;
/// Size of the fixed header
pub const HEADER_SIZE: usize = 16;

/// Parsed image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Format version
    pub version: u16,
    /// Length of the postcard payload
    pub payload_len: u64,
}

impl ImageHeader {
    /// Parses and validates the header at the start of `data`.
    ///
    /// # Errors
    /// [`Error::Empty`] for empty input, [`Error::NotSupported`] for a foreign magic or
    /// version, [`Error::OutOfBounds`] for a truncated header or payload.
    pub fn parse(data: &[u8]) -> Result<ImageHeader> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut offset = 0;
        let magic = [
            read_le_at::<u8>(data, &mut offset)?,
            read_le_at::<u8>(data, &mut offset)?,
            read_le_at::<u8>(data, &mut offset)?,
            read_le_at::<u8>(data, &mut offset)?,
        ];
        if magic != IMAGE_MAGIC {
            return Err(Error::NotSupported);
        }

        let version = read_le_at::<u16>(data, &mut offset)?;
        if version != IMAGE_VERSION {
            return Err(Error::NotSupported);
        }
        let reserved = read_le_at::<u16>(data, &mut offset)?;
        if reserved != 0 {
            return Err(malformed_error!("reserved header field is {:#06x}", reserved));
        }
        let payload_len = read_le_at::<u64>(data, &mut offset)?;

        let available = (data.len() - HEADER_SIZE) as u64;
        if payload_len > available {
            return Err(Error::OutOfBounds);
        }
        Ok(ImageHeader {
            version,
            payload_len,
        })
    }

    /// Encodes the header
    ///
    /// # Errors
    /// Never in practice; the buffer is sized for the header.
    pub fn to_bytes(self) -> Result<[u8; HEADER_SIZE]> {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut offset = 0;
        for byte in IMAGE_MAGIC {
            write_le_at(&mut bytes, &mut offset, byte)?;
        }
        write_le_at(&mut bytes, &mut offset, self.version)?;
        write_le_at(&mut bytes, &mut offset, 0_u16)?;
        write_le_at(&mut bytes, &mut offset, self.payload_len)?;
        Ok(bytes)
    }
}

/// Encodes a module into a complete image
///
/// # Errors
/// Returns [`Error::Serialization`] if the module cannot be encoded.
pub fn encode(module: &Module) -> Result<Vec<u8>> {
    let payload =
        postcard::to_allocvec(module).map_err(|error| Error::Serialization(error.to_string()))?;
    let header = ImageHeader {
        version: IMAGE_VERSION,
        payload_len: payload.len() as u64,
    };
    let mut image = Vec::with_capacity(HEADER_SIZE + payload.len());
    image.extend_from_slice(&header.to_bytes()?);
    image.extend_from_slice(&payload);
    Ok(image)
}

/// Decodes a complete image
///
/// # Errors
/// Header errors as [`ImageHeader::parse`], [`Error::Serialization`] for a payload that
/// does not decode.
pub fn decode(data: &[u8]) -> Result<Module> {
    let header = ImageHeader::parse(data)?;
    let end = HEADER_SIZE + header.payload_len as usize;
    postcard::from_bytes(&data[HEADER_SIZE..end])
        .map_err(|error| Error::Serialization(error.to_string()))
}

/// Derives the module version id from the module content.
///
/// The id is the SHA-1 of the payload encoded with an all-zero id, truncated to 16 bytes
/// and marked as a name-based (version 5) GUID. Equal modules get equal ids.
///
/// # Errors
/// Returns [`Error::Serialization`] if the module cannot be encoded.
pub fn stamp_mvid(module: &mut Module) -> Result<uguid::Guid> {
    module.mvid = [0; 16];
    let payload =
        postcard::to_allocvec(module).map_err(|error| Error::Serialization(error.to_string()))?;
    let digest = Sha1::digest(&payload);

    let mut mvid = [0u8; 16];
    mvid.copy_from_slice(&digest[..16]);
    mvid[6] = (mvid[6] & 0x0F) | 0x50;
    mvid[8] = (mvid[8] & 0x3F) | 0x80;
    module.mvid = mvid;
    Ok(module.mvid())
}

/// Loads and writes modules as `RFAM` images
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProvider;

impl ModuleProvider for ImageProvider {
    fn load(&self, path: &Path) -> Result<Module> {
        if fs::metadata(path)?.len() == 0 {
            return Err(Error::Empty);
        }
        let image = Physical::new(path)?;
        let module = decode(image.data())?;
        debug!(
            target: TARGET,
            "loaded {} ({} bytes, {} types)",
            path.display(),
            image.len(),
            module.type_defs.len()
        );
        Ok(module)
    }

    fn write(&self, module: &Module, path: &Path) -> Result<()> {
        let image = encode(module)?;
        fs::write(path, &image)?;
        debug!(target: TARGET, "wrote {} ({} bytes)", path.display(), image.len());
        Ok(())
    }
}
