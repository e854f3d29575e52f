//! Bounds-checked little-endian reads and writes for image headers.
//!
//! The image header is a handful of fixed-width integers. [`read_le_at`] and
//! [`write_le_at`] advance a caller-held offset, so consecutive fields read and write in
//! sequence without manual offset arithmetic. Every access is bounds checked and fails
//! with [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Examples
//!
//! ```rust
//! use refasm::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0u8; 6];
//! let mut offset = 0;
//! write_le_at(&mut data, &mut offset, 0x0102_u16)?;
//! write_le_at(&mut data, &mut offset, 7_u32)?;
//! assert_eq!(data, [0x02, 0x01, 7, 0, 0, 0]);
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 0x0102);
//! assert_eq!(read_le_at::<u32>(&data, &mut offset)?, 7);
//! # Ok::<(), refasm::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Fixed-width integers that can be read from and written to image headers.
pub trait ImageIO: Sized {
    /// Byte array holding one value
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write to little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_image_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ImageIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_image_io!(u8, u16, u32, u64, i32, i64);

/// Reads a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn read_le<T: ImageIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: ImageIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Writes `value` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn write_le_at<T: ImageIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sequence() {
        let data = [0x52, 0x46, 0x41, 0x4D, 0x01, 0x00, 0xFF];
        let mut offset = 0;
        assert_eq!(read_le_at::<u32>(&data, &mut offset).unwrap(), 0x4D41_4652);
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 1);
        assert_eq!(read_le_at::<u8>(&data, &mut offset).unwrap(), 0xFF);
        assert_eq!(offset, 7);
    }

    #[test]
    fn read_past_end_fails_without_advancing() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 1;
        assert!(matches!(read_le_at::<u32>(&data, &mut offset), Err(OutOfBounds)));
        assert_eq!(offset, 1);
        assert!(matches!(read_le::<u64>(&data), Err(OutOfBounds)));
    }

    #[test]
    fn write_sequence() {
        let mut data = [0u8; 12];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 0xAABB_u16).unwrap();
        write_le_at(&mut data, &mut offset, u64::MAX).unwrap();
        assert_eq!(offset, 10);
        assert_eq!(&data[..3], &[0xBB, 0xAA, 0xFF]);
        assert!(matches!(
            write_le_at(&mut data, &mut offset, 1_u32),
            Err(OutOfBounds)
        ));
    }

    #[test]
    fn offset_overflow_is_out_of_bounds() {
        let data = [0u8; 4];
        let mut offset = usize::MAX;
        assert!(matches!(read_le_at::<u16>(&data, &mut offset), Err(OutOfBounds)));
    }
}
