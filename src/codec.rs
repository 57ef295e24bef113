//! Little-endian primitives shared by the metadata block and the container
//!
//! Strings are a `u32` byte length followed by UTF-8. Booleans are one byte.

use crate::{Error, Result};
use std::io::{self, Write};

pub(crate) trait WriteExt: Write {
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_all(&[value])
    }

    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    fn write_bool(&mut self, value: bool) -> io::Result<()> {
        self.write_u8(value as u8)
    }

    /// Write a collection length as `u32`
    fn write_len(&mut self, len: usize) -> io::Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "length does not fit in u32")
        })?;
        self.write_u32(len)
    }

    fn write_str(&mut self, value: &str) -> io::Result<()> {
        self.write_len(value.len())?;
        self.write_all(value.as_bytes())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

/// Cursor over an in-memory buffer that reports truncation as a format error
pub(crate) struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Decoder<'a> {
    /// `what` names the structure being decoded in error messages
    pub(crate) fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, pos: 0, what }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::InvalidArchive(format!(
                "{} truncated at offset {} (needed {} more bytes, {} left)",
                self.what,
                self.pos,
                len,
                self.remaining()
            )));
        }

        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidArchive(format!(
                "{}: invalid boolean {} at offset {}",
                self.what, other, offset
            ))),
        }
    }

    /// Read a `u32` count, rejecting counts that cannot fit in what is left
    ///
    /// `min_item_size` is the smallest encoding of one item.
    pub(crate) fn count(&mut self, min_item_size: usize) -> Result<usize> {
        let count = self.u32()? as usize;
        if count.saturating_mul(min_item_size.max(1)) > self.remaining() {
            return Err(Error::InvalidArchive(format!(
                "{}: count {} exceeds remaining {} bytes",
                self.what,
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }

    pub(crate) fn string(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = self.u32()? as usize;
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            Error::InvalidArchive(format!(
                "{}: string at offset {} is not valid UTF-8",
                self.what, offset
            ))
        })
    }

    /// Fail unless every byte was consumed
    pub(crate) fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::InvalidArchive(format!(
                "{}: {} trailing bytes",
                self.what,
                self.remaining()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives() {
        let mut buf = Vec::new();
        buf.write_u8(7).unwrap();
        buf.write_u32(0xDEAD_BEEF).unwrap();
        buf.write_u64(1 << 40).unwrap();
        buf.write_bool(true).unwrap();
        buf.write_str("héllo").unwrap();
        buf.write_str("").unwrap();

        let mut d = Decoder::new(&buf, "test");
        assert_eq!(d.u8().unwrap(), 7);
        assert_eq!(d.u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(d.u64().unwrap(), 1 << 40);
        assert!(d.bool().unwrap());
        assert_eq!(d.string().unwrap(), "héllo");
        assert_eq!(d.string().unwrap(), "");
        d.finish().unwrap();
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = Vec::new();
        buf.write_str("ab").unwrap();
        assert_eq!(buf, vec![2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_truncation_is_an_error() {
        let buf = [5u8, 0, 0, 0, b'a'];
        let mut d = Decoder::new(&buf, "test");
        assert!(matches!(d.string(), Err(Error::InvalidArchive(_))));
    }

    #[test]
    fn test_invalid_bool() {
        let mut d = Decoder::new(&[2], "test");
        assert!(d.bool().is_err());
    }

    #[test]
    fn test_oversized_count() {
        let buf = [0xFFu8, 0xFF, 0xFF, 0x7F, 0, 0];
        let mut d = Decoder::new(&buf, "test");
        assert!(d.count(4).is_err());
    }

    #[test]
    fn test_trailing_bytes() {
        let d = Decoder::new(&[1, 2], "test");
        assert!(d.finish().is_err());
    }
}
