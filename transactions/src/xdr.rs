//! Minimal XDR (RFC 4506) reader and writer.
//!
//! Only the primitives the ledger's transaction and result types need:
//! 32/64-bit integers, booleans, fixed and variable opaque data, and
//! bounded array lengths. Everything is big-endian and 4-byte aligned.

use crate::error::XdrError;

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Types with a canonical XDR encoding.
pub trait ToXdr {
    fn write_xdr(&self, w: &mut XdrWriter);

    fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }
}

#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u32(u32::from(v));
    }

    /// Fixed-length opaque data, zero padded to a multiple of four.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.extend(std::iter::repeat(0u8).take(padding(bytes.len())));
    }

    /// Variable-length opaque data: length prefix, bytes, padding.
    pub fn write_var(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_fixed(bytes);
    }

    /// Array length prefix. Callers write the elements themselves.
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(len as u32);
    }
}

pub struct XdrReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        if self.remaining() < n {
            return Err(XdrError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32, XdrError> {
        self.take_array().map(u32::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, XdrError> {
        self.take_array().map(i32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, XdrError> {
        self.take_array().map(u64::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, XdrError> {
        self.take_array().map(i64::from_be_bytes)
    }

    pub fn read_bool(&mut self) -> Result<bool, XdrError> {
        match self.read_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(XdrError::InvalidBool(other)),
        }
    }

    fn skip_padding(&mut self, len: usize) -> Result<(), XdrError> {
        let pad = self.take(padding(len))?;
        if pad.iter().any(|b| *b != 0) {
            return Err(XdrError::NonZeroPadding);
        }
        Ok(())
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let out = self.take_array::<N>()?;
        self.skip_padding(N)?;
        Ok(out)
    }

    pub fn read_var(&mut self, max: usize) -> Result<Vec<u8>, XdrError> {
        let len = self.read_len(max)?;
        let bytes = self.take(len)?.to_vec();
        self.skip_padding(len)?;
        Ok(bytes)
    }

    /// Array length prefix, bounded by `max`.
    pub fn read_len(&mut self, max: usize) -> Result<usize, XdrError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(XdrError::LengthExceeded { len, max });
        }
        Ok(len)
    }

    /// Require that the whole input was consumed.
    pub fn finish(self) -> Result<(), XdrError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(XdrError::TrailingBytes(n)),
        }
    }
}
