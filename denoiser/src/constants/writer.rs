//! Append-only packing of constant fields into a pass region.

use crate::error::{DenoiserError, Result};
use crate::math::{Mat4, Vec2, Vec4};

/// Appends typed fields to one pass's constant region.
///
/// The region is zeroed on creation. Writes past the end of the region are
/// truncated but still counted, so [`ConstantWriter::finish`] can report the
/// size the pass actually tried to pack. All fields are 4-byte words in native
/// byte order; matrices are written column by column.
#[derive(Debug)]
pub struct ConstantWriter<'a> {
    data: &'a mut [u8],
    packed: usize,
}

impl<'a> ConstantWriter<'a> {
    /// Start packing into `data`, clearing it first.
    pub fn new(data: &'a mut [u8]) -> Self {
        data.fill(0);
        Self { data, packed: 0 }
    }

    /// Bytes appended so far, including truncated ones.
    pub fn packed(&self) -> usize {
        self.packed
    }

    /// Declared size of the region.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Append raw bytes.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        let start = self.packed.min(self.data.len());
        let end = (self.packed + bytes.len()).min(self.data.len());
        self.data[start..end].copy_from_slice(&bytes[..end - start]);
        self.packed += bytes.len();
    }

    /// Append a float.
    pub fn add_float(&mut self, value: f32) {
        self.add_bytes(bytemuck::bytes_of(&value));
    }

    /// Append an unsigned integer.
    pub fn add_uint(&mut self, value: u32) {
        self.add_bytes(bytemuck::bytes_of(&value));
    }

    /// Append a float2.
    pub fn add_float2(&mut self, value: Vec2) {
        self.add_bytes(bytemuck::cast_slice(value.as_slice()));
    }

    /// Append a uint2.
    pub fn add_uint2(&mut self, x: u32, y: u32) {
        self.add_bytes(bytemuck::cast_slice(&[x, y]));
    }

    /// Append a float4.
    pub fn add_float4(&mut self, value: Vec4) {
        self.add_bytes(bytemuck::cast_slice(value.as_slice()));
    }

    /// Append a column-major 4x4 matrix.
    pub fn add_float4x4(&mut self, value: &Mat4) {
        self.add_bytes(bytemuck::cast_slice(value.as_slice()));
    }

    /// Compare the packed size with the region's declared size.
    ///
    /// With validation enabled a mismatch is logged and returned as
    /// [`DenoiserError::ConstantLayoutMismatch`]. Without validation the region
    /// keeps its truncated or zero-padded contents.
    pub fn finish(self, validation: bool, pass: &str) -> Result<()> {
        let declared = self.data.len();
        if self.packed == declared || !validation {
            return Ok(());
        }

        log::error!(
            "Constant layout mismatch in pass '{pass}': declared {declared} bytes, packed {}",
            self.packed
        );
        Err(DenoiserError::ConstantLayoutMismatch {
            pass: pass.to_string(),
            declared: declared as u32,
            packed: self.packed as u32,
        })
    }
}
