// geodata_server/server/src/world/geodata/layer.rs
//! Packed layer codec shared by every buffer-backed block.
//!
//! A layer occupies `LAYER_SIZE` bytes: the NSWE flags byte followed by the
//! height as a little-endian `i16`. Indices handed out by block queries always
//! point at the flags byte of a layer.
use crate::core::constants::LAYER_SIZE;

#[inline]
pub fn nswe(buffer: &[u8], index: usize) -> u8 {
    buffer[index]
}

#[inline]
pub fn height(buffer: &[u8], index: usize) -> i32 {
    i16::from_le_bytes([buffer[index + 1], buffer[index + 2]]) as i32
}

#[inline]
pub fn set_nswe(buffer: &mut [u8], index: usize, nswe: u8) {
    buffer[index] = nswe;
}

/// Heights outside the `i16` range saturate.
#[inline]
pub fn set_height(buffer: &mut [u8], index: usize, height: i32) {
    let clamped = height.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    buffer[index + 1..index + LAYER_SIZE].copy_from_slice(&clamped.to_le_bytes());
}

#[inline]
pub fn write(buffer: &mut [u8], index: usize, nswe: u8, height: i32) {
    set_nswe(buffer, index, nswe);
    set_height(buffer, index, height);
}

/// Raw comparison of the two height bytes of the same layer in two buffers.
#[inline]
pub fn same_height(a: &[u8], b: &[u8], index: usize) -> bool {
    a[index + 1..index + LAYER_SIZE] == b[index + 1..index + LAYER_SIZE]
}
