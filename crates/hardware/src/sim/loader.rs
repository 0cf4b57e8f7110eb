//! Image Loading and Interrupt Table Setup.
//!
//! This module provides utilities for placing guest code in memory before boot. It performs:
//! 1. **Image reading:** Reads raw images from disk into a byte buffer.
//! 2. **Image placement:** Copies an image into memory and reserves its pages.
//! 3. **Vector tables:** Writes 12-byte interrupt vector records and reserves the table.

use std::fs;

use crate::common::addr::PhysAddr;
use crate::common::constants::{INTERRUPT_COUNT, INTERRUPT_VECTOR_SIZE};
use crate::common::error::MemoryError;
use crate::sim::SimError;
use crate::soc::traits::{InterruptVector, MemoryBackend};

/// Reads a raw image file from disk.
///
/// # Arguments
///
/// * `path` - Path to the image.
///
/// # Returns
///
/// The raw bytes of the file, or `SimError::Io` naming the path.
pub fn read_image(path: &str) -> Result<Vec<u8>, SimError> {
    fs::read(path).map_err(|source| SimError::Io {
        path: path.to_string(),
        source,
    })
}

/// Copies `image` to `addr` and reserves the pages it occupies.
pub fn place_image(
    memory: &mut dyn MemoryBackend,
    addr: PhysAddr,
    image: &[u8],
) -> Result<(), MemoryError> {
    memory.load(addr, image)?;
    memory.reserve(addr, image.len() as u32)?;
    tracing::debug!(addr = %addr, len = image.len(), "image loaded");
    Ok(())
}

/// Writes interrupt vectors into the table at `table` and reserves the whole table.
///
/// Each record is `cs:u16 ds:u16 ip:u32 sp:u32`, little-endian. Indices not listed
/// keep whatever the memory holds (zero in a fresh memory).
///
/// # Arguments
///
/// * `memory` - Target backend.
/// * `table` - Physical base of the table; must be 4-byte aligned.
/// * `vectors` - `(index, vector)` pairs to install.
pub fn install_vector_table(
    memory: &mut dyn MemoryBackend,
    table: PhysAddr,
    vectors: &[(u32, InterruptVector)],
) -> Result<(), MemoryError> {
    for (index, vector) in vectors {
        let base = table.offset(index * INTERRUPT_VECTOR_SIZE);
        memory.write_u16(base, vector.cs)?;
        memory.write_u16(base.offset(2), vector.ds)?;
        memory.write_u32(base.offset(4), vector.ip)?;
        memory.write_u32(base.offset(8), vector.sp)?;
    }
    memory.reserve(table, INTERRUPT_COUNT * INTERRUPT_VECTOR_SIZE)
}
