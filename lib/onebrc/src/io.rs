use crate::error::{CalcError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

/// Read-only view over the whole input, shared by every worker for the duration of a run.
pub enum RawBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl RawBytes {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => &map[..],
            Self::Owned(bytes) => bytes.as_slice(),
        }
    }

    pub fn is_mapped(&self) -> bool { matches!(self, Self::Mapped(_)) }
}

impl Deref for RawBytes {
    type Target = [u8];
    fn deref(&self) -> &[u8] { self.as_bytes() }
}

pub fn open_input(path: impl AsRef<Path>) -> Result<RawBytes> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CalcError::io(path, e))?;
    let len = file.metadata().map_err(|e| CalcError::io(path, e))?.len();
    // Zero-length maps are rejected on some platforms
    if len == 0 { return Ok(RawBytes::Owned(Vec::new())); }
    let map = unsafe { Mmap::map(&file) }.map_err(|e| CalcError::io(path, e))?;
    Ok(RawBytes::Mapped(map))
}
