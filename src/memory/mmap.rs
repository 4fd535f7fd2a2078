// Tue Jan 13 2026 - Alex

use crate::memory::{MemoryAccessor, MemoryError};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Snapshot file mapped read-only into the address space.
pub struct MappedFile {
    mmap: Arc<Mmap>,
    path: PathBuf,
}

impl MappedFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let file = File::open(path.as_ref())?;
        // The snapshot is never written while an analysis session holds it.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self {
            mmap: Arc::new(mmap),
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryAccessor for MappedFile {
    fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_into(&self, offset: u64, buffer: &mut [u8]) -> Result<(), MemoryError> {
        self.check_range(offset, buffer.len() as u64)?;
        let start = offset as usize;
        buffer.copy_from_slice(&self.mmap[start..start + buffer.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mapped_file_reads_are_bounds_checked() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5, 6]).unwrap();
        file.flush().unwrap();

        let mapped = MappedFile::open(file.path()).unwrap();
        assert_eq!(mapped.size(), 6);
        let mut buffer = [0u8; 2];
        mapped.read_into(4, &mut buffer).unwrap();
        assert_eq!(buffer, [5, 6]);
        assert!(mapped.read_into(5, &mut buffer).is_err());
        assert_eq!(mapped.path(), file.path());
    }
}
