//! Flash-backed byte-blob storage.
//!
//! This is the only way the dispatcher and applets touch persistent state;
//! there is no raw-address access anywhere above this trait. The concrete
//! backend (wear-levelling, power-loss atomicity) lives entirely on the
//! other side of it — the core only assumes a completed `write_file` call
//! is durable.

/// Named byte-blob store.
///
/// Mirrors the narrow C ABI the original firmware exposes
/// (`get_file_size`/`read_file`/`write_file`), kept as three methods
/// instead of folding them into one enum-returning call so a concrete
/// backend can implement whichever subset is cheap for it (many flash
/// filesystems expose exactly these three primitives already).
pub trait FlashFs {
    /// Size in bytes of the named file, or `None` if it does not exist.
    fn get_file_size(&self, name: &str) -> Option<usize>;

    /// Read `len` bytes starting at `offset` into `buf[..len]`.
    ///
    /// Returns the number of bytes actually read, or `Err(())` on any
    /// underlying I/O failure (short reads past EOF are a caller bug in
    /// this crate — every reader here already checked the file size).
    fn read_file(&self, name: &str, buf: &mut [u8], offset: usize, len: usize) -> Result<usize, ()>;

    /// Write `buf[..len]` at `offset`. If `truncate` is set, the file is
    /// shrunk to exactly `offset + len` bytes afterwards (the only mode
    /// every caller in this crate uses — partial in-place patches of a
    /// file kept around for its old tail are not a pattern this core
    /// needs).
    fn write_file(&mut self, name: &str, buf: &[u8], offset: usize, len: usize, truncate: bool) -> Result<(), ()>;

    /// Delete the named file, if present. Used by applet factory resets.
    fn delete_file(&mut self, name: &str) -> Result<(), ()>;

    /// Report flash capacity in whatever unit `READ_FLASH_CAP` is meant to
    /// convey (the original firmware reports erase-block count); the core
    /// just forwards this single byte, never interprets it.
    fn capacity(&self) -> u8;
}

/// A convenience whole-file read: `Some(bytes)` if the file exists and was
/// read in full, `None` if absent, `Err(())` on I/O failure.
pub fn read_whole_file<F: FlashFs + ?Sized, const N: usize>(
    fs: &F,
    name: &str,
) -> Result<Option<heapless::Vec<u8, N>>, ()> {
    let Some(size) = fs.get_file_size(name) else {
        return Ok(None);
    };
    if size > N {
        return Err(());
    }
    let mut buf = [0u8; N];
    let read = fs.read_file(name, &mut buf, 0, size)?;
    if read != size {
        return Err(());
    }
    let mut out = heapless::Vec::new();
    out.extend_from_slice(&buf[..size]).map_err(|_| ())?;
    Ok(Some(out))
}

/// In-memory reference implementation, for tests and host-side simulation.
///
/// Not a real flash driver: no wear-levelling, no power-loss behavior. It
/// exists purely so the rest of the crate can be exercised without a real
/// flash backend, the same role `ctap-types`'s `std` feature plays for its
/// own test helpers.
#[cfg(feature = "std")]
pub mod memory {
    use super::FlashFs;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct MemoryFlash {
        files: BTreeMap<std::string::String, std::vec::Vec<u8>>,
        capacity: u8,
    }

    impl MemoryFlash {
        pub fn new(capacity: u8) -> Self {
            Self {
                files: BTreeMap::new(),
                capacity,
            }
        }
    }

    impl FlashFs for MemoryFlash {
        fn get_file_size(&self, name: &str) -> Option<usize> {
            self.files.get(name).map(|f| f.len())
        }

        fn read_file(
            &self,
            name: &str,
            buf: &mut [u8],
            offset: usize,
            len: usize,
        ) -> Result<usize, ()> {
            let file = self.files.get(name).ok_or(())?;
            if offset + len > file.len() {
                return Err(());
            }
            buf[..len].copy_from_slice(&file[offset..offset + len]);
            Ok(len)
        }

        fn write_file(
            &mut self,
            name: &str,
            buf: &[u8],
            offset: usize,
            len: usize,
            truncate: bool,
        ) -> Result<(), ()> {
            let file = self.files.entry(name.to_string()).or_default();
            if offset + len > file.len() {
                file.resize(offset + len, 0);
            }
            file[offset..offset + len].copy_from_slice(&buf[..len]);
            if truncate {
                file.truncate(offset + len);
            }
            Ok(())
        }

        fn delete_file(&mut self, name: &str) -> Result<(), ()> {
            self.files.remove(name);
            Ok(())
        }

        fn capacity(&self) -> u8 {
            self.capacity
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::memory::MemoryFlash;
    use super::*;

    #[test]
    fn absent_file_has_no_size() {
        let fs = MemoryFlash::new(64);
        assert_eq!(fs.get_file_size("sn"), None);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut fs = MemoryFlash::new(64);
        fs.write_file("sn", b"\xDE\xAD\xBE\xEF", 0, 4, true).unwrap();
        assert_eq!(fs.get_file_size("sn"), Some(4));
        let mut buf = [0u8; 4];
        let n = fs.read_file("sn", &mut buf, 0, 4).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"\xDE\xAD\xBE\xEF");
    }

    #[test]
    fn truncate_shrinks_file() {
        let mut fs = MemoryFlash::new(64);
        fs.write_file("cfg", &[1, 2, 3, 4], 0, 4, true).unwrap();
        fs.write_file("cfg", &[9, 9], 0, 2, true).unwrap();
        assert_eq!(fs.get_file_size("cfg"), Some(2));
    }

    #[test]
    fn read_whole_file_helper() {
        let mut fs = MemoryFlash::new(64);
        fs.write_file("admin_cfg", &[1, 0], 0, 2, true).unwrap();
        let out: heapless::Vec<u8, 8> = read_whole_file(&fs, "admin_cfg").unwrap().unwrap();
        assert_eq!(&out[..], &[1, 0]);
        let missing: Option<heapless::Vec<u8, 8>> = read_whole_file(&fs, "nope").unwrap();
        assert!(missing.is_none());
    }
}
