use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::{
    block::{BlockReader, BLOCK_SIZE},
    error::{ExtractError, FormatError},
    header::{self, SIGNATURE},
    path::EntryPath,
    record::Entry,
};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Set each extracted file's modification time from its header.
    pub restore_mtime: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            restore_mtime: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: u64,
    pub bytes: u64,
}

#[derive(Debug)]
enum State {
    ExpectHeaderOrEnd,
    StreamingContent {
        name: String,
        size: u64,
        remaining: u64,
    },
    Done,
    Failed,
}

/// Reads an archive front to back.
///
/// [`ArchiveReader::next_entry`] yields each header in turn; the content
/// that follows is either copied out with [`ArchiveReader::copy_content`]
/// or skipped. Any error leaves the reader failed, and every later call
/// returns [`ExtractError::Failed`].
#[derive(Debug)]
pub struct ArchiveReader<R> {
    blocks: BlockReader<R>,
    state: State,
}

impl<R: Read> ArchiveReader<R> {
    /// Checks the signature at the start of `source`.
    pub fn new(source: R) -> Result<ArchiveReader<R>, ExtractError> {
        let mut blocks = BlockReader::new(source);
        let found = blocks.read_signature(SIGNATURE.len())?;
        if found != SIGNATURE {
            return Err(ExtractError::BadSignature {
                expected: *SIGNATURE,
                found,
            });
        }
        blocks.set_origin();

        Ok(ArchiveReader {
            blocks,
            state: State::ExpectHeaderOrEnd,
        })
    }

    pub fn bytes_read(&self) -> u64 {
        self.blocks.bytes_read()
    }

    #[inline(always)]
    fn check<T>(&mut self, result: Result<T, ExtractError>) -> Result<T, ExtractError> {
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    /// Reads the next header, skipping whatever is left of the previous
    /// entry's content. `None` once the archive is exhausted.
    pub fn next_entry(&mut self) -> Result<Option<(EntryPath, Entry)>, ExtractError> {
        let result = self.next_entry_inner();
        self.check(result)
    }

    fn next_entry_inner(&mut self) -> Result<Option<(EntryPath, Entry)>, ExtractError> {
        match self.state {
            State::Failed => return Err(ExtractError::Failed),
            State::Done => return Ok(None),
            State::StreamingContent { .. } => {
                self.drain(&mut std::io::sink())?;
            }
            State::ExpectHeaderOrEnd => {}
        }

        let offset = self.blocks.bytes_read();
        let block = match self.blocks.read_block()? {
            Some(v) => v,
            None => {
                tracing::warn!(offset, "archive ended without a terminator");
                self.state = State::Done;
                return Ok(None);
            }
        };

        if header::is_terminator(&block) {
            match self.blocks.read_block()? {
                Some(next) if !header::is_terminator(&next) => {
                    return Err(FormatError::BadTerminator { offset }.into());
                }
                Some(_) => {}
                None => tracing::warn!(offset, "archive ended after a single terminator block"),
            }
            tracing::debug!(offset, "reached terminator");
            self.state = State::Done;
            return Ok(None);
        }

        let entry = header::decode(&block)?;
        let path = EntryPath::new(&entry.name).map_err(|source| ExtractError::UnsafePath {
            name: entry.name.clone(),
            source,
        })?;

        tracing::debug!(offset, name = %entry.name, size = entry.size, "read header");
        self.state = State::StreamingContent {
            name: entry.name.clone(),
            size: entry.size,
            remaining: entry.size,
        };

        Ok(Some((path, entry)))
    }

    /// Copies the current entry's content into `dest` and returns the number
    /// of bytes copied. Returns 0 when no entry is open.
    pub fn copy_content<W: Write>(&mut self, dest: &mut W) -> Result<u64, ExtractError> {
        let result = self.drain(dest);
        self.check(result)
    }

    pub fn skip_content(&mut self) -> Result<u64, ExtractError> {
        self.copy_content(&mut std::io::sink())
    }

    fn drain<W: Write>(&mut self, dest: &mut W) -> Result<u64, ExtractError> {
        let (name, size, mut remaining) = match &self.state {
            State::StreamingContent {
                name,
                size,
                remaining,
            } => (name.clone(), *size, *remaining),
            State::Failed => return Err(ExtractError::Failed),
            State::ExpectHeaderOrEnd | State::Done => return Ok(0),
        };

        let mut buf = [0u8; BLOCK_SIZE];
        while remaining > 0 {
            let want = remaining.min(BLOCK_SIZE as u64) as usize;
            let read = self.blocks.read_some(&mut buf[..want])?;
            if read == 0 {
                return Err(ExtractError::IncompleteArchive {
                    name,
                    size,
                    remaining,
                });
            }

            dest.write_all(&buf[..read])
                .map_err(|source| ExtractError::WriteFile {
                    name: name.clone(),
                    source,
                })?;
            remaining -= read as u64;
        }

        let padding = self.blocks.align()?;
        tracing::trace!(%name, padding, "skipped content padding");

        self.state = State::ExpectHeaderOrEnd;
        Ok(size)
    }

    /// Reconstructs every remaining entry beneath `root`, creating `root`
    /// and any parent directories as needed. Stops at the first error;
    /// files already written are left in place.
    pub fn extract_all<P: AsRef<Path>>(
        &mut self,
        root: P,
        options: &ExtractOptions,
    ) -> Result<ExtractStats, ExtractError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|source| ExtractError::CreateDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        let mut stats = ExtractStats::default();
        while let Some((path, entry)) = self.next_entry()? {
            let dest = path.to_path(root);
            let result = self.extract_entry(&dest, &entry, options);
            stats.bytes += self.check(result)?;
            stats.files += 1;
        }

        Ok(stats)
    }

    fn extract_entry(
        &mut self,
        dest: &Path,
        entry: &Entry,
        options: &ExtractOptions,
    ) -> Result<u64, ExtractError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| ExtractError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = File::create(dest).map_err(|source| ExtractError::CreateFile {
            path: dest.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        let bytes = self.drain(&mut out)?;
        let file = out.into_inner().map_err(|e| ExtractError::WriteFile {
            name: entry.name.clone(),
            source: e.into_error(),
        })?;

        if options.restore_mtime {
            if let Err(e) = file.set_modified(entry.modified()) {
                tracing::warn!(path = %dest.display(), "cannot restore modification time: {}", e);
            }
        }

        tracing::info!(path = %dest.display(), bytes, "extracted");
        Ok(bytes)
    }
}

#[cfg(all(test, feature = "writer"))]
mod tests {
    use super::*;
    use crate::file::writer::ArchiveWriter;
    use std::io::Cursor;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ArchiveWriter::new(Vec::new()).unwrap();
        for (name, data) in entries {
            let entry = Entry::new(*name, data.len() as u64, 0);
            writer.append(&entry, &mut &data[..]).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn walks_entries_in_order() {
        let data = archive(&[("a", &b"hello"[..]), ("b/c", &[1u8; 1025][..]), ("d", &b""[..])]);
        let len = data.len() as u64;
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();

        let (path, entry) = reader.next_entry().unwrap().unwrap();
        assert_eq!(path.as_str(), "a");
        assert_eq!(entry.size, 5);
        let mut buf = vec![];
        assert_eq!(reader.copy_content(&mut buf).unwrap(), 5);
        assert_eq!(buf, b"hello");

        // Left unread; next_entry skips it.
        let (path, entry) = reader.next_entry().unwrap().unwrap();
        assert_eq!(path.as_str(), "b/c");
        assert_eq!(entry.size, 1025);

        let (path, entry) = reader.next_entry().unwrap().unwrap();
        assert_eq!(path.as_str(), "d");
        assert_eq!(entry.size, 0);

        assert!(reader.next_entry().unwrap().is_none());
        assert!(reader.next_entry().unwrap().is_none());
        assert_eq!(reader.bytes_read(), len);
    }

    #[test]
    fn bad_signature() {
        let result = ArchiveReader::new(Cursor::new(b"PK\x03\x04 not ours".to_vec()));
        assert!(matches!(result, Err(ExtractError::BadSignature { .. })));

        match ArchiveReader::new(Cursor::new(Vec::new())) {
            Err(ExtractError::BadSignature { found, .. }) => assert!(found.is_empty()),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_terminator_is_tolerated() {
        let mut data = archive(&[("a", &b"xyz"[..])]);
        data.truncate(data.len() - 2 * BLOCK_SIZE);
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();
        assert!(reader.next_entry().unwrap().is_some());
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn half_terminator_followed_by_data() {
        let mut data = archive(&[]);
        data[8 + BLOCK_SIZE] = 1;
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.next_entry(),
            Err(ExtractError::Format(FormatError::BadTerminator { offset: 8 }))
        ));
    }

    #[test]
    fn truncated_content_is_incomplete() {
        let mut data = archive(&[("a", &[7u8; 600][..])]);
        data.truncate(8 + BLOCK_SIZE + 100);
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();
        reader.next_entry().unwrap().unwrap();
        match reader.skip_content() {
            Err(ExtractError::IncompleteArchive {
                name,
                size,
                remaining,
            }) => {
                assert_eq!(name, "a");
                assert_eq!(size, 600);
                assert_eq!(remaining, 500);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(reader.next_entry(), Err(ExtractError::Failed)));
    }

    #[test]
    fn truncated_header_is_reported() {
        let mut data = archive(&[("a", &b"1"[..])]);
        data.truncate(8 + 100);
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.next_entry(),
            Err(ExtractError::TruncatedStream(_))
        ));
    }

    #[test]
    fn traversal_is_refused() {
        let data = archive(&[("../../evil", &b"boo"[..])]);
        let mut reader = ArchiveReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.next_entry(),
            Err(ExtractError::UnsafePath { .. })
        ));
    }
}
