use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::{
    block::{BlockWriter, BLOCK_SIZE},
    error::CreateError,
    header::{self, SIGNATURE},
    path::EntryPath,
    record::Entry,
};

/// Streams entries into an archive.
///
/// Nothing is buffered beyond a single block: the header, content and
/// padding of each entry go straight to the sink. Call
/// [`ArchiveWriter::finish`] to write the terminator; a writer dropped
/// without finishing leaves an archive without one.
#[derive(Debug)]
pub struct ArchiveWriter<W: Write> {
    blocks: BlockWriter<W>,
    entries: u64,
    names: HashSet<String>,
}

impl<W: Write> ArchiveWriter<W> {
    /// Starts a new archive on `sink` by writing the signature.
    pub fn new(sink: W) -> Result<ArchiveWriter<W>, CreateError> {
        let mut blocks = BlockWriter::new(sink);
        blocks.write_content(SIGNATURE).map_err(CreateError::Write)?;
        blocks.set_origin();

        Ok(ArchiveWriter {
            blocks,
            entries: 0,
            names: HashSet::new(),
        })
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn bytes_written(&self) -> u64 {
        self.blocks.bytes_written()
    }

    /// Archives the regular file at `path`. The file is opened, drained and
    /// closed before this returns.
    pub fn append_path<P: AsRef<Path>>(&mut self, path: P) -> Result<Entry, CreateError> {
        let path = path.as_ref();
        let name = EntryPath::from_path(path).map_err(|source| CreateError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;

        let mut file = File::open(path).map_err(|source| CreateError::OpenSource {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = file.metadata().map_err(|source| CreateError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(CreateError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let entry = Entry::from_metadata(name.to_string(), &meta);
        self.append_inner(&entry, &mut file, path)?;
        Ok(entry)
    }

    /// Archives `content` under `entry`. The reader must yield exactly
    /// `entry.size` bytes.
    pub fn append<R: Read>(&mut self, entry: &Entry, content: &mut R) -> Result<(), CreateError> {
        self.append_inner(entry, content, Path::new(&entry.name))
    }

    fn append_inner<R: Read>(
        &mut self,
        entry: &Entry,
        content: &mut R,
        source_path: &Path,
    ) -> Result<(), CreateError> {
        let block = header::encode(entry).map_err(|source| CreateError::Header {
            name: entry.name.clone(),
            source,
        })?;
        self.blocks.write_block(&block).map_err(CreateError::Write)?;

        let size_changed = |actual| CreateError::SizeChanged {
            name: entry.name.clone(),
            expected: entry.size,
            actual,
        };

        let mut buf = [0u8; BLOCK_SIZE];
        let mut written = 0u64;
        loop {
            let n = match content.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(CreateError::ReadSource {
                        path: source_path.to_path_buf(),
                        source,
                    })
                }
            };

            if written + n as u64 > entry.size {
                return Err(size_changed(written + n as u64));
            }
            self.blocks
                .write_content(&buf[..n])
                .map_err(CreateError::Write)?;
            written += n as u64;
        }

        if written != entry.size {
            return Err(size_changed(written));
        }

        let padding = self.blocks.pad().map_err(CreateError::Write)?;
        self.entries += 1;

        let stored = header::truncate_name(&entry.name);
        if !self.names.insert(stored.to_string()) {
            tracing::warn!(
                name = %entry.name,
                stored = %stored,
                "stored name repeats an earlier entry; it will overwrite it on extraction"
            );
        }

        tracing::info!(name = %entry.name, size = entry.size, padding, "added entry");
        Ok(())
    }

    /// Writes the terminator, flushes and hands back the sink.
    pub fn finish(mut self) -> Result<W, CreateError> {
        self.blocks.write_terminator().map_err(CreateError::Write)?;
        self.blocks.flush().map_err(CreateError::Write)?;

        tracing::debug!(
            entries = self.entries,
            bytes = self.blocks.bytes_written(),
            "finished archive"
        );
        Ok(self.blocks.into_inner())
    }
}

/// Writes an archive of `paths`, in order, to `sink`. The first file that
/// cannot be archived aborts the run.
pub fn create<I, P, W>(paths: I, sink: W) -> Result<W, CreateError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    W: Write,
{
    let mut writer = ArchiveWriter::new(sink)?;
    for path in paths {
        writer.append_path(path)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BLOCK_SIZE;

    #[test]
    fn empty_archive() {
        let out = create(Vec::<&Path>::new(), Vec::new()).unwrap();
        assert_eq!(out.len(), SIGNATURE.len() + 2 * BLOCK_SIZE);
        assert_eq!(&out[..8], &[0x75, 0x73, 0x74, 0x61, 0x72, 0x00, 0x30, 0x37]);
        assert!(out[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn content_is_padded_to_blocks() {
        let mut writer = ArchiveWriter::new(Vec::new()).unwrap();
        let data = vec![0xabu8; 700];
        writer
            .append(&Entry::new("a.bin", 700, 0), &mut &data[..])
            .unwrap();
        writer
            .append(&Entry::new("empty", 0, 0), &mut std::io::empty())
            .unwrap();
        assert_eq!(writer.entries(), 2);
        let out = writer.finish().unwrap();

        // header + 2 content blocks + header + terminator
        assert_eq!(out.len(), 8 + BLOCK_SIZE * 6);
        let content = &out[8 + BLOCK_SIZE..8 + BLOCK_SIZE * 3];
        assert!(content[..700].iter().all(|b| *b == 0xab));
        assert!(content[700..].iter().all(|b| *b == 0));
        assert_eq!(&out[8 + BLOCK_SIZE * 3..8 + BLOCK_SIZE * 3 + 5], b"empty");
    }

    #[test]
    fn short_content_is_rejected() {
        let mut writer = ArchiveWriter::new(Vec::new()).unwrap();
        let result = writer.append(&Entry::new("a", 10, 0), &mut &b"abc"[..]);
        assert!(matches!(
            result,
            Err(CreateError::SizeChanged {
                expected: 10,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn long_content_is_rejected() {
        let mut writer = ArchiveWriter::new(Vec::new()).unwrap();
        let result = writer.append(&Entry::new("a", 2, 0), &mut &b"abc"[..]);
        assert!(matches!(result, Err(CreateError::SizeChanged { expected: 2, .. })));
    }

    #[test]
    fn missing_source_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        match create(vec![&missing], Vec::new()) {
            Err(CreateError::OpenSource { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected {:?}", other.map(|x| x.len())),
        }
    }

    #[test]
    fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = create(vec![dir.path()], Vec::new());
        assert!(matches!(
            result,
            Err(CreateError::NotAFile { .. }) | Err(CreateError::OpenSource { .. })
        ));
    }
}
