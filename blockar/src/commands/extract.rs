use blockar_format::{ArchiveReader, ExtractOptions};

use crate::cli::ExtractArgs;
use crate::error::{Error, Result};

pub fn run(args: ExtractArgs) -> Result<()> {
    let root = match args.directory {
        Some(v) => v,
        None => std::env::current_dir().map_err(|source| Error::CurrentDir { source })?,
    };

    let mut reader =
        ArchiveReader::new(std::io::stdin().lock()).map_err(|source| Error::Extract { source })?;

    let options = ExtractOptions {
        restore_mtime: !args.touch,
    };
    let stats = reader
        .extract_all(&root, &options)
        .map_err(|source| Error::Extract { source })?;

    tracing::info!(
        files = stats.files,
        bytes = stats.bytes,
        archive_bytes = reader.bytes_read(),
        root = %root.display(),
        "extraction complete"
    );
    Ok(())
}
