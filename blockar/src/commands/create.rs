use std::io::{BufWriter, IsTerminal};

use blockar_format::ArchiveWriter;

use crate::cli::CreateArgs;
use crate::error::{Error, Result};

pub fn run(args: CreateArgs) -> Result<()> {
    let stdout = std::io::stdout();
    if stdout.is_terminal() {
        return Err(Error::TerminalOutput);
    }

    let mut writer =
        ArchiveWriter::new(BufWriter::new(stdout.lock())).map_err(|source| Error::Create { source })?;

    for path in &args.files {
        writer
            .append_path(path)
            .map_err(|source| Error::Create { source })?;
    }

    let entries = writer.entries();
    let bytes = writer.bytes_written();
    writer.finish().map_err(|source| Error::Create { source })?;

    tracing::info!(entries, bytes, "archive written");
    Ok(())
}
