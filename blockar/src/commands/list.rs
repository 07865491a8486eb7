use std::io::Write;

use blockar_format::ArchiveReader;

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::{format_size, format_time};

pub fn run(args: ListArgs) -> Result<()> {
    let mut reader =
        ArchiveReader::new(std::io::stdin().lock()).map_err(|source| Error::List { source })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let output = |source| Error::Output { source };

    if !args.json {
        writeln!(out, "{:>12}  {:<20}  {}", "Size", "Modified", "Path").map_err(output)?;
        writeln!(out, "{:->12}  {:-<20}  {:-<8}", "", "", "").map_err(output)?;
    }

    while let Some((path, entry)) = reader
        .next_entry()
        .map_err(|source| Error::List { source })?
    {
        if args.json {
            serde_json::to_writer(&mut out, &entry)
                .map_err(std::io::Error::from)
                .map_err(output)?;
            writeln!(out).map_err(output)?;
        } else {
            writeln!(
                out,
                "{:>12}  {:<20}  {}",
                format_size(entry.size),
                format_time(entry.modified()),
                path
            )
            .map_err(output)?;
        }
    }

    out.flush().map_err(output)
}
