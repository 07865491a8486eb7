pub mod block;
mod error;
mod file;
pub mod header;
pub mod path;
mod record;

pub use block::{Block, BlockReader, BlockWriter, BLOCK_SIZE};
pub use error::{CreateError, ExtractError, FormatError, HeaderError, StreamError};
#[cfg(feature = "reader")]
pub use file::reader::{ArchiveReader, ExtractOptions, ExtractStats};
#[cfg(feature = "writer")]
pub use file::writer::{create, ArchiveWriter};
pub use header::SIGNATURE;
pub use path::EntryPath;
pub use record::Entry;
