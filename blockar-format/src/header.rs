//! Header block encoding.
//!
//! | field   | offset | width | contents                                   |
//! |---------|--------|-------|--------------------------------------------|
//! | name    | 0      | 100   | UTF-8, zero-padded                         |
//! | mode    | 100    | 8     | `0000755`                                  |
//! | uid     | 108    | 8     | `0000000`                                  |
//! | gid     | 116    | 8     | `0000000`                                  |
//! | size    | 124    | 12    | decimal, right-justified in 11, space-padded |
//! | mtime   | 136    | 12    | decimal, right-justified in 11, space-padded |
//! | marker  | 148    | 8     | `ustar`                                    |
//! | version | 156    | 2     | `00`                                       |
//! | owner   | 158    | 30    | `root`                                     |
//!
//! Everything after byte 188 is zero. Unused bytes inside a field are zero.

use crate::{
    block::{Block, ZERO_BLOCK},
    error::{FormatError, HeaderError},
    record::Entry,
};

/// Leading bytes of every archive.
pub const SIGNATURE: &[u8; 8] = b"ustar\x0007";

pub const NAME_WIDTH: usize = 100;

// Digits that fit in a numeric field, leaving its last byte zero.
const NUMBER_DIGITS: usize = 11;

struct Field {
    name: &'static str,
    offset: usize,
    width: usize,
}

impl Field {
    const fn new(name: &'static str, offset: usize, width: usize) -> Field {
        Field {
            name,
            offset,
            width,
        }
    }

    #[inline(always)]
    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

const NAME: Field = Field::new("name", 0, NAME_WIDTH);
const MODE: Field = Field::new("mode", 100, 8);
const UID: Field = Field::new("uid", 108, 8);
const GID: Field = Field::new("gid", 116, 8);
const SIZE: Field = Field::new("size", 124, 12);
const MTIME: Field = Field::new("mtime", 136, 12);
const MARKER: Field = Field::new("marker", 148, 8);
const VERSION: Field = Field::new("version", 156, 2);
const OWNER: Field = Field::new("owner", 158, 30);

pub(crate) const MODE_PLACEHOLDER: &[u8] = b"0000755";
pub(crate) const UID_PLACEHOLDER: &[u8] = b"0000000";
pub(crate) const GID_PLACEHOLDER: &[u8] = b"0000000";
pub(crate) const FORMAT_MARKER: &[u8] = b"ustar";
pub(crate) const FORMAT_VERSION: &[u8] = b"00";
pub(crate) const OWNER_PLACEHOLDER: &[u8] = b"root";

/// Cuts `name` to the longest prefix of at most [`NAME_WIDTH`] bytes that
/// ends on a character boundary. A separator left at the end of the cut is
/// dropped too, so the result still names a file.
///
/// Distinct long names can truncate to the same stored name; such entries
/// extract onto one path and the later one wins.
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= NAME_WIDTH {
        return name;
    }
    let mut end = NAME_WIDTH;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].trim_end_matches('/')
}

#[inline(always)]
fn put(block: &mut Block, field: &Field, value: &[u8]) {
    debug_assert!(value.len() <= field.width);
    block[field.offset..field.offset + value.len()].copy_from_slice(value);
}

fn put_number(block: &mut Block, field: &Field, value: u64) -> Result<(), HeaderError> {
    let digits = format!("{:>width$}", value, width = NUMBER_DIGITS);
    if digits.len() > NUMBER_DIGITS {
        return Err(HeaderError::FieldOverflow {
            field: field.name,
            value,
            width: field.width,
        });
    }
    put(block, field, digits.as_bytes());
    Ok(())
}

/// Packs `entry` into a header block. Names longer than [`NAME_WIDTH`]
/// bytes are truncated as per [`truncate_name`].
pub fn encode(entry: &Entry) -> Result<Block, HeaderError> {
    let mut block = ZERO_BLOCK;

    let name = truncate_name(&entry.name);
    if name.len() < entry.name.len() {
        tracing::warn!(
            name = %entry.name,
            stored = %name,
            "name longer than {} bytes, truncating",
            NAME_WIDTH
        );
    }

    put(&mut block, &NAME, name.as_bytes());
    put(&mut block, &MODE, MODE_PLACEHOLDER);
    put(&mut block, &UID, UID_PLACEHOLDER);
    put(&mut block, &GID, GID_PLACEHOLDER);
    put_number(&mut block, &SIZE, entry.size)?;
    put_number(&mut block, &MTIME, entry.mtime)?;
    put(&mut block, &MARKER, FORMAT_MARKER);
    put(&mut block, &VERSION, FORMAT_VERSION);
    put(&mut block, &OWNER, OWNER_PLACEHOLDER);

    Ok(block)
}

fn parse_number(block: &Block, field: &Field) -> Result<u64, FormatError> {
    let raw = &block[field.range()];
    let padding = |b: &u8| *b == 0 || *b == b' ';

    let start = match raw.iter().position(|b| !padding(b)) {
        Some(v) => v,
        None => return Ok(0),
    };
    let end = raw.iter().rposition(|b| !padding(b)).map_or(start, |x| x + 1);
    let digits = &raw[start..end];

    let invalid = || FormatError::InvalidNumber {
        field: field.name,
        value: String::from_utf8_lossy(digits).into_owned(),
    };

    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|x| x.parse::<u64>().ok())
        .ok_or_else(invalid)
}

fn parse_name(block: &Block) -> String {
    let raw = &block[NAME.range()];
    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |x| x + 1);
    String::from_utf8_lossy(&raw[..end]).replace('\0', "_")
}

/// Unpacks a header block. Only the size field is validated strictly, since
/// it alone determines where the next header starts.
pub fn decode(block: &Block) -> Result<Entry, FormatError> {
    let name = parse_name(block);
    let size = parse_number(block, &SIZE)?;
    let mtime = parse_number(block, &MTIME).unwrap_or_else(|e| {
        tracing::warn!(%name, "ignoring modification time: {}", e);
        0
    });

    Ok(Entry { name, size, mtime })
}

/// An all-zero block, one half of the end-of-archive marker.
#[inline(always)]
pub fn is_terminator(block: &Block) -> bool {
    block.iter().all(|b| *b == 0)
}
