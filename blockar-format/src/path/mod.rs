use relative_path::{Component as RelativeComponent, RelativePath};
use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoEntryPathError;

/// The separator used between segments of an archived name, independent of
/// the platform that wrote the archive.
pub const PATH_ENTRY_SEP: &str = "/";

/// A validated, relative entry name.
///
/// Every segment is a plain file or directory name: `.` segments and
/// leading separators are dropped, `..` segments are rejected, so joining an
/// `EntryPath` onto a destination root can never leave that root.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntryPath(pub(crate) String);

fn check_segment(segment: &str) -> Result<&str, IntoEntryPathError> {
    if segment.contains('\0') {
        return Err(IntoEntryPathError::UnrepresentableStr);
    }

    // Drive prefixes and the like only parse as something other than a
    // single normal component on the platforms where they mean something.
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(segment),
        _ => Err(IntoEntryPathError::UnrepresentableStr),
    }
}

impl EntryPath {
    /// Validates a name as it appears in an archive header.
    pub fn new<S: AsRef<str>>(name: S) -> Result<EntryPath, IntoEntryPathError> {
        let mut out = vec![];

        for component in RelativePath::new(name.as_ref()).components() {
            match component {
                RelativeComponent::CurDir => {}
                RelativeComponent::ParentDir => return Err(IntoEntryPathError::ParentTraversal),
                RelativeComponent::Normal(segment) => out.push(check_segment(segment)?),
            }
        }

        if out.is_empty() {
            return Err(IntoEntryPathError::EmptyPath);
        }

        Ok(EntryPath(out.join(PATH_ENTRY_SEP)))
    }

    /// Builds the archived name for a filesystem path. Root and drive
    /// prefixes are stripped, so `/etc/hosts` is stored as `etc/hosts`, and
    /// `..` removes the segment before it, so `work/../up.txt` is stored as
    /// `up.txt` and `../notes.txt` as `notes.txt`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<EntryPath, IntoEntryPathError> {
        let path = path.as_ref();
        let mut out = vec![];
        let mut has_parent = false;

        for component in path.components() {
            match component {
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    has_parent = true;
                    out.pop();
                }
                Component::Normal(os_str) => {
                    let segment = os_str
                        .to_str()
                        .ok_or(IntoEntryPathError::UnrepresentableStr)?;
                    out.push(check_segment(segment)?);
                }
            }
        }

        if out.is_empty() {
            return Err(IntoEntryPathError::EmptyPath);
        }

        let name = out.join(PATH_ENTRY_SEP);
        if has_parent {
            tracing::warn!(
                path = %path.display(),
                stored = %name,
                "removing `..` from archived name"
            );
        }
        Ok(EntryPath(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves this entry beneath `root`.
    pub fn to_path<P: AsRef<Path>>(&self, root: P) -> PathBuf {
        let mut path = root.as_ref().to_path_buf();
        path.extend(self.iter());
        path
    }

    pub fn iter(&self) -> std::str::Split<'_, &str> {
        self.0.split(PATH_ENTRY_SEP)
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
