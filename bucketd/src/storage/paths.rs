// PathManager maps object keys to locations under the storage root.
//
// The layout on disk is:
//
//	<root>
//	└── objects
//	    └── <key segments>     one directory per segment of the key
//	        ├── _data          object body
//	        └── _meta.json     content type, etag and upload time
//
// Bodies are always leaves named `_data`, so a key may be a prefix of another
// key (`x.md` and `x.md/y.md`). Key segments starting with `_` are stored with
// one more leading `_`, so no segment can be mistaken for a leaf.

use std::path::{Component, Path, PathBuf};

use tokio::io;

pub(crate) const DATA_FILE: &str = "_data";
const META_FILE: &str = "_meta.json";

#[derive(Clone, Debug)]
pub struct PathManager {
    root_path: PathBuf,
}

impl PathManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        PathManager {
            root_path: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root of the object tree (e.g. `<root>/objects`).
    pub fn objects_path(&self) -> PathBuf {
        self.root_path.join("objects")
    }

    /// Returns the directory of an object (e.g. `<root>/objects/notes/a.md`).
    pub fn object_dir(&self, key: &str) -> io::Result<PathBuf> {
        Ok(self.objects_path().join(relative_key(key)?))
    }

    /// Returns the path of an object body (e.g. `<root>/objects/notes/a.md/_data`).
    pub fn object_data_path(&self, key: &str) -> io::Result<PathBuf> {
        Ok(self.object_dir(key)?.join(DATA_FILE))
    }

    /// Returns the path of an object's metadata (e.g. `<root>/objects/notes/a.md/_meta.json`).
    pub fn object_meta_path(&self, key: &str) -> io::Result<PathBuf> {
        Ok(self.object_dir(key)?.join(META_FILE))
    }

    /// Maps a body path found under `objects_path` back to its key.
    /// Anything that is not a `_data` leaf yields `None`.
    pub fn key_for(&self, data_path: &Path) -> Option<String> {
        if data_path.file_name()? != DATA_FILE {
            return None;
        }
        let relative = data_path.parent()?.strip_prefix(self.objects_path()).ok()?;
        let segments = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str().map(unescape_segment),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }
}

/// Every `/`-separated segment must be a single plain path component.
fn relative_key(key: &str) -> io::Result<PathBuf> {
    let mut path = PathBuf::new();
    for segment in key.split('/') {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(s)), None) if s == segment => {
                path.push(escape_segment(segment));
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("key `{key}` does not map to a path under the storage root"),
                ));
            }
        }
    }
    Ok(path)
}

fn escape_segment(segment: &str) -> String {
    if segment.starts_with('_') {
        format!("_{segment}")
    } else {
        segment.to_string()
    }
}

fn unescape_segment(name: &str) -> String {
    name.strip_prefix('_').unwrap_or(name).to_string()
}
