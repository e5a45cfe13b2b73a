//! Normalized path handling for drive-letter and UNC paths

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Backslashes become forward slashes, repeated separators collapse (except
/// the leading `//` of a UNC path), `.` components are dropped and trailing
/// separators are removed. Conversion back to a platform-native form happens
/// only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        Self { inner: clean(&raw) }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Render with the platform's separator.
    pub fn to_native_string(&self) -> String {
        if MAIN_SEPARATOR == '/' {
            self.inner.clone()
        } else {
            self.inner.replace('/', &MAIN_SEPARATOR.to_string())
        }
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(self.to_native_string())
    }

    /// Render with backslashes, the form Access stores in connect strings.
    pub fn to_windows_string(&self) -> String {
        self.inner.replace('/', "\\")
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let (root, rest) = self.split_root();
        // only a drive root such as `C:/` keeps a trailing separator
        if rest.ends_with('/') {
            return None;
        }
        match rest.rfind('/') {
            Some(idx) => Some(Self {
                inner: clean(&format!("{}{}", root, &rest[..idx])),
            }),
            None if root == "/" && !rest.is_empty() => Some(Self {
                inner: "/".to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let (_, rest) = self.split_root();
        let last = rest.rsplit('/').next()?;
        if last.is_empty() || is_drive(last) {
            None
        } else {
            Some(last)
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Check if this is a UNC path (`\\server\share\...`).
    pub fn is_network_path(&self) -> bool {
        self.inner.starts_with("//")
    }

    /// Rooted at `/`, `//` or a drive letter.
    pub fn is_absolute(&self) -> bool {
        let (root, rest) = self.split_root();
        !root.is_empty() || rest.split('/').next().is_some_and(is_drive)
    }

    /// The `//server/share` root of a UNC path.
    pub fn share_root(&self) -> Option<Self> {
        if !self.is_network_path() {
            return None;
        }
        let mut parts = self.inner[2..].split('/');
        let server = parts.next().filter(|s| !s.is_empty())?;
        let share = parts.next().filter(|s| !s.is_empty())?;
        Some(Self {
            inner: format!("//{}/{}", server, share),
        })
    }

    /// Resolve a relative path against `base`; absolute paths are returned as-is.
    pub fn absolutize(&self, base: &NormalizedPath) -> Self {
        if self.is_absolute() {
            self.clone()
        } else {
            base.join(&self.inner)
        }
    }

    /// Strip `prefix` when it matches this path's leading components,
    /// ignoring case. Returns the remainder without a leading separator.
    ///
    /// Matching works on whole components, so `//srv/data` is not a prefix
    /// of `//srv/database/x.mdb`.
    pub fn strip_prefix_ignore_case(&self, prefix: &NormalizedPath) -> Option<&str> {
        let (root, rest) = self.split_root();
        let (prefix_root, prefix_rest) = prefix.split_root();
        if root != prefix_root {
            return None;
        }

        let mut remainder = rest;
        for wanted in prefix_rest.split('/').filter(|c| !c.is_empty()) {
            let (head, tail) = remainder.split_once('/').unwrap_or((remainder, ""));
            if head.is_empty() || !eq_ignore_case(head, wanted) {
                return None;
            }
            remainder = tail;
        }
        Some(remainder)
    }

    /// True when `prefix` is this path or one of its ancestors, ignoring case.
    pub fn starts_with_ignore_case(&self, prefix: &NormalizedPath) -> bool {
        self.strip_prefix_ignore_case(prefix).is_some()
    }

    /// Case-insensitive equality, the way Windows compares paths.
    pub fn eq_ignore_case(&self, other: &NormalizedPath) -> bool {
        eq_ignore_case(&self.inner, &other.inner)
    }

    /// Number of path components, not counting the root marker.
    pub fn depth(&self) -> usize {
        let (_, rest) = self.split_root();
        rest.split('/').filter(|c| !c.is_empty()).count()
    }

    fn split_root(&self) -> (&str, &str) {
        if let Some(rest) = self.inner.strip_prefix("//") {
            ("//", rest)
        } else if let Some(rest) = self.inner.strip_prefix('/') {
            ("/", rest)
        } else {
            ("", &self.inner)
        }
    }
}

fn clean(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let (root, rest) = if let Some(rest) = unified.strip_prefix("//") {
        ("//", rest)
    } else if let Some(rest) = unified.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", unified.as_str())
    };

    let parts: Vec<&str> = rest
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();

    let mut out = String::with_capacity(unified.len());
    out.push_str(root);
    out.push_str(&parts.join("/"));
    // a bare drive letter keeps its root separator: `C:/`
    if root.is_empty() && parts.len() == 1 && is_drive(parts[0]) {
        out.push('/');
    }
    out
}

fn is_drive(component: &str) -> bool {
    let bytes = component.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
