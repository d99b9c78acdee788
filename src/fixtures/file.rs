use std::fmt;
use std::path::{Path, PathBuf};

use super::{DslOptions, ToDsl};

/// The suffix the runtime's file sink appends to written files by default.
pub const DEFAULT_SUFFIX: &str = "out";

/// The behavior of a file sink when its target file already exists.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileMode {
    Append,
    Replace,
    Fail,
    Ignore,
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "APPEND"),
            Self::Replace => write!(f, "REPLACE"),
            Self::Fail => write!(f, "FAIL"),
            Self::Ignore => write!(f, "IGNORE"),
        }
    }
}

/// A sink which writes each message to a file.
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
    name: String,
    suffix: String,
    mode: Option<FileMode>,
    binary: Option<bool>,
    options: DslOptions,
}

impl FileSink {
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.into(),
            suffix: DEFAULT_SUFFIX.into(),
            mode: None,
            binary: None,
            options: DslOptions::default(),
        }
    }

    /// Set the suffix of the written file.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the sink's behavior when the target file already exists.
    pub fn mode(mut self, mode: FileMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Write messages as raw bytes, without appending a line separator.
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Set an additional option, e.g. `overwrite`.
    pub fn option(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.options.set(key, val);
        self
    }

    /// The path of the file this sink writes to.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, self.suffix))
    }
}

impl ToDsl for FileSink {
    fn to_dsl(&self) -> String {
        let mut out = format!("file --dir={} --name={} --suffix={}", self.dir.display(), self.name, self.suffix);
        if let Some(mode) = self.mode {
            out.push_str(&format!(" --mode={}", mode));
        }
        if let Some(binary) = self.binary {
            out.push_str(&format!(" --binary={}", binary));
        }
        self.options.render_into(&mut out);
        out
    }
}
