use std::path::{Path, PathBuf};

use super::{DslOptions, ToDsl, DEFAULT_SUFFIX};

/// The name of the directory, under the output dir, which the job reads from by default.
pub const DEFAULT_DIRECTORY_NAME: &str = "filejdbctest";
/// The name of the file which the job reads by default, without suffix.
pub const DEFAULT_FILE_NAME: &str = "filejdbctest";
/// The table which the job writes to by default.
pub const DEFAULT_TABLE_NAME: &str = "filejdbctest";
/// The column names which each line of the file is mapped onto by default.
pub const DEFAULT_NAMES: &str = "data";

/// A batch job which reads a file and writes each line as a row of a database table.
#[derive(Clone, Debug)]
pub struct FileJdbcJob {
    dir: PathBuf,
    file_name: String,
    suffix: String,
    names: String,
    table: String,
    delete_files: bool,
    initialize_database: bool,
    options: DslOptions,
}

impl FileJdbcJob {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            file_name: DEFAULT_FILE_NAME.into(),
            suffix: DEFAULT_SUFFIX.into(),
            names: DEFAULT_NAMES.into(),
            table: DEFAULT_TABLE_NAME.into(),
            delete_files: false,
            initialize_database: true,
            options: DslOptions::default(),
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn names(mut self, names: impl Into<String>) -> Self {
        self.names = names.into();
        self
    }

    pub fn table_name(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Have the job delete its input files once they are loaded.
    pub fn delete_files(mut self, delete: bool) -> Self {
        self.delete_files = delete;
        self
    }

    pub fn initialize_database(mut self, initialize: bool) -> Self {
        self.initialize_database = initialize;
        self
    }

    pub fn option(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.options.set(key, val);
        self
    }

    /// The directory this job reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The table this job writes to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The path of the file this job reads.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.file_name, self.suffix))
    }

    /// The job's input as a resource URI.
    pub fn resource(&self) -> String {
        format!("file://{}", self.path().display())
    }
}

impl ToDsl for FileJdbcJob {
    fn to_dsl(&self) -> String {
        let mut out = format!(
            "filejdbc --resources={} --names={} --tableName={} --initializeDatabase={}",
            self.resource(),
            self.names,
            self.table,
            self.initialize_database
        );
        if self.delete_files {
            out.push_str(" --deleteFiles=true");
        }
        self.options.render_into(&mut out);
        out
    }
}
