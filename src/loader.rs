use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::env::{EnvironmentSink, TargetEnv};
use crate::error::Error;
use crate::model::{EnvStore, Entry, LoadReport, LoaderConfig};
use crate::parser::parse_rows;

const DEFAULT_FILE: &str = ".env";

/// Policy flags for the convenience loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub append: bool,
    pub silent: bool,
    pub system: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            append: false,
            silent: false,
            system: true,
        }
    }
}

/// Load files into a fresh store and the process environment.
///
/// # Safety
///
/// Writes through [`std::env::set_var`] when `options.system` is set; see
/// [`TargetEnv::process`].
pub unsafe fn load<I, P>(paths: I, options: LoadOptions) -> Result<EnvStore, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    // SAFETY: forwarded to the caller.
    let target = unsafe { TargetEnv::process() };
    let mut loader = EnvLoader::new().paths(paths).options(options).sink(target);
    loader.load()?;
    Ok(loader.into_store())
}

/// Load `.env` from the current working directory into the process environment.
///
/// # Safety
///
/// See [`load`].
pub unsafe fn dotenv() -> Result<EnvStore, Error> {
    unsafe { from_path(DEFAULT_FILE) }
}

/// Load a single file into the process environment.
///
/// # Safety
///
/// See [`load`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<EnvStore, Error> {
    unsafe { load([path], LoadOptions::default()) }
}

/// Load multiple files, in order, into the process environment.
///
/// # Safety
///
/// See [`load`].
pub unsafe fn from_paths<I, P>(paths: I) -> Result<EnvStore, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    unsafe { load(paths, LoadOptions::default()) }
}

/// Builder-style loader.
///
/// Entries always land in the in-process [`EnvStore`]; with `system` set they
/// are also written into the sink, an in-memory [`TargetEnv`] by default.
#[derive(Debug, Clone)]
pub struct EnvLoader<S = TargetEnv> {
    config: LoaderConfig,
    store: EnvStore,
    sink: S,
}

impl EnvLoader<TargetEnv> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: LoaderConfig) -> Self {
        Self {
            config,
            store: EnvStore::new(),
            sink: TargetEnv::memory(),
        }
    }
}

impl Default for EnvLoader<TargetEnv> {
    fn default() -> Self {
        Self::from_config(LoaderConfig::default())
    }
}

impl<S: EnvironmentSink> EnvLoader<S> {
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.config
            .paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn append(mut self, append: bool) -> Self {
        self.config.append = append;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.config.silent = silent;
        self
    }

    pub fn system(mut self, system: bool) -> Self {
        self.config.system = system;
        self
    }

    pub fn options(self, options: LoadOptions) -> Self {
        self.append(options.append)
            .silent(options.silent)
            .system(options.system)
    }

    /// Start from an existing store instead of an empty one.
    pub fn with_store(mut self, store: EnvStore) -> Self {
        self.store = store;
        self
    }

    /// Replace the environment sink.
    pub fn sink<T: EnvironmentSink>(self, sink: T) -> EnvLoader<T> {
        EnvLoader {
            config: self.config,
            store: self.store,
            sink,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn env_store(&self) -> &EnvStore {
        &self.store
    }

    pub fn env_store_mut(&mut self) -> &mut EnvStore {
        &mut self.store
    }

    pub fn target(&self) -> &S {
        &self.sink
    }

    pub fn target_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_store(self) -> EnvStore {
        self.store
    }

    pub fn into_parts(self) -> (EnvStore, S) {
        (self.store, self.sink)
    }

    /// Read and parse every configured file without applying anything.
    ///
    /// Entries come back in file order; duplicates are kept.
    pub fn parse_only(&self) -> Result<Vec<Entry>, Error> {
        let mut entries = Vec::new();
        let mut report = LoadReport::default();
        visit_entries(&self.config, &mut report, |entry, _| entries.push(entry))?;
        Ok(entries)
    }

    /// Apply every configured file, in order, to the store and sink.
    ///
    /// In strict mode the first error aborts the load; entries applied before
    /// it stay applied.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let config = &self.config;
        let store = &mut self.store;
        let sink = &mut self.sink;
        let mut report = LoadReport::default();

        visit_entries(config, &mut report, |entry, report| {
            apply_entry(config, store, sink, entry, report);
        })?;

        debug!(
            files_read = report.files_read,
            files_skipped = report.files_skipped,
            loaded = report.loaded,
            skipped_existing = report.skipped_existing,
            skipped_invalid = report.skipped_invalid,
            "environment load finished"
        );
        Ok(report)
    }
}

fn apply_entry<S: EnvironmentSink>(
    config: &LoaderConfig,
    store: &mut EnvStore,
    sink: &mut S,
    entry: Entry,
    report: &mut LoadReport,
) {
    if config.append && (store.has_value(&entry.key) || sink.has_value(&entry.key)) {
        report.skipped_existing += 1;
        debug!(key = %entry.key, "skipping existing key");
        return;
    }

    if config.system {
        sink.set_var(&entry.key, &entry.value.to_env_string());
    }
    trace!(
        key = %entry.key,
        kind = entry.value.type_name(),
        line = entry.line,
        "loaded entry"
    );
    store.insert(entry.key, entry.value);
    report.loaded += 1;
}

fn visit_entries<F>(
    config: &LoaderConfig,
    report: &mut LoadReport,
    mut visit: F,
) -> Result<(), Error>
where
    F: FnMut(Entry, &mut LoadReport),
{
    for path in effective_paths(config, report)? {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) if config.silent => {
                debug!(path = %path.display(), error = %source, "skipping unreadable file");
                report.files_skipped += 1;
                continue;
            }
            Err(source) => return Err(Error::FileRead { path, source }),
        };
        report.files_read += 1;

        for row in parse_rows(&content, Some(path.as_path())) {
            match row {
                Ok(entry) => visit(entry, report),
                // Row content is left out of logs; it may hold secrets.
                Err(err) if config.silent => {
                    debug!(
                        path = %path.display(),
                        line = err.line,
                        kind = %err.kind,
                        "skipping invalid row"
                    );
                    report.skipped_invalid += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

fn effective_paths(
    config: &LoaderConfig,
    report: &mut LoadReport,
) -> Result<Vec<PathBuf>, Error> {
    if config.paths.is_empty() {
        return Ok(vec![PathBuf::from(DEFAULT_FILE)]);
    }

    let mut paths = Vec::with_capacity(config.paths.len());
    for (index, path) in config.paths.iter().enumerate() {
        if path.as_os_str().is_empty() {
            if config.silent {
                debug!(index, "skipping empty path");
                report.files_skipped += 1;
                continue;
            }
            return Err(Error::InvalidPath { index });
        }
        paths.push(path.clone());
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Value;

    #[test]
    fn empty_path_is_rejected_before_any_file_is_read() {
        let mut loader = EnvLoader::new().path("").path("never-read.env");
        let err = loader.load().expect_err("expected invalid path");

        match err {
            Error::InvalidPath { index } => assert_eq!(index, 0),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(loader.env_store().is_empty());
    }

    #[test]
    fn silent_mode_skips_empty_paths() {
        let mut report = LoadReport::default();
        let config = LoaderConfig {
            paths: vec![PathBuf::new(), PathBuf::from("a.env")],
            silent: true,
            ..LoaderConfig::default()
        };

        let paths = effective_paths(&config, &mut report).expect("silent mode should not fail");
        assert_eq!(paths, vec![PathBuf::from("a.env")]);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn no_paths_falls_back_to_default_file() {
        let mut report = LoadReport::default();
        let paths = effective_paths(&LoaderConfig::default(), &mut report).expect("default path");

        assert_eq!(paths, vec![PathBuf::from(".env")]);
    }

    #[test]
    fn append_consults_store_and_sink() {
        let config = LoaderConfig {
            append: true,
            ..LoaderConfig::default()
        };
        let mut store = EnvStore::new();
        store.insert("IN_STORE", Value::Str("kept".into()));
        let mut sink = BTreeMap::from([("IN_SINK".to_owned(), "kept".to_owned())]);
        let mut report = LoadReport::default();

        for key in ["IN_STORE", "IN_SINK", "FRESH"] {
            let entry = Entry {
                key: key.to_owned(),
                value: Value::Str("new".into()),
                source: None,
                line: 1,
            };
            apply_entry(&config, &mut store, &mut sink, entry, &mut report);
        }

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_existing, 2);
        assert_eq!(store.get_string("IN_STORE"), "kept");
        assert_eq!(sink.get("IN_SINK").map(String::as_str), Some("kept"));
        assert_eq!(sink.get("FRESH").map(String::as_str), Some("new"));
    }

    #[test]
    fn system_false_leaves_sink_untouched() {
        let config = LoaderConfig {
            system: false,
            ..LoaderConfig::default()
        };
        let mut store = EnvStore::new();
        let mut sink = BTreeMap::<String, String>::new();
        let mut report = LoadReport::default();
        let entry = Entry {
            key: "FLAG".to_owned(),
            value: Value::Bool(true),
            source: None,
            line: 1,
        };

        apply_entry(&config, &mut store, &mut sink, entry, &mut report);

        assert!(sink.is_empty());
        assert_eq!(store.get_bool_opt("FLAG"), Some(true));
    }

    #[test]
    fn load_options_default_propagates_to_system() {
        let options = LoadOptions::default();
        assert!(options.system);
        assert!(!options.append);
        assert!(!options.silent);
    }
}
