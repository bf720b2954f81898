use std::path::PathBuf;

/// Errors raised while reading catalog files.
///
/// The catalog never hands these to callers of its query methods: a file
/// that fails to load is logged and treated as empty. They exist so the
/// individual loaders can use `?` and so tests can assert on the cause.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Reading a file or directory failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template or name cache file is not valid JSON of the right shape.
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The worlds file is not valid YAML of the right shape.
    #[error("malformed YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
