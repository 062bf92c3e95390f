pub use crate::{
    errors::ConfigError,
    loader::Loader,
    model::{Checksum, KeyPath, Layer, SnapshotVersion},
    snapshot::ConfigSnapshot,
    source::{cli::CliArgsSource, env::EnvSource, file::FileSource, Source, SourceSnapshot},
};
