use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::{DeletionGuard, FolderRemover};
use crate::error::Result;
use crate::paths::posix;
use crate::settings::{default_n_partitions, default_num_of_dir_levels, JobSettings};

/// The part of an upload job config that names its source folders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoriesToDeleteConfigs {
    /// Modality abbreviation to source folder, e.g. `{"ecephys": "/scratch/a/ephys"}`.
    /// Kept in document order.
    #[serde(
        default,
        deserialize_with = "ordered_sources",
        serialize_with = "sources_as_map"
    )]
    pub modality_sources: Vec<(String, PathBuf)>,
    #[serde(default)]
    pub metadata_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSourceFoldersSettings {
    pub directories: DirectoriesToDeleteConfigs,
    #[serde(default = "default_num_of_dir_levels")]
    pub num_of_dir_levels: usize,
    #[serde(default = "default_n_partitions")]
    pub n_partitions: usize,
    #[serde(default)]
    pub dry_run: bool,
}

impl JobSettings for DeleteSourceFoldersSettings {
    const FIELDS: &'static [&'static str] =
        &["directories", "num_of_dir_levels", "n_partitions", "dry_run"];
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSourceFoldersReport {
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_dir_removed: Option<String>,
    pub dry_run: bool,
    pub elapsed_seconds: f64,
}

fn ordered_sources<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, PathBuf)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SourcesVisitor;

    impl<'de> Visitor<'de> for SourcesVisitor {
        type Value = Vec<(String, PathBuf)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of modality abbreviation to source folder")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut sources = Vec::new();
            while let Some(entry) = map.next_entry::<String, PathBuf>()? {
                sources.push(entry);
            }
            Ok(sources)
        }
    }

    deserializer.deserialize_map(SourcesVisitor)
}

fn sources_as_map<S>(
    sources: &[(String, PathBuf)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(sources.iter().map(|(modality, dir)| (modality, dir)))
}

impl DirectoriesToDeleteConfigs {
    pub fn modality_directories(&self) -> Vec<&Path> {
        self.modality_sources
            .iter()
            .map(|(_, dir)| dir.as_path())
            .collect()
    }
}

pub fn run(settings: &DeleteSourceFoldersSettings) -> Result<DeleteSourceFoldersReport> {
    run_with_guard(settings, DeletionGuard::staging_or_scratch()?)
}

pub(crate) fn run_with_guard(
    settings: &DeleteSourceFoldersSettings,
    guard: DeletionGuard,
) -> Result<DeleteSourceFoldersReport> {
    let started = Instant::now();
    let remover = FolderRemover::new(
        guard,
        settings.num_of_dir_levels,
        settings.n_partitions,
        settings.dry_run,
    );

    let mut removed = Vec::new();
    for folder in settings.directories.modality_directories() {
        removed.push(remover.remove_tree(folder)?);
    }

    // Only the metadata folder itself is removed, without the partitioned pass.
    let metadata_dir_removed = match &settings.directories.metadata_dir {
        Some(metadata_dir) => {
            let metadata_dir = posix(metadata_dir);
            remover.remove_directory(&metadata_dir)?;
            Some(metadata_dir)
        }
        None => None,
    };

    let elapsed = started.elapsed().as_secs_f64();
    log::debug!("Task took {} seconds", elapsed);

    Ok(DeleteSourceFoldersReport {
        removed,
        metadata_dir_removed,
        dry_run: settings.dry_run,
        elapsed_seconds: elapsed,
    })
}
