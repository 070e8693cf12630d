//! Output directory and file writers

use crate::error::{PrepError, PrepResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DATA_JSON: &str = "data.json";
pub const PAPER_IDS_JSON: &str = "paper_ids.json";
pub const SAFE_PAPER_IDS_JSON: &str = "safe_paper_ids.json";
pub const TITLES_JSON: &str = "titles.json";
pub const FIELDS_BY_SPLIT_JSON: &str = "mag_fields_by_paper_ids.json";
pub const FIELDS_BY_PAPER_JSON: &str = "mag_fields_by_all_paper_ids.json";
pub const CITED_BY_JSON: &str = "cited_by.json";
pub const CITES_JSON: &str = "cites.json";
pub const METADATA_JSON: &str = "metadata.json";
pub const MANIFEST_JSON: &str = "manifest.json";

/// A directory that receives pipeline outputs
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Create the directory (and parents) if needed
    pub fn create(root: impl Into<PathBuf>) -> PrepResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| PrepError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Open a buffered writer, truncating any existing file
    pub fn writer(&self, name: &str) -> PrepResult<BufWriter<File>> {
        let path = self.path(name);
        let file = File::create(&path).map_err(|e| PrepError::io(&path, e))?;
        Ok(BufWriter::new(file))
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T, pretty: bool) -> PrepResult<PathBuf> {
        let path = self.path(name);
        let mut writer = self.writer(name)?;
        if pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writer.flush().map_err(|e| PrepError::io(&path, e))?;
        Ok(path)
    }

    /// One item per line
    pub fn write_lines<I, T>(&self, name: &str, lines: I) -> PrepResult<PathBuf>
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        let path = self.path(name);
        let mut writer = self.writer(name)?;
        for line in lines {
            writeln!(writer, "{}", line).map_err(|e| PrepError::io(&path, e))?;
        }
        writer.flush().map_err(|e| PrepError::io(&path, e))?;
        Ok(path)
    }
}

/// Read a JSON file written by an earlier run
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> PrepResult<T> {
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
