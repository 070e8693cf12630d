//! Gzip shard fixtures written into a temporary corpus directory

use citegraph::PipelineConfig;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary corpus laid out as `metadata/` and `pdf_parses/` shards
pub struct TestCorpus {
    dir: TempDir,
    pub shard_count: usize,
}

impl TestCorpus {
    /// Create a corpus with `shard_count` empty metadata and PDF-parse shards
    pub fn new(shard_count: usize) -> Self {
        let corpus = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            shard_count,
        };
        for shard in 0..shard_count {
            corpus.write_metadata(shard, &[]);
            corpus.write_pdf_parses(shard, &[]);
        }
        corpus
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("corpus")
    }

    pub fn save_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// A pipeline config pointed at this corpus
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.data_dir(), self.save_dir());
        config.shard_count = self.shard_count;
        config.workers = 2;
        config.strict = true;
        config
    }

    pub fn write_metadata(&self, shard: usize, records: &[Value]) {
        let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        self.write_raw_metadata(shard, &lines);
    }

    pub fn write_raw_metadata(&self, shard: usize, lines: &[String]) {
        let path = self
            .data_dir()
            .join("metadata")
            .join(format!("metadata_{}.jsonl.gz", shard));
        write_gz(&path, lines);
    }

    pub fn write_pdf_parses(&self, shard: usize, records: &[Value]) {
        let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        let path = self
            .data_dir()
            .join("pdf_parses")
            .join(format!("pdf_parses_{}.jsonl.gz", shard));
        write_gz(&path, &lines);
    }

    pub fn read_json(&self, name: &str) -> Value {
        let text = std::fs::read_to_string(self.save_dir().join(name))
            .unwrap_or_else(|e| panic!("read {}: {}", name, e));
        serde_json::from_str(&text).expect("valid json")
    }

    pub fn read_lines(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.save_dir().join(name))
            .unwrap_or_else(|e| panic!("read {}: {}", name, e))
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn write_gz(path: &Path, lines: &[String]) {
    std::fs::create_dir_all(path.parent().expect("shard parent")).expect("create shard dir");
    let file = File::create(path).expect("create shard");
    let mut encoder = GzEncoder::new(file, Compression::default());
    for line in lines {
        writeln!(encoder, "{}", line).expect("write line");
    }
    encoder.finish().expect("finish gzip");
}

/// A metadata record; `safe` controls the parsed-abstract flag
pub fn paper(id: &str, fields: &[&str], safe: bool, cites: &[&str]) -> Value {
    json!({
        "paper_id": id,
        "title": format!("Title {}", id),
        "mag_field_of_study": fields,
        "has_pdf_parse": true,
        "has_pdf_parsed_abstract": safe,
        "has_outbound_citations": !cites.is_empty(),
        "outbound_citations": cites,
    })
}

/// A metadata record that is also cited by `citers`
pub fn cited_paper(id: &str, fields: &[&str], cites: &[&str], citers: &[&str]) -> Value {
    let mut record = paper(id, fields, true, cites);
    record["has_inbound_citations"] = json!(!citers.is_empty());
    record["inbound_citations"] = json!(citers);
    record
}

pub fn pdf_parse(id: &str, abstract_text: &str) -> Value {
    json!({
        "paper_id": id,
        "abstract": [{"text": abstract_text}],
    })
}
