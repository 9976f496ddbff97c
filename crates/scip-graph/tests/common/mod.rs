//! Shared fixtures for integration tests.
//!
//! Indexes are built with the crate's own wire messages and encoded with
//! `prost`, so tests exercise the real decoder.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use prost::Message;
use scip_graph::scip::proto;
use scip_graph::scip::ROLE_DEFINITION;
use tempfile::TempDir;

/// SCIP `Kind.Class`.
pub const KIND_CLASS: i32 = 7;

/// Global symbol for `name` defined in `file`.
pub fn sym(file: &str, name: &str) -> String {
    format!("scip-typescript npm fixture 1.0.0 `{file}`/{name}#")
}

/// Builder for an encoded SCIP index.
#[derive(Default)]
pub struct IndexBuilder {
    documents: Vec<proto::Document>,
    external_symbols: Vec<proto::SymbolInformation>,
    tool: Option<(String, String)>,
}

/// One document under construction.
pub struct DocBuilder {
    doc: proto::Document,
    next_line: i32,
}

impl DocBuilder {
    fn new(path: &str) -> Self {
        Self {
            doc: proto::Document {
                relative_path: path.to_string(),
                language: "TypeScript".to_string(),
                ..Default::default()
            },
            next_line: 0,
        }
    }

    fn take_line(&mut self) -> i32 {
        let line = self.next_line;
        self.next_line += 1;
        line
    }

    /// Define a global class `name` in this document.
    pub fn defines(mut self, name: &str) -> Self {
        let symbol = sym(&self.doc.relative_path, name);
        self.define_raw(&symbol, name);
        self
    }

    /// Define an arbitrary symbol string.
    pub fn defines_raw(mut self, symbol: &str, display_name: &str) -> Self {
        self.define_raw(symbol, display_name);
        self
    }

    fn define_raw(&mut self, symbol: &str, display_name: &str) {
        let line = self.take_line();
        self.doc.occurrences.push(proto::Occurrence {
            range: vec![line, 0, 3],
            symbol: symbol.to_string(),
            symbol_roles: ROLE_DEFINITION,
        });
        self.doc.symbols.push(proto::SymbolInformation {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            kind: KIND_CLASS,
            documentation: vec![format!("class {display_name}")],
            ..Default::default()
        });
    }

    /// Reference `name` defined in `file`, on a new line.
    pub fn uses(mut self, file: &str, name: &str) -> Self {
        let line = self.take_line();
        self.reference_at(&sym(file, name), line);
        self
    }

    /// Reference an arbitrary symbol string on a given line.
    pub fn uses_raw_at(mut self, symbol: &str, line: i32) -> Self {
        self.reference_at(symbol, line);
        self
    }

    fn reference_at(&mut self, symbol: &str, line: i32) {
        self.doc.occurrences.push(proto::Occurrence {
            range: vec![line, 4, line, 9],
            symbol: symbol.to_string(),
            symbol_roles: 0,
        });
    }
}

impl IndexBuilder {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document configured by `build`.
    pub fn file(mut self, path: &str, build: impl FnOnce(DocBuilder) -> DocBuilder) -> Self {
        self.documents.push(build(DocBuilder::new(path)).doc);
        self
    }

    /// Record the producing tool.
    pub fn tool(mut self, name: &str, version: &str) -> Self {
        self.tool = Some((name.to_string(), version.to_string()));
        self
    }

    /// Add external symbol metadata.
    pub fn external(mut self, symbol: &str, display_name: &str) -> Self {
        self.external_symbols.push(proto::SymbolInformation {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            ..Default::default()
        });
        self
    }

    /// Encode to SCIP protobuf bytes.
    pub fn encode(self) -> Vec<u8> {
        let metadata = self.tool.map(|(name, version)| proto::Metadata {
            tool_info: Some(proto::ToolInfo {
                name,
                version,
                arguments: vec![],
            }),
            project_root: "file:///fixture".to_string(),
            ..Default::default()
        });
        proto::Index {
            metadata,
            documents: self.documents,
            external_symbols: self.external_symbols,
        }
        .encode_to_vec()
    }
}

/// A temporary project with an index file and a store location.
pub struct Project {
    pub dir: TempDir,
    pub index: PathBuf,
    pub db: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let index = dir.path().join("index.scip");
        let db = dir.path().join(".scip-graph").join("graph.db");
        Self { dir, index, db }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write an encoded index to the project's index file.
    pub fn write_index(&self, index: IndexBuilder) {
        std::fs::write(&self.index, index.encode()).expect("should write index");
    }

    /// Create a source file with a fixed modification time.
    pub fn touch(&self, relative: &str, secs_after_base: u64) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("should create parent dirs");
        }
        std::fs::write(&path, b"// source").expect("should write source file");
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs_after_base);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("should open source file")
            .set_modified(at)
            .expect("should set mtime");
    }

    /// Run `git` in the project root, panicking on failure.
    pub fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .status()
            .expect("should run git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Turn the project into a git repository with a committer configured.
    pub fn init_git(&self) {
        self.git(&["init", "-q"]);
        self.git(&["config", "user.email", "dev@example.com"]);
        self.git(&["config", "user.name", "Dev"]);
        self.git(&["config", "commit.gpgsign", "false"]);
    }
}
