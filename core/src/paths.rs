use std::path::{Path, PathBuf};

/// On-disk layout of one build's artifacts under a single root directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// The global sorted index, `token:doc_id,weight;...` per line.
    pub fn index(&self) -> PathBuf {
        self.root.join("index.txt")
    }

    /// Offset side index for the global index.
    pub fn index_offsets(&self) -> PathBuf {
        self.root.join("index_offsets.txt")
    }

    /// Document registry, three lines per document: path, url, title.
    pub fn registry(&self) -> PathBuf {
        self.root.join("registry.txt")
    }

    /// Offset side index for the registry.
    pub fn registry_offsets(&self) -> PathBuf {
        self.root.join("registry_offsets.txt")
    }

    /// Working directory for per-worker partial indices.
    pub fn partials(&self) -> PathBuf {
        self.root.join("partials")
    }
}
