//! Payload files and their descriptors in a scratch directory.

use seqdl_core::session::descriptor::TransferDescriptor;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch area with a `sources/` directory for payloads and descriptors and
/// an empty `dest/` directory to download into.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir(root.path().join("sources")).unwrap();
        fs::create_dir(root.path().join("dest")).unwrap();
        Self { root }
    }

    pub fn dest(&self) -> PathBuf {
        self.root.path().join("dest")
    }

    pub fn dest_str(&self) -> String {
        self.dest().to_string_lossy().into_owned()
    }

    /// Write `body` as a payload and a matching descriptor named `<name>.toml`.
    /// Returns the descriptor path as a locator string.
    pub fn add_payload(&self, name: &str, body: &[u8]) -> String {
        let payload = self.root.path().join("sources").join(format!("{name}.bin"));
        fs::write(&payload, body).unwrap();
        let descriptor = TransferDescriptor::describe(&payload, Some(name)).unwrap();
        self.write_descriptor(name, &descriptor.to_toml_string().unwrap())
    }

    pub fn write_descriptor(&self, name: &str, text: &str) -> String {
        let path = self.root.path().join("sources").join(format!("{name}.toml"));
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    pub fn read_dest(&self, name: &str) -> Option<Vec<u8>> {
        fs::read(self.dest().join(name)).ok()
    }

    pub fn dest_has(&self, name: &str) -> bool {
        self.dest().join(name).exists()
    }
}

/// Deterministic, non-repeating-looking body of `len` bytes.
pub fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
