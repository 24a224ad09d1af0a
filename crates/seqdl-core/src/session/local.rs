//! Local transfer backend: copies a payload file described by a TOML
//! descriptor into the destination directory in fixed-size chunks.
//!
//! Data goes to `<name>.part` and is renamed to `<name>` once complete (and
//! verified, when the descriptor carries a digest). A final file that already
//! matches the descriptor is reported as complete without copying.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use super::descriptor::TransferDescriptor;
use super::{
    DescriptorError, SessionError, SessionObserver, SessionSnapshot, SessionState,
    TransferBackend, TransferSession,
};
use crate::checksum;
use crate::config::SeqdlConfig;

/// Backend producing [`LocalSession`]s.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    chunk_size: usize,
    verify_checksums: bool,
}

impl LocalBackend {
    pub fn new(chunk_size: usize, verify_checksums: bool) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            verify_checksums,
        }
    }

    pub fn from_config(cfg: &SeqdlConfig) -> Self {
        Self::new(cfg.chunk_size, cfg.verify_checksums)
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::from_config(&SeqdlConfig::default())
    }
}

impl TransferBackend for LocalBackend {
    type Descriptor = TransferDescriptor;

    fn load_descriptor(&self, path: &Path) -> Result<TransferDescriptor, DescriptorError> {
        TransferDescriptor::load(path)
    }

    fn open_session(
        &self,
        descriptor: TransferDescriptor,
        destination: &Path,
    ) -> Result<Box<dyn TransferSession>, SessionError> {
        let payload = File::open(&descriptor.source).map_err(SessionError::Payload)?;
        let payload_len = payload.metadata().map_err(SessionError::Payload)?.len();
        let final_path = destination.join(&descriptor.name);
        let part_path = part_path(&final_path);
        let part = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part_path)
            .map_err(|source| SessionError::Storage {
                path: part_path.clone(),
                source,
            })?;
        let plan = CopyPlan {
            payload,
            part,
            part_path,
            final_path,
            expected_len: descriptor.length.unwrap_or(payload_len),
            sha256: descriptor.sha256.filter(|_| self.verify_checksums),
            chunk_size: self.chunk_size,
        };
        Ok(Box::new(LocalSession::new(plan)))
    }
}

/// Temp path for an in-progress file: `<final>.part`.
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

struct CopyPlan {
    payload: File,
    part: File,
    part_path: PathBuf,
    final_path: PathBuf,
    expected_len: u64,
    sha256: Option<String>,
    chunk_size: usize,
}

enum CopyEnd {
    Done,
    Stopped,
}

/// State shared between the session handle and its copy thread.
struct Shared {
    state: AtomicU8,
    completion_bits: AtomicU32,
    stop: AtomicBool,
    observers: Mutex<Vec<SessionObserver>>,
}

impl Shared {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: decode_state(self.state.load(Ordering::Acquire)),
            completion: f32::from_bits(self.completion_bits.load(Ordering::Acquire)),
        }
    }

    /// Store the new state and completion, then notify every observer.
    fn publish(&self, state: SessionState, completion: f32) {
        self.completion_bits
            .store(completion.to_bits(), Ordering::Release);
        self.state.store(encode_state(state), Ordering::Release);
        let snapshot = self.snapshot();
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter_mut() {
            observer(&snapshot);
        }
    }
}

fn encode_state(state: SessionState) -> u8 {
    match state {
        SessionState::Waiting => 0,
        SessionState::Validating => 1,
        SessionState::Running => 2,
        SessionState::Done => 3,
        SessionState::Error => 4,
    }
}

fn decode_state(raw: u8) -> SessionState {
    match raw {
        0 => SessionState::Waiting,
        1 => SessionState::Validating,
        2 => SessionState::Running,
        3 => SessionState::Done,
        _ => SessionState::Error,
    }
}

/// One local copy. The copy runs on its own thread between `start` and `stop`.
pub struct LocalSession {
    shared: Arc<Shared>,
    plan: Mutex<Option<CopyPlan>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LocalSession {
    fn new(plan: CopyPlan) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(encode_state(SessionState::Waiting)),
                completion_bits: AtomicU32::new(0f32.to_bits()),
                stop: AtomicBool::new(false),
                observers: Mutex::new(Vec::new()),
            }),
            plan: Mutex::new(Some(plan)),
            handle: Mutex::new(None),
        }
    }
}

impl TransferSession for LocalSession {
    fn start(&self) {
        let Some(plan) = self
            .plan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || run_copy(plan, &shared));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn state(&self) -> SessionState {
        self.shared.snapshot().state
    }

    fn completion(&self) -> f32 {
        self.shared.snapshot().completion
    }

    fn add_observer(&self, observer: SessionObserver) {
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("local copy thread panicked");
            }
        }
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_copy(plan: CopyPlan, shared: &Shared) {
    let final_path = plan.final_path.clone();
    shared.publish(SessionState::Validating, 0.0);
    match copy_payload(plan, shared) {
        Ok(CopyEnd::Done) => {
            tracing::debug!(path = %final_path.display(), "local copy complete");
            shared.publish(SessionState::Done, 100.0);
        }
        Ok(CopyEnd::Stopped) => {
            tracing::debug!(path = %final_path.display(), "local copy stopped");
        }
        Err(e) => {
            tracing::warn!(path = %final_path.display(), "local copy failed: {:#}", e);
            let completion = shared.snapshot().completion;
            shared.publish(SessionState::Error, completion);
        }
    }
}

fn percent(done: u64, total: u64) -> f32 {
    if total == 0 {
        return 100.0;
    }
    ((done as f64 * 100.0) / total as f64).min(100.0) as f32
}

fn already_complete(plan: &CopyPlan) -> Result<bool> {
    let Ok(meta) = fs::metadata(&plan.final_path) else {
        return Ok(false);
    };
    if !meta.is_file() || meta.len() != plan.expected_len {
        return Ok(false);
    }
    match &plan.sha256 {
        Some(expected) => checksum::verify_sha256(&plan.final_path, expected),
        None => Ok(true),
    }
}

fn copy_payload(mut plan: CopyPlan, shared: &Shared) -> Result<CopyEnd> {
    if already_complete(&plan)? {
        drop(plan.part);
        let _ = fs::remove_file(&plan.part_path);
        shared.publish(SessionState::Running, 100.0);
        return Ok(CopyEnd::Done);
    }

    let total = plan.expected_len;
    let mut done = 0u64;
    let mut buf = vec![0u8; plan.chunk_size];
    shared.publish(SessionState::Running, 0.0);
    loop {
        if shared.stop.load(Ordering::Acquire) {
            return Ok(CopyEnd::Stopped);
        }
        let n = plan.payload.read(&mut buf).context("read payload")?;
        if n == 0 {
            break;
        }
        plan.part
            .write_all(&buf[..n])
            .with_context(|| format!("write {}", plan.part_path.display()))?;
        done += n as u64;
        if done > total {
            anyhow::bail!("payload is larger than the described {} bytes", total);
        }
        shared.publish(SessionState::Running, percent(done, total));
    }
    if done != total {
        anyhow::bail!("payload has {} bytes, expected {}", done, total);
    }
    if total == 0 {
        shared.publish(SessionState::Running, 100.0);
    }

    plan.part.sync_all().context("sync part file")?;
    drop(plan.part);
    if let Some(expected) = &plan.sha256 {
        if !checksum::verify_sha256(&plan.part_path, expected)? {
            anyhow::bail!("sha256 mismatch: expected {}", expected);
        }
    }
    fs::rename(&plan.part_path, &plan.final_path).with_context(|| {
        format!(
            "rename {} -> {}",
            plan.part_path.display(),
            plan.final_path.display()
        )
    })?;
    Ok(CopyEnd::Done)
}
