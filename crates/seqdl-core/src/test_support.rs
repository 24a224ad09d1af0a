//! Test doubles: a scripted transfer session/backend and a recording listener.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::listener::DownloadListener;
use crate::outcome::Outcome;
use crate::session::{
    DescriptorError, SessionError, SessionObserver, SessionSnapshot, SessionState,
    TransferBackend, TransferSession,
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Publish(SessionState, f32),
    SleepMs(u64),
}

struct ScriptShared {
    snapshot: Mutex<SessionSnapshot>,
    observers: Mutex<Vec<SessionObserver>>,
    stopped: AtomicBool,
}

impl ScriptShared {
    fn publish(&self, state: SessionState, completion: f32) {
        let snapshot = {
            let mut current = self.snapshot.lock().unwrap();
            *current = SessionSnapshot { state, completion };
            *current
        };
        for observer in self.observers.lock().unwrap().iter_mut() {
            observer(&snapshot);
        }
    }
}

/// Session that plays back a list of steps on its own thread once started.
/// Tests can also drive it directly with [`ScriptedSession::publish`].
pub(crate) struct ScriptedSession {
    shared: Arc<ScriptShared>,
    script: Mutex<Option<Vec<Step>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stops: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        Self::with_stop_counter(script, Arc::new(AtomicUsize::new(0)))
    }

    pub(crate) fn with_stop_counter(script: Vec<Step>, stops: Arc<AtomicUsize>) -> Self {
        Self {
            shared: Arc::new(ScriptShared {
                snapshot: Mutex::new(SessionSnapshot {
                    state: SessionState::Waiting,
                    completion: 0.0,
                }),
                observers: Mutex::new(Vec::new()),
                stopped: AtomicBool::new(false),
            }),
            script: Mutex::new(Some(script)),
            handle: Mutex::new(None),
            stops,
        }
    }

    pub(crate) fn publish(&self, state: SessionState, completion: f32) {
        self.shared.publish(state, completion);
    }
}

impl TransferSession for ScriptedSession {
    fn start(&self) {
        let Some(script) = self.script.lock().unwrap().take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || {
            for step in script {
                if shared.stopped.load(Ordering::SeqCst) {
                    return;
                }
                match step {
                    Step::Publish(state, completion) => shared.publish(state, completion),
                    Step::SleepMs(ms) => {
                        let mut left = ms;
                        while left > 0 && !shared.stopped.load(Ordering::SeqCst) {
                            let slice = left.min(5);
                            std::thread::sleep(Duration::from_millis(slice));
                            left -= slice;
                        }
                    }
                }
            }
        });
        *self.handle.lock().unwrap() = Some(handle);
    }

    fn state(&self) -> SessionState {
        self.shared.snapshot.lock().unwrap().state
    }

    fn completion(&self) -> f32 {
        self.shared.snapshot.lock().unwrap().completion
    }

    fn add_observer(&self, observer: SessionObserver) {
        self.shared.observers.lock().unwrap().push(observer);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.shared.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

/// Backend whose descriptors are plain text files. The text `corrupt` fails to
/// parse and `unreachable` fails session construction; anything else opens the
/// next queued script (or an empty one).
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    pub(crate) opened: AtomicUsize,
    pub(crate) stops: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub(crate) fn with_scripts(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }
}

impl TransferBackend for ScriptedBackend {
    type Descriptor = String;

    fn load_descriptor(&self, path: &Path) -> Result<String, DescriptorError> {
        if !path.exists() {
            return Err(DescriptorError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| DescriptorError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if text.trim() == "corrupt" {
            return Err(DescriptorError::Invalid {
                path: path.to_path_buf(),
                reason: "corrupt".to_string(),
            });
        }
        Ok(text)
    }

    fn open_session(
        &self,
        descriptor: String,
        _destination: &Path,
    ) -> Result<Box<dyn TransferSession>, SessionError> {
        if descriptor.trim() == "unreachable" {
            return Err(SessionError::Other("address resolution failed".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::new(ScriptedSession::with_stop_counter(
            script,
            Arc::clone(&self.stops),
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Start(String),
    Progress(String, u8),
    End(String, Outcome),
}

#[derive(Default)]
pub(crate) struct RecordingListener {
    calls: Mutex<Vec<Call>>,
}

impl RecordingListener {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn progress(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Progress(_, p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn ends(&self) -> Vec<(String, Outcome)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::End(s, o) => Some((s, o)),
                _ => None,
            })
            .collect()
    }
}

impl DownloadListener for RecordingListener {
    fn on_download_start(&self, source: &str) {
        self.calls.lock().unwrap().push(Call::Start(source.to_string()));
    }

    fn on_download_progress(&self, source: &str, progress: u8) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Progress(source.to_string(), progress));
    }

    fn on_download_end(&self, source: &str, outcome: Outcome) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::End(source.to_string(), outcome));
    }
}

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
