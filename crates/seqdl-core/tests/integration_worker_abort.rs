//! Integration test: worker, suspension gate and completion waiter together,
//! over a backend defined outside the crate.
//!
//! Descriptor files contain either `hang` (a session that runs until stopped)
//! or `quick` (a session that is done as soon as it starts).

mod common;

use common::recorder::Recorder;
use seqdl_core::downloader::Downloader;
use seqdl_core::session::{
    DescriptorError, SessionError, SessionObserver, SessionSnapshot, SessionState,
    TransferBackend, TransferSession,
};
use seqdl_core::worker::{WorkerHandle, WorkerState};
use seqdl_core::{Job, Outcome};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct InlineSession {
    hang: bool,
    snapshot: Mutex<SessionSnapshot>,
    observers: Mutex<Vec<SessionObserver>>,
    stops: Arc<AtomicUsize>,
}

impl InlineSession {
    fn publish(&self, state: SessionState, completion: f32) {
        let snapshot = SessionSnapshot { state, completion };
        *self.snapshot.lock().unwrap() = snapshot;
        for observer in self.observers.lock().unwrap().iter_mut() {
            observer(&snapshot);
        }
    }
}

impl TransferSession for InlineSession {
    fn start(&self) {
        if self.hang {
            self.publish(SessionState::Running, 10.0);
        } else {
            self.publish(SessionState::Done, 100.0);
        }
    }

    fn state(&self) -> SessionState {
        self.snapshot.lock().unwrap().state
    }

    fn completion(&self) -> f32 {
        self.snapshot.lock().unwrap().completion
    }

    fn add_observer(&self, observer: SessionObserver) {
        self.observers.lock().unwrap().push(observer);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct InlineBackend {
    stops: Arc<AtomicUsize>,
}

impl TransferBackend for InlineBackend {
    type Descriptor = bool;

    fn load_descriptor(&self, path: &Path) -> Result<bool, DescriptorError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text.trim() == "hang"),
            Err(_) => Err(DescriptorError::NotFound(path.to_path_buf())),
        }
    }

    fn open_session(
        &self,
        hang: bool,
        _destination: &Path,
    ) -> Result<Box<dyn TransferSession>, SessionError> {
        Ok(Box::new(InlineSession {
            hang,
            snapshot: Mutex::new(SessionSnapshot {
                state: SessionState::Waiting,
                completion: 0.0,
            }),
            observers: Mutex::new(Vec::new()),
            stops: Arc::clone(&self.stops),
        }))
    }
}

struct Rig {
    dir: TempDir,
    recorder: Arc<Recorder>,
    worker: WorkerHandle<Downloader<InlineBackend>>,
}

impl Rig {
    fn new(timeout_ms: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new();
        let downloader = Downloader::new(InlineBackend::default());
        downloader.set_listener(Some(recorder.clone()));
        downloader.set_timeout_ms(timeout_ms);
        Self {
            dir,
            recorder,
            worker: WorkerHandle::spawn(Arc::new(downloader)).unwrap(),
        }
    }

    /// A job whose descriptor is named `name` and contains `kind`.
    fn job(&self, name: &str, kind: &str) -> Job {
        let path = self.dir.path().join(name);
        fs::write(&path, kind).unwrap();
        Job::new(path.to_string_lossy(), self.dir.path().to_string_lossy()).unwrap()
    }

    fn wait_until_running(&self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.worker.state() != WorkerState::ProcessingJob {
            assert!(Instant::now() < deadline, "job never started");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn stops(&self) -> usize {
        self.worker.runner().backend().stops.load(Ordering::SeqCst)
    }
}

fn names(ends: Vec<(String, Outcome)>) -> Vec<(String, Outcome)> {
    ends.into_iter()
        .map(|(source, outcome)| {
            let name = Path::new(&source)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned();
            (name, outcome)
        })
        .collect()
}

#[test]
fn abort_cancels_running_and_queued_jobs_but_not_later_ones() {
    let rig = Rig::new(0);
    rig.worker.submit(rig.job("a", "hang")).unwrap();
    rig.wait_until_running();
    rig.worker.submit(rig.job("b", "quick")).unwrap();
    rig.worker.abort().unwrap();
    rig.worker.submit(rig.job("c", "quick")).unwrap();

    let ends = names(rig.recorder.wait_for_ends(2));
    assert_eq!(
        ends,
        vec![
            ("a".to_string(), Outcome::Aborted),
            ("c".to_string(), Outcome::Completed),
        ]
    );
    assert_eq!(rig.stops(), 2);
    assert_eq!(rig.worker.pending_aborts(), 0);
    assert!(rig.worker.is_enabled());
}

#[test]
fn stalled_session_times_out_and_the_next_job_runs() {
    let rig = Rig::new(150);
    let begin = Instant::now();
    rig.worker.submit(rig.job("stuck", "hang")).unwrap();
    rig.worker.submit(rig.job("next", "quick")).unwrap();

    let ends = names(rig.recorder.wait_for_ends(2));
    assert!(begin.elapsed() >= Duration::from_millis(150));
    assert_eq!(
        ends,
        vec![
            ("stuck".to_string(), Outcome::TimedOut),
            ("next".to_string(), Outcome::Completed),
        ]
    );
}

#[test]
fn repeated_aborts_while_idle_leave_the_worker_usable() {
    let rig = Rig::new(0);
    for _ in 0..5 {
        rig.worker.abort().unwrap();
    }
    rig.worker.submit(rig.job("after", "quick")).unwrap();
    let ends = names(rig.recorder.wait_for_ends(1));
    assert_eq!(ends, vec![("after".to_string(), Outcome::Completed)]);
    assert_eq!(rig.worker.pending_aborts(), 0);
}

#[test]
fn shutdown_ends_the_running_job_as_aborted() {
    let rig = Rig::new(0);
    rig.worker.submit(rig.job("long", "hang")).unwrap();
    rig.wait_until_running();
    rig.worker.submit(rig.job("never", "quick")).unwrap();

    rig.worker.shutdown();
    let ends = names(rig.recorder.ends());
    assert_eq!(ends, vec![("long".to_string(), Outcome::Aborted)]);
    assert!(rig.worker.submit(rig.job("late", "quick")).is_err());
}
