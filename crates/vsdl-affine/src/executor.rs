//! Affine executor implementation.
//!
//! One worker thread, one unbounded command queue:
//! - `submit` sends a command plus a single-slot reply channel and waits
//! - `submit_async` sends a command and returns immediately
//! - `shutdown` queues a close marker behind everything already submitted
//!
//! A panic inside a command aborts the worker. The state is leaked rather than
//! dropped, since native teardown on top of a trapped call is not safe.

use crate::error::ExecError;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

/// Severity of a message passed to the report hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Fatal,
}

/// Diagnostic hook. Called from the worker thread.
pub type ReportHook = Arc<dyn Fn(Severity, &str) + Send + Sync>;

type Job<S> = Box<dyn FnOnce(&mut S) -> Flow + Send>;

enum Command<S> {
    Run(Job<S>),
    Close,
}

/// What the worker does after a job.
enum Flow {
    Continue,
    Abort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Lifecycle {
    Running,
    Closing,
    Closed,
    Failed(String),
}

/// State shared by submitters and the worker.
struct Shared {
    lifecycle: Mutex<Lifecycle>,
    report: ReportHook,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lock().clone()
    }

    fn set(&self, next: Lifecycle) {
        let mut lifecycle = self.lock();
        if !matches!(*lifecycle, Lifecycle::Failed(_)) {
            *lifecycle = next;
        }
    }

    fn begin_close(&self) {
        let mut lifecycle = self.lock();
        if *lifecycle == Lifecycle::Running {
            *lifecycle = Lifecycle::Closing;
        }
    }

    fn fail(&self, reason: String) {
        self.report(Severity::Fatal, &reason);
        *self.lock() = Lifecycle::Failed(reason);
    }

    /// Error for a submitter whose command will never run.
    fn refusal<E>(&self) -> ExecError<E> {
        match self.lifecycle() {
            Lifecycle::Failed(reason) => ExecError::Fatal(reason),
            _ => ExecError::Closed,
        }
    }

    fn report(&self, severity: Severity, message: &str) {
        (self.report)(severity, message);
    }
}

fn log_report(name: String) -> ReportHook {
    Arc::new(move |severity, message| match severity {
        Severity::Debug => debug!("[{}] {}", name, message),
        Severity::Info => info!("[{}] {}", name, message),
        Severity::Warn => warn!("[{}] {}", name, message),
        Severity::Fatal => error!("[{}] FATAL: {}", name, message),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "command panicked".to_string()
    }
}

/// Configures and spawns an [`AffineExecutor`].
pub struct Builder {
    name: String,
    report: Option<ReportHook>,
}

impl Builder {
    /// The name is used for the worker thread and in diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            report: None,
        }
    }

    /// Route worker diagnostics to `hook` instead of the `log` facade.
    pub fn on_report<F>(mut self, hook: F) -> Self
    where
        F: Fn(Severity, &str) + Send + Sync + 'static,
    {
        self.report = Some(Arc::new(hook));
        self
    }

    /// Spawn the worker thread. `init` runs on it and builds the state, so
    /// the state never has to cross threads.
    pub fn spawn<S, E, F>(self, init: F) -> std::io::Result<AffineExecutor<S, E>>
    where
        S: 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        let report = match self.report {
            Some(report) => report,
            None => log_report(self.name.clone()),
        };
        let shared = Arc::new(Shared {
            lifecycle: Mutex::new(Lifecycle::Running),
            report,
        });
        let (commands, queue) = crossbeam_channel::unbounded::<Command<S>>();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run_worker(init, queue, worker_shared))?;

        Ok(AffineExecutor {
            name: self.name,
            commands,
            shared,
            thread_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
            _error: PhantomData,
        })
    }
}

fn run_worker<S, F>(init: F, queue: Receiver<Command<S>>, shared: Arc<Shared>)
where
    F: FnOnce() -> S,
{
    let mut state = match panic::catch_unwind(AssertUnwindSafe(init)) {
        Ok(state) => state,
        Err(payload) => {
            shared.fail(format!("initialization panicked: {}", panic_message(&*payload)));
            return;
        }
    };
    shared.report(Severity::Debug, "worker started");

    while let Ok(command) = queue.recv() {
        match command {
            Command::Run(job) => {
                if let Flow::Abort = job(&mut state) {
                    // Queued commands are discarded with the receiver; their
                    // submitters observe the failure.
                    drop(queue);
                    std::mem::forget(state);
                    return;
                }
            }
            Command::Close => break,
        }
    }

    drop(queue);
    drop(state);
    shared.set(Lifecycle::Closed);
    shared.report(Severity::Debug, "worker stopped");
}

/// Serializes commands onto one dedicated OS thread that owns state `S`.
///
/// `S` may be `!Send`: it is built by the init closure on the worker and is
/// only ever reached through submitted commands. `E` is the error type of
/// those commands.
pub struct AffineExecutor<S: 'static, E> {
    name: String,
    commands: Sender<Command<S>>,
    shared: Arc<Shared>,
    thread_id: ThreadId,
    worker: Mutex<Option<JoinHandle<()>>>,
    _error: PhantomData<fn() -> E>,
}

impl<S: 'static, E: Send + 'static> AffineExecutor<S, E> {
    /// Run `op` on the worker and wait for its result.
    ///
    /// Side effects of every command submitted earlier are visible to `op`.
    pub fn submit<T, F>(&self, op: F) -> Result<T, ExecError<E>>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> Result<T, E> + Send + 'static,
    {
        if self.on_worker() {
            return Err(ExecError::WorkerThread);
        }

        let (reply, response) = crossbeam_channel::bounded(1);
        let shared = Arc::clone(&self.shared);
        self.enqueue(Box::new(move |state: &mut S| {
            match panic::catch_unwind(AssertUnwindSafe(|| op(state))) {
                Ok(result) => {
                    let _ = reply.send(result.map_err(ExecError::Operation));
                    Flow::Continue
                }
                Err(payload) => {
                    let reason = panic_message(&*payload);
                    shared.fail(reason.clone());
                    let _ = reply.send(Err(ExecError::Fatal(reason)));
                    Flow::Abort
                }
            }
        }))?;

        // A dropped reply means the command was discarded unrun.
        response
            .recv()
            .unwrap_or_else(|_| Err(self.shared.refusal()))
    }

    /// Queue `op` without waiting. Its failure is reported, never returned;
    /// an error here only means the executor no longer accepts commands.
    pub fn submit_async<F>(&self, op: F) -> Result<(), ExecError<E>>
    where
        E: fmt::Display,
        F: FnOnce(&mut S) -> Result<(), E> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.enqueue(Box::new(move |state: &mut S| {
            match panic::catch_unwind(AssertUnwindSafe(|| op(state))) {
                Ok(Ok(())) => Flow::Continue,
                Ok(Err(err)) => {
                    shared.report(
                        Severity::Warn,
                        &format!("fire-and-forget command failed: {}", err),
                    );
                    Flow::Continue
                }
                Err(payload) => {
                    shared.fail(panic_message(&*payload));
                    Flow::Abort
                }
            }
        }))
    }

    fn enqueue(&self, job: Job<S>) -> Result<(), ExecError<E>> {
        if self.shared.lifecycle() != Lifecycle::Running {
            return Err(self.shared.refusal());
        }
        self.commands
            .send(Command::Run(job))
            .map_err(|_| self.shared.refusal())
    }
}

impl AffineExecutor<(), ()> {
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder::new(name)
    }
}

impl<S: 'static, E> AffineExecutor<S, E> {
    /// Close the queue behind all submitted commands, wait for the worker to
    /// drop its state and exit. Safe to call more than once.
    pub fn shutdown(&self) -> Result<(), ExecError<E>> {
        if self.on_worker() {
            return Err(ExecError::WorkerThread);
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = worker.take() {
            self.shared.begin_close();
            let _ = self.commands.send(Command::Close);
            if handle.join().is_err() {
                self.shared.fail("worker panicked during teardown".to_string());
            }
            self.shared.report(Severity::Info, "shut down");
        }
        drop(worker);

        match self.shared.lifecycle() {
            Lifecycle::Failed(reason) => Err(ExecError::Fatal(reason)),
            _ => Ok(()),
        }
    }

    /// True until shutdown starts or the worker aborts.
    pub fn is_running(&self) -> bool {
        self.shared.lifecycle() == Lifecycle::Running
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl<S: 'static, E> Drop for AffineExecutor<S, E> {
    fn drop(&mut self) {
        if self.on_worker() {
            // Cannot join ourselves; let the loop wind down on its own.
            self.shared.begin_close();
            let _ = self.commands.send(Command::Close);
            return;
        }
        let _ = self.shutdown();
    }
}

impl<S: 'static, E> fmt::Debug for AffineExecutor<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffineExecutor")
            .field("name", &self.name)
            .field("lifecycle", &self.shared.lifecycle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Exec = AffineExecutor<Vec<u32>, String>;

    fn spawn_log(name: &str) -> Exec {
        AffineExecutor::builder(name).spawn(Vec::new).unwrap()
    }

    #[test]
    fn test_blocking_submit_returns_its_result() {
        let exec = spawn_log("test-blocking");
        let len = exec
            .submit(|log| {
                log.push(7);
                Ok(log.len())
            })
            .unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn test_mixed_commands_run_in_submission_order() {
        let exec = spawn_log("test-order");
        for i in 0..200u32 {
            if i % 3 == 0 {
                exec.submit(move |log| {
                    log.push(i);
                    Ok(())
                })
                .unwrap();
            } else {
                exec.submit_async(move |log| {
                    log.push(i);
                    Ok(())
                })
                .unwrap();
            }
        }

        let log = exec.submit(|log| Ok(log.clone())).unwrap();
        assert_eq!(log, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_submitters_get_their_own_results() {
        let exec = Arc::new(spawn_log("test-concurrent"));

        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let exec = Arc::clone(&exec);
                thread::spawn(move || {
                    for n in 0..50u32 {
                        let id = t * 1000 + n;
                        if n % 2 == 0 {
                            exec.submit_async(move |log| {
                                log.push(id);
                                Ok(())
                            })
                            .unwrap();
                        } else {
                            let echoed = exec
                                .submit(move |log| {
                                    log.push(id);
                                    Ok(id)
                                })
                                .unwrap();
                            assert_eq!(echoed, id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = exec.submit(|log| Ok(log.clone())).unwrap();
        assert_eq!(log.len(), 400);
        for t in 0..8u32 {
            let mine: Vec<u32> = log.iter().copied().filter(|id| id / 1000 == t).collect();
            let expected: Vec<u32> = (0..50).map(|n| t * 1000 + n).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn test_operation_error_only_reaches_its_submitter() {
        let exec = spawn_log("test-error");
        let err = exec
            .submit(|_| Err::<(), _>("boom".to_string()))
            .unwrap_err();
        assert!(matches!(err, ExecError::Operation(ref m) if m == "boom"));
        assert!(!err.is_fatal());

        let len = exec
            .submit(|log| {
                log.push(1);
                Ok(log.len())
            })
            .unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn test_async_failure_is_reported_not_returned() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let exec: Exec = Builder::new("test-report")
            .on_report(move |severity, message| {
                sink.lock().unwrap().push((severity, message.to_string()));
            })
            .spawn(Vec::new)
            .unwrap();

        assert!(exec.submit_async(|_| Err("lost frame".to_string())).is_ok());
        exec.submit(|_| Ok(())).unwrap();

        let reports = reports.lock().unwrap();
        assert!(
            reports
                .iter()
                .any(|(severity, message)| *severity == Severity::Warn
                    && message.contains("lost frame"))
        );
    }

    #[test]
    fn test_panic_is_fatal_for_every_waiter() {
        let exec = Arc::new(spawn_log("test-panic"));
        let (gate, gated) = crossbeam_channel::bounded::<()>(0);

        exec.submit_async(move |_| {
            let _ = gated.recv();
            Ok(())
        })
        .unwrap();
        exec.submit_async(|_| -> Result<(), String> { panic!("native trap") })
            .unwrap();

        let waiter = {
            let exec = Arc::clone(&exec);
            thread::spawn(move || exec.submit(|log| Ok(log.len())))
        };
        thread::sleep(Duration::from_millis(50));
        gate.send(()).unwrap();

        let queued = waiter.join().unwrap();
        assert!(matches!(queued, Err(ExecError::Fatal(ref r)) if r.contains("native trap")));

        let later = exec.submit(|log| Ok(log.len()));
        assert!(matches!(later, Err(ExecError::Fatal(_))));
        assert!(exec.submit_async(|_| Ok(())).unwrap_err().is_fatal());
        assert!(!exec.is_running());
        assert!(exec.shutdown().unwrap_err().is_fatal());
    }

    #[test]
    fn test_init_panic_is_fatal() {
        let exec: Exec = Builder::new("test-init")
            .spawn(|| -> Vec<u32> { panic!("no display") })
            .unwrap();
        let err = exec.submit(|log| Ok(log.len())).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("no display"));
    }

    struct Tracked {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log
                .lock()
                .unwrap()
                .push(format!("drop on {:?}", thread::current().name()));
        }
    }

    #[test]
    fn test_state_lives_and_dies_on_the_worker() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state_log = Arc::clone(&log);
        let exec: AffineExecutor<Tracked, String> = Builder::new("test-worker")
            .spawn(move || {
                state_log
                    .lock()
                    .unwrap()
                    .push(format!("init on {:?}", thread::current().name()));
                Tracked { log: state_log }
            })
            .unwrap();

        let seen = exec.submit(|_| Ok(thread::current().id())).unwrap();
        assert_eq!(seen, exec.thread_id());
        assert_ne!(seen, thread::current().id());

        exec.submit_async(|tracked| {
            tracked.log.lock().unwrap().push("last command".to_string());
            Ok(())
        })
        .unwrap();
        exec.shutdown().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "init on Some(\"test-worker\")",
                "last command",
                "drop on Some(\"test-worker\")",
            ]
        );
        assert!(matches!(exec.submit(|_| Ok(())), Err(ExecError::Closed)));
    }

    #[test]
    fn test_shutdown_runs_queued_commands_first() {
        let exec = spawn_log("test-shutdown");
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            exec.submit_async(move |_| {
                thread::sleep(Duration::from_millis(2));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }

        exec.shutdown().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert!(!exec.is_running());
        assert!(exec.shutdown().is_ok());
    }

    #[test]
    fn test_blocking_submit_from_worker_is_rejected() {
        let exec = Arc::new(spawn_log("test-reentrant"));
        let inner = Arc::clone(&exec);
        let nested = exec
            .submit(move |_| Ok(inner.submit(|_| Ok(())).is_err()))
            .unwrap();
        assert!(nested);
    }
}
