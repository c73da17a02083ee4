//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform traits
//! defined in `trellis-dom`. [`ThreadTaskRunner`] gives every document its
//! own worker thread, and [`StdDocumentFactory`] plugs it into a
//! [`trellis_dom::DomManagerRegistry`] together with an application supplied
//! render manager.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use trellis_dom::{
    DocumentConfig, DocumentFactory, DomError, LayoutService, RenderManager, RootId, Task,
    TaskRunner,
};

/// Task runner that executes tasks in FIFO order on one dedicated thread.
///
/// Tasks are never run inline by [`post_task`](TaskRunner::post_task), even
/// when posted from the worker thread itself. A panicking task is logged and
/// the worker moves on to the next one.
pub struct ThreadTaskRunner {
    name: String,
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl ThreadTaskRunner {
    /// Spawns the worker thread, named `name`.
    pub fn new(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Task>();
        let thread_name = name.clone();
        let worker = thread::Builder::new().name(name.clone()).spawn(move || {
            for task in receiver {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    log::error!("{thread_name}: task panicked");
                }
            }
            log::debug!("{thread_name}: worker stopped");
        })?;
        Ok(Self {
            name,
            worker_id: worker.thread().id(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the caller is running on this runner's worker thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    pub fn is_running(&self) -> bool {
        self.lock_sender().is_some()
    }

    /// Blocks until every task posted before this call has run.
    ///
    /// Returns `false` without waiting when called from the worker thread or
    /// after [`shutdown`](Self::shutdown).
    pub fn flush(&self) -> bool {
        if self.is_current() {
            log::warn!("{}: flush called from the worker thread", self.name);
            return false;
        }
        let (done, wait) = mpsc::sync_channel(1);
        let posted = match self.lock_sender().as_ref() {
            Some(sender) => sender
                .send(Box::new(move || {
                    let _ = done.send(());
                }))
                .is_ok(),
            None => false,
        };
        posted && wait.recv().is_ok()
    }

    /// Stops accepting tasks and waits for the queued ones to finish.
    ///
    /// Called from the worker thread it only closes the queue; the worker
    /// exits once the current task returns.
    pub fn shutdown(&self) {
        let sender = self.lock_sender().take();
        if sender.is_none() {
            return;
        }
        drop(sender);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match worker {
            Some(worker) if !self.is_current() => {
                if worker.join().is_err() {
                    log::error!("{}: worker thread panicked", self.name);
                }
            }
            _ => log::debug!("{}: shut down from its own worker", self.name),
        }
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<Sender<Task>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskRunner for ThreadTaskRunner {
    fn post_task(&self, task: Task) {
        let rejected = match self.lock_sender().as_ref() {
            Some(sender) => sender.send(task).err().map(|err| err.0),
            None => Some(task),
        };
        // Dropped outside the lock: a dropped task may post again.
        if let Some(task) = rejected {
            log::warn!("{}: runner stopped; task dropped", self.name);
            drop(task);
        }
    }
}

impl Drop for ThreadTaskRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadTaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTaskRunner")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

type RenderManagerFactory = dyn Fn(RootId) -> Box<dyn RenderManager> + Send + Sync;
type LayoutServiceFactory = dyn Fn(RootId) -> Box<dyn LayoutService> + Send + Sync;

/// [`DocumentFactory`] giving each document its own [`ThreadTaskRunner`].
pub struct StdDocumentFactory {
    render: Box<RenderManagerFactory>,
    layout: Option<Box<LayoutServiceFactory>>,
    config: DocumentConfig,
}

impl StdDocumentFactory {
    pub fn new(render: impl Fn(RootId) -> Box<dyn RenderManager> + Send + Sync + 'static) -> Self {
        Self {
            render: Box::new(render),
            layout: None,
            config: DocumentConfig::default(),
        }
    }

    pub fn with_layout(
        mut self,
        layout: impl Fn(RootId) -> Box<dyn LayoutService> + Send + Sync + 'static,
    ) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    pub fn with_config(mut self, config: DocumentConfig) -> Self {
        self.config = config;
        self
    }

    fn thread_name(root_id: RootId) -> String {
        format!("trellis-dom-{root_id}")
    }
}

impl DocumentFactory for StdDocumentFactory {
    fn create_runner(&self, root_id: RootId) -> Result<Arc<dyn TaskRunner>, DomError> {
        match ThreadTaskRunner::new(Self::thread_name(root_id)) {
            Ok(runner) => Ok(Arc::new(runner)),
            Err(err) => {
                log::error!("document {root_id}: failed to spawn runner: {err}");
                Err(DomError::RunnerUnavailable {
                    root_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn create_render_manager(&self, root_id: RootId) -> Box<dyn RenderManager> {
        (self.render)(root_id)
    }

    fn create_layout_service(&self, root_id: RootId) -> Option<Box<dyn LayoutService>> {
        self.layout.as_ref().map(|layout| layout(root_id))
    }

    fn config(&self, _root_id: RootId) -> DocumentConfig {
        self.config.clone()
    }
}

impl fmt::Debug for StdDocumentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdDocumentFactory")
            .field("layout", &self.layout.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use trellis_dom::{DocumentFactory, TaskRunner};
    use trellis_testing::NullRenderManager;

    use super::{StdDocumentFactory, ThreadTaskRunner};

    fn runner() -> Arc<ThreadTaskRunner> {
        Arc::new(ThreadTaskRunner::new("trellis-test").expect("spawn runner"))
    }

    #[test]
    fn tasks_run_in_post_order_off_the_caller_thread() {
        let runner = runner();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for index in 0..16 {
            let seen = Arc::clone(&seen);
            let worker = Arc::clone(&runner);
            runner.post_task(Box::new(move || {
                assert!(worker.is_current());
                seen.lock().unwrap().push(index);
            }));
        }
        assert!(!runner.is_current());
        assert!(runner.flush());
        assert_eq!(*seen.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn task_posted_from_worker_runs_after_current_task() {
        let runner = runner();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner_seen = Arc::clone(&seen);
        let inner_runner = Arc::clone(&runner);
        runner.post_task(Box::new(move || {
            let nested = Arc::clone(&inner_seen);
            inner_runner.post_task(Box::new(move || nested.lock().unwrap().push("nested")));
            inner_seen.lock().unwrap().push("outer");
        }));
        let (done, wait) = mpsc::channel();
        let done_runner = Arc::clone(&runner);
        runner.post_task(Box::new(move || {
            done_runner.post_task(Box::new(move || done.send(()).unwrap()));
        }));
        wait.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["outer", "nested"]);
    }

    #[test]
    fn panicking_task_does_not_stop_the_worker() {
        let runner = runner();
        runner.post_task(Box::new(|| panic!("task failure")));
        let (done, wait) = mpsc::channel();
        runner.post_task(Box::new(move || done.send(7).unwrap()));
        assert_eq!(wait.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    }

    #[test]
    fn shutdown_drains_queue_and_rejects_later_tasks() {
        let runner = runner();
        let count = Arc::new(Mutex::new(0));
        for _ in 0..4 {
            let count = Arc::clone(&count);
            runner.post_task(Box::new(move || *count.lock().unwrap() += 1));
        }
        runner.shutdown();
        assert!(!runner.is_running());
        assert_eq!(*count.lock().unwrap(), 4);

        let late = Arc::clone(&count);
        runner.post_task(Box::new(move || *late.lock().unwrap() += 1));
        assert!(!runner.flush());
        assert_eq!(*count.lock().unwrap(), 4);
    }

    #[test]
    fn flush_from_worker_returns_without_blocking() {
        let runner = runner();
        let (result, wait) = mpsc::channel();
        let worker = Arc::clone(&runner);
        runner.post_task(Box::new(move || result.send(worker.flush()).unwrap()));
        assert!(!wait.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn factory_names_runner_after_root() {
        let factory = StdDocumentFactory::new(|_| Box::new(NullRenderManager));
        let runner = factory.create_runner(7).expect("runner");
        let (name, wait) = mpsc::channel();
        runner.post_task(Box::new(move || {
            name.send(std::thread::current().name().map(str::to_owned))
                .unwrap();
        }));
        assert_eq!(
            wait.recv_timeout(Duration::from_secs(5)).unwrap().as_deref(),
            Some("trellis-dom-7")
        );
        assert!(factory.create_layout_service(7).is_none());
    }
}
