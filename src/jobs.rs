//! Background job executor
//!
//! Cooperative, single-threaded executor for the shell's fire-and-forget
//! background commands (`command &`). Jobs are spawned detached: nothing is
//! joined back to the session that started them, and there is no
//! cancellation surface. The host drives execution with [`Executor::tick`]
//! (e.g. from requestAnimationFrame) or drains everything with
//! [`Executor::run`] in tests and non-UI contexts.
//!
//! All methods take `&self`: a running job may spawn further jobs through
//! the same executor, so state lives behind interior mutability and new
//! spawns are queued until the current tick integrates them.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::future::Future;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

/// Identifier of a spawned background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

struct Job {
    id: JobId,
    future: LocalBoxFuture<'static, ()>,
}

/// Shared state for waker to signal job readiness
struct WakerState {
    job_id: JobId,
    ready_set: Rc<RefCell<HashSet<JobId>>>,
}

/// The executor - polls jobs cooperatively, one tick at a time.
pub struct Executor {
    /// All live jobs, indexed by ID
    jobs: RefCell<BTreeMap<JobId, Job>>,

    /// Jobs that are ready to be polled (signaled by waker)
    ready: Rc<RefCell<HashSet<JobId>>>,

    /// Jobs spawned mid-tick, integrated at tick boundaries
    pending_spawn: RefCell<VecDeque<Job>>,

    /// Next job ID
    next_id: Cell<u64>,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            jobs: RefCell::new(BTreeMap::new()),
            ready: Rc::new(RefCell::new(HashSet::new())),
            pending_spawn: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
        }
    }

    /// Spawn a detached job, returns its ID.
    pub fn spawn<F>(&self, future: F) -> JobId
    where
        F: Future<Output = ()> + 'static,
    {
        let id = JobId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        self.pending_spawn.borrow_mut().push_back(Job {
            id,
            future: future.boxed_local(),
        });
        self.ready.borrow_mut().insert(id);
        id
    }

    /// Integrate pending spawns into the job map
    fn integrate_pending(&self) {
        loop {
            let job = self.pending_spawn.borrow_mut().pop_front();
            match job {
                Some(job) => {
                    self.jobs.borrow_mut().insert(job.id, job);
                }
                None => break,
            }
        }
    }

    /// Run one tick: poll every ready job once.
    ///
    /// Returns the number of jobs polled. Jobs that yield without waking
    /// stay parked until their waker fires.
    pub fn tick(&self) -> usize {
        self.integrate_pending();

        let mut ready_ids: Vec<JobId> = self.ready.borrow().iter().copied().collect();
        ready_ids.sort();

        let mut polled = 0;

        for job_id in ready_ids {
            self.ready.borrow_mut().remove(&job_id);

            // Take the job out so its future can be polled without holding
            // the map borrow (the job itself may spawn more jobs).
            let Some(mut job) = self.jobs.borrow_mut().remove(&job_id) else {
                continue;
            };

            let waker = self.create_waker(job_id);
            let mut cx = Context::from_waker(&waker);

            match job.future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => {
                    polled += 1;
                }
                Poll::Pending => {
                    self.jobs.borrow_mut().insert(job_id, job);
                    polled += 1;
                }
            }
        }

        self.integrate_pending();
        polled
    }

    /// Run until all jobs complete (tests, non-UI contexts).
    pub fn run(&self) {
        loop {
            self.integrate_pending();
            if self.jobs.borrow().is_empty() && self.pending_spawn.borrow().is_empty() {
                break;
            }

            // If nothing is ready, mark everything ready (prevents deadlock
            // for jobs that yield without arranging a wake).
            if self.ready.borrow().is_empty() {
                let ids: Vec<JobId> = self.jobs.borrow().keys().copied().collect();
                let mut ready = self.ready.borrow_mut();
                for id in ids {
                    ready.insert(id);
                }
            }

            self.tick();
        }
    }

    /// Check if there are any live jobs
    pub fn has_jobs(&self) -> bool {
        !self.jobs.borrow().is_empty() || !self.pending_spawn.borrow().is_empty()
    }

    /// Number of live jobs
    pub fn job_count(&self) -> usize {
        self.jobs.borrow().len() + self.pending_spawn.borrow().len()
    }

    /// Create a waker that marks a job as ready
    fn create_waker(&self, job_id: JobId) -> Waker {
        let state = Box::new(WakerState {
            job_id,
            ready_set: self.ready.clone(),
        });
        let ptr = Box::into_raw(state) as *const ();
        let raw = RawWaker::new(ptr, &WAKER_VTABLE);
        unsafe { Waker::from_raw(raw) }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

// Waker implementation that signals job readiness through the shared set

const WAKER_VTABLE: RawWakerVTable =
    RawWakerVTable::new(waker_clone, waker_wake, waker_wake_by_ref, waker_drop);

unsafe fn waker_clone(ptr: *const ()) -> RawWaker {
    unsafe {
        let state = &*(ptr as *const WakerState);
        let cloned = Box::new(WakerState {
            job_id: state.job_id,
            ready_set: state.ready_set.clone(),
        });
        RawWaker::new(Box::into_raw(cloned) as *const (), &WAKER_VTABLE)
    }
}

unsafe fn waker_wake(ptr: *const ()) {
    unsafe {
        let state = Box::from_raw(ptr as *mut WakerState);
        state.ready_set.borrow_mut().insert(state.job_id);
        // Box is dropped here
    }
}

unsafe fn waker_wake_by_ref(ptr: *const ()) {
    unsafe {
        let state = &*(ptr as *const WakerState);
        state.ready_set.borrow_mut().insert(state.job_id);
    }
}

unsafe fn waker_drop(ptr: *const ()) {
    unsafe {
        drop(Box::from_raw(ptr as *mut WakerState));
    }
}
