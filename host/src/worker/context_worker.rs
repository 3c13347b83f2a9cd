use std::{
    cmp,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, info, trace};

use hubqueue_shared::{Context, RunningFlag, Timestamp};

use crate::{HostContexts, HostError, WorkerConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drives `run_cycle` for a set of hosts once per heartbeat
pub struct ContextWorker<C: Context> {
    config: WorkerConfig,
    hosts: Vec<Arc<HostContexts<C>>>,
    running: RunningFlag,
}

impl<C: Context> ContextWorker<C> {
    pub fn new(config: WorkerConfig, running: RunningFlag) -> Self {
        Self {
            config,
            hosts: Vec::new(),
            running,
        }
    }

    /// The flag every added host must poll, see `HostContexts::with_running_flag`
    pub fn running(&self) -> &RunningFlag {
        &self.running
    }

    /// # Errors
    /// `HostError::ForeignRunningFlag` if the host's scans poll another flag,
    /// since stopping the worker could not interrupt them.
    pub fn add_host(&mut self, host: Arc<HostContexts<C>>) -> Result<(), HostError> {
        if !host.running().same_as(&self.running) {
            return Err(HostError::ForeignRunningFlag {
                hostname: host.hostname().to_string(),
            });
        }
        self.hosts.push(host);
        Ok(())
    }

    pub fn hosts(&self) -> &[Arc<HostContexts<C>>] {
        &self.hosts
    }

    /// One cycle over every host
    pub fn run_once(&self) {
        // shuffle order of hosts in order to avoid priority among them
        let mut hosts: Vec<&Arc<HostContexts<C>>> = self.hosts.iter().collect();
        fastrand::shuffle(&mut hosts);

        for host in hosts {
            if !self.running.is_running() {
                return;
            }
            let outcome = host.run_cycle(Timestamp::now_usec());
            trace!("host '{}' cycle: {:?}", host.hostname(), outcome);
        }
    }

    /// Moves the worker onto its own thread
    ///
    /// # Errors
    /// `HostError::WorkerSpawn` if the thread could not be created.
    pub fn spawn(self) -> Result<WorkerHandle, HostError> {
        let name = self.config.thread_name.clone();
        let running = self.running.clone();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .map_err(|source| HostError::WorkerSpawn {
                name: name.clone(),
                source,
            })?;

        Ok(WorkerHandle {
            name,
            running,
            thread,
        })
    }

    fn run(self) {
        info!(
            "context worker '{}' started for {} hosts",
            self.config.thread_name,
            self.hosts.len()
        );

        while self.running.is_running() {
            let started = Instant::now();
            self.run_once();
            self.sleep_until(started + self.config.heartbeat);
        }

        info!("context worker '{}' stopped", self.config.thread_name);
    }

    fn sleep_until(&self, deadline: Instant) {
        loop {
            if !self.running.is_running() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep(cmp::min(deadline - now, POLL_INTERVAL));
        }
    }
}

/// A running ContextWorker thread
pub struct WorkerHandle {
    name: String,
    running: RunningFlag,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Clears the running flag and waits for the thread to exit
    ///
    /// # Errors
    /// `HostError::WorkerPanicked` if the thread panicked.
    pub fn stop(self) -> Result<(), HostError> {
        debug!("stopping context worker '{}'", self.name);
        self.running.stop();
        self.thread
            .join()
            .map_err(|_| HostError::WorkerPanicked { name: self.name })
    }
}
