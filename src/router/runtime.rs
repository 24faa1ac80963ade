//! Channel-based runtime enforcing owner-thread isolation.
//!
//! A single owner thread executes every command strictly sequentially; the
//! Hot Cache, Dirty Tracker, and History Cache never leave it. The
//! presentation side holds only channel endpoints: a bounded command queue
//! (backpressure via `try_send`) and an event receiver for unsolicited
//! progress messages. This boundary is what prevents read-modify-write races
//! between simulation and rendering, and it holds even though shared-memory
//! access would be possible in-process.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, warn};

use crate::error::{LeagueError, ProtocolError};
use crate::sim::GameSimulator;
use crate::storage::StoreHandles;

use super::handlers::{LeagueService, ServiceConfig};
use super::{Command, CorrelationId, Event, Request, Response, ResponseBody};

/// Runtime configuration.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Maximum queued commands before `submit` reports backpressure.
    pub queue_capacity: usize,
    /// Event channel capacity; overflowing progress events are dropped.
    pub event_capacity: usize,
    /// Games per simulation batch.
    pub sim_batch_size: usize,
    /// History Cache capacity.
    pub history_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            event_capacity: 256,
            sim_batch_size: 4,
            history_capacity: crate::cache::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

enum Job {
    Request {
        request: Request,
        reply: Sender<Response>,
    },
}

/// Handle returned by [`LeagueRuntime::submit`].
#[derive(Debug)]
pub struct PendingResponse {
    correlation_id: CorrelationId,
    rx: Receiver<Response>,
}

impl PendingResponse {
    /// The correlation id the response will carry.
    #[must_use]
    pub const fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Wait for the response.
    pub fn join(self) -> Result<Response, ProtocolError> {
        self.rx.recv().map_err(|_| ProtocolError::Disconnected)
    }

    /// Wait for the response with a timeout.
    pub fn join_timeout(self, timeout: Duration) -> Result<Option<Response>, ProtocolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Ok(None),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(ProtocolError::Disconnected)
            }
        }
    }
}

/// The running league engine: one owner thread plus its channel endpoints.
pub struct LeagueRuntime {
    tx: Option<Sender<Job>>,
    events: Receiver<Event>,
    worker: Option<JoinHandle<()>>,
    queue_capacity: usize,
}

impl LeagueRuntime {
    /// Spawn the owner thread over the given store backend and simulator.
    #[must_use]
    pub fn start(stores: StoreHandles, sim: Box<dyn GameSimulator>, config: RuntimeConfig) -> Self {
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);
        let (event_tx, event_rx) = bounded::<Event>(config.event_capacity.max(1));

        let service_config = ServiceConfig {
            sim_batch_size: config.sim_batch_size,
            history_capacity: config.history_capacity,
        };

        let worker = thread::Builder::new()
            .name("gridiron-owner".to_string())
            .spawn(move || {
                let mut service = LeagueService::new(stores, sim, service_config);

                while let Ok(Job::Request { request, reply }) = rx.recv() {
                    let correlation_id = request.correlation_id;
                    let mut emit = |event: Event| {
                        // Progress is advisory; a slow consumer loses events,
                        // never blocks the owner thread.
                        let _ = event_tx.try_send(event);
                    };

                    let body = match service.handle(request.command, &mut emit) {
                        Ok(body) => body,
                        Err(e) => {
                            warn!("command {correlation_id} failed: {e}");
                            ResponseBody::Error {
                                kind: e.kind().to_string(),
                                message: e.to_string(),
                            }
                        }
                    };

                    if reply
                        .send(Response {
                            correlation_id,
                            body,
                        })
                        .is_err()
                    {
                        debug!("response {correlation_id} dropped: requester gone");
                    }
                }
            })
            .expect("failed to spawn gridiron owner thread");

        Self {
            tx: Some(tx),
            events: event_rx,
            worker: Some(worker),
            queue_capacity,
        }
    }

    /// Submit a command without waiting for its response.
    ///
    /// # Errors
    /// [`ProtocolError::QueueFull`] under backpressure,
    /// [`ProtocolError::Disconnected`] after shutdown.
    pub fn submit(&self, command: Command) -> Result<PendingResponse, LeagueError> {
        let tx = self.tx.as_ref().ok_or(ProtocolError::Disconnected)?;

        let request = Request::new(command);
        let correlation_id = request.correlation_id;
        let (reply_tx, reply_rx) = bounded::<Response>(1);

        match tx.try_send(Job::Request {
            request,
            reply: reply_tx,
        }) {
            Ok(()) => Ok(PendingResponse {
                correlation_id,
                rx: reply_rx,
            }),
            Err(TrySendError::Full(_)) => Err(ProtocolError::QueueFull {
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ProtocolError::Disconnected.into()),
        }
    }

    /// Submit a command and wait for its response.
    pub fn request(&self, command: Command) -> Result<Response, LeagueError> {
        Ok(self.submit(command)?.join()?)
    }

    /// The unsolicited-event stream (simulation progress).
    #[must_use]
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Drain one pending event, if any.
    #[must_use]
    pub fn try_next_event(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }
}

impl Drop for LeagueRuntime {
    fn drop(&mut self) {
        // Deterministic shutdown: close the queue, let the worker drain
        // what's left, and join it.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{LeagueOptions, TeamDef};
    use crate::sim::RatingSimulator;
    use crate::storage::InMemoryStores;

    fn defs(n: usize) -> Vec<TeamDef> {
        (0..n)
            .map(|i| TeamDef {
                name: format!("City {i}"),
                abbr: format!("C{i}"),
                conference: "East".to_string(),
                division: "North".to_string(),
            })
            .collect()
    }

    fn runtime() -> LeagueRuntime {
        LeagueRuntime::start(
            InMemoryStores::handles(),
            Box::new(RatingSimulator),
            RuntimeConfig::default(),
        )
    }

    #[test]
    fn responses_echo_the_correlation_id() {
        let runtime = runtime();

        let pending = runtime.submit(Command::Init).unwrap();
        let id = pending.correlation_id();
        let response = pending.join().unwrap();

        assert_eq!(response.correlation_id, id);
        assert!(matches!(response.body, ResponseBody::NoSave));
    }

    #[test]
    fn handler_errors_become_error_responses_not_panics() {
        let runtime = runtime();

        let response = runtime.request(Command::AdvanceWeek).unwrap();
        let ResponseBody::Error { kind, .. } = response.body else {
            panic!("expected error response");
        };
        assert_eq!(kind, "validation");
    }

    #[test]
    fn commands_execute_strictly_in_submission_order() {
        let runtime = runtime();

        let create = runtime
            .submit(Command::NewLeague {
                team_defs: defs(2),
                options: LeagueOptions::default(),
            })
            .unwrap();
        let advance = runtime.submit(Command::AdvanceWeek).unwrap();

        assert!(matches!(
            create.join().unwrap().body,
            ResponseBody::League(_)
        ));
        // The advance ran after the creation, so it found a league.
        assert!(matches!(advance.join().unwrap().body, ResponseBody::Week(_)));
    }

    #[test]
    fn submit_after_shutdown_reports_disconnected() {
        let mut runtime = runtime();
        drop(runtime.tx.take());

        let err = runtime.submit(Command::Init).unwrap_err();
        assert!(matches!(
            err,
            LeagueError::Protocol(ProtocolError::Disconnected)
        ));
    }
}
