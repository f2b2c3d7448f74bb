mod queue;
mod stats;

pub use queue::QueuedRequest;
pub use stats::SchedulerStats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::types::{Priority, Protocol};
use crate::config::SchedulerConfig;
use crate::errors::ModbusError;
use crate::handlers::{self, Request, ResponseData, ResponseEnvelope};
use crate::retry;
use crate::transport::Transport;

use queue::PriorityQueue;
use stats::StatsTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Stopped,
    Running,
}

struct Inner {
    queue: PriorityQueue,
    active: usize,
    last_dispatch: Option<Instant>,
}

/// Priority scheduler owning the single dispatch slot for an RTU/ASCII
/// transport: submissions queue here, one in-flight transaction at a time,
/// paced by `request_interval`.
pub struct Scheduler {
    transport: Arc<dyn Transport>,
    config: SchedulerConfig,
    protocol: Protocol,
    state: Mutex<RunState>,
    inner: Mutex<Inner>,
    stats: Mutex<StatsTracker>,
    running_flag: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(transport: Arc<dyn Transport>, protocol: Protocol, config: SchedulerConfig) -> Self {
        Self {
            transport,
            config,
            protocol,
            state: Mutex::new(RunState::Stopped),
            inner: Mutex::new(Inner {
                queue: PriorityQueue::new(),
                active: 0,
                last_dispatch: None,
            }),
            stats: Mutex::new(StatsTracker::new()),
            running_flag: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
            dispatch_handle: Mutex::new(None),
        }
    }

    /// Starts the dispatch loop. A no-op if already running.
    pub async fn start(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        if *state == RunState::Running {
            return;
        }
        *state = RunState::Running;
        self.running_flag.store(true, Ordering::SeqCst);

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move { scheduler.dispatch_loop().await });
        *self.dispatch_handle.lock().await = Some(handle);
        info!("scheduler started");
    }

    /// Stops the dispatch loop. Rejects every queued and in-flight request
    /// with `SchedulerStopped`. A no-op if already stopped.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if *state == RunState::Stopped {
            return;
        }
        *state = RunState::Stopped;
        self.running_flag.store(false, Ordering::SeqCst);
        self.stop_notify.notify_waiters();

        if let Some(handle) = self.dispatch_handle.lock().await.take() {
            let _ = handle.await;
        }

        let mut inner = self.inner.lock().await;
        for queued in inner.queue.drain() {
            let _ = queued.waiter.send(Err(ModbusError::SchedulerStopped));
        }
        inner.active = 0;
        info!("scheduler stopped");
    }

    /// Submits a request for dispatch, returning a receiver that resolves
    /// with the eventual result.
    pub async fn schedule(
        &self,
        unit_id: u8,
        request: Request,
        priority: Priority,
    ) -> Result<oneshot::Receiver<Result<ResponseEnvelope, ModbusError>>, ModbusError> {
        if *self.state.lock().await != RunState::Running {
            return Err(ModbusError::SchedulerNotRunning);
        }
        if !self.transport.is_connected() {
            return Err(ModbusError::NotConnected {
                context: crate::errors::ErrorContext::new(
                    unit_id,
                    self.protocol,
                    crate::errors::Phase::Validate,
                ),
            });
        }

        let mut inner = self.inner.lock().await;
        if inner.queue.len() >= self.config.queue_size_limit {
            return Err(ModbusError::QueueFull {
                limit: self.config.queue_size_limit,
            });
        }

        let (tx, rx) = oneshot::channel();
        let id = crate::utils::generate_request_id();
        inner.queue.insert(QueuedRequest {
            id,
            unit_id,
            request,
            protocol: self.protocol,
            priority,
            submitted_at: Instant::now(),
            attempts: 0,
            max_attempts: self.config.default_retry.max_retries + 1,
            waiter: tx,
        });
        Ok(rx)
    }

    pub async fn stats(&self) -> SchedulerStats {
        let inner = self.inner.lock().await;
        self.stats.lock().await.snapshot(inner.queue.len(), inner.active)
    }

    async fn dispatch_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.request_interval);
        loop {
            ticker.tick().await;
            if !self.running_flag.load(Ordering::SeqCst) {
                return;
            }
            if !self.transport.is_connected() {
                continue;
            }

            let next = {
                let mut inner = self.inner.lock().await;
                if inner.active >= self.config.max_concurrent_requests {
                    continue;
                }
                if let Some(last) = inner.last_dispatch {
                    if last.elapsed() < self.config.request_interval {
                        continue;
                    }
                }
                let Some(queued) = inner.queue.pop_front() else {
                    continue;
                };
                inner.active += 1;
                inner.last_dispatch = Some(Instant::now());
                queued
            };

            self.run_one(next).await;

            let mut inner = self.inner.lock().await;
            inner.active = inner.active.saturating_sub(1);
        }
    }

    async fn run_one(&self, mut queued: QueuedRequest) {
        let started = Instant::now();
        let transport = Arc::clone(&self.transport);
        let retry_policy = self.config.default_retry.clone();
        let timeout = self.config.default_timeout;
        let unit_id = queued.unit_id;
        let protocol = queued.protocol;
        let request = queued.request.clone();
        let attempt_count = std::cell::Cell::new(0u32);

        let work = retry::run_with_retry(&retry_policy, || {
            attempt_count.set(attempt_count.get() + 1);
            execute_once(transport.as_ref(), unit_id, &request, protocol, timeout)
        });

        tokio::select! {
            result = work => {
                queued.attempts = attempt_count.get();
                let succeeded = result.is_ok();
                self.stats.lock().await.record_completion(succeeded, started.elapsed());
                let _ = queued.waiter.send(result);
            }
            _ = self.stop_notify.notified() => {
                warn!(id = queued.id, attempts = attempt_count.get(), "scheduler stopped with this request in flight");
                let _ = queued.waiter.send(Err(ModbusError::SchedulerStopped));
            }
        }
    }
}

fn is_write_request(request: &Request) -> bool {
    matches!(
        request,
        Request::WriteSingleCoil { .. }
            | Request::WriteSingleRegister { .. }
            | Request::WriteMultipleCoils { .. }
            | Request::WriteMultipleRegisters { .. }
    )
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Builds, sends and decodes a single request. Broadcast writes (`unit_id
/// == 0`) resolve immediately after the write completes, without awaiting a
/// reply (see the broadcast-write design decision recorded in DESIGN.md).
async fn execute_once(
    transport: &dyn Transport,
    unit_id: u8,
    request: &Request,
    protocol: Protocol,
    timeout: Duration,
) -> Result<ResponseEnvelope, ModbusError> {
    let pdu = handlers::build_request(unit_id, request, protocol)?;
    let frame = match protocol {
        Protocol::Rtu => pdu.encode_rtu(),
        Protocol::Ascii => pdu.encode_ascii(),
    };

    if unit_id == 0 {
        if !is_write_request(request) {
            return Err(ModbusError::InvalidArgument {
                details: "broadcast unit id 0 is only valid for write requests".to_string(),
                context: crate::errors::ErrorContext::new(unit_id, protocol, crate::errors::Phase::Validate)
                    .with_function_code(request.function_code()),
            });
        }
        transport.post_message(frame)?;
        return Ok(ResponseEnvelope {
            unit_id,
            function_code: request.function_code(),
            function_name: handlers::registry::lookup(request.function_code())
                .map(|meta| meta.name)
                .unwrap_or("unknown"),
            data: ResponseData::Empty,
            start_address: request.address(),
            timestamp_ms: now_ms(),
        });
    }

    let decoded = crate::correlator::send_and_await(
        transport,
        frame,
        unit_id,
        request.function_code(),
        protocol,
        timeout,
    )
    .await?;

    handlers::decode_response(unit_id, request, protocol, decoded, now_ms())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Pdu;
    use crate::transport::MockTransport;
    use std::time::Duration;

    fn scheduler_with(config: SchedulerConfig) -> (Arc<Scheduler>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let scheduler = Arc::new(Scheduler::new(transport.clone(), Protocol::Rtu, config));
        (scheduler, transport)
    }

    #[tokio::test]
    async fn schedule_before_start_fails_with_not_running() {
        let (scheduler, _transport) = scheduler_with(SchedulerConfig::default());
        let err = scheduler
            .schedule(
                1,
                Request::ReadHoldingRegisters {
                    address: 0,
                    quantity: 1,
                },
                Priority::Normal,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::SchedulerNotRunning));
    }

    #[tokio::test]
    async fn dispatches_a_queued_request_once_running() {
        let mut config = SchedulerConfig::default();
        config.request_interval = Duration::from_millis(5);
        config.default_timeout = Duration::from_millis(200);
        let (scheduler, transport) = scheduler_with(config);
        transport.connect().await.unwrap();

        let request_frame = Pdu::new(1, 0x03, vec![0x00, 0x00, 0x00, 0x01]).encode_rtu();
        let response_frame = Pdu::new(1, 0x03, vec![0x02, 0x00, 0x2A]).encode_rtu();
        transport.program_response(request_frame, response_frame, None);

        scheduler.start().await;
        let rx = scheduler
            .schedule(
                1,
                Request::ReadHoldingRegisters {
                    address: 0,
                    quantity: 1,
                },
                Priority::Normal,
            )
            .await
            .expect("scheduled");

        let result = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("did not hang")
            .expect("channel not dropped");
        assert_eq!(result.unwrap().data, ResponseData::Registers(vec![0x2A]));
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn queue_full_rejects_synchronously() {
        let mut config = SchedulerConfig::default();
        config.queue_size_limit = 1;
        config.request_interval = Duration::from_secs(60);
        let (scheduler, transport) = scheduler_with(config);
        transport.connect().await.unwrap();
        scheduler.start().await;

        let read = || Request::ReadHoldingRegisters {
            address: 0,
            quantity: 1,
        };
        let _first = scheduler.schedule(1, read(), Priority::Normal).await;
        let second = scheduler.schedule(1, read(), Priority::Normal).await;
        assert!(matches!(second, Err(ModbusError::QueueFull { .. })));
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_resolves_in_flight_request_with_scheduler_stopped() {
        let mut config = SchedulerConfig::default();
        config.request_interval = Duration::from_millis(5);
        config.default_timeout = Duration::from_secs(5);
        let (scheduler, transport) = scheduler_with(config);
        transport.connect().await.unwrap();
        scheduler.start().await;

        let rx = scheduler
            .schedule(
                1,
                Request::ReadHoldingRegisters {
                    address: 0,
                    quantity: 1,
                },
                Priority::Normal,
            )
            .await
            .expect("scheduled");

        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.stop().await;

        let result = rx.await.expect("channel not dropped");
        assert!(matches!(result, Err(ModbusError::SchedulerStopped)));
    }
}
