// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use daq_channel::{
    connect_and_discover, BindingId, BindingTable, ChannelProvider, FieldHint, MockChannelProvider, SubscriptionMask,
};
use daq_core::{DaqError, TerminationReason};
use daq_request::{LoadOptions, RequestSet};
use daq_runtime::context::{RunController, RunOptions};
use daq_runtime::supervisor::{NullSupervisor, PingOutcome, PingPolicy, PvSupervisor, Supervisor};

/// Flags shared by every acquisition binary. Flag *semantics* belong
/// to the real CLI layer; these are the typed options that layer
/// populates.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Path to the request file describing which channels to observe.
    #[arg(long)]
    pub request: PathBuf,

    /// Path to the output file this run writes.
    #[arg(long)]
    pub output: PathBuf,

    /// Collapse duplicate request rows by ControlName.
    #[arg(long)]
    pub unique: bool,

    /// Bounded connect wait, in seconds.
    #[arg(long, default_value_t = 60.0)]
    pub connect_timeout_secs: f64,

    /// Output flushed to disk every this many write cycles.
    #[arg(long, default_value_t = 1)]
    pub flush_interval: u32,

    /// Rows preallocated per page/lengthen call.
    #[arg(long, default_value_t = 100)]
    pub preallocate_rows: usize,

    /// Stop after this many sampling steps (0 = unbounded).
    #[arg(long, default_value_t = 0)]
    pub step_limit: u64,

    /// Stop after this many seconds (0 = unbounded).
    #[arg(long, default_value_t = 0.0)]
    pub deadline_secs: f64,

    /// Sampling/poll period, in seconds.
    #[arg(long, default_value_t = 1.0)]
    pub period_secs: f64,

    /// Control name this run pings on every check-in with a supervising
    /// process. Requires `supervisor_status_channel`; omit both to run
    /// standalone.
    #[arg(long)]
    pub supervisor_ping_channel: Option<String>,

    /// Control name a supervising process sets non-zero to abort this
    /// run. Requires `supervisor_ping_channel`.
    #[arg(long)]
    pub supervisor_status_channel: Option<String>,

    /// How often to ping the configured supervisor, in seconds.
    #[arg(long, default_value_t = 2.0)]
    pub supervisor_ping_interval_secs: f64,
}

pub struct Pipeline {
    pub request: RequestSet,
    pub bindings: BindingTable,
    pub provider: MockChannelProvider,
}

/// Loads the request file, builds one binding per active row, and
/// connects. The real CA client is an external collaborator this core
/// does not ship, so every binary wires against the deterministic
/// provider here; a production deployment links a real `ChannelProvider`
/// in its place without touching the pipeline crates.
pub fn set_up(args: &CommonArgs) -> Result<Pipeline, DaqError> {
    let request = daq_request::load(&args.request, LoadOptions { unique: args.unique })
        .map_err(|e| DaqError::Schema(e.to_string()))?;

    let mut bindings = BindingTable::new();
    let mut provider = MockChannelProvider::new();
    let mut hints = HashMap::new();

    for row in request.active_rows() {
        let id = bindings.insert(row.control_name.clone());
        provider.register_scalar(id, &row.control_name, row.initial_value.unwrap_or(0.0));
        hints.insert(
            id,
            FieldHint {
                expect_numeric: row.expect_numeric,
                expect_field_type: row.expect_field_type.clone(),
                expect_elements: row.expect_elements,
            },
        );
        if let Some(binding) = bindings.get_mut(id) {
            binding.readback_name = row.readback_name.clone();
            binding.related_name = row.related_control_name.clone();
        }
    }

    connect_and_discover(
        &mut provider,
        &mut bindings,
        &hints,
        Duration::from_secs_f64(args.connect_timeout_secs.max(0.0)),
    )?;

    for binding in bindings.iter() {
        let _ = provider.subscribe(binding.id, SubscriptionMask::BOTH);
    }

    Ok(Pipeline { request, bindings, provider })
}

/// The column name a binding's value is written under: the request
/// row's `ReadbackName` if supplied, else the control name.
pub fn readback_names(bindings: &BindingTable) -> Vec<String> {
    bindings
        .iter()
        .map(|b| b.readback_name.clone().unwrap_or_else(|| b.name.clone()))
        .collect()
}

fn run_options(args: &CommonArgs) -> RunOptions {
    RunOptions {
        deadline: (args.deadline_secs > 0.0).then(|| Duration::from_secs_f64(args.deadline_secs)),
        step_limit: (args.step_limit != 0).then_some(args.step_limit),
        sampling_interval: Duration::from_secs_f64(args.period_secs.max(0.01)),
        ping_policy: PingPolicy {
            interval: Duration::from_secs_f64(args.supervisor_ping_interval_secs.max(0.01)),
            ..PingPolicy::default()
        },
    }
}

/// The two bindings a configured supervisor pings over: the channel
/// this run writes to check in, and the channel the supervisor sets
/// non-zero to abort it.
#[derive(Debug, Clone, Copy)]
struct SupervisorBindings {
    ping: BindingId,
    status: BindingId,
}

fn resolve_supervisor_bindings(
    args: &CommonArgs,
    bindings: &BindingTable,
) -> Result<Option<SupervisorBindings>, DaqError> {
    match (&args.supervisor_ping_channel, &args.supervisor_status_channel) {
        (Some(ping_name), Some(status_name)) => {
            let ping = bindings.by_name(ping_name).ok_or_else(|| {
                DaqError::Schema(format!("supervisor ping channel '{ping_name}' is not in the request file"))
            })?;
            let status = bindings.by_name(status_name).ok_or_else(|| {
                DaqError::Schema(format!("supervisor status channel '{status_name}' is not in the request file"))
            })?;
            Ok(Some(SupervisorBindings { ping, status }))
        }
        (None, None) => Ok(None),
        _ => Err(DaqError::Schema(
            "supervisor_ping_channel and supervisor_status_channel must be set together".to_string(),
        )),
    }
}

/// Owns a run's termination and supervisor-liveness state: the real
/// wall-clock deadline, step limit, and recorded-signal checks a
/// `RunController` provides, plus — when the run was configured with
/// supervisor channels — a ping issued on `PvSupervisor`'s cadence.
///
/// The ping is issued through a freshly built `PvSupervisor` per call
/// rather than one held for the run's lifetime, since `PvSupervisor`
/// borrows the provider and every binary's loop also needs the
/// provider for its own `pend_event`/`get`/`put` calls in between
/// pings.
pub struct RunGuard {
    controller: RunController<NullSupervisor>,
    supervisor: Option<SupervisorBindings>,
    ping_interval: Duration,
    last_ping: Option<Instant>,
}

impl RunGuard {
    pub fn new(
        args: &CommonArgs,
        bindings: &BindingTable,
        provider: &mut dyn ChannelProvider,
    ) -> Result<Self, DaqError> {
        let options = run_options(args);
        let supervisor = resolve_supervisor_bindings(args, bindings)?;
        let ping_interval = options.ping_policy.interval;
        let controller = RunController::new(options, NullSupervisor)?;
        if let Some(sb) = supervisor {
            PvSupervisor::new(provider, sb.ping, sb.status).init()?;
        }
        Ok(Self {
            controller,
            supervisor,
            ping_interval,
            last_ping: None,
        })
    }

    pub fn advance_tick(&mut self) {
        self.controller.advance_tick();
    }

    /// Checks the deadline/step-limit/signal conditions, then pings the
    /// configured supervisor if its interval has elapsed. Call once per
    /// sampling tick; `Some` means the caller should stop.
    pub fn check(&mut self, provider: &mut dyn ChannelProvider) -> Result<Option<TerminationReason>, DaqError> {
        if let Some(reason) = self.controller.check_termination() {
            return Ok(Some(reason));
        }
        let Some(sb) = self.supervisor else {
            return Ok(None);
        };
        if self.last_ping.is_some_and(|t| t.elapsed() < self.ping_interval) {
            return Ok(None);
        }
        self.last_ping = Some(Instant::now());
        let mut pv = PvSupervisor::new(provider, sb.ping, sb.status);
        Ok(match pv.ping()? {
            PingOutcome::Ok => None,
            PingOutcome::Abort => Some(TerminationReason::SupervisorAbort),
            PingOutcome::Timeout => Some(TerminationReason::SupervisorTimeout),
        })
    }

    pub fn finish(self, provider: &mut dyn ChannelProvider, reason: TerminationReason) {
        if let Some(sb) = self.supervisor {
            PvSupervisor::new(provider, sb.ping, sb.status).exit();
        }
        self.controller.finish(reason);
    }
}
