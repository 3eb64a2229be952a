// SPDX-License-Identifier: Apache-2.0

//! The supervisor client: a periodic ping
//! interface whose `ABORT`/`TIMEOUT` outcomes are fatal. `PvSupervisor`
//! implements the ping-by-PV pattern the original programs use, atop
//! two plain channels rather than a bespoke RPC protocol.

use std::time::Duration;

use daq_channel::{BindingId, ChannelProvider, RawValue};
use daq_core::DaqError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    Ok,
    Abort,
    Timeout,
}

#[derive(Debug, Clone, Copy)]
pub struct PingPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }
}

pub trait Supervisor {
    fn init(&mut self) -> Result<(), DaqError>;
    fn ping(&mut self) -> Result<PingOutcome, DaqError>;
    fn exit(&mut self);
}

/// No external run-control process attached; every ping succeeds.
/// Lets `scalar-monitor` and other programs run standalone.
#[derive(Debug, Default)]
pub struct NullSupervisor;

impl Supervisor for NullSupervisor {
    fn init(&mut self) -> Result<(), DaqError> {
        Ok(())
    }

    fn ping(&mut self) -> Result<PingOutcome, DaqError> {
        Ok(PingOutcome::Ok)
    }

    fn exit(&mut self) {}
}

/// Pings over two plain channels: a status PV the supervisor writes
/// (0 = ok, 1 = abort) and a ping PV this program writes on every
/// successful check-in.
pub struct PvSupervisor<'p> {
    provider: &'p mut dyn ChannelProvider,
    ping_binding: BindingId,
    status_binding: BindingId,
}

impl<'p> PvSupervisor<'p> {
    pub fn new(
        provider: &'p mut dyn ChannelProvider,
        ping_binding: BindingId,
        status_binding: BindingId,
    ) -> Self {
        Self {
            provider,
            ping_binding,
            status_binding,
        }
    }

    fn transient(&self, detail: impl Into<String>) -> DaqError {
        DaqError::TransientCa {
            channel: "supervisor".to_string(),
            detail: detail.into(),
        }
    }
}

impl Supervisor for PvSupervisor<'_> {
    fn init(&mut self) -> Result<(), DaqError> {
        self.provider
            .put(self.ping_binding, RawValue::Numeric(1.0))
            .map_err(|e| self.transient(e.to_string()))
    }

    fn ping(&mut self) -> Result<PingOutcome, DaqError> {
        match self.provider.get(self.status_binding) {
            Ok(RawValue::Numeric(v)) if v == 1.0 => Ok(PingOutcome::Abort),
            Ok(_) => {
                self.provider
                    .put(self.ping_binding, RawValue::Numeric(1.0))
                    .map_err(|e| self.transient(e.to_string()))?;
                Ok(PingOutcome::Ok)
            }
            Err(_) => Ok(PingOutcome::Timeout),
        }
    }

    fn exit(&mut self) {
        let _ = self.provider.put(self.ping_binding, RawValue::Numeric(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::mock::MockChannelProvider;

    #[test]
    fn pv_supervisor_pings_ok_when_status_clear() {
        let mut provider = MockChannelProvider::new();
        let ping = BindingId(0);
        let status = BindingId(1);
        provider.register_scalar(ping, "PING", 0.0);
        provider.register_scalar(status, "STATUS", 0.0);

        let mut supervisor = PvSupervisor::new(&mut provider, ping, status);
        supervisor.init().unwrap();
        assert_eq!(supervisor.ping().unwrap(), PingOutcome::Ok);
    }

    #[test]
    fn pv_supervisor_reports_abort_on_nonzero_status() {
        let mut provider = MockChannelProvider::new();
        let ping = BindingId(0);
        let status = BindingId(1);
        provider.register_scalar(ping, "PING", 0.0);
        provider.register_scalar(status, "STATUS", 1.0);

        let mut supervisor = PvSupervisor::new(&mut provider, ping, status);
        assert_eq!(supervisor.ping().unwrap(), PingOutcome::Abort);
    }
}
