// SPDX-License-Identifier: Apache-2.0

//! Daemon mode: an indefinite run where a save cycle fires when
//! the trigger channel transitions to a non-zero value or a recorded
//! signal arrives, the trigger is reset to zero once the cycle
//! finishes, the output filename is optionally published back to an
//! output-name channel, and the input request file is optionally
//! re-read when a watched filename channel's target changes.

use std::path::PathBuf;

use daq_channel::{BindingId, ChannelProvider, RawValue};
use daq_core::DaqError;
use daq_runtime::signals;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub trigger_binding: BindingId,
    pub output_name_binding: Option<BindingId>,
    pub input_filename_binding: Option<BindingId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCause {
    Channel,
    Signal(i32),
}

/// Checks whether a save cycle should fire this tick: the trigger
/// channel reads non-zero, or a recorded signal is pending.
pub fn poll_trigger(
    provider: &mut dyn ChannelProvider,
    config: &DaemonConfig,
) -> Result<Option<TriggerCause>, DaqError> {
    if let Some((sig, _class)) = signals::take_signal() {
        return Ok(Some(TriggerCause::Signal(sig)));
    }
    let value = provider.get(config.trigger_binding).map_err(|e| DaqError::TransientCa {
        channel: "trigger".to_string(),
        detail: e.to_string(),
    })?;
    match value {
        RawValue::Numeric(v) if v != 0.0 => Ok(Some(TriggerCause::Channel)),
        _ => Ok(None),
    }
}

/// Resets the trigger channel to zero after a save cycle completes, so
/// the next non-zero write starts a fresh cycle.
pub fn acknowledge_trigger(provider: &mut dyn ChannelProvider, config: &DaemonConfig) -> Result<(), DaqError> {
    provider
        .put(config.trigger_binding, RawValue::Numeric(0.0))
        .map_err(|e| DaqError::TransientCa {
            channel: "trigger".to_string(),
            detail: e.to_string(),
        })
}

/// Publishes the filename a save cycle just wrote to the optional
/// output-name channel.
pub fn publish_output_name(
    provider: &mut dyn ChannelProvider,
    config: &DaemonConfig,
    path: &PathBuf,
) -> Result<(), DaqError> {
    let Some(binding) = config.output_name_binding else {
        return Ok(());
    };
    provider
        .put(binding, RawValue::Text(path.display().to_string()))
        .map_err(|e| DaqError::TransientCa {
            channel: "output name".to_string(),
            detail: e.to_string(),
        })
}

/// Reads the current request filename from the optional input-filename
/// channel, for callers that re-read the request file when it changes.
pub fn current_input_filename(
    provider: &mut dyn ChannelProvider,
    config: &DaemonConfig,
) -> Result<Option<String>, DaqError> {
    let Some(binding) = config.input_filename_binding else {
        return Ok(None);
    };
    let value = provider.get(binding).map_err(|e| DaqError::TransientCa {
        channel: "input filename".to_string(),
        detail: e.to_string(),
    })?;
    match value {
        RawValue::Text(name) => Ok(Some(name)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::mock::MockChannelProvider;
    use daq_channel::BindingTable;

    #[test]
    fn nonzero_trigger_value_fires_a_cycle() {
        let mut provider = MockChannelProvider::new();
        let mut bindings = BindingTable::new();
        let trigger = bindings.insert("Trigger");
        provider.register_scalar(trigger, "Trigger", 1.0);
        let config = DaemonConfig {
            trigger_binding: trigger,
            output_name_binding: None,
            input_filename_binding: None,
        };
        assert_eq!(poll_trigger(&mut provider, &config).unwrap(), Some(TriggerCause::Channel));
    }

    #[test]
    fn zero_trigger_value_does_not_fire() {
        let mut provider = MockChannelProvider::new();
        let mut bindings = BindingTable::new();
        let trigger = bindings.insert("Trigger");
        provider.register_scalar(trigger, "Trigger", 0.0);
        let config = DaemonConfig {
            trigger_binding: trigger,
            output_name_binding: None,
            input_filename_binding: None,
        };
        assert_eq!(poll_trigger(&mut provider, &config).unwrap(), None);
    }

    #[test]
    fn acknowledge_resets_trigger_to_zero() {
        let mut provider = MockChannelProvider::new();
        let mut bindings = BindingTable::new();
        let trigger = bindings.insert("Trigger");
        provider.register_scalar(trigger, "Trigger", 1.0);
        let config = DaemonConfig {
            trigger_binding: trigger,
            output_name_binding: None,
            input_filename_binding: None,
        };
        acknowledge_trigger(&mut provider, &config).unwrap();
        assert_eq!(provider.get(trigger).unwrap(), RawValue::Numeric(0.0));
    }
}
