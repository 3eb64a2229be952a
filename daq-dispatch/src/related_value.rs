// SPDX-License-Identifier: Apache-2.0

//! The two-phase related-value pattern: an accepted alarm event
//! whose binding names a distinct related channel is held pending
//! until a one-shot get on that channel completes, then the two are
//! combined into a single output row.

use daq_channel::{BindingId, ChannelError, ChannelProvider, RawValue};

use crate::event::Event;

/// An alarm event awaiting its related-channel get. Holds the
/// triggering event's captured context so the write can complete once
/// `resolve` succeeds.
#[derive(Debug, Clone)]
pub struct PendingRelatedValue {
    pub binding: BindingId,
    pub related_binding: BindingId,
    pub captured: Event,
}

/// Begins the two-phase write: the binding's `write_pending` flag
/// (owned by the caller's `BindingTable`) must be set by the caller
/// before handing the pending write off, so that subsequent
/// less-severe callbacks are dropped per the change filter.
pub fn begin(binding: BindingId, related_binding: BindingId, captured: Event) -> PendingRelatedValue {
    PendingRelatedValue {
        binding,
        related_binding,
        captured,
    }
}

/// Issues the one-shot get and renders the related value's string
/// form, producing the final event to write. Returns the original
/// captured event unchanged but with `related_value` populated; a
/// failed get still produces a row, with an error-signaling related
/// value, matching the bit-decoder's conversion-failure behavior.
pub fn resolve(provider: &mut dyn ChannelProvider, pending: PendingRelatedValue) -> Event {
    let mut event = pending.captured;
    event.related_value = Some(render_related_value(provider, pending.related_binding));
    event
}

fn render_related_value(provider: &mut dyn ChannelProvider, related_binding: BindingId) -> String {
    match provider.get(related_binding) {
        Ok(RawValue::Numeric(v)) => format!("{v}"),
        Ok(RawValue::Text(s)) => s,
        Ok(RawValue::NumericWaveform(values)) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        Ok(RawValue::StringWaveform(values)) => values.join(" "),
        Err(ChannelError::Transient { detail, .. }) => format!("<related value unavailable: {detail}>"),
        Err(_) => "<related value unavailable>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Payload;
    use daq_channel::mock::MockChannelProvider;
    use daq_core::{Severity, SourceTimestamp, Status};

    fn sample_event(binding: BindingId) -> Event {
        Event {
            binding,
            source_time: SourceTimestamp::default(),
            client_time: SourceTimestamp::default(),
            status: Status::HiHi,
            severity: Severity::Major,
            payload: Payload::Scalar(42.0),
            related_value: None,
        }
    }

    #[test]
    fn resolve_attaches_related_channel_value() {
        let mut provider = MockChannelProvider::new();
        let related = BindingId(1);
        provider.register_scalar(related, "RELATED", 7.5);

        let event = sample_event(BindingId(0));
        let pending = begin(BindingId(0), related, event);
        let resolved = resolve(&mut provider, pending);

        assert_eq!(resolved.related_value.as_deref(), Some("7.5"));
    }

    #[test]
    fn resolve_unknown_related_channel_still_emits_a_row() {
        let mut provider = MockChannelProvider::new();
        let related = BindingId(99);

        let event = sample_event(BindingId(0));
        let pending = begin(BindingId(0), related, event);
        let resolved = resolve(&mut provider, pending);

        assert!(resolved.related_value.is_some());
    }
}
