// SPDX-License-Identifier: Apache-2.0

//! Bit-decoder expansion: when a binding names a bit-decoder
//! array, an alarm event on an integer-valued channel expands into one
//! output row per set bit, each carrying the decoder array's string
//! for that bit position as its related value.

use crate::event::{Event, Payload};

/// Looks up the textual description for bit `j` of a sampled integer,
/// resolved through whatever owns the request file's parameter-side
/// decoder arrays (the Output Writer, per `SPEC_FULL.md`'s component
/// design — this crate only consumes the resolved strings).
pub trait BitDecoderResolver {
    fn describe_bit(&self, decoder_array: &str, bit: u32) -> Option<String>;
}

/// Expands `event` into one row per set bit of its integer value, each
/// a clone of `event` with `related_value` set to that bit's decoder
/// string. A value that cannot be converted to an integer yields a
/// single row with an error-signaling related value rather than an
/// expansion.
pub fn expand(
    event: &Event,
    decoder_array: &str,
    resolver: &dyn BitDecoderResolver,
) -> Vec<Event> {
    let Some(raw) = integer_value(event) else {
        let mut row = event.clone();
        row.related_value = Some("<bit-decoder: value is not an integer>".to_string());
        return vec![row];
    };

    let mut rows = Vec::new();
    for bit in 0..(std::mem::size_of::<i64>() as u32 * 8) {
        if raw & (1i64 << bit) == 0 {
            continue;
        }
        let mut row = event.clone();
        row.related_value = Some(
            resolver
                .describe_bit(decoder_array, bit)
                .unwrap_or_else(|| format!("bit {bit}")),
        );
        rows.push(row);
    }
    rows
}

fn integer_value(event: &Event) -> Option<i64> {
    match &event.payload {
        Payload::Scalar(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
        Payload::Enumerated { ordinal, .. } => Some(*ordinal as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::BindingId;
    use daq_core::{Severity, SourceTimestamp, Status};

    struct FixedResolver;
    impl BitDecoderResolver for FixedResolver {
        fn describe_bit(&self, _decoder_array: &str, bit: u32) -> Option<String> {
            Some(format!("fault-{bit}"))
        }
    }

    fn scalar_event(value: f64) -> Event {
        Event {
            binding: BindingId(0),
            source_time: SourceTimestamp::default(),
            client_time: SourceTimestamp::default(),
            status: Status::HiHi,
            severity: Severity::Major,
            payload: Payload::Scalar(value),
            related_value: None,
        }
    }

    #[test]
    fn expands_one_row_per_set_bit() {
        let event = scalar_event(5.0); // 0b101
        let rows = expand(&event, "DECODER", &FixedResolver);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].related_value.as_deref(), Some("fault-0"));
        assert_eq!(rows[1].related_value.as_deref(), Some("fault-2"));
    }

    #[test]
    fn zero_value_expands_to_no_rows() {
        let event = scalar_event(0.0);
        let rows = expand(&event, "DECODER", &FixedResolver);
        assert!(rows.is_empty());
    }

    #[test]
    fn non_integer_value_yields_single_error_row() {
        let event = scalar_event(1.5);
        let rows = expand(&event, "DECODER", &FixedResolver);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].related_value.as_deref().unwrap().contains("not an integer"));
    }
}
