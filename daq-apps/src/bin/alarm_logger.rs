// SPDX-License-Identifier: Apache-2.0

//! One row per alarm-relevant callback: severity/status transitions,
//! plus the two-phase related-value pattern and bit-decoder expansion
//! for bindings that name them.

use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use daq_apps::{set_up, CommonArgs, RunGuard};
use daq_channel::{connect::apply_callback, BindingId, ChannelProvider};
use daq_dispatch::{
    begin_related_value, change_filter::ChangeFilterConfig, decide, expand_bit_decoder, Decision, Event,
};
use daq_writer::{alarm_log_layout, CellValue, OpenMode, PreallocationPolicy, Writer, WriterBitDecoderResolver};

#[derive(Debug, Parser)]
#[command(name = "alarm-logger")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Log the first value seen for every channel, not just later
    /// alarm transitions.
    #[arg(long)]
    log_initial_values: bool,

    /// Append to an existing output file rather than creating one.
    #[arg(long)]
    append: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut pipeline = set_up(&cli.common)?;

    let mode = if cli.append {
        OpenMode::Append { to_page: true }
    } else {
        OpenMode::Create
    };
    let mut writer = Writer::open(
        &cli.common.output,
        mode,
        alarm_log_layout(),
        &["ControlName", "Time", "AlarmStatus", "AlarmSeverity", "Value", "RelatedValue"],
        PreallocationPolicy { block_rows: cli.common.preallocate_rows },
        cli.common.flush_interval,
    )?;

    let config = ChangeFilterConfig {
        log_initial_values: cli.log_initial_values,
        ..Default::default()
    };

    let poll = Duration::from_secs_f64(cli.common.period_secs.max(0.01));
    let mut run = RunGuard::new(&cli.common, &pipeline.bindings, &mut pipeline.provider)?;

    // Previous output row's index and source time, per binding, so
    // `PreviousRow`/`Duration` can be computed for the next row the
    // binding emits. Absent until that binding's first row.
    let mut previous_row: HashMap<BindingId, (u64, f64)> = HashMap::new();

    let reason = loop {
        let callbacks = pipeline.provider.pend_event(poll);
        for cb in &callbacks {
            let Some(binding_before) = pipeline.bindings.get(cb.binding).cloned() else {
                continue;
            };
            let event = Event::from_raw(cb.binding, cb);
            let decision = decide(&binding_before, &event, 0.0, &config);
            apply_callback(&mut pipeline.bindings, cb);

            if decision != Decision::Emit {
                continue;
            }

            let resolved = match binding_before.related_name.as_deref().and_then(|name| pipeline.bindings.by_name(name)) {
                Some(related_id) => {
                    if let Some(b) = pipeline.bindings.get_mut(cb.binding) {
                        b.write_pending = true;
                    }
                    let pending = begin_related_value(cb.binding, related_id, event);
                    let resolved = daq_dispatch::resolve_related_value(&mut pipeline.provider, pending);
                    if let Some(b) = pipeline.bindings.get_mut(cb.binding) {
                        b.write_pending = false;
                    }
                    resolved
                }
                None => event,
            };

            let decoder_array = pipeline
                .request
                .rows
                .iter()
                .find(|r| r.control_name == binding_before.name)
                .and_then(|r| r.bit_decoder_array.clone());

            let rows = match decoder_array {
                Some(array) => {
                    let params = writer.current_page_parameters().cloned().unwrap_or_default();
                    let resolver = WriterBitDecoderResolver::new(writer.layout(), &params);
                    expand_bit_decoder(&resolved, &array, &resolver)
                }
                None => vec![resolved],
            };

            for row in rows {
                let time = row.source_time.to_unix_seconds(0);
                let (prior_row, duration) = match previous_row.get(&cb.binding) {
                    Some(&(row_idx, prior_time)) => (row_idx as i64, time - prior_time),
                    None => (-1, 0.0),
                };

                write_alarm_row(&mut writer, &binding_before.name, &row, duration, prior_row)?;

                let row_idx = writer.total_rows() as u64;
                previous_row.insert(cb.binding, (row_idx, time));
                if let Some(b) = pipeline.bindings.get_mut(cb.binding) {
                    b.last_row = Some(row_idx);
                }
            }
            writer.tick_flush()?;
        }

        run.advance_tick();
        if let Some(reason) = run.check(&mut pipeline.provider)? {
            break reason;
        }
    };

    tracing::info!(%reason, "stopping");
    run.finish(&mut pipeline.provider, reason);
    writer.close()?;
    Ok(())
}

fn write_alarm_row(
    writer: &mut Writer,
    control_name: &str,
    event: &Event,
    duration: f64,
    previous_row: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = match &event.payload {
        daq_dispatch::Payload::Scalar(v) => *v,
        daq_dispatch::Payload::Enumerated { ordinal, .. } => *ordinal as f64,
        _ => 0.0,
    };
    let time = event.source_time.to_unix_seconds(0);
    writer.append_row(&[
        ("ControlName", CellValue::Str(control_name.to_string())),
        ("Time", CellValue::F64(time)),
        ("Hour", CellValue::F64((time / 3600.0) % 24.0)),
        ("AlarmStatus", CellValue::Str(event.status.to_string())),
        ("AlarmSeverity", CellValue::Str(event.severity.to_string())),
        ("Value", CellValue::F64(value)),
        ("RelatedValue", CellValue::Str(event.related_value.clone().unwrap_or_default())),
        ("Duration", CellValue::F64(duration)),
        ("PreviousRow", CellValue::I64(previous_row)),
    ])?;
    Ok(())
}
