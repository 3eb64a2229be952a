// SPDX-License-Identifier: Apache-2.0

//! Change-triggered logger: one row per binding whenever the per-binding
//! change filter accepts the callback.

use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use daq_apps::{readback_names, set_up, CommonArgs, RunGuard};
use daq_channel::ChannelProvider;
use daq_channel::{connect::apply_callback, BindingId};
use daq_core::SourceTimestamp;
use daq_dispatch::{change_filter::ChangeFilterConfig, decide, Decision, Event};
use daq_writer::{change_log_layout, CellValue, OpenMode, PreallocationPolicy, Writer};

#[derive(Debug, Parser)]
#[command(name = "change-logger")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Default tolerance for bindings whose request row left it unset.
    #[arg(long, default_value_t = 0.0)]
    default_tolerance: f64,

    #[arg(long)]
    log_initial_values: bool,

    #[arg(long)]
    append: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut pipeline = set_up(&cli.common)?;

    let tolerances: HashMap<BindingId, f64> = pipeline
        .request
        .rows
        .iter()
        .filter_map(|r| {
            pipeline
                .bindings
                .by_name(&r.control_name)
                .map(|id| (id, r.tolerance.unwrap_or(cli.default_tolerance)))
        })
        .collect();

    let readbacks = readback_names(&pipeline.bindings);
    let readback_refs: Vec<&str> = readbacks.iter().map(String::as_str).collect();

    let mode = if cli.append {
        OpenMode::Append { to_page: true }
    } else {
        OpenMode::Create
    };
    let mut writer = Writer::open(
        &cli.common.output,
        mode,
        change_log_layout(&readback_refs),
        &readback_refs,
        PreallocationPolicy { block_rows: cli.common.preallocate_rows },
        cli.common.flush_interval,
    )?;

    let config = ChangeFilterConfig {
        log_initial_values: cli.log_initial_values,
        ..Default::default()
    };
    let poll = Duration::from_secs_f64(cli.common.period_secs.max(0.01));
    let mut step: i64 = 0;
    let mut run = RunGuard::new(&cli.common, &pipeline.bindings, &mut pipeline.provider)?;

    let reason = loop {
        let callbacks = pipeline.provider.pend_event(poll);
        for cb in &callbacks {
            let Some(binding_before) = pipeline.bindings.get(cb.binding).cloned() else {
                continue;
            };
            let event = Event::from_raw(cb.binding, cb);
            let tolerance = tolerances.get(&cb.binding).copied().unwrap_or(cli.default_tolerance);
            let decision = decide(&binding_before, &event, tolerance, &config);
            apply_callback(&mut pipeline.bindings, cb);

            if decision != Decision::Emit {
                continue;
            }

            let now = SourceTimestamp::from_system_time(std::time::SystemTime::now());
            let unix = now.to_unix_seconds(0);
            let readback = binding_before.readback_name.clone().unwrap_or_else(|| binding_before.name.clone());
            let value = match &event.payload {
                daq_dispatch::Payload::Scalar(v) => *v,
                daq_dispatch::Payload::Enumerated { ordinal, .. } => *ordinal as f64,
                _ => binding_before.last_value,
            };

            writer.append_row(&[
                ("Step", CellValue::I64(step)),
                ("Time", CellValue::F64(unix)),
                ("TimeOfDay", CellValue::F64((unix / 3600.0) % 24.0)),
                ("DayOfMonth", CellValue::I64(((unix / 86_400.0) as i64) % 31 + 1)),
                ("CAerrors", CellValue::I64(0)),
                (readback.as_str(), CellValue::F64(value)),
            ])?;
            if let Some(b) = pipeline.bindings.get_mut(cb.binding) {
                b.last_row = Some(writer.total_rows() as u64);
            }
            writer.tick_flush()?;
            step += 1;
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
