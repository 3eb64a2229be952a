// SPDX-License-Identifier: Apache-2.0

//! Scalar monitor with glitch/trigger capture: samples every
//! readback each tick, runs a glitch predicate on the first readback,
//! and writes a page per trigger via the pre/post buffer.

use std::time::Duration;

use clap::Parser;
use daq_apps::{readback_names, set_up, CommonArgs, RunGuard};
use daq_channel::ChannelProvider;
use daq_channel::connect::apply_callback;
use daq_core::SourceTimestamp;
use daq_gate::{InhibitConfig, InhibitGate};
use daq_trigger::{buffer::Sample, FiredPredicate, GlitchPredicate, HoldoffConfig, Threshold, TickOutcome, TriggerEngine};
use daq_writer::{monitor_layout, CellValue, OpenMode, PreallocationPolicy, Writer};

#[derive(Debug, Parser)]
#[command(name = "scalar-monitor")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Pre-trigger samples retained in the circular buffer.
    #[arg(long, default_value_t = 10)]
    before: usize,

    /// Post-trigger samples captured once the predicate fires.
    #[arg(long, default_value_t = 10)]
    after: usize,

    /// Fractional glitch threshold on the first readback.
    #[arg(long, default_value_t = 0.1)]
    glitch_fraction: f64,

    /// Smoothing fraction for the glitch predicate's EMA baseline.
    #[arg(long, default_value_t = 0.1)]
    glitch_filter_frac: f64,

    /// Ticks to suppress retriggering after a capture.
    #[arg(long, default_value_t = 0)]
    holdoff_ticks: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut pipeline = set_up(&cli.common)?;

    let readbacks = readback_names(&pipeline.bindings);
    let readback_refs: Vec<&str> = readbacks.iter().map(String::as_str).collect();

    let mut writer = Writer::open(
        &cli.common.output,
        OpenMode::Create,
        monitor_layout(&readback_refs, &["Glitch"]),
        &readback_refs,
        PreallocationPolicy { block_rows: cli.common.preallocate_rows },
        cli.common.flush_interval,
    )?;

    let mut engine = TriggerEngine::new(cli.before, cli.after);
    let mut glitch = GlitchPredicate::new(Threshold::Fractional(cli.glitch_fraction), cli.glitch_filter_frac);
    let mut inhibit = InhibitGate::new(InhibitConfig::default());

    let poll = Duration::from_secs_f64(cli.common.period_secs.max(0.01));
    let mut tick: u64 = 0;
    let mut run = RunGuard::new(&cli.common, &pipeline.bindings, &mut pipeline.provider)?;

    let reason = loop {
        let callbacks = pipeline.provider.pend_event(poll);
        for cb in &callbacks {
            apply_callback(&mut pipeline.bindings, cb);
        }

        let inhibit_value = pipeline.bindings.iter().find(|b| b.name == "Inhibit").map(|b| b.last_value).unwrap_or(0.0);
        if inhibit.observe(inhibit_value) {
            engine.reset_on_inhibit();
            glitch.reset_baseline();
        }

        let values: Vec<f64> = pipeline.bindings.iter().map(|b| b.last_value).collect();
        let now = SourceTimestamp::from_system_time(std::time::SystemTime::now());
        let sample = Sample { tick, time: now, values: values.clone() };

        let mut fired = Vec::new();
        if inhibit_value == 0.0 {
            if let Some(first) = values.first() {
                if glitch.evaluate(*first) {
                    fired.push(FiredPredicate {
                        name: "Glitch".to_string(),
                        holdoff: HoldoffConfig::Fixed { ticks: cli.holdoff_ticks },
                        alarm_severity: None,
                    });
                }
            }
        }

        let outcome = engine.on_tick(tick, sample, fired);
        if outcome == TickOutcome::PageReady {
            if let Some(page) = engine.take_page() {
                if writer.current_row_count() > 0 {
                    writer.start_page(cli.common.preallocate_rows);
                }
                write_page(&mut writer, &readback_refs, &page)?;
                writer.tick_flush()?;
            }
        }

        tick += 1;
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

fn write_page(
    writer: &mut Writer,
    readback_refs: &[&str],
    page: &daq_trigger::CaptureResult,
) -> Result<(), Box<dyn std::error::Error>> {
    writer.set_page_parameter("GlitchTriggered", daq_table::ParamValue::I64(page.triggered_predicates.contains(&"Glitch".to_string()) as i64))?;
    writer.set_page_parameter(
        "AlarmSeverity",
        daq_table::ParamValue::I64(page.alarm_severity.map(|s| s.ordinal() as i64).unwrap_or(0)),
    )?;

    for row in &page.rows {
        let time = row.sample.time.to_unix_seconds(0);
        let mut values: Vec<(&str, CellValue)> = vec![
            ("Step", CellValue::I64(row.sample.tick as i64)),
            ("Time", CellValue::F64(time)),
            ("PostTrigger", CellValue::I64(row.post_trigger as i64)),
        ];
        for (name, value) in readback_refs.iter().zip(row.sample.values.iter()) {
            values.push((name, CellValue::F64(*value)));
        }
        writer.append_row(&values)?;
    }
    Ok(())
}
