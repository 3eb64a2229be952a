// SPDX-License-Identifier: Apache-2.0

//! Periodic scalar logger: one row per readback every sampling tick,
//! regardless of whether the value changed.

use std::time::Duration;

use clap::Parser;
use daq_apps::{readback_names, set_up, CommonArgs, RunGuard};
use daq_channel::ChannelProvider;
use daq_channel::connect::apply_callback;
use daq_core::SourceTimestamp;
use daq_writer::{periodic_log_layout, CellValue, OpenMode, PreallocationPolicy, Writer};

#[derive(Debug, Parser)]
#[command(name = "scalar-logger")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    append: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut pipeline = set_up(&cli.common)?;

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
        periodic_log_layout(&readback_refs),
        &readback_refs,
        PreallocationPolicy { block_rows: cli.common.preallocate_rows },
        cli.common.flush_interval,
    )?;

    let period = Duration::from_secs_f64(cli.common.period_secs.max(0.01));
    let mut step: i64 = 0;
    let ca_errors: i64 = 0;
    let mut run = RunGuard::new(&cli.common, &pipeline.bindings, &mut pipeline.provider)?;

    let reason = loop {
        let callbacks = pipeline.provider.pend_event(Duration::from_millis(0));
        for cb in &callbacks {
            apply_callback(&mut pipeline.bindings, cb);
        }

        let now = SourceTimestamp::from_system_time(std::time::SystemTime::now());
        let unix = now.to_unix_seconds(0);

        let mut values: Vec<(&str, CellValue)> = Vec::with_capacity(readback_refs.len() + 4);
        values.push(("Step", CellValue::I64(step)));
        values.push(("Time", CellValue::F64(unix)));
        values.push(("TimeOfDay", CellValue::F64((unix / 3600.0) % 24.0)));
        values.push(("DayOfMonth", CellValue::I64(((unix / 86_400.0) as i64) % 31 + 1)));
        values.push(("CAerrors", CellValue::I64(ca_errors)));

        for (binding, name) in pipeline.bindings.iter().zip(readback_refs.iter().copied()) {
            values.push((name, CellValue::F64(binding.last_value)));
        }

        writer.append_row(&values)?;
        writer.tick_flush()?;

        step += 1;
        std::thread::sleep(period);

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
