// SPDX-License-Identifier: Apache-2.0

//! Process-variable save/restore: a one-shot save, a one-shot
//! restore, or a daemon that saves on a channel- or signal-triggered
//! cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use daq_apps::{set_up, CommonArgs, RunGuard};
use daq_channel::{BindingId, ChannelProvider, FieldKind, RawValue};
use daq_snapshot::{
    acknowledge_trigger, build_table, build_waveform_sidecar, current_input_filename, poll_trigger,
    publish_output_name, restore, save, DaemonConfig, RunMetadata, ScalarKind, SnapshotRow,
};
use daq_table::{ColumnData, Table};

/// CA pend-I/O bound recorded in a snapshot's `PendIOTime` parameter.
/// A configured ceiling, not a measured duration.
const DEFAULT_PEND_IO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "pv-saverestore")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connects to every channel in the request file and writes one
    /// snapshot.
    Save(SaveArgs),
    /// Connects to every channel in the request file and puts the
    /// values recorded in an existing snapshot.
    Restore(RestoreArgs),
    /// Runs indefinitely, saving a fresh snapshot whenever the trigger
    /// channel goes non-zero or a recorded signal arrives.
    Daemon(DaemonArgs),
}

#[derive(Debug, Parser)]
struct SaveArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Free-text description recorded in the snapshot's Description
    /// parameter.
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Debug, Parser)]
struct RestoreArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Re-reads each channel after the put and reports mismatches.
    #[arg(long)]
    verify: bool,
}

#[derive(Debug, Parser)]
struct DaemonArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Control name of the channel that starts a save cycle when it
    /// goes non-zero.
    #[arg(long)]
    trigger: String,

    /// Control name of a string channel the written filename is
    /// published back to.
    #[arg(long)]
    output_name_channel: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    match Cli::parse().command {
        Command::Save(args) => run_save(&args),
        Command::Restore(args) => run_restore(&args),
        Command::Daemon(args) => run_daemon(&args),
    }
}

fn scalar_kinds(pipeline: &daq_apps::Pipeline) -> HashMap<BindingId, ScalarKind> {
    pipeline
        .bindings
        .iter()
        .filter_map(|b| match &b.field_kind {
            Some(FieldKind::NumericScalar { labels: Some(labels) }) => Some((
                b.id,
                ScalarKind::Enumerated {
                    labels: labels.clone(),
                    numerical: false,
                },
            )),
            Some(FieldKind::NumericScalar { labels: None }) => Some((b.id, ScalarKind::Double)),
            _ => None,
        })
        .collect()
}

fn sidecar_path(output: &Path, pv_name: &str) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("snapshot");
    let extension = output.extension().and_then(|s| s.to_str()).unwrap_or("daq");
    output.with_file_name(format!("{stem}_{pv_name}.{extension}"))
}

fn run_save(args: &SaveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let connect_start = Instant::now();
    let mut pipeline = set_up(&args.common)?;
    let connect_duration = connect_start.elapsed();

    let save_start = Instant::now();
    let kinds = scalar_kinds(&pipeline);
    let set = save(&mut pipeline.provider, &pipeline.bindings, &kinds)?;
    let save_duration = save_start.elapsed();

    let metadata = RunMetadata {
        login_id: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
        effective_uid: 0,
        group_id: "daq".to_string(),
        save_time_unix: unix_seconds_now(),
        connect_duration,
        save_duration,
        pend_io_time: DEFAULT_PEND_IO_TIMEOUT,
        request_file: args.common.request.display().to_string(),
        snapshot_filename: args.common.output.display().to_string(),
        description: args.description.clone(),
    };

    let table = build_table(&set, &metadata);
    table.store(&args.common.output)?;
    tracing::info!(rows = set.rows.len(), waveforms = set.waveforms.len(), "snapshot saved");

    for waveform in &set.waveforms {
        let sidecar = sidecar_path(&args.common.output, &waveform.pv_name);
        build_waveform_sidecar(waveform, metadata.save_time_unix).store(&sidecar)?;
    }

    Ok(())
}

fn run_restore(args: &RestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = set_up(&args.common)?;
    let loaded = Table::load(&args.common.output)?;
    let rows = load_snapshot_rows(&loaded)?;

    let (scalar_rows, waveform_rows): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|r| r.indirect_name == "-");

    let report = restore(&mut pipeline.provider, &pipeline.bindings, &scalar_rows, args.verify)?;
    tracing::info!(restored = report.restored.len(), "scalars restored");
    for failure in &report.verify_failures {
        tracing::warn!(
            channel = failure.control_name,
            expected = failure.expected,
            actual = failure.actual,
            "restore verification mismatch"
        );
    }

    for row in &waveform_rows {
        let Some(id) = pipeline.bindings.by_name(&row.indirect_name) else {
            continue;
        };
        let sidecar = sidecar_path(&args.common.output, &row.indirect_name);
        let Ok(sidecar_table) = Table::load(&sidecar) else {
            tracing::warn!(pv = row.indirect_name, "waveform sidecar missing, skipped");
            continue;
        };
        let Some(page) = sidecar_table.pages.first() else {
            continue;
        };
        let value = match page.column("Waveform")? {
            ColumnData::F64(v) => RawValue::NumericWaveform(v.clone()),
            ColumnData::Str(v) => RawValue::StringWaveform(v.clone()),
            _ => continue,
        };
        pipeline.provider.put(id, value)?;
    }

    Ok(())
}

fn run_daemon(args: &DaemonArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = set_up(&args.common)?;
    let trigger_binding = pipeline
        .bindings
        .by_name(&args.trigger)
        .ok_or_else(|| format!("trigger channel '{}' is not in the request file", args.trigger))?;
    let output_name_binding = args
        .output_name_channel
        .as_ref()
        .and_then(|name| pipeline.bindings.by_name(name));

    let config = DaemonConfig {
        trigger_binding,
        output_name_binding,
        input_filename_binding: None,
    };

    let poll = Duration::from_secs_f64(args.common.period_secs.max(0.01));
    let mut cycle: u64 = 0;
    let mut run = RunGuard::new(&args.common, &pipeline.bindings, &mut pipeline.provider)?;

    let reason = loop {
        let callbacks = pipeline.provider.pend_event(poll);
        for cb in &callbacks {
            daq_channel::connect::apply_callback(&mut pipeline.bindings, cb);
        }

        if let Some(cause) = poll_trigger(&mut pipeline.provider, &config)? {
            tracing::info!(?cause, cycle, "save cycle triggered");
            let kinds = scalar_kinds(&pipeline);
            let set = save(&mut pipeline.provider, &pipeline.bindings, &kinds)?;
            let cycle_path = cycle_output_path(&args.common.output, cycle);
            let metadata = RunMetadata {
                login_id: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
                effective_uid: 0,
                group_id: "daq".to_string(),
                save_time_unix: unix_seconds_now(),
                connect_duration: Duration::ZERO,
                save_duration: Duration::ZERO,
                pend_io_time: DEFAULT_PEND_IO_TIMEOUT,
                request_file: args.common.request.display().to_string(),
                snapshot_filename: cycle_path.display().to_string(),
                description: String::new(),
            };
            build_table(&set, &metadata).store(&cycle_path)?;
            for waveform in &set.waveforms {
                let sidecar = sidecar_path(&cycle_path, &waveform.pv_name);
                build_waveform_sidecar(waveform, metadata.save_time_unix).store(&sidecar)?;
            }
            publish_output_name(&mut pipeline.provider, &config, &cycle_path)?;
            acknowledge_trigger(&mut pipeline.provider, &config)?;
            cycle += 1;
        }

        let _ = current_input_filename(&mut pipeline.provider, &config)?;

        run.advance_tick();
        if let Some(reason) = run.check(&mut pipeline.provider)? {
            break reason;
        }
    };

    tracing::info!(%reason, "stopping");
    run.finish(&mut pipeline.provider, reason);
    Ok(())
}

fn cycle_output_path(output: &Path, cycle: u64) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("snapshot");
    let extension = output.extension().and_then(|s| s.to_str()).unwrap_or("daq");
    output.with_file_name(format!("{stem}_{cycle:06}.{extension}"))
}

fn load_snapshot_rows(table: &Table) -> Result<Vec<SnapshotRow>, Box<dyn std::error::Error>> {
    let Some(page) = table.pages.first() else {
        return Ok(Vec::new());
    };
    let ColumnData::Str(names) = page.column("ControlName")? else {
        return Err("snapshot file's ControlName column is not a string column".into());
    };
    let ColumnData::Str(values) = page.column("ValueString")? else {
        return Err("snapshot file's ValueString column is not a string column".into());
    };
    let indirect: Vec<String> = match page.column("IndirectName") {
        Ok(ColumnData::Str(v)) => v.clone(),
        _ => vec!["-".to_string(); names.len()],
    };
    let count: Vec<i64> = match page.column("Count") {
        Ok(ColumnData::I64(v)) => v.clone(),
        _ => vec![1; names.len()],
    };

    Ok(names
        .iter()
        .zip(values.iter())
        .zip(indirect.iter())
        .zip(count.iter())
        .map(|(((name, value), indirect), count)| SnapshotRow {
            control_name: name.clone(),
            value_string: value.clone(),
            indirect_name: indirect.clone(),
            count: (*count).max(1) as u32,
        })
        .collect())
}

fn unix_seconds_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
