//! Drive the adapter over a fixed host time grid, the way a host engine would.

use std::io::Write;

use mh_abi::ModelLoader;
use mh_core::Role;
use mh_host::{Adapter, HostBridge};
use tracing::info;

use crate::error::CliResult;
use crate::scenario::{InstanceSpec, Scenario};

/// Host arrays of one instance.
struct Slot<'a> {
    spec: &'a InstanceSpec,
    xdata: Vec<f64>,
    xout: Vec<f64>,
    xvar: Vec<f64>,
}

/// Run `scenario` and write recorded outputs as CSV to `out`.
///
/// Returns the number of rows written.
pub fn run<L, B, W>(scenario: &Scenario, adapter: &mut Adapter<L, B>, out: &mut W) -> CliResult<usize>
where
    L: ModelLoader,
    B: HostBridge,
    W: Write,
{
    let mut slots = Vec::with_capacity(scenario.instances.len());
    for spec in &scenario.instances {
        spec.instance_id()?;
        let mut slot = Slot {
            spec,
            xdata: spec.xdata(scenario),
            xout: vec![0.0; spec.initial_outputs.len()],
            xvar: vec![0.0; spec.state_slots],
        };
        adapter.init(&slot.xdata, &spec.xin(0.0, true), &mut slot.xout, &mut slot.xvar)?;
        slots.push(slot);
    }

    write_header(adapter, &slots, out)?;
    let steps = scenario.step_count();
    let mut rows = 0;
    for k in 0..=steps {
        let t = k as f64 * scenario.host_step;
        for slot in &mut slots {
            adapter.exec(&slot.xdata, &slot.spec.xin(t, false), &mut slot.xout, &mut slot.xvar)?;
        }
        if k % scenario.record_every == 0 || k == steps {
            write_row(t, &slots, out)?;
            rows += 1;
        }
    }

    let leftover = adapter.shutdown();
    info!(steps, rows, cleaned = leftover.len(), "run finished");
    Ok(rows)
}

fn write_header<L: ModelLoader, B: HostBridge, W: Write>(
    adapter: &Adapter<L, B>,
    slots: &[Slot<'_>],
    out: &mut W,
) -> CliResult<()> {
    let mut columns = vec!["t".to_string()];
    for slot in slots {
        let names: Vec<String> = adapter
            .arena()
            .and_then(|arena| slot.spec.instance_id().ok().and_then(|id| arena.get(id).ok()))
            .and_then(|instance| instance.buffer(Role::Outputs))
            .map(|buffer| buffer.layout().slots().iter().map(|s| s.name.clone()).collect())
            .unwrap_or_else(|| (0..slot.xout.len()).map(|i| format!("out{i}")).collect());
        columns.extend(names.iter().map(|name| format!("{}.{name}", slot.spec.id)));
    }
    writeln!(out, "{}", columns.join(","))?;
    Ok(())
}

fn write_row<W: Write>(t: f64, slots: &[Slot<'_>], out: &mut W) -> CliResult<()> {
    let mut line = format!("{t}");
    for slot in slots {
        for value in &slot.xout {
            line.push_str(&format!(",{value}"));
        }
    }
    writeln!(out, "{line}")?;
    Ok(())
}
