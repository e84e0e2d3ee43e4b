//! CLI display utilities for plugin listings and dry runs

use crate::core::styles::StyleRole;
use crate::plugin::api::{PluginContext, PluginRegistry};
use crate::scheduler::api::DryRunEntry;
use prettytable::format::consts::FORMAT_CLEAN;
use prettytable::{Cell, Row, Table};

fn cell(text: &str, role: StyleRole, color: bool) -> Cell {
    let cell = Cell::new(text);
    match role.to_prettytable_spec().filter(|_| color) {
        Some(spec) => cell.style_spec(&spec),
        None => cell,
    }
}

fn availability(available: bool, color: bool) -> Cell {
    if available {
        cell("yes", StyleRole::Success, color)
    } else {
        cell("no", StyleRole::Unavailable, color)
    }
}

/// Table of every registered plugin, in run order
///
/// Each plugin is constructed once to answer the availability question.
pub fn plugin_table(registry: &PluginRegistry, ctx: &PluginContext, color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_CLEAN);
    table.set_titles(Row::new(
        ["Plugin", "Type", "Priority", "Available", "Depends on", "Description"]
            .iter()
            .map(|title| cell(title, StyleRole::Header, color))
            .collect(),
    ));

    for descriptor in registry.descriptors() {
        let (available, dependencies) = match descriptor.instantiate(ctx) {
            Ok(plugin) => (
                plugin.is_available(),
                plugin
                    .dependencies()
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Err(err) => (false, format!("({})", err)),
        };

        table.add_row(Row::new(vec![
            cell(&descriptor.name, StyleRole::Literal, color),
            Cell::new(&descriptor.scan_type.to_string()),
            Cell::new(&descriptor.priority.to_string()),
            availability(available, color),
            Cell::new(if dependencies.is_empty() { "-" } else { &dependencies }),
            Cell::new(&descriptor.description),
        ]));
    }
    table
}

/// Human-readable dry-run plan
pub fn render_dry_run(entries: &[DryRunEntry], target: &str, color: bool) -> String {
    if entries.is_empty() {
        return format!("No plugins selected for {}\n", target);
    }

    let mut out = format!(
        "{} {} plugin(s) against {}\n",
        StyleRole::Header.paint("Dry run:", color),
        entries.len(),
        target
    );
    for (index, entry) in entries.iter().enumerate() {
        let status = if entry.available {
            StyleRole::Success.paint("available", color)
        } else {
            StyleRole::Unavailable.paint("unavailable", color)
        };
        out.push_str(&format!(
            "\n{}. {} ({}, priority {}, {})\n",
            index + 1,
            StyleRole::Literal.paint(&entry.name, color),
            entry.scan_type,
            entry.priority,
            status
        ));
        out.push_str(&format!("   {}\n", entry.info.description));
        for dependency in &entry.dependencies {
            out.push_str(&format!("   after:   {}\n", dependency));
        }
        for command in &entry.info.commands {
            out.push_str(&format!("   command: {}\n", command));
        }
        for operation in &entry.info.operations {
            out.push_str(&format!("   then:    {}\n", operation));
        }
    }
    out
}
