//! Nextflow configuration rendering.
//!
//! Serializes category policies into a `process { ... }` block with one
//! `withName:` selector per category. Memory is written in MB and time in
//! whole minutes; the layout is fixed so regenerated files diff cleanly.

use std::fmt::Write;

use super::{CategoryPolicy, EscalationRule, ProcessDefaults};
use crate::models::Dimension;
use crate::units::{mb_to_nf_memory, seconds_to_nf_time};

fn literal(dim: Dimension, value: f64) -> String {
    match dim {
        Dimension::Memory => mb_to_nf_memory(value.ceil() as u64),
        Dimension::WallTime => seconds_to_nf_time(value),
    }
}

fn directive(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Memory => "memory",
        Dimension::WallTime => "time",
    }
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

fn write_rule(out: &mut String, rule: &EscalationRule) {
    let _ = writeln!(
        out,
        "\t\t{} = {{ task.attempt < {} ? task.attempt * {} : {} }}",
        directive(rule.dimension),
        rule.repeats,
        literal(rule.dimension, rule.step),
        literal(rule.dimension, rule.ceiling),
    );
}

/// Renders a Nextflow config for the given policies.
///
/// ```
/// use u_allocate::models::{ClampRanges, EstimatedResources};
/// use u_allocate::policy::{render_nextflow_config, PolicyGenerator, ProcessDefaults};
///
/// let clamp = ClampRanges::none().with_memory(500.0, 1000.0);
/// let est = EstimatedResources { memory: Some(600.0), wall_time: None };
/// let policy = PolicyGenerator::new(clamp).generate_one("align", &est).unwrap();
///
/// let text = render_nextflow_config(&ProcessDefaults::default(), &[policy]);
/// assert!(text.contains("withName: 'align'"));
/// assert!(text.contains("task.attempt < 2 ? task.attempt * 600.MB : 1000.MB"));
/// ```
pub fn render_nextflow_config(defaults: &ProcessDefaults, policies: &[CategoryPolicy]) -> String {
    let statuses = defaults
        .retry_exit_statuses
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut out = String::from("process {\n");
    let _ = writeln!(out, "\tmaxRetries = {}", defaults.max_retries);
    let _ = writeln!(
        out,
        "\terrorStrategy = {{ task.exitStatus in [{statuses}] ? 'retry' : 'finish' }}"
    );
    out.push('\n');

    for policy in policies {
        let _ = writeln!(out, "\twithName: '{}' {{", escape_name(&policy.category));
        for dim in Dimension::ALL {
            if let Some(rule) = policy.rule(dim) {
                write_rule(&mut out, rule);
            }
        }
        if let Some(max_retries) = policy.max_retries {
            let _ = writeln!(out, "\t\tmaxRetries = {max_retries}");
        }
        out.push_str("\t}\n");
    }
    out.push_str("}\n");
    out
}
