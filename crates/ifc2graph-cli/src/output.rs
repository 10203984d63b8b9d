//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use ifc2graph_core::{GenerationReport, NodeRole, ProgressSink, Stage, ValidationReport};
use ifc2graph_graph::queries::{ChildNode, ModelSummary, RoleCounts};
use ifc2graph_graph::GraphCounts;

/// Progress bars for the generation stages, one at a time.
#[derive(Default)]
pub struct StageBars {
    current: Mutex<Option<ProgressBar>>,
}

impl StageBars {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>6.bold} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

impl ProgressSink for StageBars {
    fn start(&self, stage: Stage, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_prefix(stage.to_string());
        *self.current.lock() = Some(bar);
    }

    fn advance(&self, _stage: Stage, done: usize) {
        if let Some(bar) = self.current.lock().as_ref() {
            bar.set_position(done as u64);
        }
    }

    fn finish(&self, _stage: Stage) {
        if let Some(bar) = self.current.lock().take() {
            bar.finish();
        }
    }
}

pub fn role_colored(role: &str) -> ColoredString {
    match role {
        "PrimaryNode" => role.blue(),
        "ConnectionNode" => role.green(),
        "SecondaryNode" => role.yellow(),
        other => other.normal(),
    }
}

pub fn print_generation_report(report: &GenerationReport, dry_run: bool) {
    let heading = if dry_run { "Dry run complete" } else { "Generation complete" };
    println!("\n{}", heading.green().bold());
    println!("{}", "─".repeat(50));
    println!("  Label:              {}", report.label.as_str().cyan());
    println!("  Nodes:              {}", report.nodes);
    println!("  Edges:              {}", report.edges);
    if report.recovered_edges > 0 {
        println!("  Recovered edges:    {}", report.recovered_edges.to_string().yellow());
    }
    if report.skipped_elements > 0 {
        println!("  Skipped elements:   {}", report.skipped_elements.to_string().yellow());
    }
    if report.purged_nodes > 0 {
        println!("  Replaced nodes:     {}", report.purged_nodes.to_string().yellow());
    }
    println!("  Write commands:     {}", report.log.len());
    if let Some(validation) = &report.validation {
        print_validation(validation);
    }
    println!("{}", "─".repeat(50));
}

pub fn print_validation(report: &ValidationReport) {
    let verdict = if report.passed() {
        "passed".green().bold()
    } else {
        format!("failed (off by {})", report.difference()).red().bold()
    };
    println!("  Validation:         {}", verdict);
    println!("    Entities:         {}", report.entity_count);
    println!("    Nodes:            {}", report.node_count);
}

pub fn print_models(models: &[ModelSummary]) {
    if models.is_empty() {
        println!("{}", "No generated models found.".dimmed());
        return;
    }

    println!("{:<28} {:>10}", "Label", "Nodes");
    println!("{}", "─".repeat(40));
    for model in models {
        println!("{:<28} {:>10}", model.label.cyan(), model.nodes);
    }
}

pub fn print_totals(counts: &GraphCounts) {
    println!("{}", "─".repeat(40));
    println!("  Database nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Database relationships: {}", counts.relationships.to_string().cyan());
}

pub fn print_role_counts(label: &str, counts: &RoleCounts) {
    println!("{} {}", "Model".bold(), label.cyan());
    println!("{}", "─".repeat(40));
    for (role, count) in [
        (NodeRole::PrimaryNode, counts.primary),
        (NodeRole::ConnectionNode, counts.connection),
        (NodeRole::SecondaryNode, counts.secondary),
    ] {
        println!("  {:<16} {:>8}", role_colored(role.label()), count);
    }
    println!("  {:<16} {:>8}", "Nodes".bold(), counts.nodes());
    println!("  {:<16} {:>8}", "Edges".bold(), counts.edges);
    println!("{}", "─".repeat(40));
}

pub fn print_children(p21_id: u64, children: &[ChildNode]) {
    if children.is_empty() {
        println!("{}", format!("#{p21_id} has no outgoing edges.").dimmed());
        return;
    }

    println!("{} #{}", "Children of".bold(), p21_id);
    println!("{}", "─".repeat(50));
    for child in children {
        let position = child.list_item.map(|i| format!("[{i}]")).unwrap_or_default();
        println!(
            "  {}{} {} #{} {}",
            child.rel_type.yellow(),
            position.dimmed(),
            "→".dimmed(),
            child.p21_id,
            child.entity_type.cyan()
        );
    }
}
