//! Human-readable calculation memory.
//!
//! A pure, order-preserving formatter over an already-computed result.
//! The single source of truth is the canonical `ExecutionResult`; no
//! calculation, model reading or validation happens here.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::audit::DecisionExcerpt;
use crate::interpreter::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Text,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: ReportFormat,
    /// Number nodes as `parent.child` under the first already-numbered
    /// dependency instead of a flat sequence.
    pub hierarchical_numbering: bool,
    pub title: String,
    /// Execution timestamp from the persisted record, when available.
    /// The renderer itself never reads a clock.
    pub executed_at: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Markdown,
            hierarchical_numbering: false,
            title: "Memoria de Calculo".to_string(),
            executed_at: None,
        }
    }
}

/// Renders the calculation memory for one execution, walking the trail
/// in evaluation order.
pub fn render_calculation_memory(
    result: &ExecutionResult,
    decisions: Option<&BTreeMap<String, DecisionExcerpt>>,
    options: &ReportOptions,
) -> String {
    let mut out = String::new();
    let format = options.format;

    push_title(&mut out, format, &options.title);
    if let Some(executed_at) = &options.executed_at {
        let _ = writeln!(out, "Data da execucao: {executed_at}");
    }
    let _ = writeln!(out, "No raiz avaliado: {}", result.root_id);
    out.push('\n');

    push_subtitle(&mut out, format, "Detalhamento do calculo");

    let mut number_of: BTreeMap<&str, String> = BTreeMap::new();
    let mut children_of: BTreeMap<&str, usize> = BTreeMap::new();

    for (position, (id, node)) in result.trail.iter().enumerate() {
        let sequence = position + 1;
        let description = node
            .legal_metadata
            .description
            .clone()
            .unwrap_or_else(|| humanize(id));

        let number = if options.hierarchical_numbering && !node.dependencies.is_empty() {
            let parent = node
                .dependencies
                .iter()
                .find(|dep| number_of.contains_key(dep.as_str()));
            match parent {
                Some(parent) => {
                    let count = children_of.entry(parent.as_str()).or_insert(0);
                    *count += 1;
                    format!("{}.{}", number_of[parent.as_str()], count)
                }
                None => sequence.to_string(),
            }
        } else {
            sequence.to_string()
        };
        number_of.insert(id, number.clone());

        match format {
            ReportFormat::Markdown => {
                let _ = writeln!(out, "### {number}. {description}");
            }
            ReportFormat::Text => {
                let _ = writeln!(out, "\n{number}. {}", description.to_uppercase());
            }
        }

        if !node.dependencies.is_empty() {
            let considered: Vec<String> = node
                .dependencies
                .iter()
                .map(|dep| match result.evaluated_nodes.get(dep) {
                    Some(evaluated) => {
                        format!("{dep} ({})", format_for(dep, evaluated.computed_value))
                    }
                    None => dep.clone(),
                })
                .collect();
            let _ = writeln!(out, "- Dependencias consideradas: {}", considered.join(", "));
        }

        if let Some(excerpt) = decisions.and_then(|map| map.get(id)) {
            if let Some(entry) = &excerpt.entry {
                let _ = writeln!(out, "- Origem: {}", entry.origin);
                if let Some(reference) = &entry.documentary_reference {
                    let _ = writeln!(out, "- Referencia documental: {reference}");
                }
            }
        }

        let label = if node.dependencies.is_empty() {
            "Valor adotado"
        } else {
            "Valor calculado"
        };
        let _ = writeln!(out, "- {label}: {}", format_for(id, node.computed_value));

        if let Some(basis) = &node.legal_metadata.legal_basis {
            let _ = writeln!(out, "- Fundamento legal: {basis}");
        }
        if let Some(notes) = &node.legal_metadata.notes {
            let _ = writeln!(out, "- Observacoes: {notes}");
        }
        out.push('\n');
    }

    push_subtitle(&mut out, format, "Resultado final");
    let _ = writeln!(
        out,
        "Valor total apurado: {}",
        format_currency(result.final_value)
    );

    out
}

fn push_title(out: &mut String, format: ReportFormat, text: &str) {
    match format {
        ReportFormat::Markdown => {
            let _ = writeln!(out, "# {text}");
        }
        ReportFormat::Text => {
            let _ = writeln!(out, "{text}");
            let _ = writeln!(out, "{}", "=".repeat(text.chars().count()));
        }
    }
}

fn push_subtitle(out: &mut String, format: ReportFormat, text: &str) {
    match format {
        ReportFormat::Markdown => {
            let _ = writeln!(out, "## {text}");
        }
        ReportFormat::Text => {
            let _ = writeln!(out, "\n{}", text.to_uppercase());
            let _ = writeln!(out, "{}", "-".repeat(text.chars().count()));
        }
    }
}

/// Percentage ids render as percentages, everything else as currency.
fn format_for(id: &str, value: f64) -> String {
    if id.starts_with("percentual_") {
        format_percent(value)
    } else {
        format_currency(value)
    }
}

/// Brazilian currency layout: dot for thousands, comma for cents.
fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("R$ {sign}{grouped},{cents}")
}

fn format_percent(value: f64) -> String {
    format!("{:.2}", value * 100.0).replace('.', ",") + "%"
}

fn humanize(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
