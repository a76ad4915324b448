//! Markdown and JSON report generation.
//!
//! Each variable renders as a heading, a box summary table and a
//! histogram table with a text bar for the `All` series.

use crate::analysis::{BoxSummary, Distribution};
use crate::models::{Report, ReportMetadata, ReportSection};
use anyhow::Result;

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 40;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# citeview Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for (i, section) in report.sections.iter().enumerate() {
        output.push_str(&generate_section(i + 1, section));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Task data:** `{}`\n", metadata.task_data));
    section.push_str(&format!("- **User data:** `{}`\n", metadata.user_data));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Citation Design:** {}\n",
        list_or_none(&metadata.citation_design)
    ));
    section.push_str(&format!(
        "- **Context Stakeness:** {}\n",
        list_or_none(&metadata.context_stakeness)
    ));
    section.push_str(&format!(
        "- **Source Reliability:** {}\n",
        list_or_none(&metadata.source_reliability)
    ));
    match metadata.method {
        Some(method) => section.push_str(&format!(
            "- **Group by:** {} ({})\n",
            metadata.grouping, method
        )),
        None => section.push_str(&format!("- **Group by:** {}\n", metadata.grouping)),
    }
    section.push_str(&format!("- **Split by:** {}\n", metadata.split_by));
    section.push_str(&format!(
        "- **Task rows:** {} loaded, {} after filtering, {} analyzed\n",
        metadata.task_rows_loaded, metadata.task_rows_filtered, metadata.task_rows_analyzed
    ));
    section.push_str(&format!("- **Participants:** {}\n", metadata.participants));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for (i, section) in report.sections.iter().enumerate() {
        let heading = section_heading(i + 1, section);
        toc.push_str(&format!("- [{}](#{})\n", heading, anchor(&heading)));
        for dist in &section.distributions {
            let heading = distribution_heading(dist);
            toc.push_str(&format!("  - [{}](#{})\n", heading, anchor(&heading)));
        }
    }

    toc.push('\n');

    toc
}

fn section_heading(number: usize, section: &ReportSection) -> String {
    format!("{}. {}", roman(number), section.title)
}

fn distribution_heading(dist: &Distribution) -> String {
    format!("{} ({})", dist.label, dist.column)
}

fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}

fn roman(number: usize) -> &'static str {
    match number {
        1 => "I",
        2 => "II",
        3 => "III",
        4 => "IV",
        _ => "V",
    }
}

/// Generate one section of distributions.
fn generate_section(number: usize, section: &ReportSection) -> String {
    let mut output = String::new();

    output.push_str(&format!("## {}\n\n", section_heading(number, section)));

    if section.distributions.is_empty() {
        output.push_str("No variables selected.\n\n");
        return output;
    }

    for dist in &section.distributions {
        output.push_str(&generate_distribution_block(dist));
    }

    output
}

/// Generate the block for a single variable.
fn generate_distribution_block(dist: &Distribution) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", distribution_heading(dist)));
    block.push_str(&format!(
        "*Kind: {} | Values: {} | Missing: {}*\n\n",
        dist.kind,
        dist.total(),
        dist.missing
    ));

    if dist.bins.is_empty() {
        block.push_str("No values to display.\n\n---\n\n");
        return block;
    }

    let summaries: Vec<_> = dist
        .series
        .iter()
        .filter_map(|s| s.summary.as_ref().map(|summary| (&s.name, summary)))
        .collect();
    if !summaries.is_empty() {
        block.push_str("| Series | n | Min | Q1 | Median | Q3 | Max | Mean |\n");
        block.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|\n");
        for (name, summary) in summaries {
            block.push_str(&summary_row(name, summary));
        }
        block.push('\n');
    }

    block.push_str(&histogram_table(dist));
    block.push_str("---\n\n");

    block
}

fn summary_row(name: &str, s: &BoxSummary) -> String {
    format!(
        "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
        name, s.n, s.min, s.q1, s.median, s.q3, s.max, s.mean
    )
}

fn histogram_table(dist: &Distribution) -> String {
    let mut table = String::new();

    let names: Vec<&str> = dist.series.iter().map(|s| s.name.as_str()).collect();
    table.push_str(&format!("| Bin | {} | |\n", names.join(" | ")));
    table.push_str(&format!("|:---|{}:---|\n", "---:|".repeat(names.len())));

    let peak = dist
        .series
        .first()
        .and_then(|s| s.counts.iter().max().copied())
        .unwrap_or(0);

    for (i, bin) in dist.bins.iter().enumerate() {
        let counts: Vec<String> = dist
            .series
            .iter()
            .map(|s| s.counts[i].to_string())
            .collect();
        let all = dist.series.first().map_or(0, |s| s.counts[i]);
        table.push_str(&format!(
            "| {} | {} | `{}` |\n",
            bin.label,
            counts.join(" | "),
            bar(all, peak)
        ));
    }
    table.push('\n');

    table
}

fn bar(count: usize, peak: usize) -> String {
    if peak == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH + peak - 1) / peak;
    "#".repeat(len)
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by citeview*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::distribution::{Bin, Series};
    use crate::catalog::Level;
    use crate::data::ColumnKind;
    use crate::models::{AggMethod, Grouping, SplitBy};
    use chrono::Utc;

    fn create_test_metadata() -> ReportMetadata {
        ReportMetadata {
            task_data: "0_final_data.csv".to_string(),
            user_data: "0_final_user_data.csv".to_string(),
            analysis_date: Utc::now(),
            citation_design: vec!["Icon".to_string(), "Domain".to_string()],
            context_stakeness: vec![],
            source_reliability: vec!["Original".to_string()],
            grouping: Grouping::Participant,
            method: Some(AggMethod::Median),
            split_by: SplitBy::CitationDesign,
            task_rows_loaded: 120,
            task_rows_filtered: 40,
            task_rows_analyzed: 20,
            participants: 60,
            duration_seconds: 0.2,
        }
    }

    fn create_test_distribution() -> Distribution {
        Distribution {
            label: "Number of clicks".to_string(),
            column: "n_clicks".to_string(),
            kind: ColumnKind::Numeric,
            split_by: SplitBy::CitationDesign,
            missing: 1,
            bins: vec![
                Bin {
                    label: "0.000-5.000".to_string(),
                    lower: Some(0.0),
                    upper: Some(5.0),
                },
                Bin {
                    label: "5.000-10.000".to_string(),
                    lower: Some(5.0),
                    upper: Some(10.0),
                },
            ],
            series: vec![
                Series {
                    name: "All".to_string(),
                    counts: vec![4, 2],
                    summary: BoxSummary::compute(&[0.0, 1.0, 2.0, 4.0, 6.0, 10.0]),
                },
                Series {
                    name: "icon".to_string(),
                    counts: vec![4, 0],
                    summary: BoxSummary::compute(&[0.0, 1.0, 2.0, 4.0]),
                },
            ],
        }
    }

    fn create_test_report() -> Report {
        Report {
            metadata: create_test_metadata(),
            sections: vec![
                ReportSection {
                    title: "Task level (dependent) variables".to_string(),
                    level: Level::Task,
                    distributions: vec![create_test_distribution()],
                },
                ReportSection {
                    title: "Survey".to_string(),
                    level: Level::Survey,
                    distributions: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# citeview Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## I. Task level (dependent) variables"));
        assert!(markdown.contains("### Number of clicks (n_clicks)"));
        assert!(markdown.contains("## II. Survey"));
        assert!(markdown.contains("No variables selected."));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&create_test_metadata());

        assert!(section.contains("Icon, Domain"));
        assert!(section.contains("**Context Stakeness:** (none)"));
        assert!(section.contains("User (median)"));
        assert!(section.contains("120 loaded, 40 after filtering, 20 analyzed"));
    }

    #[test]
    fn test_generate_distribution_block() {
        let block = generate_distribution_block(&create_test_distribution());

        assert!(block.contains("*Kind: numeric | Values: 6 | Missing: 1*"));
        assert!(block.contains("| Bin | All | icon | |"));
        assert!(block.contains("| All | 6 |"));
        assert!(block.contains(&format!("`{}`", "#".repeat(BAR_WIDTH))));
        assert!(block.contains(&format!("| 5.000-10.000 | 2 | 0 | `{}` |", "#".repeat(20))));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(
            anchor("Number of clicks (n_clicks)"),
            "number-of-clicks-n_clicks"
        );
        assert_eq!(anchor("I. Survey"), "i-survey");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"sections\""));
        assert!(json.contains("\"n_clicks\""));
        assert!(json.contains("\"split_by\": \"citation_design\""));
    }
}
