//! Text (terminal) reporter with colors and formatting

use crate::models::{CategoryScore, Effort, SubScore};
use crate::pipeline::ScanReport;
use anyhow::Result;
use console::style;
use std::fmt::Write;

/// Evidence lines shown under each sub-score
const EVIDENCE_SHOWN: usize = 3;

fn score_style(score: f64) -> console::StyledObject<String> {
    let text = format!("{:>4.1}", score);
    if score >= 8.0 {
        style(text).green()
    } else if score >= 6.0 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

fn effort_style(effort: Effort) -> console::StyledObject<String> {
    let text = format!("[{}]", effort);
    match effort {
        Effort::Low => style(text).green(),
        Effort::Medium => style(text).yellow(),
        Effort::High => style(text).red(),
    }
}

/// Render report as formatted terminal output
pub fn render(report: &ScanReport) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "\n{}  {}", style("agentready").bold(), report.root.display())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    match report.scored.composite {
        Some(score) => writeln!(
            out,
            "Composite: {}/10  Tier: {}",
            style(format!("{:.1}", score)).bold(),
            style(&report.scored.tier).bold()
        )?,
        None => writeln!(out, "Composite: {}", style("not available").dim())?,
    }
    let languages: Vec<String> = report.languages.iter().map(|l| l.to_string()).collect();
    writeln!(
        out,
        "Languages: {}  Files: {} source, {} test ({} generated, {} excluded)\n",
        if languages.is_empty() {
            "none".to_string()
        } else {
            languages.join(", ")
        },
        report.files.source,
        report.files.test,
        report.files.generated,
        report.files.excluded
    )?;

    writeln!(out, "{}", style("CATEGORIES").bold())?;
    for category in &report.scored.categories {
        render_category(&mut out, report, category)?;
    }

    if !report.recommendations.is_empty() {
        writeln!(out, "\n{}", style("RECOMMENDATIONS").bold())?;
        for rec in &report.recommendations {
            writeln!(
                out,
                "  {}. {} {} {}",
                rec.rank,
                effort_style(rec.effort),
                rec.summary,
                style(format!("(+{:.2})", rec.score_improvement)).cyan()
            )?;
            writeln!(out, "     {}", style(&rec.action).dim())?;
        }
    }
    Ok(out)
}

fn render_category(out: &mut String, report: &ScanReport, category: &CategoryScore) -> Result<()> {
    if !category.is_available() {
        let reason = report
            .results
            .iter()
            .find(|r| r.category == category.category)
            .and_then(|r| r.unavailable_reason.as_deref())
            .unwrap_or("nothing to measure");
        writeln!(
            out,
            "  {}  {:<24} {}  {}",
            style(category.category.id()).bold(),
            category.name,
            style(" n/a").dim(),
            style(format!("({})", reason)).dim()
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "  {}  {:<24} {}  {}",
        style(category.category.id()).bold(),
        category.name,
        score_style(category.score),
        style(format!("weight {:.2}", category.weight)).dim()
    )?;
    for sub in &category.sub_scores {
        render_sub_score(out, sub)?;
    }
    Ok(())
}

fn render_sub_score(out: &mut String, sub: &SubScore) -> Result<()> {
    if !sub.available {
        writeln!(out, "      {:<26} {}", sub.metric, style(" n/a").dim())?;
        return Ok(());
    }
    writeln!(
        out,
        "      {:<26} {}  {}",
        sub.metric,
        score_style(sub.score),
        style(format!("raw {:.2}", sub.raw_value)).dim()
    )?;
    for item in sub.evidence.iter().take(EVIDENCE_SHOWN) {
        let location = if item.line > 0 {
            format!("{}:{}", item.file_path, item.line)
        } else {
            item.file_path.clone()
        };
        writeln!(
            out,
            "        {} {}",
            style(format!("- {}", item.description)).dim(),
            style(location).dim()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_render_sections() {
        console::set_colors_enabled(false);
        let report = test_report();
        let text = render(&report).expect("render text");

        assert!(text.contains("Composite: 6.0/10  Tier: Agent-Assisted"));
        assert!(text.contains("Files: 12 source, 4 test (1 generated, 0 excluded)"));
        assert!(text.contains("C3  Architecture"));
        assert!(text.contains("- cycle: pkg/a -> pkg/b -> pkg/c pkg/a"));
        assert!(text.contains("(bad coverage report)"));
        assert!(text.contains("1. [High] Improve circular dependencies"));
        assert!(text.contains("(+1.00)"));
    }

    #[test]
    fn test_text_render_without_composite() {
        console::set_colors_enabled(false);
        let mut report = test_report();
        report.scored.composite = None;
        report.recommendations.clear();
        let text = render(&report).expect("render text");
        assert!(text.contains("Composite: not available"));
        assert!(!text.contains("RECOMMENDATIONS"));
    }
}
