//! HTML report rendering with embedded Tera templates

use std::path::{Path, PathBuf};

use chrono::Local;
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use tracing::debug;

use crate::core::group::GroupKey;
use crate::core::parameter::Parameter;
use crate::core::stats::ParameterStats;
use crate::report::{format_pct, format_stat, BoxSummary, ParameterSection, ReportError, RunSummary, NOT_AVAILABLE};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const REPORT_TEMPLATE: &str = "report.html.tera";
const INDEX_TEMPLATE: &str = "index.html.tera";
pub const INDEX_FILE: &str = "index.html";

/// File name of a parameter's report
pub fn report_file_name(param: Parameter) -> String {
    format!("{}_report.html", param)
}

/// One table row, pre-formatted for display
#[derive(Debug, Clone, Serialize)]
struct RowView {
    group: String,
    count: usize,
    mean: String,
    stddev: String,
    min: String,
    max: String,
    q1: String,
    median: String,
    q3: String,
    yield_pct: String,
    cp: String,
    cpk: String,
}

impl RowView {
    fn new(group: &str, stats: &ParameterStats) -> Self {
        Self {
            group: group.to_string(),
            count: stats.count,
            mean: format_stat(stats.mean),
            stddev: format_stat(stats.stddev),
            min: format_stat(stats.min),
            max: format_stat(stats.max),
            q1: NOT_AVAILABLE.to_string(),
            median: NOT_AVAILABLE.to_string(),
            q3: NOT_AVAILABLE.to_string(),
            yield_pct: NOT_AVAILABLE.to_string(),
            cp: NOT_AVAILABLE.to_string(),
            cpk: NOT_AVAILABLE.to_string(),
        }
    }

    fn with_quartiles(mut self, summary: Option<&BoxSummary>) -> Self {
        if let Some(b) = summary {
            self.q1 = format_stat(Some(b.q1));
            self.median = format_stat(Some(b.median));
            self.q3 = format_stat(Some(b.q3));
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct NavLink {
    name: String,
    file: String,
    current: bool,
}

#[derive(Debug, Clone, Serialize)]
struct IndexEntry {
    name: String,
    file: String,
    count: usize,
    mean: String,
    yield_pct: String,
}

/// Renders report pages from the embedded templates
pub struct ReportGenerator {
    tera: Tera,
}

impl ReportGenerator {
    pub fn new() -> Result<Self, ReportError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html.tera"]);

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                let template_str = std::str::from_utf8(&content.data)
                    .map_err(|e| ReportError::Template(format!("{}: {}", filename, e)))?;
                tera.add_raw_template(filename, template_str)
                    .map_err(|e| ReportError::Template(e.to_string()))?;
            }
        }

        for required in [REPORT_TEMPLATE, INDEX_TEMPLATE] {
            if !tera.get_template_names().any(|n| n == required) {
                return Err(ReportError::Template(format!("Template not found: {}", required)));
            }
        }

        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, ReportError> {
        // Tera hides the useful part of the message in the error source chain
        self.tera.render(name, context).map_err(|e| {
            let mut message = e.to_string();
            let mut source = std::error::Error::source(&e);
            while let Some(inner) = source {
                message.push_str(": ");
                message.push_str(&inner.to_string());
                source = inner.source();
            }
            ReportError::Template(message)
        })
    }

    /// Render the page for one parameter
    ///
    /// `siblings` are every parameter in the run, used for the selector.
    pub fn render_report(
        &self,
        section: &ParameterSection,
        group_by: GroupKey,
        siblings: &[Parameter],
        summary: &RunSummary,
    ) -> Result<String, ReportError> {
        let rows: Vec<RowView> = section
            .stats
            .iter()
            .map(|row| {
                let mut view =
                    RowView::new(&row.group, &row.stats).with_quartiles(section.quartiles_for(&row.group));
                if let Some(y) = section.yield_for(&row.group) {
                    view.yield_pct = format_pct(y.yield_pct);
                }
                if let Some(c) = section.capability_for(&row.group) {
                    view.cp = format_stat(c.cp);
                    view.cpk = format_stat(c.cpk);
                }
                view
            })
            .collect();

        let mut overall =
            RowView::new("Overall", &section.overall).with_quartiles(section.overall_quartiles.as_ref());
        overall.yield_pct = format_pct(section.overall_yield());

        let nav: Vec<NavLink> = siblings
            .iter()
            .map(|p| NavLink {
                name: p.to_string(),
                file: report_file_name(*p),
                current: *p == section.parameter,
            })
            .collect();

        // JSON goes inside a <script> element
        let figure = section
            .chart
            .as_ref()
            .map(|chart| serde_json::to_string(&chart.figure()))
            .transpose()?
            .map(|json| json.replace("</", "<\\/"));

        let mut context = tera::Context::new();
        context.insert("parameter", section.parameter.as_str());
        context.insert("unit", section.parameter.unit());
        context.insert("group_label", group_by.label());
        context.insert("rows", &rows);
        context.insert("overall", &overall);
        context.insert("has_data", &section.has_data());
        context.insert("has_limits", &section.has_limits());
        context.insert("lsl", &format_stat(section.limits.lower));
        context.insert("usl", &format_stat(section.limits.upper));
        context.insert("nav", &nav);
        context.insert("show_index", &(siblings.len() > 1));
        context.insert("figure", &figure);
        context.insert("summary", summary);
        context.insert("timestamp", &Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        self.render(REPORT_TEMPLATE, &context)
    }

    /// Render the index page linking every parameter report
    pub fn render_index(&self, sections: &[ParameterSection], summary: &RunSummary) -> Result<String, ReportError> {
        let entries: Vec<IndexEntry> = sections
            .iter()
            .map(|s| IndexEntry {
                name: s.parameter.to_string(),
                file: report_file_name(s.parameter),
                count: s.overall.count,
                mean: format_stat(s.overall.mean),
                yield_pct: if s.has_limits() {
                    format_pct(s.overall_yield())
                } else {
                    NOT_AVAILABLE.to_string()
                },
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("entries", &entries);
        context.insert("summary", summary);
        context.insert("timestamp", &Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        self.render(INDEX_TEMPLATE, &context)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    std::fs::write(path, content).map_err(|e| ReportError::io(path, e))
}

/// Write one report per section, plus `index.html` when there are several
pub fn write_html(
    sections: &[ParameterSection],
    group_by: GroupKey,
    summary: &RunSummary,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ReportError::io(output_dir, e))?;
    let generator = ReportGenerator::new()?;
    let siblings: Vec<Parameter> = sections.iter().map(|s| s.parameter).collect();

    let mut written = Vec::with_capacity(sections.len() + 1);
    for section in sections {
        let html = generator.render_report(section, group_by, &siblings, summary)?;
        let path = output_dir.join(report_file_name(section.parameter));
        write_file(&path, &html)?;
        debug!(path = %path.display(), "wrote report");
        written.push(path);
    }

    if sections.len() > 1 {
        let html = generator.render_index(sections, summary)?;
        let path = output_dir.join(INDEX_FILE);
        write_file(&path, &html)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::limits::SpecLimits;
    use crate::core::parameter::ParameterSelection;
    use crate::core::record::RawRecord;
    use tempfile::tempdir;

    fn sections() -> Vec<ParameterSection> {
        let records = vec![
            RawRecord::new("L1", "W01", "1").with_value(Parameter::Bvdss1, 650.2),
            RawRecord::new("L1", "W01", "2").with_value(Parameter::Bvdss1, 651.8),
            RawRecord::new("L2", "W02", "1").with_value(Parameter::Bvdss1, 648.0),
        ];
        let selection = ParameterSelection::Many(vec![Parameter::Bvdss1, Parameter::Vth]);
        let agg = aggregate(&records, &selection, GroupKey::LotNumber);
        vec![
            ParameterSection::build(&agg, Parameter::Bvdss1, SpecLimits::new(Some(649.0), Some(700.0))),
            ParameterSection::build(&agg, Parameter::Vth, SpecLimits::default()),
        ]
    }

    #[test]
    fn test_report_contents() {
        let sections = sections();
        let generator = ReportGenerator::new().unwrap();
        let html = generator
            .render_report(&sections[0], GroupKey::LotNumber, &[Parameter::Bvdss1, Parameter::Vth], &RunSummary::default())
            .unwrap();

        assert!(html.contains("BVDSS1"));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("651.0000"));
        assert!(html.contains("1.1314"));
        // L2 has a single value so its standard deviation is undefined
        assert!(html.contains("N/A"));
        assert!(html.contains("VTH_report.html"));
        assert!(html.contains("Cpk"));
        assert!(html.contains("66.67%"));
    }

    #[test]
    fn test_overall_row_and_quartiles() {
        let sections = sections();
        let html = ReportGenerator::new()
            .unwrap()
            .render_report(&sections[0], GroupKey::LotNumber, &[Parameter::Bvdss1], &RunSummary::default())
            .unwrap();

        assert!(html.contains("<th>Median</th>"));
        // Overall Q1 of 648.0, 650.2, 651.8
        assert!(html.contains("<td>649.1000</td>"));
        assert!(html.contains("<td>66.67%</td><td>N/A</td><td>N/A</td>"));
        assert!(!html.contains("<td></td>"));
    }

    #[test]
    fn test_empty_parameter_has_notice() {
        let sections = sections();
        let generator = ReportGenerator::new().unwrap();
        let html = generator
            .render_report(&sections[1], GroupKey::LotNumber, &[Parameter::Vth], &RunSummary::default())
            .unwrap();
        assert!(html.contains("No data"));
        assert!(!html.contains("Plotly.newPlot"));
        assert!(!html.contains("Cpk"));
    }

    #[test]
    fn test_group_names_are_escaped() {
        let records = vec![RawRecord::new("<b>L1</b>", "W01", "1").with_value(Parameter::Bvdss1, 650.0)];
        let agg = aggregate(&records, &ParameterSelection::default(), GroupKey::LotNumber);
        let section = ParameterSection::build(&agg, Parameter::Bvdss1, SpecLimits::default());
        let html = ReportGenerator::new()
            .unwrap()
            .render_report(&section, GroupKey::LotNumber, &[Parameter::Bvdss1], &RunSummary::default())
            .unwrap();
        assert!(html.contains("&lt;b&gt;L1"));
        assert!(!html.contains("<b>L1</b></td>"));
    }

    #[test]
    fn test_write_html_with_index() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("nested/out");
        let written = write_html(&sections(), GroupKey::LotNumber, &RunSummary::default(), &out).unwrap();

        assert_eq!(written.len(), 3);
        assert!(out.join("BVDSS1_report.html").exists());
        assert!(out.join("VTH_report.html").exists());
        let index = std::fs::read_to_string(out.join(INDEX_FILE)).unwrap();
        assert!(index.contains("BVDSS1_report.html"));
        assert!(index.contains("VTH_report.html"));
    }

    #[test]
    fn test_single_parameter_has_no_index() {
        let tmp = tempdir().unwrap();
        let sections = sections();
        let written = write_html(&sections[..1], GroupKey::LotNumber, &RunSummary::default(), tmp.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(!tmp.path().join(INDEX_FILE).exists());
    }
}
