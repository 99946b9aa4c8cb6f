//! Plotly figure construction
//!
//! A figure is plain JSON handed to `Plotly.newPlot` in the report page.

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::aggregate::Aggregation;
use crate::core::limits::SpecLimits;
use crate::core::parameter::Parameter;
use crate::core::stats::quantile;

/// Five-number summary plus mean of one group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxSummary {
    /// `None` for an empty slice; `sorted` must be ascending
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let (first, last) = (sorted.first()?, sorted.last()?);
        Some(Self {
            min: *first,
            q1: quantile(sorted, 0.25),
            median: quantile(sorted, 0.5),
            q3: quantile(sorted, 0.75),
            max: *last,
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        })
    }
}

/// Box summary of one group, serialized flat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupQuartiles {
    pub group: String,
    #[serde(flatten)]
    pub summary: BoxSummary,
}

/// Box summaries of every group holding a value for `param`, in group order
pub fn quartiles_by_group(agg: &Aggregation, param: Parameter) -> Vec<GroupQuartiles> {
    agg.groups()
        .filter_map(|group| {
            BoxSummary::from_sorted(&agg.sorted_values(group, param)).map(|summary| GroupQuartiles {
                group: group.to_string(),
                summary,
            })
        })
        .collect()
}

/// Chart inputs for one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub parameter: Parameter,
    pub groups: Vec<GroupSeries>,
    pub limits: SpecLimits,
}

/// Values of one group with their hover labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub labels: Vec<String>,
    pub mean: Option<f64>,
}

impl ChartData {
    /// Collect chart series; `None` when no group has a value
    pub fn collect(agg: &Aggregation, param: Parameter, limits: SpecLimits) -> Option<Self> {
        if agg.is_empty_for(param) {
            return None;
        }
        let groups = agg
            .groups()
            .map(|group| {
                let points = agg.points(group, param);
                GroupSeries {
                    name: group.to_string(),
                    values: points.iter().map(|p| p.value).collect(),
                    labels: points
                        .iter()
                        .map(|p| format!("wafer {} die {}", p.wafer_id, p.site_id))
                        .collect(),
                    mean: agg.stats(group, param).and_then(|s| s.mean),
                }
            })
            .collect();
        Some(Self {
            parameter: param,
            groups,
            limits,
        })
    }

    /// Y range padded around the data and any limits
    fn y_range(&self) -> (f64, f64) {
        let values = self.groups.iter().flat_map(|g| g.values.iter().copied());
        let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if let Some(lower) = self.limits.lower {
            lo = lo.min(lower);
        }
        if let Some(upper) = self.limits.upper {
            hi = hi.max(upper);
        }
        let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
        (lo - pad, hi + pad)
    }

    /// Plotly figure: box with every point, mean markers and limit lines
    pub fn figure(&self) -> Value {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut hover = Vec::new();
        for group in &self.groups {
            for (value, label) in group.values.iter().zip(&group.labels) {
                x.push(group.name.as_str());
                y.push(*value);
                hover.push(label.as_str());
            }
        }

        let (mean_x, mean_y): (Vec<&str>, Vec<f64>) = self
            .groups
            .iter()
            .filter_map(|g| g.mean.map(|m| (g.name.as_str(), m)))
            .unzip();

        let box_trace = json!({
            "type": "box",
            "name": "VALUE",
            "x": x,
            "y": y,
            "hovertext": hover,
            "hoverinfo": "y+text",
            "boxpoints": "all",
            "jitter": 0.3,
            "pointpos": 0,
            "marker": { "color": "brown", "size": 3, "opacity": 0.6 },
            "line": { "color": "blue", "width": 2 },
            "fillcolor": "rgba(0, 0, 255, 0.1)",
            "whiskerwidth": 0.6,
            "showlegend": false,
        });

        let mean_trace = json!({
            "type": "scatter",
            "mode": "markers",
            "name": "Average",
            "x": mean_x,
            "y": mean_y,
            "marker": {
                "symbol": "triangle-up",
                "color": "red",
                "size": 10,
                "line": { "color": "darkred", "width": 1 },
            },
            "showlegend": false,
        });

        let mut shapes = Vec::new();
        let mut annotations = Vec::new();
        for (label, limit) in [("LSL", self.limits.lower), ("USL", self.limits.upper)] {
            let Some(limit) = limit else { continue };
            shapes.push(json!({
                "type": "line",
                "xref": "paper",
                "x0": 0,
                "x1": 1,
                "y0": limit,
                "y1": limit,
                "line": { "color": "red", "width": 2, "dash": "dash" },
            }));
            annotations.push(json!({
                "xref": "paper",
                "x": 0.01,
                "y": limit,
                "text": format!("{}:{}", label, limit),
                "showarrow": false,
                "xanchor": "left",
                "yanchor": "bottom",
                "font": { "color": "red", "size": 12 },
            }));
        }

        let (y_min, y_max) = self.y_range();
        let unit = self.parameter.unit();
        let y_title = if unit.is_empty() {
            self.parameter.to_string()
        } else {
            format!("{} ({})", self.parameter, unit)
        };

        json!({
            "data": [box_trace, mean_trace],
            "layout": {
                "title": { "text": format!("Box Plot<br>{}", self.parameter), "x": 0.5 },
                "xaxis": { "type": "category", "showgrid": true, "zeroline": false },
                "yaxis": {
                    "title": { "text": y_title },
                    "range": [y_min, y_max],
                    "zeroline": false,
                    "gridcolor": "rgba(200, 200, 200, 0.2)",
                },
                "shapes": shapes,
                "annotations": annotations,
                "hovermode": "closest",
                "template": "plotly_white",
                "plot_bgcolor": "rgba(240, 250, 255, 0.5)",
                "height": 640,
                "margin": { "l": 60, "r": 40, "t": 90, "b": 60 },
            },
        })
    }
}
