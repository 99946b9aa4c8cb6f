//! Grouped per-parameter aggregation
//!
//! One pass over the records feeds a Welford [`Accumulator`] per
//! (group, parameter) pair. Raw points are retained alongside so the chart
//! builder can draw box summaries and per-die scatter without re-reading logs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::group::GroupKey;
use crate::core::parameter::{InvalidParameterError, Parameter, ParameterSelection};
use crate::core::record::RawRecord;
use crate::core::stats::{Accumulator, ParameterStats};

/// A single measured value with the die it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub value: f64,
    pub wafer_id: String,
    pub site_id: String,
}

/// Accumulated data for one group
#[derive(Debug, Clone, Default)]
struct GroupData {
    records: usize,
    per_param: BTreeMap<Parameter, ParamData>,
}

#[derive(Debug, Clone, Default)]
struct ParamData {
    acc: Accumulator,
    points: Vec<Point>,
}

/// One row of a per-parameter statistics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub stats: ParameterStats,
}

/// Result of [`aggregate`]: group name → parameter → statistics
#[derive(Debug, Clone)]
pub struct Aggregation {
    group_key: GroupKey,
    parameters: Vec<Parameter>,
    groups: BTreeMap<String, GroupData>,
}

/// Aggregate records by `group_key` for every parameter in `selection`
///
/// Missing values are skipped for their parameter only. Groups come back in
/// lexicographic order; every group carries an entry for every selected
/// parameter, with count 0 when it had no values.
pub fn aggregate<'a, I>(records: I, selection: &ParameterSelection, group_key: GroupKey) -> Aggregation
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let parameters = selection.parameters();
    let mut groups: BTreeMap<String, GroupData> = BTreeMap::new();

    for record in records {
        let group = groups.entry(group_key.key_of(record)).or_insert_with(|| GroupData {
            records: 0,
            per_param: parameters.iter().map(|p| (*p, ParamData::default())).collect(),
        });
        group.records += 1;

        for param in &parameters {
            let Some(value) = record.value(*param) else {
                continue;
            };
            if let Some(data) = group.per_param.get_mut(param) {
                data.acc.push(value);
                data.points.push(Point {
                    value,
                    wafer_id: record.wafer_id.clone(),
                    site_id: record.site_id.clone(),
                });
            }
        }
    }

    Aggregation {
        group_key,
        parameters,
        groups,
    }
}

/// Aggregate a parameter given by name; `"all"` selects every parameter
///
/// The name is validated before any record is touched.
pub fn aggregate_by_name<'a, I>(
    records: I,
    parameter: &str,
    group_key: GroupKey,
) -> Result<Aggregation, InvalidParameterError>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let selection = if parameter.trim().eq_ignore_ascii_case("all") {
        ParameterSelection::All
    } else {
        ParameterSelection::One(parameter.parse()?)
    };
    Ok(aggregate(records, &selection, group_key))
}

impl Aggregation {
    pub fn group_key(&self) -> GroupKey {
        self.group_key
    }

    /// Parameters covered, in enumeration order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Group names in report order
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total records seen across all groups
    pub fn record_count(&self) -> usize {
        self.groups.values().map(|g| g.records).sum()
    }

    pub fn stats(&self, group: &str, param: Parameter) -> Option<ParameterStats> {
        self.groups
            .get(group)
            .and_then(|g| g.per_param.get(&param))
            .map(|d| d.acc.finish())
    }

    /// Per-group rows for one parameter
    pub fn table(&self, param: Parameter) -> Vec<GroupStats> {
        self.groups
            .iter()
            .filter_map(|(name, g)| {
                g.per_param.get(&param).map(|d| GroupStats {
                    group: name.clone(),
                    stats: d.acc.finish(),
                })
            })
            .collect()
    }

    /// Statistics over every group combined
    pub fn overall(&self, param: Parameter) -> ParameterStats {
        self.groups
            .values()
            .filter_map(|g| g.per_param.get(&param))
            .fold(Accumulator::new(), |acc, d| acc.merge(&d.acc))
            .finish()
    }

    /// Raw points of one group, in input order
    pub fn points(&self, group: &str, param: Parameter) -> &[Point] {
        self.groups
            .get(group)
            .and_then(|g| g.per_param.get(&param))
            .map(|d| d.points.as_slice())
            .unwrap_or(&[])
    }

    /// Sorted raw values of one group
    pub fn sorted_values(&self, group: &str, param: Parameter) -> Vec<f64> {
        let mut values: Vec<f64> = self.points(group, param).iter().map(|p| p.value).collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Every value of `param` across all groups, ascending
    pub fn sorted_values_all(&self, param: Parameter) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .groups()
            .flat_map(|group| self.points(group, param).iter().map(|p| p.value))
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// True when no group holds a value for `param`
    pub fn is_empty_for(&self, param: Parameter) -> bool {
        self.overall(param).is_empty()
    }

    /// Plain nested map view of the statistics
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<Parameter, ParameterStats>> {
        self.groups
            .iter()
            .map(|(name, g)| {
                let per_param = g
                    .per_param
                    .iter()
                    .map(|(p, d)| (*p, d.acc.finish()))
                    .collect();
                (name.clone(), per_param)
            })
            .collect()
    }
}
