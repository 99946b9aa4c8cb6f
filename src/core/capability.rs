//! Yield and process capability against specification limits

use serde::Serialize;

use crate::core::aggregate::Aggregation;
use crate::core::limits::SpecLimits;
use crate::core::parameter::Parameter;

/// Pass/fail counts of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldStats {
    pub group: String,
    /// Dies with a value for the parameter
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// `None` when the group has no values
    pub yield_pct: Option<f64>,
}

/// Cp / Cpk of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    pub group: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub cp: Option<f64>,
    pub cpk: Option<f64>,
}

/// Count values inside `limits` for each group
///
/// With no limits set every value passes.
pub fn yield_by_group(agg: &Aggregation, param: Parameter, limits: &SpecLimits) -> Vec<YieldStats> {
    agg.groups()
        .map(|group| {
            let points = agg.points(group, param);
            let total = points.len();
            let passed = points.iter().filter(|p| limits.contains(p.value)).count();
            YieldStats {
                group: group.to_string(),
                total,
                passed,
                failed: total - passed,
                yield_pct: (total > 0).then(|| passed as f64 / total as f64 * 100.0),
            }
        })
        .collect()
}

/// Capability indices per group; empty when `limits` sets neither side
pub fn capability_by_group(agg: &Aggregation, param: Parameter, limits: &SpecLimits) -> Vec<Capability> {
    if limits.is_empty() {
        return Vec::new();
    }
    agg.table(param)
        .into_iter()
        .map(|row| {
            let (cp, cpk) = match (row.stats.mean, row.stats.stddev) {
                (Some(mean), Some(sd)) if sd > 0.0 => indices(mean, sd, limits),
                _ => (None, None),
            };
            Capability {
                group: row.group,
                count: row.stats.count,
                mean: row.stats.mean,
                stddev: row.stats.stddev,
                cp,
                cpk,
            }
        })
        .collect()
}

fn indices(mean: f64, sd: f64, limits: &SpecLimits) -> (Option<f64>, Option<f64>) {
    let cp = match (limits.lower, limits.upper) {
        (Some(lo), Some(hi)) => Some((hi - lo) / (6.0 * sd)),
        _ => None,
    };
    let cpu = limits.upper.map(|hi| (hi - mean) / (3.0 * sd));
    let cpl = limits.lower.map(|lo| (mean - lo) / (3.0 * sd));
    let cpk = match (cpu, cpl) {
        (Some(u), Some(l)) => Some(u.min(l)),
        (one, other) => one.or(other),
    };
    (cp, cpk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::group::GroupKey;
    use crate::core::parameter::ParameterSelection;
    use crate::core::record::RawRecord;

    fn agg_of(values: &[(&str, f64)]) -> Aggregation {
        let records: Vec<RawRecord> = values
            .iter()
            .map(|(lot, v)| RawRecord::new(*lot, "W01", "1").with_value(Parameter::Bvdss1, *v))
            .collect();
        aggregate(&records, &ParameterSelection::default(), GroupKey::LotNumber)
    }

    #[test]
    fn test_yield_counts() {
        let agg = agg_of(&[("L1", 650.0), ("L1", 590.0), ("L1", 710.0), ("L1", 640.0), ("L2", 655.0)]);
        let limits = SpecLimits::new(Some(600.0), Some(700.0));
        let rows = yield_by_group(&agg, Parameter::Bvdss1, &limits);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "L1");
        assert_eq!((rows[0].total, rows[0].passed, rows[0].failed), (4, 2, 2));
        assert_eq!(rows[0].yield_pct, Some(50.0));
        assert_eq!(rows[1].yield_pct, Some(100.0));
    }

    #[test]
    fn test_yield_without_limits_passes_all() {
        let agg = agg_of(&[("L1", 1.0), ("L1", 1e12)]);
        let rows = yield_by_group(&agg, Parameter::Bvdss1, &SpecLimits::default());
        assert_eq!(rows[0].passed, 2);
    }

    #[test]
    fn test_cp_and_cpk() {
        // mean 650, sample sd 10
        let agg = agg_of(&[("L1", 640.0), ("L1", 650.0), ("L1", 660.0)]);
        let limits = SpecLimits::new(Some(600.0), Some(720.0));
        let caps = capability_by_group(&agg, Parameter::Bvdss1, &limits);

        let cap = &caps[0];
        assert!((cap.cp.unwrap() - 2.0).abs() < 1e-9);
        // min((720-650)/30, (650-600)/30)
        assert!((cap.cpk.unwrap() - 50.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_sided_cpk() {
        let agg = agg_of(&[("L1", 640.0), ("L1", 650.0), ("L1", 660.0)]);
        let caps = capability_by_group(&agg, Parameter::Bvdss1, &SpecLimits::new(Some(620.0), None));
        assert_eq!(caps[0].cp, None);
        assert!((caps[0].cpk.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_capability_undefined_cases() {
        let agg = agg_of(&[("L1", 650.0), ("L2", 648.0), ("L2", 648.0)]);
        let limits = SpecLimits::new(Some(600.0), Some(700.0));
        let caps = capability_by_group(&agg, Parameter::Bvdss1, &limits);
        // single value, then zero spread
        assert_eq!((caps[0].cp, caps[0].cpk), (None, None));
        assert_eq!((caps[1].cp, caps[1].cpk), (None, None));

        assert!(capability_by_group(&agg, Parameter::Bvdss1, &SpecLimits::default()).is_empty());
    }
}
