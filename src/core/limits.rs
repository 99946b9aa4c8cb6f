//! Specification limits per parameter

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::parameter::Parameter;

/// Lower / upper specification limit of one parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
}

impl SpecLimits {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// A value passes when it is inside every limit that is set
    pub fn contains(&self, value: f64) -> bool {
        self.lower.map_or(true, |lo| value >= lo) && self.upper.map_or(true, |hi| value <= hi)
    }

    /// Overlay `other` on top of `self`: set fields in `other` win
    pub fn overridden_by(&self, other: &SpecLimits) -> SpecLimits {
        SpecLimits {
            lower: other.lower.or(self.lower),
            upper: other.upper.or(self.upper),
        }
    }
}

/// Limits for every parameter that declares any
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LimitTable {
    limits: BTreeMap<Parameter, SpecLimits>,
}

impl LimitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: Parameter) -> SpecLimits {
        self.limits.get(&param).copied().unwrap_or_default()
    }

    pub fn set(&mut self, param: Parameter, limits: SpecLimits) {
        if limits.is_empty() {
            self.limits.remove(&param);
        } else {
            self.limits.insert(param, limits);
        }
    }

    /// Record limits read from a log unless a parameter already has some
    ///
    /// Logs are visited in sorted order, so the first file to declare a limit wins.
    pub fn absorb_first_seen(&mut self, other: &LimitTable) {
        for (param, limits) in &other.limits {
            self.limits.entry(*param).or_insert(*limits);
        }
    }

    /// Apply explicit overrides field by field
    pub fn apply_overrides(&mut self, overrides: &LimitTable) {
        for (param, limits) in &overrides.limits {
            let merged = self.get(*param).overridden_by(limits);
            self.set(*param, merged);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, SpecLimits)> + '_ {
        self.limits.iter().map(|(p, l)| (*p, *l))
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_respects_present_sides() {
        let both = SpecLimits::new(Some(600.0), Some(700.0));
        assert!(both.contains(600.0));
        assert!(both.contains(700.0));
        assert!(!both.contains(599.9));
        assert!(!both.contains(700.1));

        let upper_only = SpecLimits::new(None, Some(1e-6));
        assert!(upper_only.contains(-5.0));
        assert!(!upper_only.contains(2e-6));

        assert!(SpecLimits::default().contains(f64::MAX));
    }

    #[test]
    fn test_first_seen_wins() {
        let mut table = LimitTable::new();
        let mut first = LimitTable::new();
        first.set(Parameter::Bvdss1, SpecLimits::new(Some(600.0), None));
        let mut second = LimitTable::new();
        second.set(Parameter::Bvdss1, SpecLimits::new(Some(500.0), Some(800.0)));
        second.set(Parameter::Vth, SpecLimits::new(Some(2.0), Some(4.0)));

        table.absorb_first_seen(&first);
        table.absorb_first_seen(&second);

        assert_eq!(table.get(Parameter::Bvdss1), SpecLimits::new(Some(600.0), None));
        assert_eq!(table.get(Parameter::Vth), SpecLimits::new(Some(2.0), Some(4.0)));
    }

    #[test]
    fn test_overrides_are_field_wise() {
        let mut table = LimitTable::new();
        table.set(Parameter::Bvdss1, SpecLimits::new(Some(600.0), Some(700.0)));
        let mut overrides = LimitTable::new();
        overrides.set(Parameter::Bvdss1, SpecLimits::new(None, Some(720.0)));
        overrides.set(Parameter::Idss1, SpecLimits::new(None, Some(1e-6)));

        table.apply_overrides(&overrides);

        assert_eq!(table.get(Parameter::Bvdss1), SpecLimits::new(Some(600.0), Some(720.0)));
        assert_eq!(table.get(Parameter::Idss1), SpecLimits::new(None, Some(1e-6)));
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = "BVDSS1:\n  lower: 600\n  upper: 700\nVTH:\n  upper: 4.5\n";
        let table: LimitTable = serde_yml::from_str(yaml).unwrap();
        assert_eq!(table.get(Parameter::Bvdss1), SpecLimits::new(Some(600.0), Some(700.0)));
        assert_eq!(table.get(Parameter::Vth), SpecLimits::new(None, Some(4.5)));
    }
}
