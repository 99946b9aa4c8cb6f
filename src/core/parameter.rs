//! The fixed set of CP electrical test parameters

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A device parameter measured at circuit probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Parameter {
    Bvdss1,
    Bvdss2,
    Deltabv,
    Idss1,
    Vth,
    Rdson1,
    Vfsds,
    Igss2,
    Igssr2,
    Idss2,
}

/// Requested parameter is not one the tester reports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown parameter: '{name}' (expected one of {})", Parameter::names().join(", "))]
pub struct InvalidParameterError {
    pub name: String,
}

impl Parameter {
    /// Number of parameters in the enumeration
    pub const COUNT: usize = 10;

    /// All parameters in column order
    pub fn all() -> &'static [Parameter] {
        &[
            Parameter::Bvdss1,
            Parameter::Bvdss2,
            Parameter::Deltabv,
            Parameter::Idss1,
            Parameter::Vth,
            Parameter::Rdson1,
            Parameter::Vfsds,
            Parameter::Igss2,
            Parameter::Igssr2,
            Parameter::Idss2,
        ]
    }

    /// Column name as written by the tester
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Bvdss1 => "BVDSS1",
            Parameter::Bvdss2 => "BVDSS2",
            Parameter::Deltabv => "DELTABV",
            Parameter::Idss1 => "IDSS1",
            Parameter::Vth => "VTH",
            Parameter::Rdson1 => "RDSON1",
            Parameter::Vfsds => "VFSDS",
            Parameter::Igss2 => "IGSS2",
            Parameter::Igssr2 => "IGSSR2",
            Parameter::Idss2 => "IDSS2",
        }
    }

    /// Position of this parameter in [`Parameter::all`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Unit the value is reported in, used for axis labels
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Bvdss1 | Parameter::Bvdss2 | Parameter::Deltabv => "V",
            Parameter::Vth | Parameter::Vfsds => "V",
            Parameter::Idss1 | Parameter::Idss2 | Parameter::Igss2 | Parameter::Igssr2 => "A",
            Parameter::Rdson1 => "Ω",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|p| p.as_str()).collect()
    }

    /// Exact column-name match used by the log parser
    pub fn from_column(name: &str) -> Option<Parameter> {
        Self::all().iter().copied().find(|p| p.as_str() == name)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Parameter {
    type Err = InvalidParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Parameter::from_column(&upper).ok_or_else(|| InvalidParameterError {
            name: s.to_string(),
        })
    }
}

/// Which parameters an analysis covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSelection {
    One(Parameter),
    Many(Vec<Parameter>),
    All,
}

impl ParameterSelection {
    /// Build a selection from user-supplied names, validating each one
    ///
    /// The name `all` selects every parameter.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, InvalidParameterError> {
        let mut params = Vec::with_capacity(names.len());
        for name in names {
            if name.as_ref().trim().eq_ignore_ascii_case("all") {
                return Ok(ParameterSelection::All);
            }
            let param: Parameter = name.as_ref().parse()?;
            if !params.contains(&param) {
                params.push(param);
            }
        }
        Ok(match params.as_slice() {
            [single] => ParameterSelection::One(*single),
            _ if params.len() == Parameter::COUNT => ParameterSelection::All,
            _ => ParameterSelection::Many(params),
        })
    }

    /// Selected parameters in enumeration order
    pub fn parameters(&self) -> Vec<Parameter> {
        match self {
            ParameterSelection::One(p) => vec![*p],
            ParameterSelection::Many(list) => {
                let mut sorted = list.clone();
                sorted.sort();
                sorted
            }
            ParameterSelection::All => Parameter::all().to_vec(),
        }
    }

    pub fn contains(&self, param: Parameter) -> bool {
        match self {
            ParameterSelection::One(p) => *p == param,
            ParameterSelection::Many(list) => list.contains(&param),
            ParameterSelection::All => true,
        }
    }
}

impl Default for ParameterSelection {
    fn default() -> Self {
        ParameterSelection::One(Parameter::Bvdss1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, p) in Parameter::all().iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert_eq!(Parameter::all().len(), Parameter::COUNT);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("bvdss1".parse::<Parameter>().unwrap(), Parameter::Bvdss1);
        assert_eq!(" IGSSR2 ".parse::<Parameter>().unwrap(), Parameter::Igssr2);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = "BVDSS9".parse::<Parameter>().unwrap_err();
        assert_eq!(err.name, "BVDSS9");
        assert!(err.to_string().contains("BVDSS1"));
    }

    #[test]
    fn test_from_column_is_exact() {
        assert_eq!(Parameter::from_column("VTH"), Some(Parameter::Vth));
        assert_eq!(Parameter::from_column("vth"), None);
        assert_eq!(Parameter::from_column("VTH "), None);
    }

    #[test]
    fn test_selection_from_names() {
        let one = ParameterSelection::from_names(&["VTH"]).unwrap();
        assert_eq!(one, ParameterSelection::One(Parameter::Vth));

        let many = ParameterSelection::from_names(&["IDSS2", "BVDSS1", "IDSS2"]).unwrap();
        assert_eq!(many.parameters(), vec![Parameter::Bvdss1, Parameter::Idss2]);

        let all = ParameterSelection::from_names(&Parameter::names()).unwrap();
        assert_eq!(all, ParameterSelection::All);

        assert!(ParameterSelection::from_names(&["VTH", "NOPE"]).is_err());
    }

    #[test]
    fn test_serde_uses_column_names() {
        let json = serde_json::to_string(&Parameter::Deltabv).unwrap();
        assert_eq!(json, "\"DELTABV\"");
        let back: Parameter = serde_json::from_str("\"RDSON1\"").unwrap();
        assert_eq!(back, Parameter::Rdson1);
    }
}
