//! Core module - data model, aggregation and configuration

pub mod aggregate;
pub mod capability;
pub mod config;
pub mod group;
pub mod limits;
pub mod parameter;
pub mod record;
pub mod stats;

pub use aggregate::{aggregate, aggregate_by_name, Aggregation, GroupStats, Point};
pub use capability::{capability_by_group, yield_by_group, Capability, YieldStats};
pub use config::{AnalysisConfig, ConfigError, ConfigFile, OutputFormat};
pub use group::{GroupKey, InvalidGroupKeyError, UNKNOWN_GROUP};
pub use limits::{LimitTable, SpecLimits};
pub use parameter::{InvalidParameterError, Parameter, ParameterSelection};
pub use record::{Measurements, RawRecord};
pub use stats::{Accumulator, ParameterStats};
