//! Partition naming.
//!
//! A partition is addressed by `<logical-name>-<version>`. Bumping the version is the only
//! way to invalidate a whole partition: the superseded name is garbage-collected at the next
//! activation.

use crate::strategy::Strategy;
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionName {
    logical: String,
    version: String,
}

impl PartitionName {
    pub fn new(logical: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let logical = logical.into();
        let version = version.into();
        validate_segment(&logical, "logical")?;
        validate_segment(&version, "version")?;
        Ok(Self { logical, version })
    }

    /// Parse `<logical>-<version>`; the version is everything after the last `-`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.rsplit_once('-') {
            Some((logical, version)) => Self::new(logical, version),
            None => Err(Error::configuration_with_context(
                "partition name must look like <logical>-<version>",
                ErrorContext::new().with_details(name),
            )),
        }
    }

    pub fn logical(&self) -> &str {
        &self.logical
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Display for PartitionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.logical, self.version)
    }
}

fn validate_segment(segment: &str, field: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_') || (c == '-' && field != "version"));
    if valid {
        Ok(())
    } else {
        Err(Error::configuration_with_context(
            format!("invalid partition {} segment", field),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(segment),
        ))
    }
}

/// The three current partitions: static, dynamic and generic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    pub static_assets: PartitionName,
    pub dynamic: PartitionName,
    pub generic: PartitionName,
}

impl PartitionSet {
    pub fn new(
        static_logical: &str,
        dynamic_logical: &str,
        generic_logical: &str,
        version: &str,
    ) -> Result<Self> {
        Ok(Self {
            static_assets: PartitionName::new(static_logical, version)?,
            dynamic: PartitionName::new(dynamic_logical, version)?,
            generic: PartitionName::new(generic_logical, version)?,
        })
    }

    /// `static-<v>`, `dynamic-<v>`, `generic-<v>`.
    pub fn with_version(version: &str) -> Result<Self> {
        Self::new("static", "dynamic", "generic", version)
    }

    /// Partition an executor writes to for the given strategy.
    pub fn for_strategy(&self, strategy: Strategy) -> &PartitionName {
        match strategy {
            Strategy::CacheFirst => &self.static_assets,
            Strategy::StaleWhileRevalidate => &self.dynamic,
            Strategy::NetworkFirst => &self.generic,
        }
    }

    /// Fallback lookup order: static, dynamic, generic.
    pub fn lookup_order(&self) -> [&PartitionName; 3] {
        [&self.static_assets, &self.dynamic, &self.generic]
    }

    pub fn current_names(&self) -> Vec<String> {
        self.lookup_order().iter().map(|p| p.to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup_order().iter().any(|p| p.to_string() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trips_through_display() {
        let name = PartitionName::new("static", "v1").unwrap();
        assert_eq!(name.to_string(), "static-v1");
        assert_eq!(PartitionName::parse("static-v1").unwrap(), name);
    }

    #[test]
    fn test_parse_takes_last_dash_as_version_separator() {
        let name = PartitionName::parse("prompt-pages-v12").unwrap();
        assert_eq!(name.logical(), "prompt-pages");
        assert_eq!(name.version(), "v12");
    }

    #[test]
    fn test_invalid_segments_are_rejected() {
        assert!(PartitionName::new("", "v1").is_err());
        assert!(PartitionName::new("static", "v/1").is_err());
        assert!(PartitionName::new("static", "v-1").is_err());
        assert!(PartitionName::parse("noversion").is_err());
    }

    #[test]
    fn test_set_maps_strategies_to_partitions() {
        let set = PartitionSet::with_version("v3").unwrap();
        assert_eq!(set.for_strategy(Strategy::CacheFirst).to_string(), "static-v3");
        assert_eq!(
            set.for_strategy(Strategy::StaleWhileRevalidate).to_string(),
            "dynamic-v3"
        );
        assert_eq!(set.for_strategy(Strategy::NetworkFirst).to_string(), "generic-v3");
        assert_eq!(set.current_names(), vec!["static-v3", "dynamic-v3", "generic-v3"]);
        assert!(set.contains("generic-v3"));
        assert!(!set.contains("generic-v2"));
    }
}
