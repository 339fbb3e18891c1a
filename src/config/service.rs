// ABOUTME: Service descriptors and the validated, tier-ordered registry.
// ABOUTME: Raw YAML entries are checked here; a Registry is never partially loaded.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use super::deserialize::deserialize_signed_millis;
use super::error::ConfigError;
use super::probe::ProbeSpec;
use crate::types::ServiceName;

/// A validated service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub name: ServiceName,
    pub tier: u32,
    pub probe: ProbeSpec,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ServiceSpec {
    pub fn new(name: ServiceName, tier: u32, probe: ProbeSpec) -> Self {
        Self {
            name,
            tier,
            probe,
            timeout: Duration::from_secs(30),
            interval: Duration::from_secs(5),
            address: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Address advertised on the status endpoint.
    pub fn address(&self) -> String {
        self.address.clone().unwrap_or_else(|| self.probe.target())
    }

    /// Upper bound for a single probe attempt.
    pub fn attempt_timeout(&self) -> Duration {
        self.probe.timeout.unwrap_or(self.interval)
    }
}

/// A registry entry as written in the YAML file, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    pub name: ServiceName,
    pub tier: i64,
    pub probe: ProbeSpec,
    #[serde(deserialize_with = "deserialize_signed_millis")]
    pub timeout: i64,
    #[serde(deserialize_with = "deserialize_signed_millis")]
    pub interval: i64,
    #[serde(default)]
    pub address: Option<String>,
}

impl ServiceEntry {
    fn into_spec(self) -> Result<ServiceSpec, ConfigError> {
        let name = self.name;

        if self.tier < 0 {
            return Err(ConfigError::NegativeTier {
                service: name,
                tier: self.tier,
            });
        }
        let Ok(tier) = u32::try_from(self.tier) else {
            return Err(ConfigError::TierTooLarge {
                service: name,
                tier: self.tier,
            });
        };

        if self.timeout <= 0 {
            return Err(ConfigError::NonPositiveTimeout(name));
        }
        if self.interval <= 0 {
            return Err(ConfigError::NonPositiveInterval(name));
        }

        let timeout = Duration::from_millis(self.timeout.unsigned_abs());
        let interval = Duration::from_millis(self.interval.unsigned_abs());

        if interval > timeout {
            return Err(ConfigError::IntervalExceedsTimeout {
                service: name,
                interval,
                timeout,
            });
        }

        if let Some(attempt) = self.probe.timeout
            && (attempt.is_zero() || attempt > interval)
        {
            return Err(ConfigError::InvalidAttemptTimeout {
                service: name,
                interval,
            });
        }

        Ok(ServiceSpec {
            name,
            tier,
            probe: self.probe,
            timeout,
            interval,
            address: self.address,
        })
    }
}

/// Read-only, validated sequence of services.
#[derive(Debug, Clone)]
pub struct Registry {
    services: NonEmpty<ServiceSpec>,
    tier_count: usize,
}

impl Registry {
    /// Validate raw entries into a registry.
    pub fn from_entries(entries: Vec<ServiceEntry>) -> Result<Self, ConfigError> {
        let specs = entries
            .into_iter()
            .map(ServiceEntry::into_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    /// Build a registry from already-typed specs, checking the cross-entry invariants.
    pub fn new(specs: Vec<ServiceSpec>) -> Result<Self, ConfigError> {
        let services = NonEmpty::from_vec(specs).ok_or(ConfigError::NoServices)?;

        let mut seen = HashSet::new();
        for spec in services.iter() {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateName(spec.name.clone()));
            }
            if spec.timeout.is_zero() {
                return Err(ConfigError::NonPositiveTimeout(spec.name.clone()));
            }
            if spec.interval.is_zero() {
                return Err(ConfigError::NonPositiveInterval(spec.name.clone()));
            }
            if spec.interval > spec.timeout {
                return Err(ConfigError::IntervalExceedsTimeout {
                    service: spec.name.clone(),
                    interval: spec.interval,
                    timeout: spec.timeout,
                });
            }
            let attempt = spec.attempt_timeout();
            if attempt.is_zero() || attempt > spec.interval {
                return Err(ConfigError::InvalidAttemptTimeout {
                    service: spec.name.clone(),
                    interval: spec.interval,
                });
            }
        }

        let tiers: BTreeSet<u32> = services.iter().map(|s| s.tier).collect();
        let max_tier = tiers.last().copied().unwrap_or(0);
        if let Some(gap) = (0..=max_tier).find(|t| !tiers.contains(t)) {
            return Err(ConfigError::TierGap(u64::from(gap)));
        }

        Ok(Self {
            services,
            tier_count: max_tier as usize + 1,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Always false; a registry holds at least one service.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn tier_count(&self) -> usize {
        self.tier_count
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name.as_str() == name)
    }

    /// Services of one tier, in registry order.
    pub fn tier(&self, tier: u32) -> Vec<&ServiceSpec> {
        self.services.iter().filter(|s| s.tier == tier).collect()
    }

    /// All tiers in ascending order; index equals tier number.
    pub fn tiers(&self) -> Vec<Vec<&ServiceSpec>> {
        (0..self.tier_count as u32).map(|t| self.tier(t)).collect()
    }
}
