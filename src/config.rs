use std::{collections::BTreeMap, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    ledger::CapacityMode,
    problem::{CapacityScope, ContainerType, Cost, Distance, Port, PortKind, Quantity},
};

/// Distance used for a route that has no entry in the distance table
pub const DEFAULT_FALLBACK_DISTANCE: Distance = 2000.0;
/// Cost per kilometer per container, used for container types without their own rate
pub const DEFAULT_PER_KM_RATE: Cost = 2500.0;
/// Fixed handling cost per container, used for container types without their own fee
pub const DEFAULT_HANDLING_FEE: Cost = 1_200_000.0;

/// How the demand of a destination must be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandRelation {
    /// Demand is a floor, shipping more is allowed
    #[default]
    AtLeast,
    /// Demand must be met exactly
    Exact,
}

/// A permitted origin-destination pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub origin: String,
    pub destination: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

impl RouteSpec {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> RouteSpec {
        RouteSpec {
            origin: origin.into(),
            destination: destination.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> RouteSpec {
        self.active = false;
        self
    }
}

fn active_by_default() -> bool {
    true
}

/// One entry of the distance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub origin: String,
    pub destination: String,
    pub km: Distance,
}

/// Cost parameters for one container type. Missing values fall back to the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffSpec {
    #[serde(default)]
    pub per_km_rate: Option<Cost>,
    #[serde(default)]
    pub handling_fee: Option<Cost>,
    /// Weight of one loaded container, in tons
    #[serde(default)]
    pub weight_tons: Option<f64>,
}

/// The configuration of a single solve, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    pub ports: Vec<Port>,
    /// Permitted routes. When absent, every port with supply may ship to every port with demand.
    #[serde(default)]
    pub routes: Option<Vec<RouteSpec>>,
    #[serde(default)]
    pub distances: Vec<DistanceEntry>,
    #[serde(default = "default_fallback_distance")]
    pub fallback_distance: Distance,
    #[serde(default = "default_per_km_rate")]
    pub default_per_km_rate: Cost,
    #[serde(default = "default_handling_fee")]
    pub default_handling_fee: Cost,
    #[serde(default)]
    pub container_types: BTreeMap<ContainerType, TariffSpec>,
    /// Container types to ship. When absent, every type in `container_types` is enabled.
    #[serde(default)]
    pub enabled_types: Option<Vec<ContainerType>>,
    #[serde(default)]
    pub capacity_mode: CapacityMode,
    /// port name -> scope -> maximum units available
    #[serde(default)]
    pub supply: BTreeMap<String, BTreeMap<CapacityScope, Quantity>>,
    /// port name -> scope -> required units
    #[serde(default)]
    pub demand: BTreeMap<String, BTreeMap<CapacityScope, Quantity>>,
    #[serde(default)]
    pub demand_relation: DemandRelation,
    #[serde(default)]
    pub origin_filter: Option<Vec<String>>,
    #[serde(default)]
    pub destination_filter: Option<Vec<String>>,
}

fn default_fallback_distance() -> Distance {
    DEFAULT_FALLBACK_DISTANCE
}

fn default_per_km_rate() -> Cost {
    DEFAULT_PER_KM_RATE
}

fn default_handling_fee() -> Cost {
    DEFAULT_HANDLING_FEE
}

impl TransportConfig {
    /// Reads a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<TransportConfig> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<TransportConfig> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The NML network: Makassar and Balikpapan shipping to Tanjung Priok and Tanjung Perak,
    /// with 20ft and 40ft containers sharing one tariff.
    pub fn nml_default() -> TransportConfig {
        let twenty = ContainerType::TwentyFoot;
        let forty = ContainerType::FortyFoot;
        let per_type = |t: ContainerType, q: Quantity| BTreeMap::from([(CapacityScope::Type(t), q)]);
        let distance = |o: &str, d: &str, km: Distance| DistanceEntry {
            origin: o.to_string(),
            destination: d.to_string(),
            km,
        };

        TransportConfig {
            ports: vec![
                Port::new("Makassar", PortKind::Domestic).at(-5.1477, 119.4327),
                Port::new("Balikpapan", PortKind::Domestic).at(-1.2654, 116.8312),
                Port::new("Tanjung Priok", PortKind::Domestic).at(-6.1045, 106.8805),
                Port::new("Tanjung Perak", PortKind::Domestic).at(-7.1986, 112.7323),
            ],
            routes: None,
            distances: vec![
                distance("Makassar", "Tanjung Priok", 1400.0),
                distance("Makassar", "Tanjung Perak", 900.0),
                distance("Balikpapan", "Tanjung Priok", 780.0),
                distance("Balikpapan", "Tanjung Perak", 400.0),
            ],
            fallback_distance: DEFAULT_FALLBACK_DISTANCE,
            default_per_km_rate: DEFAULT_PER_KM_RATE,
            default_handling_fee: DEFAULT_HANDLING_FEE,
            container_types: BTreeMap::from([
                (
                    twenty,
                    TariffSpec {
                        weight_tons: Some(22.0),
                        ..TariffSpec::default()
                    },
                ),
                (
                    forty,
                    TariffSpec {
                        weight_tons: Some(28.0),
                        ..TariffSpec::default()
                    },
                ),
            ]),
            enabled_types: None,
            capacity_mode: CapacityMode::PerType,
            supply: BTreeMap::from([
                ("Makassar".to_string(), per_type(twenty, 70.0)),
                ("Balikpapan".to_string(), per_type(twenty, 50.0)),
            ]),
            demand: BTreeMap::from([
                ("Tanjung Priok".to_string(), per_type(twenty, 60.0)),
                ("Tanjung Perak".to_string(), per_type(twenty, 40.0)),
            ]),
            demand_relation: DemandRelation::AtLeast,
            origin_filter: None,
            destination_filter: None,
        }
    }

    /// Removes a container type from the enabled set
    pub fn disable(&mut self, container_type: ContainerType) {
        let enabled = self.enabled_types.get_or_insert_with(|| {
            if self.container_types.is_empty() {
                ContainerType::ALL.to_vec()
            } else {
                self.container_types.keys().copied().collect()
            }
        });
        enabled.retain(|t| *t != container_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_documented_defaults() {
        let config = TransportConfig::from_json(
            r#"{
                "ports": [{"name": "Makassar"}, {"name": "Tanjung Priok", "kind": "international"}],
                "supply": {"Makassar": {"20ft": 10}},
                "demand": {"Tanjung Priok": {"20ft": 5}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.fallback_distance, DEFAULT_FALLBACK_DISTANCE);
        assert_eq!(config.default_per_km_rate, DEFAULT_PER_KM_RATE);
        assert_eq!(config.default_handling_fee, DEFAULT_HANDLING_FEE);
        assert_eq!(config.demand_relation, DemandRelation::AtLeast);
        assert_eq!(config.capacity_mode, CapacityMode::PerType);
        assert_eq!(config.ports[1].kind, PortKind::International);
        assert!(config.routes.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = TransportConfig::from_json(r#"{"ports": [], "cost_per_km": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn nml_default_survives_a_json_round_trip() {
        let config = TransportConfig::nml_default();
        let parsed = TransportConfig::from_json(&config.json().unwrap()).unwrap();
        assert_eq!(parsed.supply, config.supply);
        assert_eq!(parsed.container_types, config.container_types);
        assert_eq!(parsed.distances, config.distances);
    }

    #[test]
    fn disabling_starts_from_the_configured_types() {
        let mut config = TransportConfig::nml_default();
        config.disable(ContainerType::FortyFoot);
        assert_eq!(config.enabled_types, Some(vec![ContainerType::TwentyFoot]));
    }
}
