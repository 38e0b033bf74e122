use std::{
    collections::{BTreeSet, HashMap},
    convert::TryFrom,
    str::FromStr,
};

use derive_more::{Deref, Display, From, Into};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::{
    catalog::{RouteCatalog, RouteId},
    config::{DemandRelation, TransportConfig},
    cost::CostSchedule,
    error::{Result, TransportError},
    ledger::CapacityLedger,
};

/// The type used for container counts, supply and demand
pub type Quantity = f64;
/// The type used for distance, in kilometers
pub type Distance = f64;
/// The type used for cost.
pub type Cost = f64;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct PortIndex(usize);

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    #[default]
    Domestic,
    International,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// The name of the port, used as its identifier in the configuration
    pub name: String,
    /// Where the port is, if known
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub kind: PortKind,
}

impl Port {
    pub fn new(name: impl Into<String>, kind: PortKind) -> Port {
        Port {
            name: name.into(),
            coordinate: None,
            kind,
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Port {
        self.coordinate = Some(Coordinate { lat, lon });
        self
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ContainerType {
    #[serde(rename = "20ft")]
    #[display(fmt = "20ft")]
    TwentyFoot,
    #[serde(rename = "40ft")]
    #[display(fmt = "40ft")]
    FortyFoot,
    #[serde(rename = "40ft-hc")]
    #[display(fmt = "40ft-hc")]
    FortyFootHighCube,
}

impl ContainerType {
    pub const COUNT: usize = 3;
    pub const ALL: [ContainerType; ContainerType::COUNT] = [
        ContainerType::TwentyFoot,
        ContainerType::FortyFoot,
        ContainerType::FortyFootHighCube,
    ];

    /// Position of the type in `ContainerType::ALL`
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for ContainerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ContainerType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown container type `{}`", s))
    }
}

/// What a supply or demand figure counts: one container type, or every enabled type pooled together.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum CapacityScope {
    #[display(fmt = "{}", _0)]
    Type(ContainerType),
    #[display(fmt = "all")]
    Pooled,
}

impl TryFrom<String> for CapacityScope {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim() {
            "all" => Ok(CapacityScope::Pooled),
            other => other.parse().map(CapacityScope::Type),
        }
    }
}

impl From<CapacityScope> for String {
    fn from(scope: CapacityScope) -> String {
        scope.to_string()
    }
}

/// A validated transportation problem. Everything in here has passed the configuration checks,
/// and all defaults have been applied.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Every configured route, with resolved distances
    catalog: RouteCatalog,
    /// Unit cost parameters per container type
    schedule: CostSchedule,
    /// Supply ceilings and demand requirements
    ledger: CapacityLedger,
    /// Container types that may be shipped in this run, sorted
    enabled_types: Vec<ContainerType>,
    origin_filter: Option<Vec<PortIndex>>,
    destination_filter: Option<Vec<PortIndex>>,
    demand_relation: DemandRelation,
}

impl Problem {
    pub fn new(config: &TransportConfig) -> Result<Problem> {
        let ports = Problem::ports(&config.ports)?;
        let lookup = ports
            .iter_enumerated()
            .map(|(i, port)| (port.name.clone(), i))
            .collect::<HashMap<_, _>>();
        let resolve = |field: &str, name: &str| -> Result<PortIndex> {
            lookup
                .get(name)
                .copied()
                .ok_or_else(|| TransportError::invalid(field, format!("unknown port `{}`", name)))
        };

        let schedule = CostSchedule::new(
            config.default_per_km_rate,
            config.default_handling_fee,
            &config.container_types,
        )?;

        let mut ledger = CapacityLedger::new(config.capacity_mode);
        for (name, entries) in &config.supply {
            let port = resolve(&format!("supply[{}]", name), name)?;
            for (scope, quantity) in entries {
                ledger.set_supply(port, *scope, *quantity, &format!("supply[{}].{}", name, scope))?;
            }
        }
        for (name, entries) in &config.demand {
            let port = resolve(&format!("demand[{}]", name), name)?;
            for (scope, quantity) in entries {
                ledger.set_demand(port, *scope, *quantity, &format!("demand[{}].{}", name, scope))?;
            }
        }

        let mut distances = HashMap::new();
        for entry in &config.distances {
            let field = format!("distances[{}->{}]", entry.origin, entry.destination);
            let id = RouteId {
                origin: resolve(&field, &entry.origin)?,
                destination: resolve(&field, &entry.destination)?,
            };
            if distances.insert(id, entry.km).is_some() {
                return Err(TransportError::invalid(field, "distance given twice"));
            }
        }

        let routes = match &config.routes {
            Some(routes) => routes
                .iter()
                .map(|route| -> Result<(RouteId, bool)> {
                    let field = format!("routes[{}->{}]", route.origin, route.destination);
                    let id = RouteId {
                        origin: resolve(&field, &route.origin)?,
                        destination: resolve(&field, &route.destination)?,
                    };
                    Ok((id, route.active))
                })
                .collect::<Result<Vec<_>>>()?,
            // Without an explicit route list every supplying port may ship to every demanding port
            None => {
                let origins = ledger.supply_ports();
                let destinations = ledger.demand_ports();
                itertools::iproduct!(origins.iter().copied(), destinations.iter().copied())
                    .filter(|(o, d)| o != d)
                    .map(|(origin, destination)| (RouteId { origin, destination }, true))
                    .collect()
            }
        };

        let catalog = RouteCatalog::new(ports, routes, &distances, config.fallback_distance)?;

        let enabled_types = match &config.enabled_types {
            Some(types) => types.iter().copied().collect::<BTreeSet<_>>(),
            None if config.container_types.is_empty() => ContainerType::ALL.into_iter().collect(),
            None => config.container_types.keys().copied().collect(),
        }
        .into_iter()
        .collect::<Vec<_>>();

        if enabled_types.is_empty() {
            warn!("No container type is enabled");
        }

        let filter = |field: &str, names: &Option<Vec<String>>| -> Result<Option<Vec<PortIndex>>> {
            names
                .as_ref()
                .map(|names| names.iter().map(|name| resolve(field, name)).collect())
                .transpose()
        };
        let origin_filter = filter("origin_filter", &config.origin_filter)?;
        let destination_filter = filter("destination_filter", &config.destination_filter)?;

        debug!(
            "Problem with {} ports, {} routes, enabled types {:?}, demand relation {:?}",
            catalog.ports().len(),
            catalog.all().len(),
            enabled_types,
            config.demand_relation
        );

        Ok(Problem {
            catalog,
            schedule,
            ledger,
            enabled_types,
            origin_filter,
            destination_filter,
            demand_relation: config.demand_relation,
        })
    }

    fn ports(ports: &[Port]) -> Result<TiVec<PortIndex, Port>> {
        let mut seen = BTreeSet::new();
        for (i, port) in ports.iter().enumerate() {
            if port.name.trim().is_empty() {
                return Err(TransportError::invalid(
                    format!("ports[{}].name", i),
                    "port name must not be empty",
                ));
            }
            if !seen.insert(port.name.as_str()) {
                return Err(TransportError::invalid(
                    format!("ports[{}].name", i),
                    format!("port `{}` is declared twice", port.name),
                ));
            }
        }

        Ok(ports.to_vec().into())
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    pub fn schedule(&self) -> &CostSchedule {
        &self.schedule
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Container types that may be shipped in this run, sorted
    pub fn enabled_types(&self) -> &[ContainerType] {
        &self.enabled_types
    }

    pub fn origin_filter(&self) -> Option<&[PortIndex]> {
        self.origin_filter.as_deref()
    }

    pub fn destination_filter(&self) -> Option<&[PortIndex]> {
        self.destination_filter.as_deref()
    }

    pub fn demand_relation(&self) -> DemandRelation {
        self.demand_relation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteSpec;

    #[test]
    fn container_types_parse_from_their_labels() {
        assert_eq!("20ft".parse::<ContainerType>(), Ok(ContainerType::TwentyFoot));
        assert_eq!("40FT-HC".parse::<ContainerType>(), Ok(ContainerType::FortyFootHighCube));
        assert!("53ft".parse::<ContainerType>().is_err());
    }

    #[test]
    fn capacity_scope_round_trips_through_json_keys() {
        let json = r#"{"20ft": 70.0, "all": 5.0}"#;
        let parsed: std::collections::BTreeMap<CapacityScope, f64> =
            serde_json::from_str(json).unwrap();
        assert_eq!(parsed[&CapacityScope::Type(ContainerType::TwentyFoot)], 70.0);
        assert_eq!(parsed[&CapacityScope::Pooled], 5.0);
    }

    #[test]
    fn default_routes_cover_supply_times_demand_ports() {
        let problem = Problem::new(&TransportConfig::nml_default()).unwrap();
        assert_eq!(problem.catalog().all().len(), 4);
        assert_eq!(
            problem.enabled_types(),
            &[ContainerType::TwentyFoot, ContainerType::FortyFoot]
        );
    }

    #[test]
    fn unknown_ports_are_named_in_the_error() {
        let mut config = TransportConfig::nml_default();
        config.routes = Some(vec![RouteSpec::new("Makassar", "Surabaya")]);
        match Problem::new(&config) {
            Err(TransportError::InvalidConfiguration { field, reason }) => {
                assert_eq!(field, "routes[Makassar->Surabaya]");
                assert!(reason.contains("Surabaya"));
            }
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_port_names_are_rejected() {
        let mut config = TransportConfig::nml_default();
        let first = config.ports[0].clone();
        config.ports.push(first);
        assert!(matches!(
            Problem::new(&config),
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }
}
