use std::collections::{HashMap, HashSet};

use log::{trace, warn};
use typed_index_collections::TiVec;

use crate::{
    error::{Result, TransportError},
    problem::{Distance, Port, PortIndex},
};

/// Identifies a route by its end points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId {
    pub origin: PortIndex,
    pub destination: PortIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: RouteId,
    /// Distance in kilometers, either from the distance table or the fallback
    pub distance: Distance,
    /// Whether the route may carry containers in this run
    pub active: bool,
}

impl Route {
    pub fn origin(&self) -> PortIndex {
        self.id.origin
    }

    pub fn destination(&self) -> PortIndex {
        self.id.destination
    }
}

/// The ports and the routes between them.
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    ports: TiVec<PortIndex, Port>,
    routes: Vec<Route>,
}

impl RouteCatalog {
    /// Resolves the distance of every route. Routes missing from `distances` get `fallback`.
    /// Routes from a port to itself are dropped.
    pub fn new(
        ports: TiVec<PortIndex, Port>,
        routes: Vec<(RouteId, bool)>,
        distances: &HashMap<RouteId, Distance>,
        fallback: Distance,
    ) -> Result<RouteCatalog> {
        if !fallback.is_finite() || fallback <= 0.0 {
            return Err(TransportError::invalid(
                "fallback_distance",
                format!("must be positive, got {}", fallback),
            ));
        }

        let label = |id: &RouteId| format!("{}->{}", ports[id.origin].name, ports[id.destination].name);

        for (id, km) in distances {
            if !km.is_finite() || *km < 0.0 {
                return Err(TransportError::invalid(
                    format!("distances[{}].km", label(id)),
                    format!("must be a non-negative number, got {}", km),
                ));
            }
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(routes.len());
        for (id, active) in routes {
            if id.origin == id.destination {
                warn!("Ignoring route {} as it starts and ends in the same port", label(&id));
                continue;
            }
            if !seen.insert(id) {
                return Err(TransportError::invalid(
                    format!("routes[{}]", label(&id)),
                    "route is listed twice",
                ));
            }

            let distance = match distances.get(&id) {
                Some(km) => *km,
                None => {
                    trace!("No distance for {}, using fallback {}", label(&id), fallback);
                    fallback
                }
            };
            if active && distance <= 0.0 {
                return Err(TransportError::invalid(
                    format!("routes[{}].distance", label(&id)),
                    "an active route must have a positive distance",
                ));
            }

            resolved.push(Route {
                id,
                distance,
                active,
            });
        }

        Ok(RouteCatalog {
            ports,
            routes: resolved,
        })
    }

    pub fn ports(&self) -> &TiVec<PortIndex, Port> {
        &self.ports
    }

    pub fn port(&self, index: PortIndex) -> &Port {
        &self.ports[index]
    }

    /// Every route, active or not
    pub fn all(&self) -> &[Route] {
        &self.routes
    }

    /// The active routes whose origin is in `origin_filter` and whose destination is in
    /// `destination_filter`. A missing filter lets every port through.
    pub fn routes(
        &self,
        origin_filter: Option<&[PortIndex]>,
        destination_filter: Option<&[PortIndex]>,
    ) -> Vec<&Route> {
        let passes = |filter: Option<&[PortIndex]>, port: PortIndex| {
            filter.map_or(true, |ports| ports.contains(&port))
        };

        self.routes
            .iter()
            .filter(|r| r.active && r.origin() != r.destination())
            .filter(|r| passes(origin_filter, r.origin()))
            .filter(|r| passes(destination_filter, r.destination()))
            .collect()
    }
}
