use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TransportError},
    problem::{CapacityScope, ContainerType, PortIndex, Quantity},
};

/// Capacity of a (port, scope) pair that the configuration does not mention
pub const DEFAULT_CAPACITY: Quantity = 0.0;

/// Whether supply and demand are given per container type or as one figure per port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    #[default]
    PerType,
    Pooled,
}

impl CapacityMode {
    /// The scope a container of type `container_type` counts against
    pub fn scope_of(self, container_type: ContainerType) -> CapacityScope {
        match self {
            CapacityMode::PerType => CapacityScope::Type(container_type),
            CapacityMode::Pooled => CapacityScope::Pooled,
        }
    }

    fn accepts(self, scope: CapacityScope) -> bool {
        matches!(
            (self, scope),
            (CapacityMode::PerType, CapacityScope::Type(_))
                | (CapacityMode::Pooled, CapacityScope::Pooled)
        )
    }
}

/// Supply ceilings of origin ports and demand requirements of destination ports.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    mode: CapacityMode,
    supply: HashMap<(PortIndex, CapacityScope), Quantity>,
    demand: HashMap<(PortIndex, CapacityScope), Quantity>,
}

impl CapacityLedger {
    pub fn new(mode: CapacityMode) -> CapacityLedger {
        CapacityLedger {
            mode,
            supply: HashMap::new(),
            demand: HashMap::new(),
        }
    }

    pub fn mode(&self) -> CapacityMode {
        self.mode
    }

    /// Sets the maximum number of units port `port` can ship in `scope`
    pub fn set_supply(
        &mut self,
        port: PortIndex,
        scope: CapacityScope,
        quantity: Quantity,
        field: &str,
    ) -> Result<()> {
        Self::check(self.mode, scope, quantity, field)?;
        self.supply.insert((port, scope), quantity);
        Ok(())
    }

    /// Sets the number of units port `port` requires in `scope`
    pub fn set_demand(
        &mut self,
        port: PortIndex,
        scope: CapacityScope,
        quantity: Quantity,
        field: &str,
    ) -> Result<()> {
        Self::check(self.mode, scope, quantity, field)?;
        self.demand.insert((port, scope), quantity);
        Ok(())
    }

    fn check(mode: CapacityMode, scope: CapacityScope, quantity: Quantity, field: &str) -> Result<()> {
        if !mode.accepts(scope) {
            let reason = match mode {
                CapacityMode::PerType => "pooled capacity (`all`) requires capacity_mode `pooled`",
                CapacityMode::Pooled => "per-type capacity requires capacity_mode `per_type`",
            };
            return Err(TransportError::invalid(field, reason));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(TransportError::invalid(
                field,
                format!("capacity must be a non-negative number, got {}", quantity),
            ));
        }
        Ok(())
    }

    /// Maximum units available at `port` in `scope`
    pub fn supply(&self, port: PortIndex, scope: CapacityScope) -> Quantity {
        self.supply
            .get(&(port, scope))
            .copied()
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Units required at `port` in `scope`
    pub fn demand(&self, port: PortIndex, scope: CapacityScope) -> Quantity {
        self.demand
            .get(&(port, scope))
            .copied()
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Ports that have at least one supply entry
    pub fn supply_ports(&self) -> BTreeSet<PortIndex> {
        self.supply.keys().map(|(port, _)| *port).collect()
    }

    /// Ports that have at least one demand entry
    pub fn demand_ports(&self) -> BTreeSet<PortIndex> {
        self.demand.keys().map(|(port, _)| *port).collect()
    }
}
