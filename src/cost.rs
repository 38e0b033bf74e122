use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::TariffSpec,
    error::{Result, TransportError},
    problem::{ContainerType, Cost, Distance},
};

/// Resolved cost parameters of one container type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tariff {
    /// Cost per kilometer per container
    pub per_km_rate: Cost,
    /// Fixed cost per container, independent of distance
    pub handling_fee: Cost,
    /// Weight of one loaded container, in tons
    pub weight_tons: Option<f64>,
}

impl Tariff {
    /// Cost of moving a single container `distance` kilometers
    pub fn unit_cost(&self, distance: Distance) -> Cost {
        distance * self.per_km_rate + self.handling_fee
    }
}

/// Unit costs for every container type.
#[derive(Debug, Clone)]
pub struct CostSchedule {
    tariffs: [Tariff; ContainerType::COUNT],
}

impl CostSchedule {
    /// Resolves the tariff of every container type, falling back to the defaults where `specs`
    /// says nothing.
    pub fn new(
        default_per_km_rate: Cost,
        default_handling_fee: Cost,
        specs: &BTreeMap<ContainerType, TariffSpec>,
    ) -> Result<CostSchedule> {
        non_negative("default_per_km_rate", default_per_km_rate)?;
        non_negative("default_handling_fee", default_handling_fee)?;

        let mut tariffs = [Tariff {
            per_km_rate: default_per_km_rate,
            handling_fee: default_handling_fee,
            weight_tons: None,
        }; ContainerType::COUNT];

        for (container_type, spec) in specs {
            let tariff = &mut tariffs[container_type.index()];
            if let Some(rate) = spec.per_km_rate {
                non_negative(&format!("container_types.{}.per_km_rate", container_type), rate)?;
                tariff.per_km_rate = rate;
            }
            if let Some(fee) = spec.handling_fee {
                non_negative(&format!("container_types.{}.handling_fee", container_type), fee)?;
                tariff.handling_fee = fee;
            }
            if let Some(weight) = spec.weight_tons {
                non_negative(&format!("container_types.{}.weight_tons", container_type), weight)?;
                tariff.weight_tons = Some(weight);
            }
        }

        Ok(CostSchedule { tariffs })
    }

    pub fn tariff(&self, container_type: ContainerType) -> &Tariff {
        &self.tariffs[container_type.index()]
    }

    /// `distance * per_km_rate + handling_fee` for the given container type
    pub fn unit_cost(&self, container_type: ContainerType, distance: Distance) -> Cost {
        self.tariff(container_type).unit_cost(distance)
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TransportError::invalid(
            field,
            format!("must be a non-negative number, got {}", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(per_km_rate: Cost, handling_fee: Cost) -> Result<CostSchedule> {
        CostSchedule::new(per_km_rate, handling_fee, &BTreeMap::new())
    }

    #[test]
    fn unit_cost_is_distance_times_rate_plus_handling() {
        let schedule = uniform(2500.0, 1_200_000.0).unwrap();
        assert_eq!(schedule.unit_cost(ContainerType::TwentyFoot, 1400.0), 4_700_000.0);
        assert_eq!(schedule.unit_cost(ContainerType::FortyFoot, 400.0), 2_200_000.0);
    }

    #[test]
    fn per_type_overrides_keep_the_other_defaults() {
        let specs = BTreeMap::from([(
            ContainerType::FortyFoot,
            TariffSpec {
                per_km_rate: Some(4000.0),
                ..TariffSpec::default()
            },
        )]);
        let schedule = CostSchedule::new(2500.0, 1_200_000.0, &specs).unwrap();

        let forty = schedule.tariff(ContainerType::FortyFoot);
        assert_eq!(forty.per_km_rate, 4000.0);
        assert_eq!(forty.handling_fee, 1_200_000.0);
        assert_eq!(schedule.tariff(ContainerType::TwentyFoot).per_km_rate, 2500.0);
    }

    #[test]
    fn negative_rates_name_the_field() {
        let specs = BTreeMap::from([(
            ContainerType::TwentyFoot,
            TariffSpec {
                handling_fee: Some(-1.0),
                ..TariffSpec::default()
            },
        )]);
        match CostSchedule::new(2500.0, 1_200_000.0, &specs) {
            Err(TransportError::InvalidConfiguration { field, .. }) => {
                assert_eq!(field, "container_types.20ft.handling_fee")
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(uniform(f64::NAN, 0.0).is_err());
    }
}
