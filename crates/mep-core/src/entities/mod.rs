//! Plain data records for every network element kind.
//!
//! Records reference each other by name. Technology instances
//! ([`Generator`], [`Storage`]) are compositions of a shared type template
//! ([`GeneratorType`], [`StorageType`]) and a [`CapacityOverrides`] record.

use serde::{Deserialize, Serialize};

mod consumers;
mod economics;
mod policy;
mod technology;
mod topology;

pub use consumers::{AggregatedConsumer, DemandProfile, Dsr};
pub use economics::{CapacityFactor, EmissionFee, Fuel, TransmissionFee};
pub use policy::{
    BoundSense, CapacityBound, DemandChunk, FractionType, GenerationFraction, TechnologyRef,
};
pub use technology::{
    CapacityLimits, CapacityOverrides, CapacityUnit, Generator, GeneratorType, Storage,
    StorageType, TechnologyParams,
};
pub use topology::{Bus, Line, LocalBalancingStack};

/// Year-indexed parameter where any year may be left unspecified.
pub type YearSeries = Vec<Option<f64>>;

/// Value of a [`YearSeries`] at `year`, `None` when unset or out of range.
pub fn year_value(series: &[Option<f64>], year: usize) -> Option<f64> {
    series.get(year).copied().flatten()
}

/// Every element kind a network can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Bus,
    Line,
    GeneratorType,
    StorageType,
    Generator,
    Storage,
    Fuel,
    CapacityFactor,
    EmissionFee,
    TransmissionFee,
    DemandProfile,
    LocalBalancingStack,
    AggregatedConsumer,
    DemandChunk,
    CapacityBound,
    GenerationFraction,
    Dsr,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ElementKind::Bus => "bus",
            ElementKind::Line => "line",
            ElementKind::GeneratorType => "generator type",
            ElementKind::StorageType => "storage type",
            ElementKind::Generator => "generator",
            ElementKind::Storage => "storage",
            ElementKind::Fuel => "fuel",
            ElementKind::CapacityFactor => "capacity factor",
            ElementKind::EmissionFee => "emission fee",
            ElementKind::TransmissionFee => "transmission fee",
            ElementKind::DemandProfile => "demand profile",
            ElementKind::LocalBalancingStack => "local balancing stack",
            ElementKind::AggregatedConsumer => "aggregated consumer",
            ElementKind::DemandChunk => "demand chunk",
            ElementKind::CapacityBound => "capacity bound",
            ElementKind::GenerationFraction => "generation fraction",
            ElementKind::Dsr => "DSR",
        };
        f.write_str(label)
    }
}

/// A named record stored in one of the network's collections.
pub trait NetworkElement {
    const KIND: ElementKind;

    fn name(&self) -> &str;

    /// Label used in diagnostics, e.g. `generator PP_1`.
    fn label(&self) -> String {
        format!("{} {}", Self::KIND, self.name())
    }
}

macro_rules! network_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl NetworkElement for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

network_element! {
    Bus => Bus,
    Line => Line,
    GeneratorType => GeneratorType,
    StorageType => StorageType,
    Generator => Generator,
    Storage => Storage,
    Fuel => Fuel,
    CapacityFactor => CapacityFactor,
    EmissionFee => EmissionFee,
    TransmissionFee => TransmissionFee,
    DemandProfile => DemandProfile,
    LocalBalancingStack => LocalBalancingStack,
    AggregatedConsumer => AggregatedConsumer,
    DemandChunk => DemandChunk,
    CapacityBound => CapacityBound,
    GenerationFraction => GenerationFraction,
    Dsr => Dsr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_value_handles_gaps() {
        let series: YearSeries = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(year_value(&series, 0), Some(1.0));
        assert_eq!(year_value(&series, 1), None);
        assert_eq!(year_value(&series, 7), None);
    }

    #[test]
    fn label_includes_kind() {
        let bus = Bus::new("EE_1", "electricity");
        assert_eq!(bus.label(), "bus EE_1");
    }
}
