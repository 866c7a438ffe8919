//! Newtype wrappers for element positions, one per element kind that the
//! optimization layer indexes directly.

use serde::{Deserialize, Serialize};

macro_rules! element_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(usize);

            impl $name {
                pub const fn new(index: usize) -> Self {
                    Self(index)
                }

                pub const fn index(self) -> usize {
                    self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}#{}", stringify!($name).trim_end_matches("Id"), self.0)
                }
            }
        )*
    };
}

element_id! {
    /// Position of a [`Bus`](crate::Bus) in its network collection
    BusId,
    LineId,
    GeneratorId,
    StorageId,
    GeneratorTypeId,
    StorageTypeId,
    /// Position of a [`LocalBalancingStack`](crate::LocalBalancingStack)
    StackId,
    /// Position of an [`AggregatedConsumer`](crate::AggregatedConsumer)
    AggregateId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_kind_and_position() {
        assert_eq!(BusId::new(3).to_string(), "Bus#3");
        assert_eq!(GeneratorTypeId::new(0).to_string(), "GeneratorType#0");
        assert_eq!(StackId::new(7).index(), 7);
    }
}
