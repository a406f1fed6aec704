//! Capacity growth policy shared by the dynamic containers.

use crate::config::StorageConfig;

/// Smallest capacity a growing container jumps to.
pub const MIN_CAPACITY: usize = 4;

/// How a container computes its next capacity when it runs out of room.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Growth {
    /// Double the current capacity.
    #[default]
    Doubling,
    /// Multiply the current capacity by a caller-supplied factor (> 1.0).
    Factor(f32),
}

impl Growth {
    /// Policy matching the configured growth factor.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        if (config.growth_factor - 2.0).abs() < f32::EPSILON {
            Self::Doubling
        } else {
            Self::Factor(config.growth_factor)
        }
    }

    /// Next capacity that holds at least `required` elements.
    #[must_use]
    pub fn next_capacity(self, current: usize, required: usize) -> usize {
        let grown = match self {
            Self::Doubling => current.saturating_mul(2),
            Self::Factor(factor) => {
                debug_assert!(factor > 1.0, "Growth factor must exceed 1.0");
                (current as f64 * f64::from(factor)).ceil() as usize
            }
        };
        grown.max(required).max(MIN_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubling() {
        assert_eq!(Growth::Doubling.next_capacity(0, 1), MIN_CAPACITY);
        assert_eq!(Growth::Doubling.next_capacity(8, 9), 16);
        assert_eq!(Growth::Doubling.next_capacity(8, 40), 40);
    }

    #[test]
    fn test_factor() {
        assert_eq!(Growth::Factor(1.5).next_capacity(10, 11), 15);
        assert_eq!(Growth::Factor(1.5).next_capacity(2, 3), MIN_CAPACITY);
    }

    #[test]
    fn test_from_config() {
        let mut config = StorageConfig::default();
        assert_eq!(Growth::from_config(&config), Growth::Doubling);
        config.growth_factor = 1.5;
        assert_eq!(Growth::from_config(&config), Growth::Factor(1.5));
    }
}
