//! Ordering for floats.

use std::hash::Hash;

/// A wrapper for `f64` that implements `Ord`.
///
/// Unlike the more principled wrappers in the `ordered_float` crate, this
/// one just treats incomparable values as equal. That's fine for us because
/// inputs are checked for NaNs before any sweep state is built, and nothing
/// in the sweep can manufacture one from finite inputs.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl Hash for CheapOrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // +0.0 and -0.0 compare equal, so they must hash equal.
        if self.0 == 0.0 {
            0u64.hash(state)
        } else {
            self.0.to_bits().hash(state)
        }
    }
}

impl CheapOrderedFloat {
    /// Retrieve the inner `f64`.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0 < other.0 {
            std::cmp::Ordering::Less
        } else if self.0 > other.0 {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn signed_zeros() {
        let pos = CheapOrderedFloat::from(0.0);
        let neg = CheapOrderedFloat::from(-0.0);
        assert_eq!(pos.cmp(&neg), std::cmp::Ordering::Equal);

        let set: HashSet<_> = [pos, neg].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    proptest! {
    #[test]
    fn agrees_with_total_cmp(x in -1e6f64..1e6, y in -1e6f64..1e6) {
        prop_assert_eq!(
            CheapOrderedFloat::from(x).cmp(&CheapOrderedFloat::from(y)),
            x.total_cmp(&y)
        );
    }
    }
}
