// Sorted per-metric distributions and percentile lookup.

/// Sorted finite values of one metric across the current batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    sorted: Vec<f64>,
}

impl Distribution {
    /// Build from any values; non-finite entries and `None` are skipped.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut sorted: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Distribution { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.sorted
    }

    /// Fraction of entries `<= x`, in [0, 1].
    ///
    /// `None` for an empty distribution or a non-finite `x`.
    pub fn percentile(&self, x: f64) -> Option<f64> {
        if self.sorted.is_empty() || !x.is_finite() {
            return None;
        }
        let at_or_below = self.sorted.partition_point(|v| *v <= x);
        Some(at_or_below as f64 / self.sorted.len() as f64)
    }

    /// Percentile of an optional value.
    pub fn percentile_of(&self, x: Option<f64>) -> Option<f64> {
        x.and_then(|v| self.percentile(v))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
