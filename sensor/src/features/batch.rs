//! Batch - one cycle's feature vectors
//!
//! A `Batch` can only be built from at least one vector, so an empty
//! window never reaches the classification service.

use serde::Serialize;

use super::vector::FeatureVector;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch(Vec<FeatureVector>);

impl Batch {
    /// Keep the successful extractions in capture order
    ///
    /// Returns `None` when nothing survived extraction.
    pub fn from_extracted<I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<FeatureVector>>,
    {
        let rows: Vec<FeatureVector> = results.into_iter().flatten().collect();
        if rows.is_empty() {
            None
        } else {
            Some(Self(rows))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[FeatureVector] {
        &self.0
    }
}
