//! Summary statistics over normalized samples.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::bdd100k::NormalizedSample;

/// Counts describing a normalized dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub samples: usize,
    pub labels: usize,
    /// Samples with no labels.
    pub empty_samples: usize,
    /// Label counts per category, most frequent first, ties by name.
    pub categories: Vec<CategoryCount>,
    /// For each scene attribute, how often each value occurs.
    pub scene_attributes: BTreeMap<String, BTreeMap<String, usize>>,
    /// Boxes with x2 < x1 or y2 < y1.
    pub unordered_boxes: usize,
    /// Boxes with NaN or infinite coordinates.
    pub non_finite_boxes: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Computes a [`DatasetSummary`].
pub fn summarize(samples: &[NormalizedSample]) -> DatasetSummary {
    let mut summary = DatasetSummary {
        samples: samples.len(),
        ..Default::default()
    };
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();

    for sample in samples {
        if sample.labels.is_empty() {
            summary.empty_samples += 1;
        }
        for (key, value) in &sample.attributes {
            *summary
                .scene_attributes
                .entry(key.clone())
                .or_default()
                .entry(value.clone())
                .or_insert(0) += 1;
        }
        for label in &sample.labels {
            summary.labels += 1;
            *categories.entry(label.category.as_str()).or_insert(0) += 1;
            if !label.bbox.is_finite() {
                summary.non_finite_boxes += 1;
            } else if !label.bbox.is_ordered() {
                summary.unordered_boxes += 1;
            }
        }
    }

    let mut sorted: Vec<CategoryCount> = categories
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    summary.categories = sorted;

    summary
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples:        {}", self.samples)?;
        writeln!(f, "Labels:         {}", self.labels)?;
        writeln!(f, "Empty samples:  {}", self.empty_samples)?;
        if self.unordered_boxes > 0 {
            writeln!(f, "Unordered boxes: {}", self.unordered_boxes)?;
        }
        if self.non_finite_boxes > 0 {
            writeln!(f, "Non-finite boxes: {}", self.non_finite_boxes)?;
        }

        if !self.categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "Categories:")?;
            let width = self
                .categories
                .iter()
                .map(|c| c.category.len())
                .max()
                .unwrap_or(0);
            for entry in &self.categories {
                writeln!(f, "  {:<width$}  {}", entry.category, entry.count)?;
            }
        }

        for (attribute, values) in &self.scene_attributes {
            writeln!(f)?;
            writeln!(f, "{attribute}:")?;
            for (value, count) in values {
                writeln!(f, "  {value}: {count}")?;
            }
        }

        Ok(())
    }
}
