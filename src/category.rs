use crate::config::CategoryConfig;
use crate::error::{Error, Result};
use crate::frame::float_column;
use polars::prelude::*;

/// Ordered bin edges with one label per interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBins {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl CategoryBins {
    pub fn new(edges: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if edges.len() != labels.len() + 1 {
            return Err(Error::BinLabelMismatch {
                bins: edges.len(),
                labels: labels.len(),
            });
        }
        if edges.iter().any(|e| e.is_nan()) || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::config("bin edges must increase monotonically"));
        }
        Ok(Self { edges, labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the interval holding `value`. Intervals are closed on the
    /// right, `(e[i], e[i+1]]`, and the first one also includes its lower
    /// edge. Values outside all bins and NaN have no category.
    pub fn classify(&self, value: f64) -> Option<usize> {
        let lowest = *self.edges.first()?;
        if value.is_nan() || value < lowest {
            return None;
        }
        if value == lowest {
            return Some(0);
        }
        self.edges
            .windows(2)
            .position(|w| w[0] < value && value <= w[1])
    }
}

/// Bins a numeric column into an ordered categorical column.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    bins: CategoryBins,
    source_col: String,
    dest_col: String,
}

impl CategoryClassifier {
    pub fn new(bins: CategoryBins, source_col: impl Into<String>, dest_col: impl Into<String>) -> Self {
        Self {
            bins,
            source_col: source_col.into(),
            dest_col: dest_col.into(),
        }
    }

    pub fn from_config(config: &CategoryConfig) -> Result<Self> {
        let bins = CategoryBins::new(config.bins.clone(), config.labels.clone())?;
        Ok(Self::new(bins, &config.source_col, &config.dest_col))
    }

    /// Appends (or replaces) the label column and hands the frame back.
    pub fn apply<'f>(&self, frame: &'f mut DataFrame) -> Result<&'f mut DataFrame> {
        let labels: Vec<Option<&str>> = float_column(frame, &self.source_col, "combined table")?
            .into_iter()
            .map(|v| {
                v.and_then(|v| self.bins.classify(v))
                    .and_then(|i| self.bins.labels().get(i))
                    .map(String::as_str)
            })
            .collect();
        frame.with_column(Series::new(self.dest_col.as_str().into(), labels))?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_labels_for_four_edges_is_rejected() {
        let err = CategoryBins::new(vec![0.0, 1.0, 2.0, 3.0], labels(&["low", "mid"])).unwrap_err();
        assert!(matches!(err, Error::BinLabelMismatch { bins: 4, labels: 2 }));
    }

    #[test]
    fn non_increasing_edges_are_rejected() {
        let err = CategoryBins::new(vec![0.0, 2.0, 1.0], labels(&["a", "b"])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn intervals_are_right_closed_with_lowest_included() {
        let bins = CategoryBins::new(vec![0.0, 1.0, 2.0, 3.0], labels(&["low", "mid", "high"])).unwrap();
        assert_eq!(bins.classify(0.0), Some(0));
        assert_eq!(bins.classify(1.0), Some(0));
        assert_eq!(bins.classify(1.5), Some(1));
        assert_eq!(bins.classify(3.0), Some(2));
        assert_eq!(bins.classify(3.1), None);
        assert_eq!(bins.classify(-0.1), None);
        assert_eq!(bins.classify(f64::NAN), None);
    }

    #[test]
    fn apply_appends_labels_in_place() {
        let mut frame = df!(
            "Name" => ["B1", "B2", "B3"],
            "hull_ag_to_GFA_m2" => [Some(1.5), None, Some(9.0)],
        )
        .unwrap();

        let bins = CategoryBins::new(vec![0.0, 1.0, 2.0, 3.0], labels(&["low", "mid", "high"])).unwrap();
        let classifier = CategoryClassifier::new(bins, "hull_ag_to_GFA_m2", "compact_category");
        let frame = classifier.apply(&mut frame).unwrap();

        let assigned: Vec<Option<&str>> = frame
            .column("compact_category")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(assigned, vec![Some("mid"), None, None]);
    }

    #[test]
    fn apply_requires_source_column() {
        let mut frame = df!("Name" => ["B1"]).unwrap();
        let bins = CategoryBins::new(vec![0.0, 1.0], labels(&["all"])).unwrap();
        let classifier = CategoryClassifier::new(bins, "hull_ag_to_GFA_m2", "compact_category");
        assert!(matches!(
            classifier.apply(&mut frame),
            Err(Error::MissingColumn { .. })
        ));
    }
}
