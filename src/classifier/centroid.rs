use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

use super::{Classifier, Model, Prediction};
use crate::data::model::{LabeledTable, Matrix};

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

/// Nearest-centroid classifier on z-scored markers.
///
/// Each label is represented by the mean of its standardised training
/// cells; a cell gets the label of the closest centroid (Euclidean).
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid;

impl Classifier for NearestCentroid {
    type Model = CentroidModel;

    fn train(&self, table: &LabeledTable) -> Result<CentroidModel> {
        if table.is_empty() {
            bail!("cannot train on an empty training set");
        }
        let markers = &table.markers;
        let k = markers.n_cols();

        let (mean, std) = column_moments(markers);

        let mut sums: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
        for (row, label) in markers.rows().zip(&table.labels) {
            let (sum, n) = sums
                .entry(label.as_str())
                .or_insert_with(|| (vec![0.0; k], 0));
            for (j, z) in standardise(row, &mean, &std).enumerate() {
                sum[j] += z;
            }
            *n += 1;
        }

        let centroids = sums
            .into_iter()
            .map(|(label, (sum, n))| {
                let centroid = sum.into_iter().map(|s| s / n as f64).collect();
                (label.to_string(), centroid)
            })
            .collect::<Vec<_>>();

        log::info!(
            "Trained nearest-centroid model: {} classes over {} markers",
            centroids.len(),
            k
        );

        Ok(CentroidModel {
            markers: markers.column_names().to_vec(),
            mean,
            std,
            centroids,
        })
    }
}

/// Per-column mean and standard deviation, ignoring NaN cells.
///
/// Columns without spread get a unit deviation so they standardise to zero.
fn column_moments(markers: &Matrix) -> (Vec<f64>, Vec<f64>) {
    let k = markers.n_cols();
    let mut sum = vec![0.0; k];
    let mut sq = vec![0.0; k];
    let mut count = vec![0usize; k];
    for row in markers.rows() {
        for (j, &v) in row.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            sum[j] += v;
            sq[j] += v * v;
            count[j] += 1;
        }
    }

    let mean: Vec<f64> = (0..k)
        .map(|j| if count[j] == 0 { 0.0 } else { sum[j] / count[j] as f64 })
        .collect();
    let std = (0..k)
        .map(|j| {
            if count[j] == 0 {
                return 1.0;
            }
            let var = (sq[j] / count[j] as f64 - mean[j] * mean[j]).max(0.0);
            let sd = var.sqrt();
            if sd > f64::EPSILON {
                sd
            } else {
                1.0
            }
        })
        .collect();
    (mean, std)
}

/// NaN cells map to zero, i.e. the training mean.
fn standardise<'a>(
    row: &'a [f64],
    mean: &'a [f64],
    std: &'a [f64],
) -> impl Iterator<Item = f64> + 'a {
    row.iter()
        .zip(mean.iter().zip(std))
        .map(|(&v, (&m, &s))| if v.is_nan() { 0.0 } else { (v - m) / s })
}

// ---------------------------------------------------------------------------
// Trained model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CentroidModel {
    /// Marker names seen in training, in training order.
    markers: Vec<String>,
    mean: Vec<f64>,
    std: Vec<f64>,
    /// (label, centroid) sorted by label.
    centroids: Vec<(String, Vec<f64>)>,
}

impl CentroidModel {
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.centroids.iter().map(|(l, _)| l.as_str())
    }
}

impl Model for CentroidModel {
    type Label = String;

    /// Markers are looked up by name: extra columns are ignored and a
    /// missing trained marker is an error.
    fn predict(&self, markers: &Matrix) -> Result<Prediction<String>> {
        let columns = self
            .markers
            .iter()
            .map(|name| {
                markers
                    .column_index(name)
                    .with_context(|| format!("marker column {name} not present in input"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut labels = Vec::with_capacity(markers.n_rows());
        let mut scores = Vec::with_capacity(markers.n_rows());
        let mut selected = vec![0.0; columns.len()];

        for row in markers.rows() {
            for (dst, &src) in selected.iter_mut().zip(&columns) {
                *dst = row[src];
            }
            let z: Vec<f64> = standardise(&selected, &self.mean, &self.std).collect();

            let (label, dist) = self
                .centroids
                .iter()
                .map(|(label, c)| (label, squared_distance(&z, c)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .context("model has no classes")?;

            labels.push(label.clone());
            scores.push(dist.sqrt());
        }

        Ok(Prediction { labels, scores })
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MarkerSchema;

    fn labeled(rows: Vec<Vec<f64>>, labels: &[&str]) -> LabeledTable {
        let schema = MarkerSchema::from_width(rows[0].len());
        LabeledTable {
            markers: Matrix::from_rows(schema.names().to_vec(), rows).unwrap(),
            schema,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn input(names: &[&str], rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(names.iter().map(|n| n.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn separates_well_spaced_classes() {
        let table = labeled(
            vec![
                vec![0.0, 0.0],
                vec![0.2, 0.1],
                vec![10.0, 10.0],
                vec![10.1, 9.9],
            ],
            &["T", "T", "B", "B"],
        );
        let model = NearestCentroid.train(&table).unwrap();
        assert_eq!(model.labels().collect::<Vec<_>>(), vec!["B", "T"]);

        let test = input(&["M0", "M1"], vec![vec![9.5, 10.2], vec![0.1, -0.1]]);
        let pred = model.predict(&test).unwrap();
        assert_eq!(pred.labels, vec!["B", "T"]);
        assert_eq!(pred.scores.len(), 2);
    }

    #[test]
    fn columns_are_matched_by_name() {
        let table = labeled(vec![vec![0.0, 5.0], vec![10.0, 5.0]], &["lo", "hi"]);
        let model = NearestCentroid.train(&table).unwrap();

        // Extra column M2 is ignored, order of M0/M1 does not matter.
        let test = input(&["M1", "M0", "M2"], vec![vec![5.0, 9.0, 100.0]]);
        assert_eq!(model.predict(&test).unwrap().labels, vec!["hi"]);
    }

    #[test]
    fn missing_marker_fails() {
        let table = labeled(vec![vec![0.0, 1.0], vec![1.0, 0.0]], &["a", "b"]);
        let model = NearestCentroid.train(&table).unwrap();
        let err = model.predict(&input(&["M0"], vec![vec![1.0]])).unwrap_err();
        assert!(err.to_string().contains("M1"));
    }

    #[test]
    fn nan_features_fall_back_to_mean() {
        let table = labeled(vec![vec![0.0, 0.0], vec![10.0, 0.0]], &["a", "b"]);
        let model = NearestCentroid.train(&table).unwrap();
        let test = input(&["M0", "M1"], vec![vec![9.0, f64::NAN]]);
        assert_eq!(model.predict(&test).unwrap().labels, vec!["b"]);
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let schema = MarkerSchema::from_width(1);
        let table = LabeledTable {
            markers: Matrix::from_rows(schema.names().to_vec(), vec![]).unwrap(),
            schema,
            labels: vec![],
        };
        assert!(NearestCentroid.train(&table).is_err());
    }
}
