//! Precomputed pairwise spatial conflicts
//!
//! Dispersion predictions do not change during a scheduling run, so the
//! spatial test for every unordered pair is evaluated once, in parallel, and
//! looked up in O(1) while candidate schedules are scored.

use crate::conflict::{ConflictDetector, SpatialConflict};
use crate::core_types::{BurnRequest, Meters};
use crate::dispersion::DispersionPrediction;
use rayon::prelude::*;

/// Upper-triangular table of spatial conflicts between `n` burns
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictMatrix {
    n: usize,
    cells: Vec<Option<SpatialConflict>>,
}

impl ConflictMatrix {
    /// Evaluate every pair `i < j`.
    ///
    /// `burns` and `predictions` are parallel slices.
    #[must_use]
    pub fn build(
        detector: &ConflictDetector,
        burns: &[BurnRequest],
        predictions: &[DispersionPrediction],
        min_separation: Meters,
    ) -> Self {
        let n = burns.len().min(predictions.len());
        let cells = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..n).map(move |j| {
                    detector.assess_spatial(
                        (&burns[i], &predictions[i]),
                        (&burns[j], &predictions[j]),
                        min_separation,
                    )
                })
            })
            .collect();
        ConflictMatrix { n, cells }
    }

    /// Number of burns covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the matrix covers no burns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Spatial conflict between burns `i` and `j`, in either order
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<&SpatialConflict> {
        if i == j || i >= self.n || j >= self.n {
            return None;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        // row `lo` starts after the (n-1) + (n-2) + ... + (n-lo) cells above it
        let index = lo * (2 * self.n - lo - 1) / 2 + (hi - lo - 1);
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Number of conflicting pairs
    #[must_use]
    pub fn conflicting_pairs(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{
        Acres, Celsius, CropType, Degrees, GeoPoint, MetersPerSecond, Percent, StabilityClass,
        TimeWindow, WeatherSnapshot,
    };
    use crate::dispersion::DispersionModel;
    use chrono::NaiveDate;

    #[test]
    fn test_matrix_matches_direct_assessment() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let weather = WeatherSnapshot {
            temperature: Celsius::new(20.0),
            humidity: Percent::new(50.0),
            wind_speed: MetersPerSecond::new(3.0),
            wind_direction: Degrees::new(0.0),
            stability: StabilityClass::C,
            timestamp: date.and_hms_opt(10, 0, 0).unwrap(),
            location: GeoPoint::new(38.5, -121.7),
        };
        let origin = GeoPoint::new(38.5, -121.7);
        let burns: Vec<_> = (0..5u64)
            .map(|i| {
                BurnRequest::new(
                    i,
                    origin.destination(Degrees::new(90.0), Meters::new(3_000.0 * i as f64)),
                    Acres::new(30.0),
                    CropType::Barley,
                    date,
                    TimeWindow::hours(9, 12).unwrap(),
                )
            })
            .collect();
        let model = DispersionModel::default();
        let preds: Vec<_> = burns
            .iter()
            .map(|b| model.predict_dispersion(b, &weather).unwrap())
            .collect();
        let detector = ConflictDetector::default();
        let min_sep = Meters::new(5_000.0);
        let matrix = ConflictMatrix::build(&detector, &burns, &preds, min_sep);

        assert_eq!(matrix.len(), 5);
        for i in 0..5 {
            assert!(matrix.get(i, i).is_none());
            for j in 0..5 {
                if i == j {
                    continue;
                }
                let direct = detector.assess_spatial((&burns[i], &preds[i]), (&burns[j], &preds[j]), min_sep);
                assert_eq!(matrix.get(i, j), direct.as_ref());
            }
        }
        // neighbours 3 km apart are inside the 5 km floor
        assert!(matrix.get(0, 1).is_some());
        assert!(matrix.get(3, 4).is_some());
    }
}
