//! Day-indexed disease progression curves.
//!
//! A [`Trajectory`] holds, for every day offset since exposure, an infectivity value per strain
//! and a single symptomaticity value. Disease parameters hand out trajectory templates that may
//! be shared by many infections; the curve data sits behind an `Arc` and every reshape goes
//! through `Arc::make_mut`, so an infection copies its curve on the first modification only.
//!
//! Offsets before exposure and past the end of the curve read as [`TrajectoryPoint::ZERO`].
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::InfectionError;
use crate::Day;

pub type StrainId = u32;

/// The strain a single-series curve is attributed to.
pub const DEFAULT_STRAIN: StrainId = 0;

/// Symptom severity written by [`Trajectory::modify_develops_symptoms`].
pub const FORCED_SYMPTOMATICITY: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub infectivity: f64,
    pub symptomaticity: f64,
}

impl TrajectoryPoint {
    pub const ZERO: TrajectoryPoint = TrajectoryPoint {
        infectivity: 0.0,
        symptomaticity: 0.0,
    };
}

/// Infectivity as written in parameter files: either one unnamed series or one series per
/// strain.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StrainCurves {
    Single(Vec<f64>),
    ByStrain(BTreeMap<StrainId, Vec<f64>>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TrajectorySpec {
    infectivity: StrainCurves,
    symptomaticity: Vec<f64>,
}

/// Every series has the same length and the last point, if any, is not all zero.
#[derive(Clone, Debug, PartialEq)]
struct TrajectoryData {
    infectivity: BTreeMap<StrainId, Vec<f64>>,
    symptomaticity: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrajectorySpec", into = "TrajectorySpec")]
pub struct Trajectory {
    data: Arc<TrajectoryData>,
}

impl TryFrom<TrajectorySpec> for Trajectory {
    type Error = InfectionError;

    fn try_from(spec: TrajectorySpec) -> Result<Self, Self::Error> {
        match spec.infectivity {
            StrainCurves::Single(series) => Trajectory::new(series, spec.symptomaticity),
            StrainCurves::ByStrain(by_strain) => {
                Trajectory::with_strains(by_strain, spec.symptomaticity)
            }
        }
    }
}

impl From<Trajectory> for TrajectorySpec {
    fn from(trajectory: Trajectory) -> Self {
        TrajectorySpec {
            infectivity: StrainCurves::ByStrain(trajectory.data.infectivity.clone()),
            symptomaticity: trajectory.data.symptomaticity.clone(),
        }
    }
}

impl Trajectory {
    /// Creates a single-strain trajectory attributed to [`DEFAULT_STRAIN`].
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidParameters` if any value is negative or not finite.
    pub fn new(infectivity: Vec<f64>, symptomaticity: Vec<f64>) -> Result<Self, InfectionError> {
        Self::with_strains(
            BTreeMap::from([(DEFAULT_STRAIN, infectivity)]),
            symptomaticity,
        )
    }

    /// Creates a trajectory with one infectivity series per strain. Series of different lengths
    /// are padded with zeros.
    ///
    /// # Errors
    ///
    /// Returns `InfectionError::InvalidParameters` if any value is negative or not finite.
    pub fn with_strains(
        infectivity: BTreeMap<StrainId, Vec<f64>>,
        symptomaticity: Vec<f64>,
    ) -> Result<Self, InfectionError> {
        let all_values = infectivity
            .values()
            .flatten()
            .chain(symptomaticity.iter());
        for value in all_values {
            if !value.is_finite() || *value < 0.0 {
                return Err(InfectionError::InvalidParameters(format!(
                    "trajectory values must be finite and non-negative, found {value}"
                )));
            }
        }

        let mut data = TrajectoryData {
            infectivity,
            symptomaticity,
        };
        data.normalize();
        Ok(Trajectory {
            data: Arc::new(data),
        })
    }

    /// Number of days covered by the curve. Every offset at or beyond it reads as zero.
    #[must_use]
    pub fn duration(&self) -> Day {
        Day::try_from(self.data.len()).unwrap_or(Day::MAX)
    }

    /// Returns the point `offset` days after exposure.
    #[must_use]
    pub fn point(&self, offset: Day) -> TrajectoryPoint {
        match usize::try_from(offset) {
            Ok(index) if index < self.data.len() => self.data.point_at(index),
            _ => TrajectoryPoint::ZERO,
        }
    }

    /// Iterates over every point of the curve in day order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, TrajectoryPoint)> + '_ {
        (0..self.data.len()).map(|index| (index as Day, self.data.point_at(index)))
    }

    /// Every strain that has ever been present in this curve, in ascending order.
    #[must_use]
    pub fn strains(&self) -> Vec<StrainId> {
        self.data.infectivity.keys().copied().collect()
    }

    /// Infectivity carried by `strain` at `offset`.
    #[must_use]
    pub fn strain_infectivity(&self, strain: StrainId, offset: Day) -> f64 {
        let Ok(index) = usize::try_from(offset) else {
            return 0.0;
        };
        self.data
            .infectivity
            .get(&strain)
            .and_then(|series| series.get(index))
            .copied()
            .unwrap_or(0.0)
    }

    /// Replaces the span `[start, end)` with `days` points and moves everything from `end` on
    /// to follow the new span. Shortening drops the end of the span; lengthening repeats its
    /// last point.
    pub fn resize_span(&mut self, start: Day, end: Day, days: Day) {
        let data = Arc::make_mut(&mut self.data);
        data.resize_span(clamp_offset(start), clamp_offset(end), clamp_offset(days));
    }

    /// With `days == 0`, removes all symptoms from `start` on. Otherwise the host is fully
    /// symptomatic on `[start, start + days)` and free of symptoms afterwards.
    pub fn modify_develops_symptoms(&mut self, start: Day, days: Day) {
        let data = Arc::make_mut(&mut self.data);
        let start = clamp_offset(start);
        let end = start + clamp_offset(days);
        if end > data.len() {
            data.extend_to(end);
        }
        for (index, value) in data.symptomaticity.iter_mut().enumerate().skip(start) {
            *value = if index < end {
                FORCED_SYMPTOMATICITY
            } else {
                0.0
            };
        }
        data.normalize();
    }

    /// Reassigns the infectivity carried by `old_strain` to `new_strain` from `offset` on.
    pub fn mutate(&mut self, old_strain: StrainId, new_strain: StrainId, offset: Day) {
        if old_strain == new_strain || !self.data.infectivity.contains_key(&old_strain) {
            return;
        }
        let data = Arc::make_mut(&mut self.data);
        let start = clamp_offset(offset);
        let len = data.len();

        let mut moved = vec![0.0; len];
        if let Some(old_series) = data.infectivity.get_mut(&old_strain) {
            for (index, value) in old_series.iter_mut().enumerate().skip(start) {
                moved[index] = *value;
                *value = 0.0;
            }
        }
        let new_series = data
            .infectivity
            .entry(new_strain)
            .or_insert_with(|| vec![0.0; len]);
        for (value, moved) in new_series.iter_mut().zip(moved) {
            *value += moved;
        }
    }
}

fn clamp_offset(offset: Day) -> usize {
    usize::try_from(offset).unwrap_or(0)
}

impl TrajectoryData {
    fn len(&self) -> usize {
        self.symptomaticity.len()
    }

    fn point_at(&self, index: usize) -> TrajectoryPoint {
        TrajectoryPoint {
            infectivity: self
                .infectivity
                .values()
                .filter_map(|series| series.get(index))
                .sum(),
            symptomaticity: self.symptomaticity[index],
        }
    }

    fn series_mut(&mut self) -> impl Iterator<Item = &mut Vec<f64>> {
        self.infectivity
            .values_mut()
            .chain(std::iter::once(&mut self.symptomaticity))
    }

    fn extend_to(&mut self, len: usize) {
        for series in self.series_mut() {
            if series.len() < len {
                series.resize(len, 0.0);
            }
        }
    }

    fn resize_span(&mut self, start: usize, end: usize, new_len: usize) {
        for series in self.series_mut() {
            resize_series(series, start, end, new_len);
        }
        self.normalize();
    }

    /// Pads every series to a common length, then drops trailing all-zero points.
    fn normalize(&mut self) {
        let len = self
            .series_mut()
            .map(|series| series.len())
            .max()
            .unwrap_or(0);
        self.extend_to(len);

        let mut last = len;
        while last > 0 && self.point_at(last - 1) == TrajectoryPoint::ZERO {
            last -= 1;
        }
        for series in self.series_mut() {
            series.truncate(last);
        }
    }
}

fn resize_series(series: &mut Vec<f64>, start: usize, end: usize, new_len: usize) {
    let start = start.min(series.len());
    let end = end.clamp(start, series.len());
    let old_len = end - start;
    let tail = series.split_off(end);
    if new_len <= old_len {
        series.truncate(start + new_len);
    } else {
        let fill = if old_len > 0 { series[end - 1] } else { 0.0 };
        series.resize(start + new_len, fill);
    }
    series.extend(tail);
}
