//! Parameter bundle.
//!
//! The Newton system works on one flat vector. [`ParameterBundle`] records
//! where each curve's parameters sit in it, in curve-definition order then
//! node order, and converts between the vector and the curves.

use std::collections::HashSet;
use std::ops::Range;

use curve_core::market_data::curves::{CurveName, InterpolatedCurve};
use curve_core::market_data::CurveParameterSensitivities;

use crate::error::CalibrationError;

/// Position of one curve in the flat parameter vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// Curve name
    pub name: CurveName,
    /// Offset of the curve's first parameter
    pub offset: usize,
    /// Number of parameters
    pub count: usize,
}

impl BundleEntry {
    /// Index range of the curve's parameters.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.count
    }
}

/// Layout of a group's curves in one parameter vector.
///
/// # Examples
///
/// ```
/// use curve_calibration::calibration::ParameterBundle;
/// use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType};
///
/// let a = InterpolatedCurve::new("A", vec![1.0, 2.0], vec![0.01, 0.02], ValueType::ZeroRate, CurveInterpolation::Linear).unwrap();
/// let b = InterpolatedCurve::new("B", vec![5.0], vec![0.03], ValueType::ZeroRate, CurveInterpolation::Linear).unwrap();
/// let curves = vec![a, b];
///
/// let bundle = ParameterBundle::of("G", &curves).unwrap();
/// let x = bundle.flatten(&curves).unwrap();
/// assert_eq!(x, vec![0.01, 0.02, 0.03]);
///
/// let rebuilt = bundle.unflatten(&[0.011, 0.021, 0.031], &curves).unwrap();
/// assert_eq!(rebuilt[1].parameters(), &[0.031]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBundle {
    group: String,
    entries: Vec<BundleEntry>,
    len: usize,
}

impl ParameterBundle {
    /// Layout for `curves` in the given order.
    ///
    /// # Errors
    ///
    /// `DuplicateCurveName` if a name repeats.
    pub fn of(group: impl Into<String>, curves: &[InterpolatedCurve]) -> Result<Self, CalibrationError> {
        let group = group.into();
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(curves.len());
        let mut offset = 0;
        for curve in curves {
            if !seen.insert(curve.name()) {
                return Err(CalibrationError::duplicate_curve_name(&group, curve.name().as_str()));
            }
            entries.push(BundleEntry {
                name: curve.name().clone(),
                offset,
                count: curve.parameter_count(),
            });
            offset += curve.parameter_count();
        }
        Ok(Self {
            group,
            entries,
            len: offset,
        })
    }

    /// Total parameter count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bundle has no parameters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries in bundle order.
    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    /// Index range of `name`, if the curve is in the bundle.
    pub fn range_of(&self, name: &CurveName) -> Option<Range<usize>> {
        self.entries.iter().find(|e| &e.name == name).map(BundleEntry::range)
    }

    /// Returns `true` if `name` is in the bundle.
    pub fn contains(&self, name: &CurveName) -> bool {
        self.entries.iter().any(|e| &e.name == name)
    }

    /// Concatenated parameters of `curves`.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` if `curves` does not match the layout.
    pub fn flatten(&self, curves: &[InterpolatedCurve]) -> Result<Vec<f64>, CalibrationError> {
        self.check_curves(curves)?;
        let mut x = Vec::with_capacity(self.len);
        for curve in curves {
            x.extend_from_slice(curve.parameters());
        }
        Ok(x)
    }

    /// New curves carrying the slices of `x`.
    ///
    /// # Errors
    ///
    /// Configuration errors if `x` or `curves` does not match the layout;
    /// `InvalidParameters` if a slice is not a valid set of node values.
    pub fn unflatten(&self, x: &[f64], curves: &[InterpolatedCurve]) -> Result<Vec<InterpolatedCurve>, CalibrationError> {
        if x.len() != self.len {
            return Err(CalibrationError::parameter_count_mismatch(&self.group, self.len, x.len()));
        }
        self.check_curves(curves)?;
        self.entries
            .iter()
            .zip(curves)
            .map(|(entry, curve)| {
                curve
                    .with_parameters(x[entry.range()].to_vec())
                    .map_err(|e| CalibrationError::invalid_parameters(&self.group, entry.name.as_str(), e.to_string()))
            })
            .collect()
    }

    /// One Jacobian row in bundle order; curves outside the bundle are
    /// ignored and bundle curves without sensitivity contribute zeros.
    pub fn flatten_sensitivity(&self, sensitivity: &CurveParameterSensitivities) -> Vec<f64> {
        let mut row = vec![0.0; self.len];
        for entry in &self.entries {
            if let Some(values) = sensitivity.get(&entry.name) {
                for (r, v) in row[entry.range()].iter_mut().zip(values) {
                    *r = *v;
                }
            }
        }
        row
    }

    fn check_curves(&self, curves: &[InterpolatedCurve]) -> Result<(), CalibrationError> {
        if curves.len() != self.entries.len() {
            return Err(CalibrationError::parameter_count_mismatch(
                &self.group,
                self.entries.len(),
                curves.len(),
            ));
        }
        for (entry, curve) in self.entries.iter().zip(curves) {
            if &entry.name != curve.name() {
                return Err(CalibrationError::invalid_curve_definition(
                    &self.group,
                    entry.name.as_str(),
                    format!("bundle slot {} holds curve '{}'", entry.offset, curve.name()),
                ));
            }
            if entry.count != curve.parameter_count() {
                return Err(CalibrationError::parameter_count_mismatch(
                    &self.group,
                    entry.count,
                    curve.parameter_count(),
                ));
            }
        }
        Ok(())
    }
}
