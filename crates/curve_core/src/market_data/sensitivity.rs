//! Point and curve-parameter sensitivities.
//!
//! Pricers report first-order risk as [`PointSensitivities`]: derivatives
//! with respect to the discount factor of a named curve at a given time.
//! [`RatesProvider::parameter_sensitivity`](crate::market_data::RatesProvider::parameter_sensitivity)
//! maps them through each curve's parameter sensitivity into
//! [`CurveParameterSensitivities`].

use std::collections::BTreeMap;

use crate::market_data::curves::CurveName;
use crate::market_data::error::MarketDataError;

/// Derivative of a value with respect to `DF_curve(time)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSensitivity {
    /// Curve whose discount factor is differentiated.
    pub curve: CurveName,
    /// Time of the discount factor in years.
    pub time: f64,
    /// Derivative value.
    pub value: f64,
}

/// A list of point sensitivities, kept unaggregated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSensitivities(Vec<PointSensitivity>);

impl PointSensitivities {
    /// Empty sensitivities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single point sensitivity.
    pub fn of(curve: CurveName, time: f64, value: f64) -> Self {
        Self(vec![PointSensitivity { curve, time, value }])
    }

    /// Adds a point sensitivity.
    pub fn push(&mut self, curve: CurveName, time: f64, value: f64) {
        self.0.push(PointSensitivity { curve, time, value });
    }

    /// Concatenates two lists.
    pub fn combined_with(mut self, other: PointSensitivities) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Scales every entry by `factor`.
    pub fn multiplied_by(mut self, factor: f64) -> Self {
        for point in self.0.iter_mut() {
            point.value *= factor;
        }
        self
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &PointSensitivity> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sensitivity to each parameter of each curve, keyed by curve name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveParameterSensitivities(BTreeMap<CurveName, Vec<f64>>);

impl CurveParameterSensitivities {
    /// Empty sensitivities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds `values` to the entry for `curve`, element-wise.
    ///
    /// # Errors
    ///
    /// `MarketDataError::ParameterCountMismatch` if an entry for `curve`
    /// already exists with a different length.
    pub fn add(&mut self, curve: CurveName, values: &[f64]) -> Result<(), MarketDataError> {
        match self.0.get_mut(&curve) {
            Some(existing) => {
                if existing.len() != values.len() {
                    return Err(MarketDataError::ParameterCountMismatch {
                        curve: curve.to_string(),
                        expected: existing.len(),
                        actual: values.len(),
                    });
                }
                for (e, v) in existing.iter_mut().zip(values) {
                    *e += v;
                }
            }
            None => {
                self.0.insert(curve, values.to_vec());
            }
        }
        Ok(())
    }

    /// Sum of two sensitivity sets.
    ///
    /// # Errors
    ///
    /// As for [`CurveParameterSensitivities::add`].
    pub fn combined_with(mut self, other: &CurveParameterSensitivities) -> Result<Self, MarketDataError> {
        for (curve, values) in other.iter() {
            self.add(curve.clone(), values)?;
        }
        Ok(self)
    }

    /// Scales every entry by `factor`.
    pub fn multiplied_by(mut self, factor: f64) -> Self {
        for values in self.0.values_mut() {
            for v in values.iter_mut() {
                *v *= factor;
            }
        }
        self
    }

    /// Sensitivity vector for `curve`.
    pub fn get(&self, curve: &CurveName) -> Option<&[f64]> {
        self.0.get(curve).map(|v| v.as_slice())
    }

    /// Iterates over curves in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurveName, &[f64])> {
        self.0.iter().map(|(name, values)| (name, values.as_slice()))
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.0.values().flat_map(|v| v.iter()).sum()
    }

    /// Returns `true` if there are no curves.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_sensitivities_scale_and_combine() {
        let a = PointSensitivities::of(CurveName::new("A"), 1.0, 2.0);
        let mut b = PointSensitivities::empty();
        b.push(CurveName::new("B"), 2.0, -1.0);

        let combined = a.combined_with(b).multiplied_by(3.0);
        let values: Vec<f64> = combined.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![6.0, -3.0]);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn test_parameter_sensitivities_accumulate() {
        let mut sens = CurveParameterSensitivities::empty();
        sens.add(CurveName::new("A"), &[1.0, 2.0]).unwrap();
        sens.add(CurveName::new("A"), &[0.5, 0.5]).unwrap();
        sens.add(CurveName::new("B"), &[4.0]).unwrap();

        assert_eq!(sens.get(&CurveName::new("A")), Some(&[1.5, 2.5][..]));
        assert_relative_eq!(sens.total(), 8.0);
        assert!(sens.add(CurveName::new("B"), &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_parameter_sensitivities_combined_and_scaled() {
        let mut a = CurveParameterSensitivities::empty();
        a.add(CurveName::new("A"), &[1.0]).unwrap();
        let mut b = CurveParameterSensitivities::empty();
        b.add(CurveName::new("A"), &[2.0]).unwrap();
        b.add(CurveName::new("C"), &[5.0]).unwrap();

        let total = a.combined_with(&b).unwrap().multiplied_by(-1.0);
        assert_eq!(total.get(&CurveName::new("A")), Some(&[-3.0][..]));
        let names: Vec<&str> = total.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
