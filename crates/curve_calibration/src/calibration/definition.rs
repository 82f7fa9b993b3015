//! Declarative curve group definitions.
//!
//! A [`CurveGroupDefinition`] lists the curves solved together and, for
//! each, the currencies it discounts and the indices it projects. Each
//! [`CurveDefinition`] lists its [`CurveNode`]s; node order fixes the
//! curve's parameter order and node times come from the templates.

use std::collections::HashSet;

use curve_core::market_data::curves::{
    CurveInterpolation, CurveName, InterpolatedCurve, ParameterMetadata, ValueType,
};
use curve_core::market_data::QuoteId;
use curve_core::types::{Currency, RateIndex};

use crate::calibration::measure::CalibrationMeasure;
use crate::error::CalibrationError;
use crate::instruments::NodeTemplate;

/// One calibration node: an instrument template and its quote.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveNode {
    label: String,
    quote_id: QuoteId,
    template: NodeTemplate,
    measure: Option<CalibrationMeasure>,
}

impl CurveNode {
    /// Creates a node measured by the calibrator's measure table.
    pub fn new(label: impl Into<String>, quote_id: impl Into<QuoteId>, template: NodeTemplate) -> Self {
        Self {
            label: label.into(),
            quote_id: quote_id.into(),
            template,
            measure: None,
        }
    }

    /// Returns the node with an explicit measure.
    pub fn with_measure(mut self, measure: CalibrationMeasure) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Node label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Market data identifier of the quote.
    pub fn quote_id(&self) -> &QuoteId {
        &self.quote_id
    }

    /// Instrument template.
    pub fn template(&self) -> &NodeTemplate {
        &self.template
    }

    /// Explicit measure, if any.
    pub fn measure(&self) -> Option<CalibrationMeasure> {
        self.measure
    }

    /// Curve node time.
    pub fn time(&self) -> f64 {
        self.template.node_time()
    }
}

/// Definition of one calibrated curve.
///
/// # Examples
///
/// ```
/// use curve_calibration::calibration::{CurveDefinition, CurveNode};
/// use curve_calibration::instruments::NodeTemplate;
/// use curve_core::market_data::curves::{CurveInterpolation, ValueType};
/// use curve_core::types::Currency;
///
/// let definition = CurveDefinition::new(
///     "USD-OIS",
///     ValueType::ZeroRate,
///     CurveInterpolation::Linear,
///     vec![
///         CurveNode::new("1Y", "USD-DEP-1Y", NodeTemplate::deposit(Currency::USD, 1.0)),
///         CurveNode::new("2Y", "USD-DEP-2Y", NodeTemplate::deposit(Currency::USD, 2.0)),
///     ],
/// );
/// assert_eq!(definition.parameter_count(), 2);
/// assert_eq!(definition.node_times(), vec![1.0, 2.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CurveDefinition {
    name: CurveName,
    value_type: ValueType,
    interpolation: CurveInterpolation,
    nodes: Vec<CurveNode>,
}

impl CurveDefinition {
    /// Creates a curve definition.
    pub fn new(
        name: impl Into<CurveName>,
        value_type: ValueType,
        interpolation: CurveInterpolation,
        nodes: Vec<CurveNode>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            interpolation,
            nodes,
        }
    }

    /// Curve name.
    pub fn name(&self) -> &CurveName {
        &self.name
    }

    /// Value type of the parameters.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Interpolation method.
    pub fn interpolation(&self) -> CurveInterpolation {
        self.interpolation
    }

    /// Nodes in parameter order.
    pub fn nodes(&self) -> &[CurveNode] {
        &self.nodes
    }

    /// Number of parameters.
    pub fn parameter_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node times in parameter order.
    pub fn node_times(&self) -> Vec<f64> {
        self.nodes.iter().map(CurveNode::time).collect()
    }

    /// Checks node templates, labels and times.
    ///
    /// # Errors
    ///
    /// `InvalidCurveDefinition` naming the first problem found.
    pub fn validate(&self, group: &str) -> Result<(), CalibrationError> {
        let invalid = |reason: String| CalibrationError::invalid_curve_definition(group, self.name.as_str(), reason);
        if self.nodes.is_empty() {
            return Err(invalid("curve has no nodes".to_string()));
        }
        let mut labels = HashSet::new();
        for node in &self.nodes {
            node.template
                .validate()
                .map_err(|reason| invalid(format!("node '{}': {}", node.label, reason)))?;
            if !labels.insert(node.label.as_str()) {
                return Err(invalid(format!("node label '{}' is used twice", node.label)));
            }
        }
        for pair in self.nodes.windows(2) {
            if pair[1].time() <= pair[0].time() {
                return Err(invalid(format!(
                    "node '{}' at {} does not follow node '{}' at {}",
                    pair[1].label,
                    pair[1].time(),
                    pair[0].label,
                    pair[0].time()
                )));
            }
        }
        Ok(())
    }

    /// Builds the starting curve from one zero rate per node.
    ///
    /// Parameter metadata carries each node's label and quote identifier.
    ///
    /// # Errors
    ///
    /// `InvalidCurveDefinition` if the curve cannot be constructed.
    pub fn initial_curve(&self, group: &str, zero_rates: &[f64]) -> Result<InterpolatedCurve, CalibrationError> {
        let times = self.node_times();
        let values = match self.value_type {
            ValueType::ZeroRate => zero_rates.to_vec(),
            ValueType::DiscountFactor => times
                .iter()
                .zip(zero_rates)
                .map(|(t, r)| (-r * t).exp())
                .collect(),
        };
        let invalid = |e: curve_core::market_data::MarketDataError| {
            CalibrationError::invalid_curve_definition(group, self.name.as_str(), e.to_string())
        };
        InterpolatedCurve::new(self.name.clone(), times, values, self.value_type, self.interpolation)
            .and_then(|curve| curve.with_parameter_metadata(self.parameter_metadata()))
            .map_err(invalid)
    }

    /// Label and quote identifier of every node.
    pub fn parameter_metadata(&self) -> Vec<ParameterMetadata> {
        self.nodes
            .iter()
            .map(|node| ParameterMetadata {
                label: node.label.clone(),
                quote_id: Some(node.quote_id.clone()),
            })
            .collect()
    }
}

/// A curve of a group with the roles it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGroupEntry {
    /// Curve definition
    pub definition: CurveDefinition,
    /// Currencies discounted on the curve
    pub discount_currencies: Vec<Currency>,
    /// Indices projected from the curve
    pub indices: Vec<RateIndex>,
}

/// Curves calibrated together in one Newton solve.
///
/// # Examples
///
/// ```
/// use curve_calibration::calibration::{CurveDefinition, CurveGroupDefinition, CurveNode};
/// use curve_calibration::instruments::NodeTemplate;
/// use curve_core::market_data::curves::{CurveInterpolation, ValueType};
/// use curve_core::types::{Currency, RateIndex};
///
/// let sofr = RateIndex::overnight("USD-SOFR", Currency::USD);
/// let ois = CurveDefinition::new(
///     "USD-OIS",
///     ValueType::ZeroRate,
///     CurveInterpolation::Linear,
///     vec![CurveNode::new("1Y", "USD-DEP-1Y", NodeTemplate::deposit(Currency::USD, 1.0))],
/// );
/// let group = CurveGroupDefinition::new("USD")
///     .with_curve(ois, vec![Currency::USD], vec![sofr]);
/// assert_eq!(group.node_count(), 1);
/// assert!(group.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGroupDefinition {
    name: String,
    entries: Vec<CurveGroupEntry>,
}

impl CurveGroupDefinition {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Adds a curve with its discounting and projection roles.
    pub fn with_curve(
        mut self,
        definition: CurveDefinition,
        discount_currencies: Vec<Currency>,
        indices: Vec<RateIndex>,
    ) -> Self {
        self.entries.push(CurveGroupEntry {
            definition,
            discount_currencies,
            indices,
        });
        self
    }

    /// Adds a discount-only curve.
    pub fn with_discount_curve(self, definition: CurveDefinition, currency: Currency) -> Self {
        self.with_curve(definition, vec![currency], Vec::new())
    }

    /// Adds a projection-only curve.
    pub fn with_forward_curve(self, definition: CurveDefinition, index: RateIndex) -> Self {
        self.with_curve(definition, Vec::new(), vec![index])
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries in definition order.
    pub fn entries(&self) -> &[CurveGroupEntry] {
        &self.entries
    }

    /// Total node count, the size of the Newton system.
    pub fn node_count(&self) -> usize {
        self.entries.iter().map(|e| e.definition.parameter_count()).sum()
    }

    /// Curve names in definition order.
    pub fn curve_names(&self) -> Vec<&CurveName> {
        self.entries.iter().map(|e| e.definition.name()).collect()
    }

    /// Discount mappings declared by the group.
    pub fn discount_mappings(&self) -> Vec<(Currency, CurveName)> {
        self.entries
            .iter()
            .flat_map(|e| {
                e.discount_currencies
                    .iter()
                    .map(move |c| (*c, e.definition.name().clone()))
            })
            .collect()
    }

    /// Forward mappings declared by the group.
    pub fn forward_mappings(&self) -> Vec<(RateIndex, CurveName)> {
        self.entries
            .iter()
            .flat_map(|e| {
                e.indices
                    .iter()
                    .map(move |i| (i.clone(), e.definition.name().clone()))
            })
            .collect()
    }

    /// Checks curve names and every curve definition.
    ///
    /// # Errors
    ///
    /// `DuplicateCurveName` or `InvalidCurveDefinition`.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let mut names = HashSet::new();
        for entry in &self.entries {
            let name = entry.definition.name();
            if !names.insert(name) {
                return Err(CalibrationError::duplicate_curve_name(&self.name, name.as_str()));
            }
            entry.definition.validate(&self.name)?;
        }
        Ok(())
    }
}
