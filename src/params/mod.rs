//! Input loading, validation, and demand-rate normalization.
//!
//! The pipeline receives two inputs: a JSON object of per-item parameters
//! and a bracketed comma-separated production sequence. This module decodes
//! both, validates them, and applies the normalization used throughout the
//! recovery-policy formulation: every quantity is divided (or multiplied)
//! by the raw demand rates so that the normalized demand of every item
//! is 1.

use ndarray::Array1;
use serde::Deserialize;

use crate::error::{GrpError, GrpResult};

/// Raw problem parameters as they arrive in the JSON payload.
///
/// All five array fields must have the same length m (the number of items);
/// `machineEfficiency` and `tolerance` are scalars. Field names are
/// camelCase on the wire.
///
/// # Examples
///
/// ```
/// use grp_rs::params::GrpParams;
///
/// let params = GrpParams::from_json(
///     r#"{
///         "demandRates": [1.0, 1.0],
///         "productionRates": [3.0, 3.0],
///         "machineEfficiency": 1.0,
///         "inventoryHoldingCosts": [1.0, 1.0],
///         "backlogCosts": [1.0, 1.0],
///         "tolerance": 0.01
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(params.demand_rates.len(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpParams {
    /// Raw demand rate per item (units of product per unit time).
    pub demand_rates: Vec<f64>,
    /// Nominal production rate per item, before efficiency compensation.
    pub production_rates: Vec<f64>,
    /// Machine efficiency in (0, 1]; scales every production rate.
    pub machine_efficiency: f64,
    /// Inventory holding cost per unit per unit time, per item.
    pub inventory_holding_costs: Vec<f64>,
    /// Backlog cost per unit per unit time, per item.
    pub backlog_costs: Vec<f64>,
    /// Maximum relative ARME residual accepted without a warning.
    pub tolerance: f64,
}

impl GrpParams {
    /// Decode parameters from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`GrpError::MalformedInput`] when the document is not valid
    /// JSON or a required field is missing or of the wrong type.
    pub fn from_json(text: &str) -> GrpResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| GrpError::MalformedInput(format!("bad parameter JSON: {}", e)))
    }
}

/// Parse a production sequence like `[0, 1, 2, 0, 1]`.
///
/// Brackets are optional and whitespace around entries is tolerated (the
/// upstream caller prints its sequence with spaces after each comma).
/// Entries must be non-negative integers; range checks against the item
/// count happen later in [`GrpInputs::new`], where m is known.
///
/// # Examples
///
/// ```
/// use grp_rs::params::parse_sequence;
///
/// assert_eq!(parse_sequence("[0,1,2,0,1]").unwrap(), vec![0, 1, 2, 0, 1]);
/// assert_eq!(parse_sequence("[0, 1]").unwrap(), vec![0, 1]);
/// assert_eq!(parse_sequence("0,1").unwrap(), vec![0, 1]);
/// assert!(parse_sequence("[0,-1]").is_err());
/// ```
///
/// # Errors
///
/// Returns [`GrpError::InvalidSequence`] when the list is empty or an entry
/// does not parse as a non-negative integer.
pub fn parse_sequence(text: &str) -> GrpResult<Vec<usize>> {
    let cleaned = text.replace('[', "").replace(']', "");
    if cleaned.trim().is_empty() {
        return Err(GrpError::InvalidSequence(
            "the sequence must contain at least one entry".to_string(),
        ));
    }
    cleaned
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<usize>().map_err(|_| {
                GrpError::InvalidSequence(format!(
                    "sequence entry '{}' is not a non-negative integer",
                    token
                ))
            })
        })
        .collect()
}

/// Validated, demand-normalized problem inputs.
///
/// Normalization convention: demand rates are scaled to 1 for every item,
/// production rates become `p = rate · efficiency / demand`, and the unit
/// costs are demand-scaled (`h = holding · demand`, `b = backlog · demand`).
/// The raw demand rates are retained because the final gain matrix is
/// rescaled by them on output.
#[derive(Debug, Clone)]
pub struct GrpInputs {
    /// Raw per-item demand rates, kept for the output rescaling.
    pub d_raw: Array1<f64>,
    /// Efficiency-compensated, demand-normalized production rates.
    pub p: Array1<f64>,
    /// Demand-scaled holding costs.
    pub h: Array1<f64>,
    /// Demand-scaled backlog costs.
    pub b: Array1<f64>,
    /// Maximum relative ARME residual accepted without a warning.
    pub tolerance: f64,
    /// Cyclic production sequence; entry j is the item run in slot j.
    pub seq: Vec<usize>,
}

impl GrpInputs {
    /// Validate the raw parameters and sequence and build the normalized
    /// input bundle.
    ///
    /// # Arguments
    ///
    /// * `params` - decoded JSON parameters
    /// * `seq` - parsed production sequence
    ///
    /// # Errors
    ///
    /// * [`GrpError::MalformedInput`] - empty item set, array length
    ///   mismatch, non-finite values, or a non-positive demand rate (the
    ///   normalization divides by it).
    /// * [`GrpError::InvalidSequence`] - empty sequence, an entry outside
    ///   `[0, m)`, or a minimum entry that is nonzero. Item indices are
    ///   zero-based, so a sequence that never visits item 0 was numbered
    ///   from 1 by the caller and is rejected.
    pub fn new(params: GrpParams, seq: Vec<usize>) -> GrpResult<Self> {
        let m = params.demand_rates.len();
        if m == 0 {
            return Err(GrpError::MalformedInput(
                "demandRates must contain at least one item".to_string(),
            ));
        }
        for (name, len) in [
            ("productionRates", params.production_rates.len()),
            ("inventoryHoldingCosts", params.inventory_holding_costs.len()),
            ("backlogCosts", params.backlog_costs.len()),
        ] {
            if len != m {
                return Err(GrpError::MalformedInput(format!(
                    "{} has length {} but demandRates has length {}",
                    name, len, m
                )));
            }
        }
        if !params.machine_efficiency.is_finite() {
            return Err(GrpError::MalformedInput(
                "machineEfficiency must be finite".to_string(),
            ));
        }
        for &rate in &params.demand_rates {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(GrpError::MalformedInput(format!(
                    "demand rates must be positive and finite, got {}",
                    rate
                )));
            }
        }
        for (name, values) in [
            ("productionRates", &params.production_rates),
            ("inventoryHoldingCosts", &params.inventory_holding_costs),
            ("backlogCosts", &params.backlog_costs),
        ] {
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(GrpError::MalformedInput(format!(
                    "{} contains a non-finite value {}",
                    name, bad
                )));
            }
        }

        if seq.is_empty() {
            return Err(GrpError::InvalidSequence(
                "the sequence must contain at least one entry".to_string(),
            ));
        }
        if let Some(&bad) = seq.iter().find(|&&item| item >= m) {
            return Err(GrpError::InvalidSequence(format!(
                "sequence entry {} is out of range for {} items",
                bad, m
            )));
        }
        if !seq.contains(&0) {
            return Err(GrpError::InvalidSequence(
                "item indices must start at 0".to_string(),
            ));
        }

        let d_raw = Array1::from_vec(params.demand_rates);
        let p = Array1::from_vec(params.production_rates) * params.machine_efficiency / &d_raw;
        let h = Array1::from_vec(params.inventory_holding_costs) * &d_raw;
        let b = Array1::from_vec(params.backlog_costs) * &d_raw;

        Ok(GrpInputs {
            d_raw,
            p,
            h,
            b,
            tolerance: params.tolerance,
            seq,
        })
    }

    /// Number of items m.
    pub fn num_items(&self) -> usize {
        self.d_raw.len()
    }

    /// Sequence length n.
    pub fn cycle_len(&self) -> usize {
        self.seq.len()
    }
}
