//! grp-rs: steady-state gain computation for Gallego's Recovery Policy
//!
//! Gallego's Recovery Policy controls a multi-item production system that
//! shares a single machine under a fixed cyclic production sequence. After a
//! disruption, the policy steers the system back to its target surplus
//! trajectory by adjusting the time spent on each run of the cycle:
//! `v = G·z`, where `z` holds the cumulative production deviation per item
//! (units of product) and `v` the timing correction per sequence position
//! (units of time). This crate computes the steady-state gain matrix `G` by
//! assembling the policy's cost and dynamics matrices, solving the associated
//! discrete-time algebraic Riccati matrix equation (ARME), and verifying the
//! residual of the returned solution.
//!
//! # Organization
//!
//! - `params`: JSON parameter decoding, sequence parsing, demand normalization
//! - `matrices`: assembly of the recovery-policy matrices
//! - `dare`: discrete-time algebraic Riccati equation solver
//! - `gain`: ARME residual check, gain extraction, end-to-end pipeline
//! - `error`: crate-wide error type
//!
//! # Example
//!
//! ```
//! use grp_rs::gain::compute_recovery_gain;
//! use grp_rs::params::{parse_sequence, GrpInputs, GrpParams};
//!
//! let json = r#"{
//!     "demandRates": [1.0],
//!     "productionRates": [2.0],
//!     "machineEfficiency": 1.0,
//!     "inventoryHoldingCosts": [1.0],
//!     "backlogCosts": [1.0],
//!     "tolerance": 0.01
//! }"#;
//! let params = GrpParams::from_json(json).unwrap();
//! let seq = parse_sequence("[0]").unwrap();
//! let inputs = GrpInputs::new(params, seq).unwrap();
//!
//! let result = compute_recovery_gain(&inputs).unwrap();
//! assert!(result.tolerance_met());
//! assert!((result.gain[[0, 0]] - 1.0).abs() < 1e-10);
//! ```

pub mod dare;
pub mod error;
pub mod gain;
pub mod matrices;
pub mod params;

pub use error::{GrpError, GrpResult};
