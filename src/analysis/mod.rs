//! # Steganalysis
//!
//! Detectors that estimate whether an image carries LSB data, without any
//! knowledge of how it was produced.
//!
//! ## Modules
//!
//! - [`balance`]: chi-square test of the 0/1 split of each channel's LSBs (low p flags)
//! - [`pov`]: pairs-of-values chi-square test on luma (high p flags)
//! - [`bitplane`]: LSB plane images for visual inspection
//! - [`report`]: both detectors combined, text and JSON output
//! - [`chi2`]: chi-square tail probabilities

pub mod balance;
pub mod bitplane;
pub mod chi2;
pub mod pov;
pub mod report;

pub use balance::{analyze_lsb_balance, BalanceReport, ChannelBalance};
pub use bitplane::{lsb_plane, lsb_planes};
pub use pov::{analyze_value_pairs, PovResult};
pub use report::{analyze, export_to_json, AnalysisReport};
