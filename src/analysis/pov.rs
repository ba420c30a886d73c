//! # Pairs-of-Values Test
//!
//! Writing random bits into LSBs pushes the frequencies of each value pair
//! `(2k, 2k+1)` towards each other. This test builds the 256-bin histogram
//! of a luma plane and runs a chi-square test of "each pair is evenly split".
//!
//! The verdict runs opposite to the balance test: a *high* p-value (the
//! pairs look too even) is what flags an image.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::chi2::chi2_sf;
use crate::processing::grid::Plane;

/// Outcome of the pairs-of-values test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PovResult {
    pub chi2: f64,
    /// Number of value pairs with at least one occurrence
    pub dof: u32,
    pub p_value: f64,
    pub suspect_threshold: f64,
    /// `p_value > suspect_threshold`
    pub suspicious: bool,
    /// Set when the test could not run on this input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Intensity histogram the statistic was computed from
    pub histogram: Vec<u64>,
}

/// Runs the pairs-of-values test on a single-channel plane.
///
/// # Arguments
/// - `plane`: Luma (or any single channel) raster
/// - `suspect_threshold`: p-values above this flag the image
///
/// # Returns
/// A [`PovResult`]. A plane with no pixels yields a non-suspicious result
/// with `dof == 0` and an explanatory note rather than an error.
pub fn analyze_value_pairs(plane: &Plane, suspect_threshold: f64) -> PovResult {
    let histogram = plane.histogram();

    let mut chi2 = 0.0;
    let mut dof = 0u32;
    for pair in histogram.chunks_exact(2) {
        let (n1, n2) = (pair[0] as f64, pair[1] as f64);
        if n1 + n2 == 0.0 {
            continue;
        }
        let expected = (n1 + n2) / 2.0;
        chi2 += (n1 - expected).powi(2) / expected + (n2 - expected).powi(2) / expected;
        dof += 1;
    }

    if dof == 0 {
        return PovResult {
            chi2: 0.0,
            dof: 0,
            p_value: 1.0,
            suspect_threshold,
            suspicious: false,
            note: Some("not enough data for a pairs-of-values test".to_string()),
            histogram: histogram.to_vec(),
        };
    }

    let p_value = chi2_sf(chi2, dof);
    debug!(
        "PoV over {} pairs: chi2 = {:.4}, p = {:.6}",
        dof, chi2, p_value
    );

    PovResult {
        chi2,
        dof,
        p_value,
        suspect_threshold,
        suspicious: p_value > suspect_threshold,
        note: None,
        histogram: histogram.to_vec(),
    }
}

impl fmt::Display for PovResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pairs-of-Values Test ===")?;
        if let Some(note) = &self.note {
            return write!(f, "{}", note);
        }
        writeln!(f, "Chi-square statistic: {:.2}", self.chi2)?;
        writeln!(f, "Degrees of freedom: {}", self.dof)?;
        writeln!(f, "P-value: {:.4}", self.p_value)?;
        if self.suspicious {
            write!(
                f,
                "Verdict: value pairs are unnaturally even (p > {}), likely LSB embedding",
                self.suspect_threshold
            )
        } else {
            write!(
                f,
                "Verdict: value pairs look natural (p <= {}), no LSB evidence",
                self.suspect_threshold
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Even values dominate each pair 8:2.
    fn skewed_plane() -> Plane {
        let data: Vec<u8> = (0..1280usize)
            .map(|i| (2 * (i % 128) + usize::from(i % 5 == 0)) as u8)
            .collect();
        Plane::new(1280, 1, data).unwrap()
    }

    #[test]
    fn natural_pairs_are_not_flagged() {
        let result = analyze_value_pairs(&skewed_plane(), 0.1);
        assert_eq!(result.dof, 128);
        assert!((result.chi2 - 460.8).abs() < 1e-9);
        assert!(result.p_value < 1e-6);
        assert!(!result.suspicious);
    }

    #[test]
    fn equalized_pairs_are_flagged() {
        // Flip LSBs so each pair is split exactly in half.
        let mut seen = [0usize; 128];
        let data: Vec<u8> = skewed_plane()
            .as_raw()
            .iter()
            .map(|&v| {
                let pair = (v / 2) as usize;
                let lsb = (seen[pair] % 2) as u8;
                seen[pair] += 1;
                (v & !1) | lsb
            })
            .collect();
        let plane = Plane::new(1280, 1, data).unwrap();

        let result = analyze_value_pairs(&plane, 0.1);
        assert_eq!(result.chi2, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(result.suspicious);
    }

    #[test]
    fn empty_pairs_are_skipped() {
        let plane = Plane::new(4, 1, vec![10, 10, 11, 11]).unwrap();
        let result = analyze_value_pairs(&plane, 0.1);
        assert_eq!(result.dof, 1);
        assert_eq!(result.histogram[10], 2);
        assert_eq!(result.histogram.len(), 256);
    }

    #[test]
    fn empty_plane_is_degenerate() {
        let plane = Plane::new(0, 0, vec![]).unwrap();
        let result = analyze_value_pairs(&plane, 0.1);
        assert_eq!(result.dof, 0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.suspicious);
        assert!(result.note.is_some());
        assert!(result.to_string().contains("not enough data"));
    }
}
