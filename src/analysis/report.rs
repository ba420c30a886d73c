//! Combined steganalysis report and its JSON export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::balance::{analyze_lsb_balance, BalanceReport};
use super::pov::{analyze_value_pairs, PovResult};
use crate::common::config::AnalysisConfig;
use crate::processing::grid::PixelGrid;

/// Both detectors run over one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Label for the image, usually its path
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub balance: BalanceReport,
    pub pov: PovResult,
}

impl AnalysisReport {
    /// True when either detector flags the image.
    pub fn suspicious(&self) -> bool {
        self.balance.any_suspicious() || self.pov.suspicious
    }
}

/// Runs the balance test on the colour channels and the PoV test on luma.
pub fn analyze(grid: &PixelGrid, label: impl Into<String>, config: &AnalysisConfig) -> AnalysisReport {
    AnalysisReport {
        image: label.into(),
        width: grid.width(),
        height: grid.height(),
        balance: analyze_lsb_balance(grid, config.balance_alpha),
        pov: analyze_value_pairs(&grid.to_luma(), config.pov_suspect_threshold),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "##### {} ({}x{}) #####", self.image, self.width, self.height)?;
        writeln!(f)?;
        writeln!(f, "{}", self.balance)?;
        write!(f, "{}", self.pov)
    }
}

/// Writes reports as pretty JSON with a generation timestamp.
///
/// # Arguments
/// - `reports`: One entry per analysed image
/// - `path`: Output file, created or truncated
pub fn export_to_json<P: AsRef<Path>>(reports: &[AnalysisReport], path: P) -> std::io::Result<()> {
    let output = serde_json::json!({
        "generated_at": chrono::Local::now().to_rfc3339(),
        "reports": reports,
    });

    let json_string = serde_json::to_string_pretty(&output)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;

    Ok(())
}
