//! # LSB Balance Test
//!
//! Counts zeros and ones in the LSB layer of each colour channel and runs a
//! one-degree-of-freedom chi-square goodness-of-fit test against an even
//! 50/50 split.
//!
//! A low p-value means the split is far from even. Natural images usually sit
//! close to 50/50 already, so on its own this is weak evidence; it is a
//! first-pass indicator.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::chi2::chi2_sf;
use crate::processing::grid::{Channel, PixelGrid};

/// Balance test outcome for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBalance {
    pub channel: Channel,
    pub count_0: u64,
    pub count_1: u64,
    /// Percentage of zero LSBs (0–100)
    pub pct_0: f64,
    /// Percentage of one LSBs (0–100)
    pub pct_1: f64,
    pub chi2: f64,
    /// Always 1
    pub dof: u32,
    pub p_value: f64,
    /// `p_value < alpha`
    pub suspicious: bool,
}

/// Balance test outcome for R, G and B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub alpha: f64,
    pub channels: Vec<ChannelBalance>,
}

impl BalanceReport {
    /// Result for one channel.
    pub fn channel(&self, channel: Channel) -> Option<&ChannelBalance> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    /// True when any channel is flagged.
    pub fn any_suspicious(&self) -> bool {
        self.channels.iter().any(|c| c.suspicious)
    }
}

/// Runs the balance test on one channel of `grid`.
pub fn analyze_channel(grid: &PixelGrid, channel: Channel, alpha: f64) -> ChannelBalance {
    let total = grid.pixel_count() as u64;
    let count_1 = grid.channel_values(channel).filter(|v| v & 1 == 1).count() as u64;
    let count_0 = total - count_1;

    if total == 0 {
        return ChannelBalance {
            channel,
            count_0,
            count_1,
            pct_0: 0.0,
            pct_1: 0.0,
            chi2: 0.0,
            dof: 1,
            p_value: 1.0,
            suspicious: false,
        };
    }

    let expected = total as f64 / 2.0;
    let chi2 = [count_0, count_1]
        .iter()
        .map(|&observed| (observed as f64 - expected).powi(2) / expected)
        .sum::<f64>();
    let p_value = chi2_sf(chi2, 1);

    debug!(
        "{} LSB balance: {} zeros / {} ones, chi2 = {:.4}, p = {:.6}",
        channel, count_0, count_1, chi2, p_value
    );

    ChannelBalance {
        channel,
        count_0,
        count_1,
        pct_0: count_0 as f64 * 100.0 / total as f64,
        pct_1: count_1 as f64 * 100.0 / total as f64,
        chi2,
        dof: 1,
        p_value,
        suspicious: p_value < alpha,
    }
}

/// Runs the balance test on R, G and B independently.
pub fn analyze_lsb_balance(grid: &PixelGrid, alpha: f64) -> BalanceReport {
    BalanceReport {
        alpha,
        channels: Channel::ALL
            .iter()
            .map(|&channel| analyze_channel(grid, channel, alpha))
            .collect(),
    }
}

impl fmt::Display for ChannelBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} Channel ===", self.channel)?;
        writeln!(f, "0 bits: {} ({:.2}%)", self.count_0, self.pct_0)?;
        writeln!(f, "1 bits: {} ({:.2}%)", self.count_1, self.pct_1)?;
        writeln!(f, "Chi-square statistic: {:.2}", self.chi2)?;
        write!(f, "P-value: {:.4}", self.p_value)?;
        if self.suspicious {
            write!(f, "  [uneven LSB split]")?;
        }
        Ok(())
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", channel)?;
        }
        Ok(())
    }
}
