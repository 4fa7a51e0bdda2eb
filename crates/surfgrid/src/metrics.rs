//! Robust scalar reductions of the derived maps.
//!
//! Each metric keeps its own recipe: PV is a plain range, NCE clips at
//! `3σ` around the median before the final `median + 3σ`, SFMA and tilt use
//! `median + 3σ` without clipping. `σ` is the population standard deviation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `max − min`, `None` for an empty set.
pub fn peak_to_valley(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some(max - min)
}

/// Median; the two middle values are averaged for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    })
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(var.sqrt())
}

/// Center/spread pair behind a `center + 3σ` metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaStat {
    pub center: f64,
    pub sigma: f64,
    /// Number of values that entered `sigma`.
    pub n: usize,
}

impl SigmaStat {
    /// `center + 3σ`.
    pub fn value(&self) -> f64 {
        self.center + 3.0 * self.sigma
    }
}

/// `median + 3σ` over all values.
pub fn median_plus_3sigma(values: &[f64]) -> Option<SigmaStat> {
    Some(SigmaStat {
        center: median(values)?,
        sigma: std_dev(values)?,
        n: values.len(),
    })
}

/// Two-pass clipped statistic: values farther than `3σ` from the median are
/// dropped before `σ` is recomputed. The center stays the unclipped median.
pub fn clipped_median_plus_3sigma(values: &[f64]) -> Option<SigmaStat> {
    let center = median(values)?;
    let sigma_raw = std_dev(values)?;
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| (v - center).abs() <= 3.0 * sigma_raw)
        .collect();
    Some(SigmaStat {
        center,
        sigma: std_dev(&kept)?,
        n: kept.len(),
    })
}

/// Scalar surface metrics. Absent entries had no valid source cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetrics {
    /// Peak-to-valley of the globally detrended surface (m).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pv: Option<f64>,
    /// Non-correctable error, clipped `median + 3σ` of field residuals (m).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nce: Option<f64>,
    /// Dynamic sub-aperture form, `median + 3σ` of the slit-averaged map (m).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfma: Option<f64>,
    /// Local tilt, `median + 3σ` of the slope magnitude (µrad).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    /// Largest local tilt (µrad).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nce_stat: Option<SigmaStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfma_stat: Option<SigmaStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_stat: Option<SigmaStat>,
}

impl SurfaceMetrics {
    /// Reduce the per-map values. Each slice holds the defined cells of one
    /// source map.
    pub fn from_maps(
        residual: &[f64],
        nce_residual: &[f64],
        sfma: &[f64],
        tilt: &[f64],
    ) -> Self {
        let nce_stat = clipped_median_plus_3sigma(nce_residual);
        let sfma_stat = median_plus_3sigma(sfma);
        let tilt_stat = median_plus_3sigma(tilt);
        Self {
            pv: peak_to_valley(residual),
            nce: nce_stat.map(|s| s.value()),
            sfma: sfma_stat.map(|s| s.value()),
            tilt: tilt_stat.map(|s| s.value()),
            tilt_max: tilt.iter().copied().reduce(f64::max),
            nce_stat,
            sfma_stat,
            tilt_stat,
        }
    }

    /// Metric name → value, for the metrics that could be computed.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        [
            ("pv", self.pv),
            ("nce", self.nce),
            ("sfma", self.sfma),
            ("tilt", self.tilt),
            ("tilt_max", self.tilt_max),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn std_is_population() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_abs_diff_eq!(sd, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn pv_is_range() {
        assert_eq!(peak_to_valley(&[1.0, -2.0, 0.5]), Some(3.0));
        assert_eq!(peak_to_valley(&[]), None);
    }

    #[test]
    fn clipping_drops_outliers_only_for_sigma() {
        let mut values = vec![0.0; 99];
        for (i, v) in values.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        values.push(100.0);
        let plain = median_plus_3sigma(&values).unwrap();
        let clipped = clipped_median_plus_3sigma(&values).unwrap();
        assert_eq!(clipped.n, 99);
        assert_eq!(plain.n, 100);
        assert!(clipped.sigma < plain.sigma);
        assert_eq!(clipped.center, plain.center);
        assert_abs_diff_eq!(clipped.sigma, std_dev(&values[..99]).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn constant_values_have_zero_sigma() {
        let stat = clipped_median_plus_3sigma(&[2.0; 5]).unwrap();
        assert_eq!(stat.value(), 2.0);
        assert_eq!(stat.n, 5);
    }

    #[test]
    fn empty_sources_give_absent_metrics() {
        let m = SurfaceMetrics::from_maps(&[], &[], &[1.0, 3.0], &[]);
        assert!(m.pv.is_none());
        assert!(m.nce.is_none());
        assert!(m.tilt.is_none());
        assert!(m.tilt_max.is_none());
        assert_eq!(m.sfma, Some(2.0 + 3.0));
        assert_eq!(m.as_map().keys().copied().collect::<Vec<_>>(), vec!["sfma"]);
    }

    #[test]
    fn tilt_reports_max() {
        let m = SurfaceMetrics::from_maps(&[0.0], &[0.0], &[0.0], &[1.0, 5.0, 2.0]);
        assert_eq!(m.tilt_max, Some(5.0));
        assert_eq!(m.pv, Some(0.0));
    }
}
