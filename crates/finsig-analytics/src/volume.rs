//! Volume analytics: VWAP variants, volume profile, OBV, A/D line, MFI,
//! relative volume, surge detection and price/flow divergence flags.

use serde::{Deserialize, Serialize};

use finsig_core::{PriceSeries, UtcDateTime};

use crate::error::{require_history, AnalyticsError};
use crate::signal::{FlowTrend, MomentumSignal, VolumeLevel};

pub const DEFAULT_PROFILE_BUCKETS: usize = 50;
pub const DEFAULT_VALUE_AREA_FRACTION: f64 = 0.70;
pub const DEFAULT_SURGE_MULTIPLE: f64 = 2.0;

/// Thresholds and windows for the volume components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Trailing window for rolling VWAP.
    pub vwap_window: usize,
    pub profile_buckets: usize,
    pub value_area_fraction: f64,
    /// Trailing window for the relative-volume average (exclusive of the
    /// current bar).
    pub relative_volume_window: usize,
    pub high_relative_volume: f64,
    pub low_relative_volume: f64,
    pub surge_multiple: f64,
    pub mfi_window: usize,
    pub mfi_overbought: f64,
    pub mfi_oversold: f64,
    /// Bars between the endpoints of the OBV / A-D trend comparison.
    pub flow_lookback: usize,
    pub divergence_lookback: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            vwap_window: 20,
            profile_buckets: DEFAULT_PROFILE_BUCKETS,
            value_area_fraction: DEFAULT_VALUE_AREA_FRACTION,
            relative_volume_window: 20,
            high_relative_volume: 1.5,
            low_relative_volume: 0.5,
            surge_multiple: DEFAULT_SURGE_MULTIPLE,
            mfi_window: 14,
            mfi_overbought: 80.0,
            mfi_oversold: 20.0,
            flow_lookback: 20,
            divergence_lookback: 20,
        }
    }
}

/// VWAP accumulation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapMode {
    /// Cumulative sums reset at each UTC calendar-date boundary.
    Session,
    /// Trailing fixed window.
    Rolling,
    /// Accumulates from series start, never resets.
    Anchored,
}

/// Volume-weighted average price series.
///
/// `Session` and `Anchored` outputs cover every bar; `Rolling` is
/// tail-aligned with length `len - window + 1`. A zero cumulative volume
/// falls back to the bar's typical price.
pub fn vwap(
    series: &PriceSeries,
    mode: VwapMode,
    config: &VolumeConfig,
) -> Result<Vec<f64>, AnalyticsError> {
    require_history(1, series.len())?;
    let bars = series.bars();

    match mode {
        VwapMode::Session => {
            let mut out = Vec::with_capacity(bars.len());
            let mut session = bars[0].ts.date();
            let mut cum_pv = 0.0;
            let mut cum_v = 0.0;
            for bar in bars {
                if bar.ts.date() != session {
                    session = bar.ts.date();
                    cum_pv = 0.0;
                    cum_v = 0.0;
                }
                cum_pv += bar.typical_price() * bar.volume as f64;
                cum_v += bar.volume as f64;
                out.push(weighted_or_typical(cum_pv, cum_v, bar.typical_price()));
            }
            Ok(out)
        }
        VwapMode::Rolling => {
            let window = config.vwap_window;
            if window == 0 {
                return Err(AnalyticsError::invalid_input("vwap window must be positive"));
            }
            require_history(window, bars.len())?;

            let mut out = Vec::with_capacity(bars.len() - window + 1);
            for end in window..=bars.len() {
                let slice = &bars[end - window..end];
                let pv: f64 = slice
                    .iter()
                    .map(|bar| bar.typical_price() * bar.volume as f64)
                    .sum();
                let volume: f64 = slice.iter().map(|bar| bar.volume as f64).sum();
                out.push(weighted_or_typical(
                    pv,
                    volume,
                    slice[slice.len() - 1].typical_price(),
                ));
            }
            Ok(out)
        }
        VwapMode::Anchored => {
            let mut out = Vec::with_capacity(bars.len());
            let mut cum_pv = 0.0;
            let mut cum_v = 0.0;
            for bar in bars {
                cum_pv += bar.typical_price() * bar.volume as f64;
                cum_v += bar.volume as f64;
                out.push(weighted_or_typical(cum_pv, cum_v, bar.typical_price()));
            }
            Ok(out)
        }
    }
}

fn weighted_or_typical(pv: f64, volume: f64, typical: f64) -> f64 {
    if volume > 0.0 {
        pv / volume
    } else {
        typical
    }
}

/// One fixed-width price bucket of the volume profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBucket {
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

/// Minimal contiguous bucket range around the POC covering the target
/// fraction of total volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    pub low: f64,
    pub high: f64,
    pub volume: f64,
    pub fraction: f64,
}

/// Price-bucketed volume distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub buckets: Vec<VolumeBucket>,
    pub poc_index: usize,
    pub poc_price: f64,
    pub value_area: ValueArea,
}

/// Bins close prices into fixed-width buckets, finds the Point of Control
/// and the minimal value area around it.
///
/// The value area expands outward from the POC toward the higher-volume
/// neighbor (ties toward the lower price) until coverage reaches the target
/// fraction, then trims ends whose removal keeps coverage at target.
pub fn volume_profile(
    series: &PriceSeries,
    config: &VolumeConfig,
) -> Result<VolumeProfile, AnalyticsError> {
    if config.profile_buckets == 0 {
        return Err(AnalyticsError::invalid_input("profile buckets must be positive"));
    }
    if !(0.0..=1.0).contains(&config.value_area_fraction) {
        return Err(AnalyticsError::invalid_input(
            "value area fraction must be within [0, 1]",
        ));
    }
    require_history(1, series.len())?;

    let bars = series.bars();
    let min_close = bars.iter().map(|bar| bar.close).fold(f64::MAX, f64::min);
    let max_close = bars.iter().map(|bar| bar.close).fold(f64::MIN, f64::max);
    let range = max_close - min_close;

    let bucket_count = if range == 0.0 { 1 } else { config.profile_buckets };
    let width = if range == 0.0 {
        0.0
    } else {
        range / bucket_count as f64
    };

    let mut buckets: Vec<VolumeBucket> = (0..bucket_count)
        .map(|index| VolumeBucket {
            low: min_close + width * index as f64,
            high: if index + 1 == bucket_count {
                max_close
            } else {
                min_close + width * (index + 1) as f64
            },
            volume: 0.0,
        })
        .collect();

    for bar in bars {
        let index = if range == 0.0 {
            0
        } else {
            (((bar.close - min_close) / width) as usize).min(bucket_count - 1)
        };
        buckets[index].volume += bar.volume as f64;
    }

    let mut poc_index = 0;
    for (index, bucket) in buckets.iter().enumerate() {
        if bucket.volume > buckets[poc_index].volume {
            poc_index = index;
        }
    }
    let poc_price = (buckets[poc_index].low + buckets[poc_index].high) / 2.0;

    let total_volume: f64 = buckets.iter().map(|bucket| bucket.volume).sum();
    let target = total_volume * config.value_area_fraction;

    let mut lo = poc_index;
    let mut hi = poc_index;
    let mut covered = buckets[poc_index].volume;
    while covered < target && (lo > 0 || hi + 1 < bucket_count) {
        let below = lo.checked_sub(1).map(|index| buckets[index].volume);
        let above = if hi + 1 < bucket_count {
            Some(buckets[hi + 1].volume)
        } else {
            None
        };

        match (below, above) {
            (Some(b), Some(a)) if b >= a => {
                lo -= 1;
                covered += b;
            }
            (_, Some(a)) => {
                hi += 1;
                covered += a;
            }
            (Some(b), None) => {
                lo -= 1;
                covered += b;
            }
            (None, None) => break,
        }
    }

    // Trim so that dropping either end bucket would fall below the target.
    while lo < hi {
        let removable = [lo, hi]
            .into_iter()
            .filter(|&end| end != poc_index && covered - buckets[end].volume >= target)
            .min_by(|&a, &b| buckets[a].volume.total_cmp(&buckets[b].volume));
        match removable {
            Some(end) if end == lo => {
                covered -= buckets[lo].volume;
                lo += 1;
            }
            Some(end) => {
                covered -= buckets[end].volume;
                hi -= 1;
            }
            None => break,
        }
    }

    let value_area = ValueArea {
        low: buckets[lo].low,
        high: buckets[hi].high,
        volume: covered,
        fraction: if total_volume > 0.0 {
            covered / total_volume
        } else {
            0.0
        },
    };

    Ok(VolumeProfile {
        buckets,
        poc_index,
        poc_price,
        value_area,
    })
}

/// On-Balance Volume: running signed-volume sum starting at zero.
pub fn obv(series: &PriceSeries) -> Result<Vec<f64>, AnalyticsError> {
    require_history(1, series.len())?;
    let bars = series.bars();

    let mut out = Vec::with_capacity(bars.len());
    out.push(0.0);
    for index in 1..bars.len() {
        let prior = out[index - 1];
        let change = if bars[index].close > bars[index - 1].close {
            bars[index].volume as f64
        } else if bars[index].close < bars[index - 1].close {
            -(bars[index].volume as f64)
        } else {
            0.0
        };
        out.push(prior + change);
    }
    Ok(out)
}

/// Accumulation/Distribution line: cumulative volume x close-location value,
/// CLV = ((C-L)-(H-C))/(H-L), 0 when high equals low.
pub fn ad_line(series: &PriceSeries) -> Result<Vec<f64>, AnalyticsError> {
    require_history(1, series.len())?;

    let mut out = Vec::with_capacity(series.len());
    let mut cumulative = 0.0;
    for bar in series.bars() {
        let range = bar.high - bar.low;
        let clv = if range == 0.0 {
            0.0
        } else {
            ((bar.close - bar.low) - (bar.high - bar.close)) / range
        };
        cumulative += clv * bar.volume as f64;
        out.push(cumulative);
    }
    Ok(out)
}

/// Money Flow Index: RSI-style oscillator over typical-price-weighted volume.
///
/// First output corresponds to bar index `window`. Identities mirror RSI:
/// no negative flow reads 100, no flow at all reads 50.
pub fn mfi(series: &PriceSeries, window: usize) -> Result<Vec<f64>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid_input("window must be positive"));
    }
    require_history(window + 1, series.len())?;

    let typical = series.typical_prices();
    let bars = series.bars();

    // Signed raw money flow per bar transition.
    let mut positive = Vec::with_capacity(bars.len() - 1);
    let mut negative = Vec::with_capacity(bars.len() - 1);
    for index in 1..bars.len() {
        let flow = typical[index] * bars[index].volume as f64;
        if typical[index] > typical[index - 1] {
            positive.push(flow);
            negative.push(0.0);
        } else if typical[index] < typical[index - 1] {
            positive.push(0.0);
            negative.push(flow);
        } else {
            positive.push(0.0);
            negative.push(0.0);
        }
    }

    let mut out = Vec::with_capacity(positive.len() - window + 1);
    for end in window..=positive.len() {
        let pos: f64 = positive[end - window..end].iter().sum();
        let neg: f64 = negative[end - window..end].iter().sum();
        out.push(flow_index(pos, neg));
    }
    Ok(out)
}

fn flow_index(positive: f64, negative: f64) -> f64 {
    if negative == 0.0 && positive == 0.0 {
        return 50.0;
    }
    if negative == 0.0 {
        return 100.0;
    }
    let ratio = positive / negative;
    100.0 - 100.0 / (1.0 + ratio)
}

/// Current volume against the trailing average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeVolume {
    pub current: u64,
    pub average: f64,
    pub ratio: f64,
    pub level: VolumeLevel,
}

/// Ratio of the latest bar's volume to the trailing-window average
/// (exclusive of the latest bar).
pub fn relative_volume(
    series: &PriceSeries,
    config: &VolumeConfig,
) -> Result<RelativeVolume, AnalyticsError> {
    let window = config.relative_volume_window;
    require_history(window + 1, series.len())?;

    let bars = series.bars();
    let current = bars[bars.len() - 1].volume;
    let trailing = &bars[bars.len() - 1 - window..bars.len() - 1];
    let average = trailing.iter().map(|bar| bar.volume as f64).sum::<f64>() / window as f64;

    let ratio = if average > 0.0 {
        current as f64 / average
    } else {
        0.0
    };
    let level = if ratio > config.high_relative_volume {
        VolumeLevel::High
    } else if ratio < config.low_relative_volume {
        VolumeLevel::Low
    } else {
        VolumeLevel::Normal
    };

    Ok(RelativeVolume {
        current,
        average,
        ratio,
        level,
    })
}

/// Bars whose volume exceeds `surge_multiple` times the trailing average of
/// the preceding `relative_volume_window` bars.
pub fn volume_surges(
    series: &PriceSeries,
    config: &VolumeConfig,
) -> Result<Vec<UtcDateTime>, AnalyticsError> {
    let window = config.relative_volume_window;
    require_history(window + 1, series.len())?;

    let bars = series.bars();
    let mut out = Vec::new();
    for index in window..bars.len() {
        let trailing = &bars[index - window..index];
        let average = trailing.iter().map(|bar| bar.volume as f64).sum::<f64>() / window as f64;
        if bars[index].volume as f64 > config.surge_multiple * average && average > 0.0 {
            out.push(bars[index].ts);
        }
    }
    Ok(out)
}

/// Bars whose volume falls below `low_relative_volume` times the trailing
/// average of the preceding `relative_volume_window` bars.
pub fn volume_dryups(
    series: &PriceSeries,
    config: &VolumeConfig,
) -> Result<Vec<UtcDateTime>, AnalyticsError> {
    let window = config.relative_volume_window;
    require_history(window + 1, series.len())?;

    let bars = series.bars();
    let mut out = Vec::new();
    for index in window..bars.len() {
        let trailing = &bars[index - window..index];
        let average = trailing.iter().map(|bar| bar.volume as f64).sum::<f64>() / window as f64;
        if (bars[index].volume as f64) < config.low_relative_volume * average && average > 0.0 {
            out.push(bars[index].ts);
        }
    }
    Ok(out)
}

/// Price extreme in the lookback not confirmed by a cumulative flow line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    /// Price made the lookback high but the flow line did not.
    UnconfirmedHigh,
    /// Price made the lookback low but the flow line did not.
    UnconfirmedLow,
}

/// Warning annotation; divergences never block a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub kind: DivergenceKind,
    pub indicator: &'static str,
}

/// Flags lookback-window price highs/lows that OBV or the A/D line did not
/// confirm.
pub fn flow_divergences(
    series: &PriceSeries,
    config: &VolumeConfig,
) -> Result<Vec<Divergence>, AnalyticsError> {
    let lookback = config.divergence_lookback;
    require_history(lookback, series.len())?;

    let closes = series.closes();
    let obv_line = obv(series)?;
    let ad = ad_line(series)?;

    let mut out = Vec::new();
    for (name, line) in [("obv", &obv_line), ("ad_line", &ad)] {
        if let Some(divergence) = check_divergence(&closes, line, lookback, name) {
            out.push(divergence);
        }
    }
    Ok(out)
}

fn check_divergence(
    closes: &[f64],
    line: &[f64],
    lookback: usize,
    indicator: &'static str,
) -> Option<Divergence> {
    let closes_tail = &closes[closes.len() - lookback..];
    let line_tail = &line[line.len() - lookback..];

    let close_now = closes_tail[closes_tail.len() - 1];
    let line_now = line_tail[line_tail.len() - 1];
    let close_max = closes_tail.iter().copied().fold(f64::MIN, f64::max);
    let close_min = closes_tail.iter().copied().fold(f64::MAX, f64::min);
    let line_max = line_tail.iter().copied().fold(f64::MIN, f64::max);
    let line_min = line_tail.iter().copied().fold(f64::MAX, f64::min);

    if close_now >= close_max && close_max > close_min && line_now < line_max {
        return Some(Divergence {
            kind: DivergenceKind::UnconfirmedHigh,
            indicator,
        });
    }
    if close_now <= close_min && close_max > close_min && line_now > line_min {
        return Some(Divergence {
            kind: DivergenceKind::UnconfirmedLow,
            indicator,
        });
    }
    None
}

/// Composite volume report for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    pub close: f64,
    pub vwap_mode: VwapMode,
    pub vwap: f64,
    pub vwap_distance_pct: f64,
    pub profile: VolumeProfile,
    pub relative_volume: RelativeVolume,
    pub obv: f64,
    pub obv_trend: FlowTrend,
    pub ad_line: f64,
    pub ad_trend: FlowTrend,
    pub mfi: f64,
    pub mfi_signal: MomentumSignal,
    pub surges: Vec<UtcDateTime>,
    pub dryups: Vec<UtcDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub divergences: Vec<Divergence>,
}

pub fn analyze(
    series: &PriceSeries,
    mode: VwapMode,
    config: &VolumeConfig,
) -> Result<VolumeReport, AnalyticsError> {
    let minimum = config
        .mfi_window
        .max(config.relative_volume_window)
        .max(config.flow_lookback)
        .max(config.divergence_lookback)
        .max(config.vwap_window)
        + 1;
    require_history(minimum, series.len())?;

    let close = series
        .last()
        .map(|bar| bar.close)
        .ok_or_else(|| AnalyticsError::invalid_input("series is empty"))?;

    let vwap_series = vwap(series, mode, config)?;
    let vwap_now = vwap_series[vwap_series.len() - 1];
    let vwap_distance_pct = if vwap_now != 0.0 {
        (close - vwap_now) / vwap_now * 100.0
    } else {
        0.0
    };

    let obv_series = obv(series)?;
    let ad_series = ad_line(series)?;
    let mfi_series = mfi(series, config.mfi_window)?;
    let mfi_now = mfi_series[mfi_series.len() - 1];

    Ok(VolumeReport {
        close,
        vwap_mode: mode,
        vwap: vwap_now,
        vwap_distance_pct,
        profile: volume_profile(series, config)?,
        relative_volume: relative_volume(series, config)?,
        obv: obv_series[obv_series.len() - 1],
        obv_trend: flow_trend(&obv_series, config.flow_lookback),
        ad_line: ad_series[ad_series.len() - 1],
        ad_trend: flow_trend(&ad_series, config.flow_lookback),
        mfi: mfi_now,
        mfi_signal: if mfi_now > config.mfi_overbought {
            MomentumSignal::Overbought
        } else if mfi_now < config.mfi_oversold {
            MomentumSignal::Oversold
        } else {
            MomentumSignal::Neutral
        },
        surges: volume_surges(series, config)?,
        dryups: volume_dryups(series, config)?,
        divergences: flow_divergences(series, config)?,
    })
}

fn flow_trend(line: &[f64], lookback: usize) -> FlowTrend {
    let now = line[line.len() - 1];
    let reference = if line.len() > lookback {
        line[line.len() - 1 - lookback]
    } else {
        line[0]
    };
    if now > reference {
        FlowTrend::Accumulation
    } else {
        FlowTrend::Distribution
    }
}
