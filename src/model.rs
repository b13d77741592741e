use crate::error::{ClubIndexError, Result};

// Calibration anchor: a 500 point edge should give the home side a 66% win chance.
pub const ANCHOR_DELTA: f64 = 500.0;
pub const ANCHOR_HOME_WIN: f64 = 0.66;

pub const DEFAULT_D0: f64 = 0.25;
pub const DEFAULT_DSCALE: f64 = 800.0;

const LOGIT_EPS: f64 = 1e-6;

/// Shape parameters of the draw decay. The logistic slope is derived from them on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub d0: f64,
    pub dscale: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            d0: DEFAULT_D0,
            dscale: DEFAULT_DSCALE,
        }
    }
}

impl ModelParams {
    pub fn new(d0: f64, dscale: f64) -> Self {
        Self { d0, dscale }
    }

    /// Rejects parameter sets that cannot produce a proper distribution.
    pub fn validate(&self) -> Result<()> {
        if !self.d0.is_finite() || self.d0 <= 0.0 || self.d0 >= 1.0 {
            return Err(ClubIndexError::degenerate(format!(
                "d0 must lie in (0, 1), got {}",
                self.d0
            )));
        }
        if !self.dscale.is_finite() || self.dscale <= 0.0 {
            return Err(ClubIndexError::degenerate(format!(
                "dscale must be positive, got {}",
                self.dscale
            )));
        }
        Ok(())
    }

    pub fn slope(&self) -> f64 {
        calibrate_slope(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeDistribution {
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Odds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeDistribution {
    pub fn sum(&self) -> f64 {
        self.p_draw + (self.p_home + self.p_away)
    }

    /// Decimal odds (1/p) for each outcome.
    pub fn odds(&self) -> Result<Odds> {
        let home = decimal_odds("home", self.p_home)?;
        let draw = decimal_odds("draw", self.p_draw)?;
        let away = decimal_odds("away", self.p_away)?;
        Ok(Odds { home, draw, away })
    }
}

fn decimal_odds(label: &str, p: f64) -> Result<f64> {
    if !p.is_finite() || p <= 0.0 {
        return Err(ClubIndexError::degenerate(format!(
            "{label} probability is {p}, odds undefined"
        )));
    }
    let odds = 1.0 / p;
    if !odds.is_finite() {
        return Err(ClubIndexError::degenerate(format!(
            "{label} odds overflowed for probability {p}"
        )));
    }
    Ok(odds)
}

/// Draw probability for a rating gap: `d0` at parity, decaying exponentially with `|delta|`.
pub fn draw_probability(delta: f64, params: &ModelParams) -> f64 {
    params.d0 * (-delta.abs() / params.dscale).exp()
}

/// Logistic slope that puts the home win probability at the anchor exactly.
pub fn calibrate_slope(params: &ModelParams) -> f64 {
    let d_anchor = draw_probability(ANCHOR_DELTA, params);
    let s_target = (ANCHOR_HOME_WIN / (1.0 - d_anchor)).clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    logit(s_target) / ANCHOR_DELTA
}

pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Home/draw/away probabilities for `delta = rating_home - rating_away`.
pub fn predict(delta: f64, params: &ModelParams) -> OutcomeDistribution {
    let k = params.slope();
    let draw = draw_probability(delta, params);

    // Evaluate the split on |delta| so that mirrored gaps give exactly mirrored results.
    let favoured = logistic(k * delta.abs());
    let (s_home, s_away) = if delta >= 0.0 {
        (favoured, 1.0 - favoured)
    } else {
        (1.0 - favoured, favoured)
    };

    let decisive = 1.0 - draw;
    let raw = OutcomeDistribution {
        p_home: decisive * s_home,
        p_draw: draw,
        p_away: decisive * s_away,
    };

    // Guard against tiny float drift.
    let sum = raw.sum();
    if sum > 0.0 && sum.is_finite() {
        OutcomeDistribution {
            p_home: raw.p_home / sum,
            p_draw: raw.p_draw / sum,
            p_away: raw.p_away / sum,
        }
    } else {
        raw
    }
}
