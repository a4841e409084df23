//! Multi-rate (RESPA) force decomposition.
//!
//! Short-range forces change quickly and are integrated with the smallest timestep, so the
//! pair force is split into shells. Inner and Middle carry the unscreened "shortcut" interaction
//! weighted by smooth switching functions; Outer carries the full split-range interaction minus
//! whatever the inner levels already hold. All three use the same weights, so their sum equals
//! the single-rate force at every distance.

use super::config::ConfigError;

/// Which part of the decomposed force a call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RespaLevel {
    Inner,
    Middle,
    Outer,
    /// No decomposition.
    Single,
}

/// Radii over which a level fades out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchShell {
    pub on: f64,
    pub off: f64,
}

impl SwitchShell {
    /// `1` up to `on`, `1 - s^2 (3 - 2 s)` across the shell, `0` from `off`.
    #[inline]
    pub fn falling(&self, r: f64) -> f64 {
        if r <= self.on {
            1.0
        } else if r >= self.off {
            0.0
        } else {
            let s = (r - self.on) / (self.off - self.on);
            1.0 - s * s * (3.0 - 2.0 * s)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespaCutoffs {
    inner: SwitchShell,
    middle: Option<SwitchShell>,
}

impl RespaCutoffs {
    /// Requires `0 < inner.on < inner.off <= middle.on < middle.off`.
    pub fn new(inner: [f64; 2], middle: Option<[f64; 2]>) -> Result<Self, ConfigError> {
        let mut radii = vec![inner[0], inner[1]];
        if let Some(middle) = middle {
            radii.extend(middle);
        }
        if !(radii[0] > 0.0) || radii.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::InvalidRespaShells(format!(
                "radii must be positive and finite, got {radii:?}"
            )));
        }
        let ordered = radii.windows(2).enumerate().all(|(k, w)| {
            // inner.off may coincide with middle.on
            if k == 1 { w[0] <= w[1] } else { w[0] < w[1] }
        });
        if !ordered {
            return Err(ConfigError::InvalidRespaShells(format!(
                "radii must increase from the inner to the middle shell, got {radii:?}"
            )));
        }
        Ok(Self {
            inner: SwitchShell {
                on: inner[0],
                off: inner[1],
            },
            middle: middle.map(|[on, off]| SwitchShell { on, off }),
        })
    }

    pub fn inner(&self) -> SwitchShell {
        self.inner
    }

    pub fn middle(&self) -> Option<SwitchShell> {
        self.middle
    }

    /// Radius beyond which only the Outer level contributes.
    pub fn outermost(&self) -> f64 {
        self.middle.map_or(self.inner.off, |m| m.off)
    }
}

/// Shortcut weights of each level at one distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespaWeights {
    pub inner: f64,
    pub middle: f64,
}

impl RespaWeights {
    /// Weight of the shortcut already carried by the faster levels.
    #[inline]
    pub fn fast(&self) -> f64 {
        self.inner + self.middle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespaDecomposer {
    cutoffs: RespaCutoffs,
    outermost_sq: f64,
}

impl RespaDecomposer {
    pub fn new(cutoffs: RespaCutoffs) -> Self {
        let outermost = cutoffs.outermost();
        Self {
            cutoffs,
            outermost_sq: outermost * outermost,
        }
    }

    pub fn cutoffs(&self) -> &RespaCutoffs {
        &self.cutoffs
    }

    /// True when the Inner and Middle levels have nothing to add at `rsq`.
    #[inline]
    pub fn beyond_fast_levels(&self, rsq: f64) -> bool {
        rsq >= self.outermost_sq
    }

    #[inline]
    pub fn weights(&self, r: f64) -> RespaWeights {
        let inner = self.cutoffs.inner.falling(r);
        let middle = match self.cutoffs.middle {
            Some(shell) if r >= shell.on => shell.falling(r),
            Some(_) => 1.0 - inner,
            None => 0.0,
        };
        RespaWeights { inner, middle }
    }

    /// Combines the full force and the shortcut force (both as force times `r`) into the
    /// contribution of `level`.
    #[inline]
    pub fn split(&self, level: RespaLevel, r: f64, full: f64, shortcut: f64) -> f64 {
        match level {
            RespaLevel::Single => full,
            RespaLevel::Inner => self.weights(r).inner * shortcut,
            RespaLevel::Middle => self.weights(r).middle * shortcut,
            RespaLevel::Outer => full - self.weights(r).fast() * shortcut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn three_level() -> RespaDecomposer {
        RespaDecomposer::new(RespaCutoffs::new([2.0, 3.0], Some([4.0, 5.0])).unwrap())
    }

    fn two_level() -> RespaDecomposer {
        RespaDecomposer::new(RespaCutoffs::new([2.0, 3.0], None).unwrap())
    }

    #[test]
    fn new_rejects_unordered_shells() {
        assert!(RespaCutoffs::new([3.0, 2.0], None).is_err());
        assert!(RespaCutoffs::new([2.0, 3.0], Some([2.5, 5.0])).is_err());
        assert!(RespaCutoffs::new([2.0, 3.0], Some([5.0, 4.0])).is_err());
        assert!(RespaCutoffs::new([0.0, 3.0], None).is_err());
    }

    #[test]
    fn new_allows_inner_off_to_meet_middle_on() {
        let cutoffs = RespaCutoffs::new([2.0, 3.0], Some([3.0, 4.0])).unwrap();
        assert_eq!(cutoffs.outermost(), 4.0);
    }

    #[test]
    fn falling_switch_is_continuous_at_both_edges() {
        let shell = SwitchShell { on: 2.0, off: 3.0 };
        assert_eq!(shell.falling(2.0), 1.0);
        assert_eq!(shell.falling(3.0), 0.0);
        assert_relative_eq!(shell.falling(2.0 + 1e-9), 1.0, epsilon = 1e-12);
        assert_relative_eq!(shell.falling(3.0 - 1e-9), 0.0, epsilon = 1e-12);
        assert_relative_eq!(shell.falling(2.5), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn middle_weight_rises_then_falls() {
        let respa = three_level();
        assert_eq!(respa.weights(1.0).middle, 0.0);
        assert_relative_eq!(respa.weights(2.5).middle, 0.5, epsilon = 1e-15);
        assert_eq!(respa.weights(3.5).middle, 1.0);
        assert_relative_eq!(respa.weights(4.5).middle, 0.5, epsilon = 1e-15);
        assert_eq!(respa.weights(5.0).middle, 0.0);
    }

    #[test]
    fn without_middle_shell_outer_switches_at_inner_shell() {
        let respa = two_level();
        assert_eq!(respa.weights(2.5).middle, 0.0);
        assert_relative_eq!(respa.weights(2.5).fast(), 0.5, epsilon = 1e-15);
        assert_eq!(respa.weights(3.0).fast(), 0.0);
        assert_eq!(respa.split(RespaLevel::Middle, 2.5, 7.0, 3.0), 0.0);
    }

    #[test]
    fn levels_sum_to_single_at_shell_boundaries() {
        let respa = three_level();
        for r in [1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 6.0] {
            let (full, shortcut) = (-3.7, 1.9);
            let sum: f64 = [RespaLevel::Inner, RespaLevel::Middle, RespaLevel::Outer]
                .into_iter()
                .map(|level| respa.split(level, r, full, shortcut))
                .sum();
            assert_relative_eq!(sum, respa.split(RespaLevel::Single, r, full, shortcut), epsilon = 1e-12);
        }
    }

    proptest! {
        #[test]
        fn levels_telescope_for_any_distance(
            r in 0.5f64..8.0,
            full in -100.0f64..100.0,
            shortcut in -100.0f64..100.0,
            middle in proptest::bool::ANY,
        ) {
            let respa = if middle { three_level() } else { two_level() };
            let sum = respa.split(RespaLevel::Inner, r, full, shortcut)
                + respa.split(RespaLevel::Middle, r, full, shortcut)
                + respa.split(RespaLevel::Outer, r, full, shortcut);
            prop_assert!((sum - full).abs() <= 1e-12 * (1.0 + full.abs() + shortcut.abs()));
        }
    }
}
