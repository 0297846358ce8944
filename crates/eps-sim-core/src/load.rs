//! Load scheduler: trigger- and duty-cycle-based continuous-average
//! instantaneous power draw.

use crate::error::{ConfigError, Result};

/// When a load mode draws power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Draws power at all times.
    Always,
    /// Draws power only in sunlight.
    Sunlight,
    /// Draws power only in eclipse.
    Eclipse,
}

impl Trigger {
    /// Parse a trigger name: `always`, `sunlight`, or `eclipse`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(Trigger::Always),
            "sunlight" => Ok(Trigger::Sunlight),
            "eclipse" => Ok(Trigger::Eclipse),
            other => Err(ConfigError::UnknownTrigger(other.to_string()).into()),
        }
    }

    fn matches(self, in_eclipse: bool) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::Sunlight => !in_eclipse,
            Trigger::Eclipse => in_eclipse,
        }
    }
}

/// A single load: a named subsystem drawing power under a trigger
/// condition, time-averaged by duty cycle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoadMode {
    /// Subsystem name.
    pub name: String,
    /// Nameplate power draw (W) while active.
    pub power_w: f64,
    /// Time-averaged duty cycle, 0-1. Interpreted as a continuous average,
    /// not a square-wave gate, so the RHS sees a smooth draw.
    pub duty_cycle: f64,
    /// Condition under which this mode is active.
    pub trigger: Trigger,
    /// Scheduling priority, informational only (no load-shedding logic in
    /// this core).
    pub priority: u32,
}

impl LoadMode {
    /// Construct a load mode, validating `power_w >= 0` and `duty_cycle`
    /// in `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        power_w: f64,
        duty_cycle: f64,
        trigger: Trigger,
        priority: u32,
    ) -> Result<Self> {
        if power_w < 0.0 {
            return Err(ConfigError::NonPositiveParameter {
                field: "power_w",
                value: power_w,
            }
            .into());
        }
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ConfigError::FractionOutOfRange {
                field: "duty_cycle",
                value: duty_cycle,
            }
            .into());
        }
        Ok(Self {
            name: name.into(),
            power_w,
            duty_cycle,
            trigger,
            priority,
        })
    }

    fn average_contribution(&self, in_eclipse: bool) -> f64 {
        if self.trigger.matches(in_eclipse) {
            self.power_w * self.duty_cycle
        } else {
            0.0
        }
    }
}

/// An ordered list of load modes, mutated only at construction time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoadProfile {
    modes: Vec<LoadMode>,
}

impl LoadProfile {
    /// Construct a load profile from a list of modes.
    pub fn new(modes: Vec<LoadMode>) -> Self {
        Self { modes }
    }

    /// All configured modes, in declaration order.
    pub fn modes(&self) -> &[LoadMode] {
        &self.modes
    }

    /// Continuous-average power draw (W) at simulation time `t`, given
    /// whether the spacecraft is currently in eclipse.
    pub fn power_at(&self, _t: f64, in_eclipse: bool) -> f64 {
        self.modes
            .iter()
            .map(|m| m.average_contribution(in_eclipse))
            .sum()
    }

    /// The modes currently contributing power at time `t`.
    pub fn active_modes(&self, _t: f64, in_eclipse: bool) -> Vec<&LoadMode> {
        self.modes
            .iter()
            .filter(|m| m.trigger.matches(in_eclipse))
            .collect()
    }

    /// Orbit-average power draw given the fraction of the orbit spent in
    /// eclipse, weighting each mode by the fraction of the orbit during
    /// which its trigger is active.
    pub fn orbit_average_power(&self, eclipse_fraction: f64) -> f64 {
        let sunlight_fraction = 1.0 - eclipse_fraction;
        self.modes
            .iter()
            .map(|m| {
                let active_fraction = match m.trigger {
                    Trigger::Always => 1.0,
                    Trigger::Sunlight => sunlight_fraction,
                    Trigger::Eclipse => eclipse_fraction,
                };
                m.power_w * m.duty_cycle * active_fraction
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> LoadProfile {
        LoadProfile::new(vec![
            LoadMode::new("obc", 1.5, 1.0, Trigger::Always, 0).unwrap(),
            LoadMode::new("radio_tx", 4.0, 0.1, Trigger::Sunlight, 1).unwrap(),
            LoadMode::new("heater", 2.0, 0.5, Trigger::Eclipse, 2).unwrap(),
        ])
    }

    #[test]
    fn rejects_duty_cycle_out_of_range() {
        assert!(LoadMode::new("x", 1.0, 1.5, Trigger::Always, 0).is_err());
    }

    #[test]
    fn rejects_negative_power() {
        assert!(LoadMode::new("x", -1.0, 0.5, Trigger::Always, 0).is_err());
    }

    #[test]
    fn parse_recognizes_all_trigger_strings() {
        assert_eq!(Trigger::parse("always").unwrap(), Trigger::Always);
        assert_eq!(Trigger::parse("sunlight").unwrap(), Trigger::Sunlight);
        assert_eq!(Trigger::parse("eclipse").unwrap(), Trigger::Eclipse);
        assert!(Trigger::parse("bogus").is_err());
    }

    #[test]
    fn power_at_in_sunlight_excludes_eclipse_only_modes() {
        let profile = sample_profile();
        let p = profile.power_at(0.0, false);
        // obc always-on + radio_tx sunlight, no heater.
        assert!((p - (1.5 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn power_at_in_eclipse_excludes_sunlight_only_modes() {
        let profile = sample_profile();
        let p = profile.power_at(0.0, true);
        // obc always-on + heater eclipse, no radio_tx.
        assert!((p - (1.5 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn active_modes_matches_trigger_condition() {
        let profile = sample_profile();
        let active = profile.active_modes(0.0, true);
        let names: Vec<&str> = active.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"obc"));
        assert!(names.contains(&"heater"));
        assert!(!names.contains(&"radio_tx"));
    }

    #[test]
    fn orbit_average_weights_by_eclipse_fraction() {
        let profile = sample_profile();
        let avg = profile.orbit_average_power(0.4);
        let expected = 1.5 * 1.0 + 4.0 * 0.1 * 0.6 + 2.0 * 0.5 * 0.4;
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn duty_cycle_is_continuous_not_gated() {
        // Power draw does not depend on t, only on trigger/eclipse state —
        // verifying the "continuous average, not square wave" contract.
        let profile = sample_profile();
        let p0 = profile.power_at(0.0, false);
        let p1 = profile.power_at(1234.5, false);
        assert_eq!(p0, p1);
    }
}
