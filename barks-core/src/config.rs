//! Configuration for the barks speech decision core.
//!
//! Maps directly to `barks.toml`. Every field has a default, so an empty
//! file (or no file at all) yields the stock companion tuning.

use serde::{Deserialize, Serialize};

/// Top-level barks configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarksConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Speech pacing.
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Mob detection thresholds.
    #[serde(default)]
    pub mob: MobConfig,
    /// Sound perception.
    #[serde(default)]
    pub sensing: SensingConfig,
    /// Combat perception.
    #[serde(default)]
    pub combat: CombatConfig,
    /// Schedule engine limits.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Telemetry & observability.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BarksConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `BarksError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::BarksError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether speech decisions run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format: pretty or json.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Speech pacing: decision cadence and combat chatter thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Seconds between decision passes while idle (or with no sensing component).
    #[serde(default = "default_0_5")]
    pub idle_interval: f32,
    /// Seconds between decision passes while alert or in combat.
    #[serde(default = "default_0_25")]
    pub alert_interval: f32,
    /// Visible enemies strictly above this count trigger the many-enemies line.
    #[serde(default = "default_4")]
    pub many_enemies_threshold: u32,
    /// Seconds without any enemy before a new sighting earns a start-combat line.
    #[serde(default = "default_30_0")]
    pub start_combat_quiet_period: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            idle_interval: 0.5,
            alert_interval: 0.25,
            many_enemies_threshold: 4,
            start_combat_quiet_period: 30.0,
        }
    }
}

/// Thresholds used by the mob detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobConfig {
    /// Enemies farther than this are not counted as visible.
    #[serde(default = "default_4096_0")]
    pub visibility_distance: f32,
    /// Visible enemies within this distance count as close.
    #[serde(default = "default_192_0")]
    pub close_distance: f32,
    /// Close enemies needed to raise the mobbed condition.
    #[serde(default = "default_3")]
    pub mob_count: u32,
    /// Seconds since an enemy was last seen for it to still count.
    #[serde(default = "default_0_5")]
    pub freshness: f32,
}

impl MobConfig {
    /// Squared visibility distance.
    #[must_use]
    pub fn visibility_distance_sqr(&self) -> f32 {
        self.visibility_distance * self.visibility_distance
    }

    /// Squared close distance.
    #[must_use]
    pub fn close_distance_sqr(&self) -> f32 {
        self.close_distance * self.close_distance
    }
}

impl Default for MobConfig {
    fn default() -> Self {
        Self {
            visibility_distance: 4096.0,
            close_distance: 192.0,
            mob_count: 3,
            freshness: 0.5,
        }
    }
}

/// Sound perception settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensingConfig {
    /// Seconds a heard sound stays in the buffer when the emitter gives no expiry.
    #[serde(default = "default_2_0")]
    pub sound_lifetime: f32,
    /// Maximum sounds buffered per agent; oldest are dropped first.
    #[serde(default = "default_16")]
    pub capacity: usize,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            sound_lifetime: 2.0,
            capacity: 16,
        }
    }
}

/// Combat perception settings for the sensing component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Damage at or above this amount raises heavy damage instead of light.
    #[serde(default = "default_20_0")]
    pub heavy_damage_threshold: f32,
    /// Seconds without seeing any enemy before enemy-lost is raised.
    #[serde(default = "default_5_0")]
    pub enemy_lost_after: f32,
    /// Aim dot product above which an enemy gets +1 priority.
    #[serde(default = "default_0_8")]
    pub aim_bonus_dot: f32,
    /// Aim dot product above which an enemy gets a further +1 priority.
    #[serde(default = "default_0_9")]
    pub aim_strong_dot: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            heavy_damage_threshold: 20.0,
            enemy_lost_after: 5.0,
            aim_bonus_dot: 0.8,
            aim_strong_dot: 0.9,
        }
    }
}

/// Schedule engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Maximum task steps the engine takes in a single tick.
    #[serde(default = "default_8")]
    pub max_task_steps: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { max_task_steps: 8 }
    }
}

/// Telemetry & observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether pass timings are recorded.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-pass budget in milliseconds; slower passes are logged.
    #[serde(default = "default_0_05_f64")]
    pub pass_budget_ms: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pass_budget_ms: 0.05,
        }
    }
}

// Default value helpers for serde
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }
fn default_0_25() -> f32 { 0.25 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_8() -> f32 { 0.8 }
fn default_0_9() -> f32 { 0.9 }
fn default_2_0() -> f32 { 2.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_20_0() -> f32 { 20.0 }
fn default_30_0() -> f32 { 30.0 }
fn default_192_0() -> f32 { 192.0 }
fn default_4096_0() -> f32 { 4096.0 }
fn default_0_05_f64() -> f64 { 0.05 }
fn default_3() -> u32 { 3 }
fn default_4() -> u32 { 4 }
fn default_8() -> usize { 8 }
fn default_16() -> usize { 16 }
