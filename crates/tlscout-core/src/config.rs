// Configuration loading and validation (scoring.toml).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::position::PositionCategory;

/// File name of the scoring configuration inside `config/` and `defaults/`.
pub const SCORING_FILE: &str = "scoring.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// scoring.toml structs
// ---------------------------------------------------------------------------

/// How the composite Value is formed from quality, rating, and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Rating-dominant mix divided by a steep price penalty.
    #[default]
    Moneyball,
    /// `100 * quality`, no rating or price term.
    Balanced,
}

/// Base weights of the non-rating quality mix. A weight of 0 drops the
/// metric from the mix entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWeights {
    pub si11: f64,
    pub ti_eff: f64,
    pub season_ti: f64,
    pub rec: f64,
    pub si_now: f64,
    pub age: f64,
    pub conditioning: f64,
}

impl Default for ValueWeights {
    fn default() -> Self {
        ValueWeights {
            si11: 0.75,
            ti_eff: 0.65,
            season_ti: 0.15,
            rec: 0.55,
            si_now: 0.35,
            age: 0.25,
            conditioning: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    pub mode: ValueMode,
    /// Share of the mix taken by the rating percentile, 0..1.
    pub rating_share: f64,
    pub rating_power: f64,
    pub quality_power: f64,
    /// Penalty base at the cheapest price percentile.
    pub price_penalty_min: f64,
    /// Penalty base at the most expensive price percentile.
    pub price_penalty_max: f64,
    pub price_penalty_power: f64,
    pub value_scale: f64,
    /// Goalkeeper values are multiplied by this, in (0, 1].
    pub gk_value_multiplier: f64,
    pub weights: ValueWeights,
}

impl Default for ValueConfig {
    fn default() -> Self {
        ValueConfig {
            mode: ValueMode::Moneyball,
            rating_share: 0.86,
            rating_power: 3.4,
            quality_power: 1.15,
            price_penalty_min: 0.10,
            price_penalty_max: 3.60,
            price_penalty_power: 5.8,
            value_scale: 160.0,
            gk_value_multiplier: 0.80,
            weights: ValueWeights::default(),
        }
    }
}

/// Which candidates qualify for outlier highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliteMode {
    /// The `top_n` highest values.
    #[default]
    TopN,
    /// Every candidate whose value percentile reaches `top_pct`.
    Percentile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    pub mode: EliteMode,
    pub top_n: usize,
    pub top_pct: f64,
}

impl Default for EliteConfig {
    fn default() -> Self {
        EliteConfig {
            mode: EliteMode::TopN,
            top_n: 10,
            top_pct: 0.80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Percentile a cell must reach (or stay under `1 - good_cell_pct` for
    /// lower-is-better metrics) to count as an outlier.
    pub good_cell_pct: f64,
    pub min_outlier_cells: usize,
    pub conditioning_higher_is_better: bool,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        OutlierConfig {
            good_cell_pct: 0.985,
            min_outlier_cells: 3,
            conditioning_higher_is_better: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Keep candidates with at least one rating at or above this.
    pub min_rating: Option<f64>,
    /// Keep candidates whose effective TI is at or above this.
    pub min_ti: Option<f64>,
    /// Rate every candidate on this position's weight row ("mc", "gk", ...).
    pub position_override: Option<String>,
}

impl FilterConfig {
    /// Parsed position override. Validation guarantees the tag is known.
    pub fn position_override(&self) -> Option<PositionCategory> {
        self.position_override
            .as_deref()
            .and_then(PositionCategory::from_tag)
    }
}

/// The complete scoring configuration, passed immutably into each refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub value: ValueConfig,
    pub elite: EliteConfig,
    pub outliers: OutlierConfig,
    pub filter: FilterConfig,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate `config/scoring.toml` relative to `base_dir`.
///
/// This does not copy defaults. Prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<ScoringConfig, ConfigError> {
    let path = base_dir.join("config").join(SCORING_FILE);
    load_config_file(&path)
}

/// Load and validate a scoring configuration from an explicit path.
pub fn load_config_file(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let text = read_file(path)?;
    let config: ScoringConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Copy `defaults/scoring.toml` into `config/` unless a local copy already
/// exists. Returns the copied paths; an existing local file is never
/// overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(SCORING_FILE);
    let config_dir = base_dir.join("config");
    let target = config_dir.join(SCORING_FILE);

    if target.exists() {
        return Ok(vec![]);
    }
    if !source.is_file() {
        if config_dir.exists() {
            return Ok(vec![]);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}; \
                 pass --config or run from the directory holding defaults/{SCORING_FILE}",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    info!("copied default scoring config to {}", target.display());
    Ok(vec![target])
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<ScoringConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

/// Reject configurations the scoring pipeline cannot use.
pub fn validate(config: &ScoringConfig) -> Result<(), ConfigError> {
    let v = &config.value;

    let unit_fields: &[(&str, f64)] = &[
        ("value.rating_share", v.rating_share),
        ("elite.top_pct", config.elite.top_pct),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }

    // The outlier intensity divides by 1 - good_cell_pct.
    let good = config.outliers.good_cell_pct;
    if !(0.0..1.0).contains(&good) {
        return Err(invalid(
            "outliers.good_cell_pct",
            format!("must be in [0.0, 1.0), got {good}"),
        ));
    }

    let positive_fields: &[(&str, f64)] = &[
        ("value.rating_power", v.rating_power),
        ("value.quality_power", v.quality_power),
        ("value.price_penalty_min", v.price_penalty_min),
        ("value.price_penalty_max", v.price_penalty_max),
        ("value.price_penalty_power", v.price_penalty_power),
        ("value.value_scale", v.value_scale),
    ];
    for (name, val) in positive_fields {
        if !(val.is_finite() && *val > 0.0) {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    let gk = v.gk_value_multiplier;
    if !(gk > 0.0 && gk <= 1.0) {
        return Err(invalid(
            "value.gk_value_multiplier",
            format!("must be in (0.0, 1.0], got {gk}"),
        ));
    }

    let w = &v.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("value.weights.si11", w.si11),
        ("value.weights.ti_eff", w.ti_eff),
        ("value.weights.season_ti", w.season_ti),
        ("value.weights.rec", w.rec),
        ("value.weights.si_now", w.si_now),
        ("value.weights.age", w.age),
        ("value.weights.conditioning", w.conditioning),
    ];
    for (name, val) in weight_fields {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }

    if config.elite.top_n == 0 {
        return Err(invalid("elite.top_n", "must be > 0".into()));
    }
    if config.outliers.min_outlier_cells == 0 {
        return Err(invalid("outliers.min_outlier_cells", "must be > 0".into()));
    }

    let f = &config.filter;
    if let Some(r) = f.min_rating {
        if !(r.is_finite() && r >= 0.0) {
            return Err(invalid("filter.min_rating", format!("must be >= 0, got {r}")));
        }
    }
    if let Some(t) = f.min_ti {
        if !t.is_finite() {
            return Err(invalid("filter.min_ti", format!("must be finite, got {t}")));
        }
    }
    if let Some(tag) = &f.position_override {
        if PositionCategory::from_tag(tag).is_none() {
            return Err(invalid(
                "filter.position_override",
                format!("unknown position tag '{tag}'"),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let root = manifest.join("../..");
        assert!(
            root.join("defaults").exists(),
            "Cannot locate defaults/ directory from {:?}",
            manifest
        );
        root
    }

    fn write_scoring(tmp: &Path, body: &str) {
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(tmp);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(SCORING_FILE), body).unwrap();
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn shipped_defaults_match_default_impl() {
        let tmp = std::env::temp_dir().join("tlscout_config_shipped_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(
            project_root().join("defaults").join(SCORING_FILE),
            tmp.join("config").join(SCORING_FILE),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("defaults should load");
        assert_eq!(config, ScoringConfig::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = std::env::temp_dir().join("tlscout_config_partial");
        write_scoring(
            &tmp,
            r#"
[value]
mode = "balanced"

[elite]
mode = "percentile"
top_pct = 0.9

[filter]
min_rating = 60.0
position_override = "mc"
"#,
        );

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.value.mode, ValueMode::Balanced);
        assert_eq!(config.value.rating_share, 0.86);
        assert_eq!(config.elite.mode, EliteMode::Percentile);
        assert_eq!(config.elite.top_pct, 0.9);
        assert_eq!(config.elite.top_n, 10);
        assert_eq!(config.filter.min_rating, Some(60.0));
        assert_eq!(
            config.filter.position_override(),
            Some(PositionCategory::CentralMidfield)
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_rating_share_above_one() {
        let tmp = std::env::temp_dir().join("tlscout_config_rating_share");
        write_scoring(&tmp, "[value]\nrating_share = 1.5\n");
        expect_field(load_config_from(&tmp).unwrap_err(), "value.rating_share");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_weight() {
        let tmp = std::env::temp_dir().join("tlscout_config_negative_weight");
        write_scoring(
            &tmp,
            r#"
[value.weights]
si11 = 0.75
ti_eff = 0.65
season_ti = 0.15
rec = -0.1
si_now = 0.35
age = 0.25
conditioning = 0.35
"#,
        );
        expect_field(load_config_from(&tmp).unwrap_err(), "value.weights.rec");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_positive_penalty_anchor() {
        let mut config = ScoringConfig::default();
        config.value.price_penalty_min = 0.0;
        expect_field(validate(&config).unwrap_err(), "value.price_penalty_min");
    }

    #[test]
    fn rejects_gk_multiplier_out_of_range() {
        let mut config = ScoringConfig::default();
        config.value.gk_value_multiplier = 1.2;
        expect_field(validate(&config).unwrap_err(), "value.gk_value_multiplier");
        config.value.gk_value_multiplier = 0.0;
        expect_field(validate(&config).unwrap_err(), "value.gk_value_multiplier");
    }

    #[test]
    fn rejects_zero_counts() {
        let mut config = ScoringConfig::default();
        config.elite.top_n = 0;
        expect_field(validate(&config).unwrap_err(), "elite.top_n");

        let mut config = ScoringConfig::default();
        config.outliers.min_outlier_cells = 0;
        expect_field(validate(&config).unwrap_err(), "outliers.min_outlier_cells");
    }

    #[test]
    fn rejects_good_cell_pct_of_one() {
        let mut config = ScoringConfig::default();
        config.outliers.good_cell_pct = 1.0;
        expect_field(validate(&config).unwrap_err(), "outliers.good_cell_pct");
    }

    #[test]
    fn rejects_unknown_position_override() {
        let mut config = ScoringConfig::default();
        config.filter.position_override = Some("sweeper".into());
        expect_field(validate(&config).unwrap_err(), "filter.position_override");
    }

    #[test]
    fn file_not_found_for_missing_scoring_toml() {
        let tmp = std::env::temp_dir().join("tlscout_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(SCORING_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = std::env::temp_dir().join("tlscout_config_invalid_toml");
        write_scoring(&tmp, "[value\nmode = ");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(SCORING_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_keeps_existing() {
        let tmp = std::env::temp_dir().join("tlscout_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            project_root().join("defaults").join(SCORING_FILE),
            defaults_dir.join(SCORING_FILE),
        )
        .unwrap();
        fs::write(defaults_dir.join("README.md"), "# notes\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(SCORING_FILE).exists());
        assert!(!tmp.join("config/README.md").exists());

        fs::write(tmp.join("config").join(SCORING_FILE), "# custom\n").unwrap();
        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(SCORING_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("tlscout_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
