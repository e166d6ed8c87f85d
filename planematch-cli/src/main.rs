use clap::Parser;
use planematch::{
    BruteForceMatcher, DescriptorSet, DistanceFilter, FilterStats, HomographyEstimator,
    ImageFeatures, KeyPoint, MatchSelection, Norm, RansacConfig, Session,
};
use planematch::PlaneMatchError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "PlaneMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum NormConfig {
    #[default]
    L1,
    L2,
}

impl From<NormConfig> for Norm {
    fn from(value: NormConfig) -> Self {
        match value {
            NormConfig::L1 => Norm::L1,
            NormConfig::L2 => Norm::L2,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum SelectionConfig {
    Raw,
    #[default]
    Filtered,
}

impl From<SelectionConfig> for MatchSelection {
    fn from(value: SelectionConfig) -> Self {
        match value {
            SelectionConfig::Raw => MatchSelection::Raw,
            SelectionConfig::Filtered => MatchSelection::Filtered,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatcherConfigJson {
    norm: NormConfig,
    cross_check: bool,
    parallel: bool,
}

impl Default for MatcherConfigJson {
    fn default() -> Self {
        let cfg = BruteForceMatcher::default();
        Self {
            norm: NormConfig::L1,
            cross_check: cfg.cross_check,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterConfigJson {
    min_factor: f32,
    max_factor: f32,
}

impl Default for FilterConfigJson {
    fn default() -> Self {
        let cfg = DistanceFilter::default();
        Self {
            min_factor: cfg.min_factor,
            max_factor: cfg.max_factor,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RansacConfigJson {
    max_iters: usize,
    reproj_threshold: f64,
    confidence: f64,
    refine: bool,
    max_refine_iters: usize,
}

impl Default for RansacConfigJson {
    fn default() -> Self {
        let cfg = RansacConfig::default();
        Self {
            max_iters: cfg.max_iters,
            reproj_threshold: cfg.reproj_threshold,
            confidence: cfg.confidence,
            refine: cfg.refine,
            max_refine_iters: cfg.max_refine_iters,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Config {
    query_features: String,
    reference_features: String,
    output_path: Option<String>,
    selection: SelectionConfig,
    seed: u64,
    matcher: MatcherConfigJson,
    filter: FilterConfigJson,
    ransac: RansacConfigJson,
}

#[derive(Debug, Deserialize)]
struct KeyPointJson {
    x: f32,
    y: f32,
    #[serde(default = "default_size")]
    size: f32,
    #[serde(default = "default_angle")]
    angle: f32,
    #[serde(default)]
    response: f32,
    #[serde(default)]
    octave: i32,
}

fn default_size() -> f32 {
    1.0
}

fn default_angle() -> f32 {
    -1.0
}

impl From<KeyPointJson> for KeyPoint {
    fn from(value: KeyPointJson) -> Self {
        let mut kp = KeyPoint::new(value.x, value.y).with_shape(value.size, value.angle);
        kp.response = value.response;
        kp.octave = value.octave;
        kp
    }
}

/// Precomputed features of one image.
#[derive(Debug, Deserialize)]
struct FeatureFile {
    width: usize,
    height: usize,
    keypoints: Vec<KeyPointJson>,
    descriptors: Vec<Vec<f32>>,
}

struct LoadedFeatures {
    width: usize,
    height: usize,
    features: ImageFeatures,
}

impl FeatureFile {
    fn into_features(self) -> Result<LoadedFeatures, Box<dyn std::error::Error>> {
        if self.width == 0 || self.height == 0 {
            return Err(PlaneMatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        let dim = self.descriptors.first().map_or(1, Vec::len);
        let descriptors = DescriptorSet::from_rows(dim, self.descriptors.as_slice())?;
        let keypoints = self.keypoints.into_iter().map(KeyPoint::from).collect();
        Ok(LoadedFeatures {
            width: self.width,
            height: self.height,
            features: ImageFeatures::new(keypoints, descriptors)?,
        })
    }
}

fn load_features(path: &Path) -> Result<LoadedFeatures, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let file: FeatureFile = serde_json::from_str(&text)?;
    file.into_features()
}

#[derive(Debug, Serialize)]
struct FilterRecord {
    min_dist: Option<f32>,
    max_dist: f32,
    threshold: Option<f32>,
    kept: usize,
}

impl FilterRecord {
    fn new(stats: FilterStats, kept: usize) -> Self {
        Self {
            min_dist: stats.min_dist.is_finite().then_some(stats.min_dist),
            max_dist: stats.max_dist,
            threshold: stats.threshold.is_finite().then_some(stats.threshold),
            kept,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    query_keypoints: usize,
    reference_keypoints: usize,
    raw_matches: usize,
    filter: FilterRecord,
    selection: SelectionConfig,
    homography: [[f64; 3]; 3],
    num_inliers: usize,
    rms_error: f64,
    trials: usize,
    corners: [[f64; 2]; 4],
    convex: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("planematch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let output = run(&config)?;
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

fn run(config: &Config) -> Result<Output, Box<dyn std::error::Error>> {
    if config.query_features.is_empty() || config.reference_features.is_empty() {
        return Err("query_features and reference_features must be set in the config".into());
    }

    let query = load_features(Path::new(&config.query_features))?;
    let reference = load_features(Path::new(&config.reference_features))?;
    tracing::info!(
        query = query.features.keypoints().len(),
        reference = reference.features.keypoints().len(),
        "loaded features"
    );

    let matcher = BruteForceMatcher::new(config.matcher.norm.into(), config.matcher.cross_check)
        .with_parallel(config.matcher.parallel);
    let filter = DistanceFilter {
        min_factor: config.filter.min_factor,
        max_factor: config.filter.max_factor,
    };
    filter.validate()?;
    let estimator = HomographyEstimator::new(RansacConfig {
        max_iters: config.ransac.max_iters,
        reproj_threshold: config.ransac.reproj_threshold,
        confidence: config.ransac.confidence,
        refine: config.ransac.refine,
        max_refine_iters: config.ransac.max_refine_iters,
    });
    estimator.config().validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let located = Session::from_extent(query.width, query.height)?
        .match_precomputed(query.features, reference.features, &matcher)?
        .filter(&filter)
        .locate(config.selection.into(), &estimator, &mut rng)?;

    let fit = located.fit();
    let quad = located.quadrilateral();
    tracing::info!(
        inliers = fit.num_inliers,
        rms_error = fit.rms_error,
        reference_width = reference.width,
        reference_height = reference.height,
        "localized query"
    );

    let stats = located
        .filter_stats()
        .ok_or("filter statistics missing after filtering")?;
    let kept = located.filtered_matches().map_or(0, Vec::len);
    let store = located.store();
    Ok(Output {
        query_keypoints: store.query_keypoints().len(),
        reference_keypoints: store.reference_keypoints().len(),
        raw_matches: store.raw_matches().len(),
        filter: FilterRecord::new(stats, kept),
        selection: config.selection,
        homography: fit.homography.to_rows(),
        num_inliers: fit.num_inliers,
        rms_error: fit.rms_error,
        trials: fit.trials,
        corners: quad.corners().map(|p| [p.x, p.y]),
        convex: quad.is_convex(),
    })
}

#[cfg(test)]
mod tests {
    use super::{run, Config, FeatureFile, SelectionConfig, EXAMPLE_JSON};
    use planematch::{localize, Homography};

    fn demo_config(selection: SelectionConfig) -> Config {
        Config {
            query_features: concat!(env!("CARGO_MANIFEST_DIR"), "/demo/query_features.json")
                .to_string(),
            reference_features: concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/demo/reference_features.json"
            )
            .to_string(),
            selection,
            ..Config::default()
        }
    }

    /// Corners of the 160x120 demo query under the transform used to
    /// generate the reference keypoints.
    fn demo_corners() -> [[f64; 2]; 4] {
        let h = Homography::from_rows([
            [1.2, -0.1, 80.0],
            [0.05, 1.1, 45.0],
            [0.0004, 0.0002, 1.0],
        ]);
        localize(&h, 160.0, 120.0).corners().map(|p| [p.x, p.y])
    }

    fn assert_demo_corners(corners: &[[f64; 2]; 4]) {
        for (got, want) in corners.iter().zip(demo_corners()) {
            let err = ((got[0] - want[0]).powi(2) + (got[1] - want[1]).powi(2)).sqrt();
            assert!(err < 0.5, "corner {got:?} vs {want:?}");
        }
    }

    #[test]
    fn example_config_parses() {
        let cfg: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert!(!cfg.query_features.is_empty());
        assert!(matches!(cfg.selection, SelectionConfig::Filtered));
        assert_eq!(cfg.ransac.max_iters, 2000);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "selection": "raw" }"#).unwrap();
        assert!(matches!(cfg.selection, SelectionConfig::Raw));
        assert_eq!(cfg.filter.min_factor, 2.0);
        assert!(cfg.matcher.cross_check);
    }

    #[test]
    fn feature_file_checks_descriptor_count() {
        let file: FeatureFile = serde_json::from_str(
            r#"{ "width": 10, "height": 10,
                 "keypoints": [{ "x": 1.0, "y": 2.0 }],
                 "descriptors": [[0.0, 1.0], [2.0, 3.0]] }"#,
        )
        .unwrap();
        assert!(file.into_features().is_err());
    }

    #[test]
    fn demo_runs_through_filtered_stage() {
        let output = run(&demo_config(SelectionConfig::Filtered)).unwrap();
        assert_eq!(output.query_keypoints, 14);
        assert_eq!(output.raw_matches, 14);
        assert_eq!(output.filter.kept, 11);
        assert_eq!(output.num_inliers, 11);
        assert!(output.convex);
        assert_demo_corners(&output.corners);
    }

    #[test]
    fn demo_raw_selection_rejects_outliers() {
        let output = run(&demo_config(SelectionConfig::Raw)).unwrap();
        assert_eq!(output.filter.kept, 11);
        assert_eq!(output.num_inliers, 11);
        assert_demo_corners(&output.corners);
    }

    #[test]
    fn empty_feature_paths_are_rejected() {
        assert!(run(&Config::default()).is_err());
    }
}
