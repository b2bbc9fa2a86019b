//! camdim CLI — measure real-world object dimensions in a single image.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use camdim::{
    Analyzer, CalibrationState, DetectionParams, LengthUnit, QualityProfile, ReferenceCatalog,
    WeightProfile,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "camdim")]
#[command(about = "Detect the dominant objects in an image and report calibrated dimensions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure objects in an image and emit the analysis as JSON.
    Measure(CliMeasureArgs),

    /// Print the builtin reference object catalog.
    Catalog {
        /// Emit the catalog as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Compute a calibration from an observed reference span, without an image.
    ScaleTest {
        /// Observed reference width in pixels.
        #[arg(long)]
        width_px: f64,

        /// Observed reference height in pixels.
        #[arg(long)]
        height_px: f64,

        /// Catalog id of the reference; matched by aspect ratio when omitted.
        #[arg(long)]
        reference: Option<String>,

        /// Write the calibration state as JSON for later `measure --calibration`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct CliMeasureArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the analysis JSON; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Speed/fidelity preset.
    #[arg(long, value_enum, default_value_t = ProfileArg::Balanced)]
    profile: ProfileArg,

    /// Candidate scoring preset.
    #[arg(long, value_enum, default_value_t = WeightsArg::Balanced)]
    weights: WeightsArg,

    /// Maximum number of measured objects, best first.
    #[arg(long, default_value = "1")]
    max_detections: usize,

    /// Reporting unit for calibrated measurements.
    #[arg(long, value_enum, default_value_t = UnitArg::Mm)]
    unit: UnitArg,

    /// Decimal places in reported values.
    #[arg(long, default_value = "2")]
    decimals: u32,

    /// Full detection parameters as a JSON file; overrides the tuning flags.
    #[arg(long, conflicts_with_all = ["profile", "weights", "max_detections", "unit", "decimals"])]
    params: Option<PathBuf>,

    /// Search anchor in pixel coordinates, e.g. where the user tapped.
    /// Seeding and scoring prefer objects near this point; defaults to
    /// the image center.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    center: Option<Vec<f32>>,

    /// Calibration state JSON written by `scale-test --out`.
    #[arg(long, conflicts_with_all = ["scale", "span_px", "ref_span_px"])]
    calibration: Option<PathBuf>,

    /// Known scale in pixels per millimeter.
    #[arg(long, conflicts_with_all = ["span_px", "ref_span_px"])]
    scale: Option<f64>,

    /// On-screen span in pixels for manual calibration.
    #[arg(long, requires = "span_mm")]
    span_px: Option<f64>,

    /// Physical length of --span-px in millimeters.
    #[arg(long, requires = "span_px")]
    span_mm: Option<f64>,

    /// Trust in the manual span or scale, 0 to 1. Becomes the
    /// calibration confidence and sets the error margin on reports.
    #[arg(long, default_value_t = camdim::calib::DEFAULT_MANUAL_CERTAINTY)]
    certainty: f64,

    /// Reference bounding box in pixels, width then height.
    #[arg(long, num_args = 2, value_names = ["W_PX", "H_PX"], conflicts_with = "span_px")]
    ref_span_px: Option<Vec<f64>>,

    /// Catalog id of the reference object; matched by aspect when omitted.
    #[arg(long, requires = "ref_span_px")]
    reference: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Fast,
    Balanced,
    Accurate,
}

impl ProfileArg {
    fn to_core(self) -> QualityProfile {
        match self {
            Self::Fast => QualityProfile::Fast,
            Self::Balanced => QualityProfile::Balanced,
            Self::Accurate => QualityProfile::Accurate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeightsArg {
    Balanced,
    Center,
    Size,
    Edges,
}

impl WeightsArg {
    fn to_core(self) -> WeightProfile {
        match self {
            Self::Balanced => WeightProfile::Balanced,
            Self::Center => WeightProfile::PrioritizeCenter,
            Self::Size => WeightProfile::PrioritizeSize,
            Self::Edges => WeightProfile::PrioritizeEdges,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitArg {
    Mm,
    Cm,
    M,
    In,
    Px,
}

impl UnitArg {
    fn to_core(self) -> LengthUnit {
        match self {
            Self::Mm => LengthUnit::Millimeters,
            Self::Cm => LengthUnit::Centimeters,
            Self::M => LengthUnit::Meters,
            Self::In => LengthUnit::Inches,
            Self::Px => LengthUnit::Pixels,
        }
    }
}

impl CliMeasureArgs {
    fn to_params(&self) -> CliResult<DetectionParams> {
        let mut params = if let Some(path) = &self.params {
            let text = std::fs::read_to_string(path).map_err(|e| -> CliError {
                format!("Failed to read parameter file {}: {}", path.display(), e).into()
            })?;
            serde_json::from_str::<DetectionParams>(&text).map_err(|e| -> CliError {
                format!("Invalid parameter file {}: {}", path.display(), e).into()
            })?
        } else {
            let mut params = DetectionParams::with_profile(self.profile.to_core());
            params.weights = self.weights.to_core().weights();
            params.max_detections = self.max_detections;
            params.measure.unit = self.unit.to_core();
            params.measure.decimals = self.decimals;
            params
        };
        if let Some(center) = &self.center {
            params.search_center = Some([center[0], center[1]]);
        }
        Ok(params)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::Catalog { json } => run_catalog(json),
        Commands::ScaleTest {
            width_px,
            height_px,
            reference,
            out,
        } => run_scale_test(width_px, height_px, reference.as_deref(), out.as_deref()),
    }
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(args: &CliMeasureArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let mut analyzer = Analyzer::new(args.to_params()?)?;

    if let Some(path) = &args.calibration {
        let text = std::fs::read_to_string(path).map_err(|e| -> CliError {
            format!("Failed to read calibration file {}: {}", path.display(), e).into()
        })?;
        let state: CalibrationState = serde_json::from_str(&text).map_err(|e| -> CliError {
            format!("Invalid calibration file {}: {}", path.display(), e).into()
        })?;
        if !state.is_valid(unix_now()) {
            tracing::warn!(
                "Calibration from {} is expired or below the confidence floor; \
                 measurements fall back to pixels",
                path.display()
            );
        }
        tracing::info!(
            "Calibration: {:.4} px/mm loaded from {}",
            state.pixels_per_mm,
            path.display()
        );
        analyzer.set_calibration(state);
    } else if let Some(scale) = args.scale {
        let state = analyzer.calibrate_manual(scale, 1.0, LengthUnit::Millimeters, args.certainty)?;
        tracing::info!(
            "Calibration: {:.4} px/mm (manual scale, margin {:.2})",
            state.pixels_per_mm,
            state.error_margin
        );
    } else if let (Some(span_px), Some(span_mm)) = (args.span_px, args.span_mm) {
        let state =
            analyzer.calibrate_manual(span_px, span_mm, LengthUnit::Millimeters, args.certainty)?;
        tracing::info!(
            "Calibration: {:.4} px/mm from {span_px} px over {span_mm} mm (margin {:.2})",
            state.pixels_per_mm,
            state.error_margin
        );
    } else if let Some(span) = &args.ref_span_px {
        let state =
            analyzer.calibrate_reference([span[0], span[1]], args.reference.as_deref(), None)?;
        tracing::info!(
            "Calibration: {:.4} px/mm from reference '{}' (confidence {:.2})",
            state.pixels_per_mm,
            state.reference_id.as_deref().unwrap_or("?"),
            state.confidence,
        );
    } else {
        tracing::info!("No calibration given; measurements stay in pixels");
    }

    let analysis = analyzer.analyze_gray(&gray)?;
    tracing::info!(
        "Measured {} objects ({} edge pixels, {} contours traced)",
        analysis.objects.len(),
        analysis.diagnostics.edge_pixels,
        analysis.diagnostics.contours_traced,
    );
    for (i, object) in analysis.objects.iter().enumerate() {
        let m = &object.measurement;
        tracing::info!(
            "#{}: {:.2} x {:.2} {} (score {:.3}, confidence {:.2})",
            i,
            m.width,
            m.height,
            m.unit.suffix(),
            object.detection.score,
            object.detection.confidence,
        );
    }

    let json = serde_json::to_string_pretty(&analysis)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

// ── catalog ────────────────────────────────────────────────────────────

fn run_catalog(as_json: bool) -> CliResult<()> {
    let catalog = ReferenceCatalog::default();

    if as_json {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }

    println!("camdim builtin reference catalog");
    println!("  entries: {}", catalog.len());
    for entry in catalog.entries() {
        println!(
            "  {:<12} {:>7.2} x {:>6.2} mm  accuracy {:.2}  ({})",
            entry.id, entry.width_mm, entry.height_mm, entry.accuracy, entry.name
        );
    }

    Ok(())
}

// ── scale-test ─────────────────────────────────────────────────────────

fn run_scale_test(
    width_px: f64,
    height_px: f64,
    reference: Option<&str>,
    out: Option<&std::path::Path>,
) -> CliResult<()> {
    let catalog = ReferenceCatalog::default();
    let state = camdim::calib::calibrate_reference(
        [width_px, height_px],
        reference,
        &catalog,
        unix_now(),
    )?;

    println!("Observed span: {:.1} x {:.1} px", width_px, height_px);
    println!("Best match:");
    println!(
        "  reference:  {}",
        state.reference_id.as_deref().unwrap_or("?")
    );
    println!("  scale:      {:.4} px/mm", state.pixels_per_mm);
    println!("  confidence: {:.3}", state.confidence);
    println!("  margin:     {:.1}%", state.error_margin * 100.0);

    if let Some(path) = out {
        std::fs::write(path, serde_json::to_string_pretty(&state)?)?;
        println!("Calibration written to {}", path.display());
    }

    Ok(())
}
