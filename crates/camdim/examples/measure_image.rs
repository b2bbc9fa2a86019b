use camdim::{Analyzer, DetectionParams, LengthUnit};
use image::ImageReader;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image> [pixels_per_mm] [out.json]", args[0]);
        std::process::exit(2);
    }

    let image = ImageReader::open(&args[1])?.decode()?.to_luma8();

    let mut analyzer = Analyzer::new(DetectionParams::default())?;
    if let Some(scale) = args.get(2) {
        analyzer.calibrate_manual(
            scale.parse()?,
            1.0,
            LengthUnit::Millimeters,
            camdim::calib::DEFAULT_MANUAL_CERTAINTY,
        )?;
    }

    let analysis = analyzer.analyze_gray(&image)?;
    println!(
        "Found {} objects in {}x{} px.",
        analysis.objects.len(),
        analysis.width,
        analysis.height
    );
    for object in &analysis.objects {
        let m = &object.measurement;
        println!(
            "  {:.2} x {:.2} {} ({:?}, confidence {:.2})",
            m.width,
            m.height,
            m.unit.suffix(),
            object.calibration_method,
            object.detection.confidence
        );
    }

    if let Some(out_path) = args.get(3) {
        std::fs::write(out_path, serde_json::to_string_pretty(&analysis)?)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
