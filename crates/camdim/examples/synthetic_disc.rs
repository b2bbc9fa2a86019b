use camdim::{Analyzer, DetectionParams, LengthUnit};
use image::{GrayImage, Luma};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // light backdrop with one dark disc of 80 px radius
    let mut frame = GrayImage::from_pixel(640, 480, Luma([225u8]));
    for y in 0..480i32 {
        for x in 0..640i32 {
            let (dx, dy) = (x - 320, y - 240);
            if dx * dx + dy * dy <= 80 * 80 {
                frame.put_pixel(x as u32, y as u32, Luma([25u8]));
            }
        }
    }

    // pretend a ruler in the scene showed 4 px per mm
    let mut analyzer = Analyzer::new(DetectionParams::default())?;
    analyzer.calibrate_manual(
        4.0,
        1.0,
        LengthUnit::Millimeters,
        camdim::calib::DEFAULT_MANUAL_CERTAINTY,
    )?;

    let analysis = analyzer.analyze_gray(&frame)?;
    let object = analysis.best().ok_or("no object found")?;
    let m = &object.measurement;
    println!(
        "disc: {:.2} x {:.2} {} (expected about 40 x 40 mm)",
        m.width,
        m.height,
        m.unit.suffix()
    );
    println!("area: {:.2} {}^2", m.area, m.unit.suffix());
    println!("circularity: {:.3}", object.detection.shape.circularity);
    println!("confidence: {:.2}", object.detection.confidence);
    Ok(())
}
