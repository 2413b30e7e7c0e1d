//! Write a synthetic training CSV for local runs
//! Run with: cargo run --example synthetic_data -- [rows] [path]

use grades::features::{FEATURE_COLUMNS, TARGET_COLUMN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() -> grades::Result<()> {
    let mut args = std::env::args().skip(1);
    let rows: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(500);
    let path = args.next().unwrap_or_else(|| "training_data.csv".to_string());

    let mut rng = StdRng::seed_from_u64(7);
    let mut out = BufWriter::new(File::create(&path)?);
    writeln!(out, "{},{}", FEATURE_COLUMNS.join(","), TARGET_COLUMN)?;

    for _ in 0..rows {
        let study_hours = rng.random_range(0.0..10.0f64);
        let attendance = rng.random_range(50.0..100.0f64);
        let previous_grade = rng.random_range(40.0..100.0f64);
        let project_score = rng.random_range(40.0..100.0f64);
        let quiz_average = rng.random_range(40.0..100.0f64);
        let study_group_hours = rng.random_range(0.0..5.0f64);
        let tutorial_attendance = rng.random_range(0.0..10.0f64).floor();
        let sleep_hours = rng.random_range(4.0..10.0f64);
        let stress_level = rng.random_range(1.0..10.0f64).floor();
        let extracurricular_hours = rng.random_range(0.0..8.0f64);

        let grade = 0.30 * previous_grade
            + 0.15 * attendance
            + 0.15 * project_score
            + 0.15 * quiz_average
            + 1.5 * study_hours
            + 0.8 * study_group_hours
            + 0.5 * tutorial_attendance
            - 0.6 * (sleep_hours - 8.0).abs()
            - 0.4 * stress_level
            - 0.2 * extracurricular_hours
            + rng.random_range(-3.0..3.0f64);

        writeln!(
            out,
            "{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.0},{:.1},{:.0},{:.1},{:.2}",
            study_hours,
            attendance,
            previous_grade,
            project_score,
            quiz_average,
            study_group_hours,
            tutorial_attendance,
            sleep_hours,
            stress_level,
            extracurricular_hours,
            grade.clamp(0.0, 100.0)
        )?;
    }

    out.flush()?;
    println!("Wrote {} rows to {}", rows, path);
    Ok(())
}
