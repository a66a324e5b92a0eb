//! CLI command implementations.

use drape_sim::{RunMetrics, Scenario, ScenarioKind, ScenarioRunner, SimulationConfig};
use drape_solver::FrameSnapshot;

pub struct SimulateArgs<'a> {
    pub config: Option<&'a str>,
    pub frames: u32,
    pub cols: usize,
    pub rows: usize,
    pub sphere: bool,
    pub save: Option<&'a str>,
}

fn load_config(path: &str) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config: SimulationConfig = toml::from_str(&text).map_err(|e| format!("Invalid config {path}: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Run one scenario frame by frame, printing a line per frame.
pub fn simulate(args: &SimulateArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    let scenario = if args.sphere {
        Scenario::sphere_drape(args.cols, args.rows)
    } else {
        Scenario::hanging_sheet(args.cols, args.rows)
    }
    .with_config(config)
    .with_frames(args.frames);

    println!("drape simulate");
    println!("──────────────");
    println!(
        "Scenario: {} ({} verts, {} faces, {} frames)",
        scenario.kind.name(),
        scenario.cloth.vertex_count(),
        scenario.cloth.face_count(),
        scenario.frames,
    );
    if let Some(path) = args.config {
        println!("Config:   {path}");
    }
    println!();
    println!("{:>6} {:>8} {:>8} {:>8} {:>12} {:>10} {:>9}", "frame", "rounds", "pairs", "impulses", "kinetic", "strain", "ms");

    let mut last_snapshot: Option<Vec<u8>> = None;
    let mut save_error: Option<String> = None;
    let metrics = ScenarioRunner::run_with(&scenario, |sim, report| {
        let rounds = report.collision.static_pass.rounds + report.collision.moving_pass.rounds;
        println!(
            "{:>6} {:>8} {:>8} {:>8} {:>12.4e} {:>10.4} {:>9.3}{}",
            report.frame,
            rounds,
            report.collision.total_pairs(),
            report.collision.total_impulses(),
            report.kinetic_energy,
            report.max_strain,
            report.wall_time * 1000.0,
            if report.collision.converged() { "" } else { "  (round cap)" },
        );
        if args.save.is_some() {
            if let Some(snapshot) = sim.state().cache.get(report.frame) {
                match snapshot.to_bytes() {
                    Ok(bytes) => last_snapshot = Some(bytes),
                    Err(e) => save_error = Some(e.to_string()),
                }
            }
        }
    })
    .map_err(|e| format!("Simulation failed: {e}"))?;

    println!();
    println!("  Wall time:     {:.3}s", metrics.total_wall_time);
    println!("  Avg frame:     {:.3}ms", metrics.avg_frame_time * 1000.0);
    println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
    println!("  Max displace:  {:.4}m", metrics.max_displacement);
    println!("  Unconverged:   {}", metrics.unconverged_frames);

    if let Some(path) = args.save {
        if let Some(e) = save_error {
            return Err(format!("Failed to encode snapshot: {e}").into());
        }
        let bytes = last_snapshot.ok_or("No frame was simulated, nothing to save")?;
        std::fs::write(path, bytes)?;
        println!("  Snapshot:      {path}");
    }
    Ok(())
}

/// Run the canonical scenarios.
pub fn benchmark(scenario_name: &str, output_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    println!("drape benchmark");
    println!("═══════════════");
    println!();

    let kinds: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                return Err(format!("Unknown scenario: '{scenario_name}'. Available: {}, all", available.join(", ")).into());
            }
        }
    };

    let mut all_metrics = Vec::new();
    for kind in kinds {
        let scenario = Scenario::from_kind(kind);
        println!(
            "Running: {} ({} verts, {} faces, {} frames)",
            kind.name(),
            scenario.cloth.vertex_count(),
            scenario.cloth.face_count(),
            scenario.frames,
        );

        let metrics = ScenarioRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;
        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg frame:     {:.3}ms", metrics.avg_frame_time * 1000.0);
        println!("  Contact pairs: {}", metrics.contact_pairs);
        println!();
        all_metrics.push(metrics);
    }

    let csv = RunMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }
    Ok(())
}

/// Decode a frame snapshot.
pub fn inspect(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("drape snapshot inspector");
    println!("────────────────────────");
    println!();

    let data = std::fs::read(path)?;
    let snapshot = FrameSnapshot::from_bytes(&data).map_err(|e| format!("Failed to read snapshot: {e}"))?;

    let pinned = snapshot.vertices.iter().filter(|v| v.is_pinned()).count();
    let active = snapshot.springs.iter().filter(|s| s.is_active()).count();
    println!("Frame:        {}", snapshot.frame);
    println!("Vertices:     {} ({} pinned)", snapshot.vertices.len(), pinned);
    println!("Springs:      {} ({} active)", snapshot.springs.len(), active);

    if !snapshot.vertices.is_empty() {
        let (min_y, max_y) = snapshot
            .vertices
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v.x.y), hi.max(v.x.y)));
        println!("Y range:      [{:.4}, {:.4}]", min_y, max_y);
        let collided = snapshot
            .vertices
            .iter()
            .filter(|v| v.flags.contains(drape_solver::VertexFlags::COLLIDED))
            .count();
        println!("Collided:     {collided}");
    }
    Ok(())
}
