//! Runs scenarios frame by frame and folds the reports into [`RunMetrics`].

use std::time::Instant;

use tracing::info;

use drape_types::DrapeResult;

use crate::metrics::RunMetrics;
use crate::scenarios::{Scenario, ScenarioKind};
use crate::simulation::{ClothSimulation, FrameReport};

pub struct ScenarioRunner;

impl ScenarioRunner {
    pub fn run(scenario: &Scenario) -> DrapeResult<RunMetrics> {
        Self::run_with(scenario, |_, _| {})
    }

    /// Runs `scenario`, calling `on_frame` after every simulated frame.
    pub fn run_with<F>(scenario: &Scenario, mut on_frame: F) -> DrapeResult<RunMetrics>
    where
        F: FnMut(&ClothSimulation, &FrameReport),
    {
        let mut sim = scenario.build()?;
        let rest = sim.positions();

        let mut metrics = RunMetrics {
            scenario: scenario.kind.name().to_string(),
            vertex_count: sim.state().vertex_count(),
            spring_count: sim.state().spring_count(),
            frames: scenario.frames,
            min_frame_time: if scenario.frames == 0 { 0.0 } else { f64::MAX },
            ..RunMetrics::default()
        };

        let start = Instant::now();
        for _ in 0..scenario.frames {
            let report = sim.step_frame()?;
            metrics.min_frame_time = metrics.min_frame_time.min(report.wall_time);
            metrics.max_frame_time = metrics.max_frame_time.max(report.wall_time);
            metrics.collision_rounds += report.collision.static_pass.rounds + report.collision.moving_pass.rounds;
            metrics.contact_pairs += report.collision.total_pairs();
            metrics.impulses += report.collision.total_impulses();
            if !report.collision.converged() {
                metrics.unconverged_frames += 1;
            }
            metrics.torn_springs += report.torn_springs;
            metrics.final_kinetic_energy = report.kinetic_energy;
            metrics.max_strain = metrics.max_strain.max(report.max_strain);
            on_frame(&sim, &report);
        }
        metrics.total_wall_time = start.elapsed().as_secs_f64();
        if scenario.frames > 0 {
            metrics.avg_frame_time = metrics.total_wall_time / scenario.frames as f64;
        }

        metrics.max_displacement = sim
            .positions()
            .iter()
            .zip(&rest)
            .map(|(p, r)| p.distance(*r))
            .fold(0.0f32, f32::max);

        info!(
            scenario = %metrics.scenario,
            frames = metrics.frames,
            wall_time = metrics.total_wall_time,
            "scenario finished"
        );
        Ok(metrics)
    }

    /// Runs every scenario at default resolution.
    pub fn run_all() -> DrapeResult<Vec<RunMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)))
            .collect()
    }
}
