//! Metrics collected over a scenario run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub scenario: String,
    pub vertex_count: usize,
    pub spring_count: usize,
    pub frames: u32,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    pub avg_frame_time: f64,
    pub min_frame_time: f64,
    pub max_frame_time: f64,
    /// Collision rounds summed over both passes and all frames.
    pub collision_rounds: u32,
    pub contact_pairs: u32,
    pub impulses: u32,
    /// Frames whose collision passes hit the round cap.
    pub unconverged_frames: u32,
    pub torn_springs: u32,
    pub final_kinetic_energy: f64,
    pub max_strain: f32,
    /// Largest distance any vertex travelled from its rest position.
    pub max_displacement: f32,
}

impl RunMetrics {
    pub fn to_csv_header() -> String {
        "scenario,vertex_count,spring_count,frames,total_wall_time_s,avg_frame_ms,min_frame_ms,max_frame_ms,collision_rounds,contact_pairs,impulses,unconverged_frames,torn_springs,final_ke,max_strain,max_displacement".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6},{:.4},{:.4},{:.4},{},{},{},{},{},{:.6e},{:.6},{:.6}",
            self.scenario,
            self.vertex_count,
            self.spring_count,
            self.frames,
            self.total_wall_time,
            self.avg_frame_time * 1000.0,
            self.min_frame_time * 1000.0,
            self.max_frame_time * 1000.0,
            self.collision_rounds,
            self.contact_pairs,
            self.impulses,
            self.unconverged_frames,
            self.torn_springs,
            self.final_kinetic_energy,
            self.max_strain,
            self.max_displacement,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[RunMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
