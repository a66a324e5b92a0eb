//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Default duration of one output frame (seconds).
pub const DEFAULT_FRAME_TIME: f32 = 1.0 / 25.0;

/// Default number of integrator sub-steps per output frame.
pub const DEFAULT_STEPS_PER_FRAME: u32 = 5;

/// Default number of spring relaxation passes per sub-step.
pub const DEFAULT_CONSTRAINT_ITERATIONS: u32 = 5;

/// Default fraction of the previous sub-step's motion kept by damped Verlet.
pub const DEFAULT_VELOCITY_RETENTION: f32 = 0.99;

/// Default collision distance (meters). Leaf bounds are inflated by this
/// amount and triangle pairs closer than it produce contacts.
pub const DEFAULT_COLLISION_EPSILON: f32 = 0.015;

/// Maximum collision rounds per pass before the frame proceeds regardless.
pub const CLOTH_MAX_THRESHOLD: u32 = 10;

/// Maximum impulse iterations within one collision round.
pub const DEFAULT_IMPULSE_ITERATIONS: u32 = 50;

/// Goal weight at or above which a vertex is treated as pinned.
pub const DEFAULT_PIN_THRESHOLD: f32 = 0.999;

/// Threshold below which lengths, determinants and relative velocities
/// are treated as zero.
pub const ALMOST_ZERO: f32 = 1.0e-6;
