//! Impulse response.
//!
//! Resolves approaching contacts by correcting the cloth's tentative
//! velocities. Each iteration visits every [`CollisionPair`], and for a
//! pair whose normal relative velocity is approaching, accumulates the
//! impulse `j = -2·v_n / (1 + Σ w_a²)` into side A's vertices weighted by
//! their barycentric weights (and the opposite impulse into side B when
//! B is cloth). Accumulated impulses are averaged per vertex and added to
//! `tv` at the end of the iteration.
//!
//! The model is frictionless and ignores vertex mass. Obstacles and
//! pinned vertices never receive impulses.

use drape_math::Vec3;
use drape_solver::state::{ClothState, VertexFlags};
use drape_types::constants::ALMOST_ZERO;

use crate::narrow::{CollisionPair, ContactSource};
use crate::obstacle::Obstacle;

/// Result of resolving one round of contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseResult {
    /// Iterations run.
    pub iterations: u32,
    /// Per-vertex impulses applied over all iterations.
    pub impulses: u32,
    /// Whether the last iteration run found nothing left to correct.
    pub settled: bool,
}

impl ResponseResult {
    /// Whether any vertex received an impulse.
    pub fn fired(&self) -> bool {
        self.impulses > 0
    }
}

/// Trait for contact response strategies.
pub trait ContactResponse: Send + Sync {
    /// Corrects `cloth`'s tentative velocities for `pairs`.
    fn resolve(&self, pairs: &[CollisionPair], cloth: &mut ClothState, obstacles: &[Obstacle]) -> ResponseResult;

    /// Returns the response strategy name.
    fn name(&self) -> &str;
}

/// No-op response: contacts are detected but never acted on.
pub struct NullContactResponse;

impl ContactResponse for NullContactResponse {
    fn resolve(&self, _pairs: &[CollisionPair], _cloth: &mut ClothState, _obstacles: &[Obstacle]) -> ResponseResult {
        ResponseResult {
            settled: true,
            ..Default::default()
        }
    }

    fn name(&self) -> &str {
        "null_contact_response"
    }
}

/// Iterative frictionless impulse response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    /// Iteration cap per round.
    pub max_iterations: u32,
}

impl ImpulseResponse {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

#[inline]
fn interpolate(weights: [f32; 3], velocity: impl Fn(usize) -> Vec3, tri: [u32; 3]) -> Vec3 {
    weights[0] * velocity(tri[0] as usize) + weights[1] * velocity(tri[1] as usize) + weights[2] * velocity(tri[2] as usize)
}

/// Normal relative velocity of a contact at the current tentative state.
pub fn normal_velocity(pair: &CollisionPair, cloth: &ClothState, obstacles: &[Obstacle]) -> f32 {
    let tv = |i: usize| cloth.vertices[i].tv;
    let va = interpolate(pair.weights_a, tv, pair.indices_a);
    let vb = match pair.source {
        ContactSource::SelfCloth => interpolate(pair.weights_b, tv, pair.indices_b),
        ContactSource::Obstacle(k) => {
            let obstacle = &obstacles[k];
            interpolate(pair.weights_b, |i| obstacle.velocity(i), pair.indices_b)
        }
    };
    (va - vb).dot(pair.normal)
}

impl ImpulseResponse {
    fn accumulate(cloth: &mut ClothState, tri: [u32; 3], weights: [f32; 3], impulse: Vec3, touched: &mut Vec<usize>) -> u32 {
        let mut applied = 0;
        for (&v, &w) in tri.iter().zip(&weights) {
            let vertex = &mut cloth.vertices[v as usize];
            if vertex.is_pinned() {
                continue;
            }
            if vertex.impulse_count == 0 {
                touched.push(v as usize);
            }
            vertex.impulse += w * impulse;
            vertex.impulse_count += 1;
            applied += 1;
        }
        applied
    }
}

impl ContactResponse for ImpulseResponse {
    fn resolve(&self, pairs: &[CollisionPair], cloth: &mut ClothState, obstacles: &[Obstacle]) -> ResponseResult {
        let mut result = ResponseResult::default();
        let mut touched: Vec<usize> = Vec::new();

        for _ in 0..self.max_iterations {
            result.iterations += 1;
            let mut applied = 0;

            for pair in pairs {
                let vn = normal_velocity(pair, cloth, obstacles);
                if vn >= -ALMOST_ZERO {
                    continue;
                }
                let w2: f32 = pair.weights_a.iter().map(|w| w * w).sum();
                let j = -2.0 * vn / (1.0 + w2);
                let impulse = j * pair.normal;

                applied += Self::accumulate(cloth, pair.indices_a, pair.weights_a, impulse, &mut touched);
                if pair.source == ContactSource::SelfCloth {
                    applied += Self::accumulate(cloth, pair.indices_b, pair.weights_b, -impulse, &mut touched);
                }
            }

            for &i in &touched {
                let vertex = &mut cloth.vertices[i];
                vertex.tv += vertex.impulse / vertex.impulse_count as f32;
                vertex.impulse = Vec3::ZERO;
                vertex.impulse_count = 0;
                vertex.flags.insert(VertexFlags::COLLIDED);
            }
            touched.clear();

            result.impulses += applied;
            if applied == 0 {
                result.settled = true;
                break;
            }
        }
        result
    }

    fn name(&self) -> &str {
        "impulse_response"
    }
}
