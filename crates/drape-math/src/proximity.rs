//! Triangle proximity queries.
//!
//! The narrow phase needs, for two triangles, the pair of nearest points
//! and the separating vector between them. The minimum distance between
//! two non-intersecting triangles is always realised either by a vertex
//! of one against the other triangle or by an edge pair, so the query
//! evaluates those fifteen candidates. Intersecting triangles report
//! distance zero with coincident points.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use drape_types::constants::ALMOST_ZERO;

/// Nearest points between two triangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleProximity {
    /// Nearest point on the first triangle.
    pub pa: Vec3,
    /// Nearest point on the second triangle.
    pub pb: Vec3,
    /// Separating vector `pa - pb` (zero when the triangles intersect).
    pub vector: Vec3,
    /// Length of `vector`.
    pub distance: f32,
}

/// Unit normal of triangle `(a, b, c)`, or zero if it is degenerate.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Closest point to `p` on triangle `(a, b, c)`.
///
/// Voronoi-region walk: vertex regions first, then edge regions, then
/// the face interior.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() < f32::MIN_POSITIVE {
        return a;
    }
    let inv = 1.0 / denom;
    let v = vb * inv;
    let w = vc * inv;
    a + ab * v + ac * w
}

/// Closest points between segments `p1q1` and `p2q2`.
pub fn closest_points_on_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= ALMOST_ZERO && e <= ALMOST_ZERO {
        (0.0, 0.0)
    } else if a <= ALMOST_ZERO {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= ALMOST_ZERO {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > ALMOST_ZERO * a * e {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// Point where segment `pq` crosses triangle `(a, b, c)`, if it does.
fn segment_triangle_intersection(p: Vec3, q: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    let dir = q - p;
    let h = dir.cross(ac);
    let det = ab.dot(h);
    if det.abs() < ALMOST_ZERO * ALMOST_ZERO {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = p - a;
    let u = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qv = s.cross(ab);
    let v = dir.dot(qv) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = ac.dot(qv) * inv_det;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(p + dir * t)
}

/// Nearest points between triangles `ta` and `tb`.
pub fn triangle_proximity(ta: [Vec3; 3], tb: [Vec3; 3]) -> TriangleProximity {
    for i in 0..3 {
        let (p, q) = (ta[i], ta[(i + 1) % 3]);
        if let Some(hit) = segment_triangle_intersection(p, q, tb[0], tb[1], tb[2]) {
            return TriangleProximity {
                pa: hit,
                pb: hit,
                vector: Vec3::ZERO,
                distance: 0.0,
            };
        }
        let (p, q) = (tb[i], tb[(i + 1) % 3]);
        if let Some(hit) = segment_triangle_intersection(p, q, ta[0], ta[1], ta[2]) {
            return TriangleProximity {
                pa: hit,
                pb: hit,
                vector: Vec3::ZERO,
                distance: 0.0,
            };
        }
    }

    let mut best_pa = ta[0];
    let mut best_pb = tb[0];
    let mut best_d2 = f32::MAX;
    let mut consider = |pa: Vec3, pb: Vec3| {
        let d2 = (pa - pb).length_squared();
        if d2 < best_d2 {
            best_d2 = d2;
            best_pa = pa;
            best_pb = pb;
        }
    };

    for &p in &ta {
        consider(p, closest_point_on_triangle(p, tb[0], tb[1], tb[2]));
    }
    for &p in &tb {
        consider(closest_point_on_triangle(p, ta[0], ta[1], ta[2]), p);
    }
    for i in 0..3 {
        for j in 0..3 {
            let (pa, pb) = closest_points_on_segments(
                ta[i],
                ta[(i + 1) % 3],
                tb[j],
                tb[(j + 1) % 3],
            );
            consider(pa, pb);
        }
    }

    let vector = best_pa - best_pb;
    TriangleProximity {
        pa: best_pa,
        pb: best_pb,
        vector,
        distance: vector.length(),
    }
}

/// Barycentric weights of `p` with respect to triangle `(a, b, c)`.
///
/// Solves the 2×2 normal equations built from the two edge vectors and
/// `p - a`. A near-singular system (degenerate triangle) yields uniform
/// weights of one third each.
pub fn barycentric_weights(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;

    if denom.abs() <= ALMOST_ZERO * d00 * d11 || denom == 0.0 {
        return [1.0 / 3.0; 3];
    }

    let w1 = (d11 * d20 - d01 * d21) / denom;
    let w2 = (d00 * d21 - d01 * d20) / denom;
    [1.0 - w1 - w2, w1, w2]
}
