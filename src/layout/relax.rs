//! Discrete force relaxation.
//!
//! Every body is pulled towards its target by a spring whose strength decays
//! with `alpha`, and pairs closer than their combined collision radii are
//! pushed apart. The loop always runs the configured number of steps; it does
//! not look for a settled state.

use std::f64::consts::PI;

use serde::Serialize;

use super::{Field, LayoutError};

const INITIAL_RADIUS: f64 = 10.0;
const ALPHA_MIN: f64 = 0.001;
const ALPHA_DECAY_STEPS: f64 = 300.0;
const VELOCITY_DECAY: f64 = 0.4;
const TARGET_STRENGTH: f64 = 0.1;
const COLLIDE_STRENGTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub target_x: f64,
    pub target_y: f64,
    /// Collision radius: drawn radius plus padding.
    pub radius: f64,
}

impl Body {
    pub fn new(key: &str, target_x: f64, target_y: f64, radius: f64) -> Self {
        Self {
            key: key.to_string(),
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            target_x,
            target_y,
            radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaxReport {
    pub iterations: usize,
    pub final_alpha: f64,
    /// Largest `r(a) + r(b) - distance(a, b)` over all pairs after the run.
    pub max_overlap: f64,
}

/// Linear congruential generator with a fixed seed, used only to break exact
/// ties in the collision force.
#[derive(Debug, Clone)]
struct Lcg(u32);

impl Lcg {
    fn new() -> Self {
        Self(1)
    }

    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.0) / 4_294_967_296.0
    }

    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

pub struct Simulation {
    bodies: Vec<Body>,
    alpha: f64,
    alpha_decay: f64,
    random: Lcg,
}

impl Simulation {
    /// Validates every target and places bodies on a phyllotaxis spiral
    /// around their targets.
    ///
    /// Nothing is moved when a target or radius is non-finite.
    pub fn new(mut bodies: Vec<Body>) -> Result<Self, LayoutError> {
        for body in &bodies {
            if !body.target_x.is_finite() {
                return Err(LayoutError::InvalidInput {
                    key: body.key.clone(),
                    field: Field::TargetX,
                });
            }
            if !body.target_y.is_finite() {
                return Err(LayoutError::InvalidInput {
                    key: body.key.clone(),
                    field: Field::TargetY,
                });
            }
            if !body.radius.is_finite() {
                return Err(LayoutError::InvalidInput {
                    key: body.key.clone(),
                    field: Field::Radius,
                });
            }
        }

        let angle_step = PI * (3.0 - 5.0_f64.sqrt());
        for (idx, body) in bodies.iter_mut().enumerate() {
            let radius = INITIAL_RADIUS * (0.5 + idx as f64).sqrt();
            let angle = idx as f64 * angle_step;
            body.x = body.target_x + radius * angle.cos();
            body.y = body.target_y + radius * angle.sin();
            body.vx = 0.0;
            body.vy = 0.0;
        }

        Ok(Self {
            bodies,
            alpha: 1.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / ALPHA_DECAY_STEPS),
            random: Lcg::new(),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        for body in &mut self.bodies {
            body.vy += (body.target_y - body.y) * TARGET_STRENGTH * alpha;
        }
        for body in &mut self.bodies {
            body.vx += (body.target_x - body.x) * TARGET_STRENGTH * alpha;
        }
        self.collide();

        for body in &mut self.bodies {
            body.vx *= 1.0 - VELOCITY_DECAY;
            body.vy *= 1.0 - VELOCITY_DECAY;
            body.x += body.vx;
            body.y += body.vy;
        }
    }

    /// One collision pass over predicted positions (`x + vx`). The correction
    /// is shared by squared radius, so small bubbles yield to large ones.
    fn collide(&mut self) {
        let count = self.bodies.len();
        for i in 0..count {
            let ri = self.bodies[i].radius;
            let ri2 = ri * ri;
            let xi = self.bodies[i].x + self.bodies[i].vx;
            let yi = self.bodies[i].y + self.bodies[i].vy;
            for j in (i + 1)..count {
                let rj = self.bodies[j].radius;
                let reach = ri + rj;
                let mut dx = xi - self.bodies[j].x - self.bodies[j].vx;
                let mut dy = yi - self.bodies[j].y - self.bodies[j].vy;
                let mut dist2 = dx * dx + dy * dy;
                if dist2 >= reach * reach {
                    continue;
                }
                if dx == 0.0 {
                    dx = self.random.jiggle();
                    dist2 += dx * dx;
                }
                if dy == 0.0 {
                    dy = self.random.jiggle();
                    dist2 += dy * dy;
                }
                let dist = dist2.sqrt();
                let push = (reach - dist) / dist * COLLIDE_STRENGTH;
                dx *= push;
                dy *= push;
                let rj2 = rj * rj;
                let share = rj2 / (ri2 + rj2);
                self.bodies[i].vx += dx * share;
                self.bodies[i].vy += dy * share;
                self.bodies[j].vx -= dx * (1.0 - share);
                self.bodies[j].vy -= dy * (1.0 - share);
            }
        }
    }

    pub fn run(mut self, iterations: usize) -> (Vec<Body>, RelaxReport) {
        for step in 0..iterations {
            self.tick();
            if step % 100 == 0 {
                log::trace!("relax step {step}: alpha={:.5}", self.alpha);
            }
        }
        let report = RelaxReport {
            iterations,
            final_alpha: self.alpha,
            max_overlap: max_overlap(&self.bodies),
        };
        (self.bodies, report)
    }
}

pub(super) fn max_overlap(bodies: &[Body]) -> f64 {
    let mut worst = 0.0_f64;
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let distance = (a.x - b.x).hypot(a.y - b.y);
            worst = worst.max(a.radius + b.radius - distance);
        }
    }
    worst
}
