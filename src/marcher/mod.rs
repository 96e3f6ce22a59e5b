use crate::math::{abs, dot, mul, normalize_or, sub, v, Ray, B1, B2, B3, V3};

pub const MAX_STEPS: usize = 100;
pub const MAX_DIST: f64 = 100.;
pub const SURF_DIST: f64 = 0.01;
pub const NORMAL_EPS: f64 = 0.01;

pub trait Renderable: Send + Sync {
    fn sdf(&self, x: &V3) -> f64;
}

/// Union of shapes: the smallest distance wins. An empty union is infinitely far away.
#[derive(Default)]
pub struct Cup {
    pub renderables: Vec<Box<dyn Renderable>>,
}

#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: V3,
    pub radius: f64,
}

/// Half-space boundary through `point`, facing along the unit vector `axis`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub point: V3,
    pub axis: V3,
}

impl Renderable for Sphere {
    fn sdf(&self, x: &V3) -> f64 {
        abs(&sub(x, &self.center)) - self.radius
    }
}

impl Renderable for Plane {
    fn sdf(&self, x: &V3) -> f64 {
        dot(&sub(x, &self.point), &self.axis)
    }
}

impl Renderable for Cup {
    fn sdf(&self, x: &V3) -> f64 {
        self.renderables
            .iter()
            .fold(f64::INFINITY, |acc, r| acc.min(r.sdf(x)))
    }
}

impl Cup {
    pub fn with(mut self, r: impl Renderable + 'static) -> Self {
        self.renderables.push(Box::new(r));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Last sample fell under `SURF_DIST`.
    Hit,
    /// Travelled past `MAX_DIST`.
    Escaped,
    /// Ran out of steps without either.
    Exhausted,
}

#[derive(Clone, Copy, Debug)]
pub struct March {
    pub distance: f64,
    pub steps: usize,
    pub outcome: Outcome,
}

impl March {
    pub fn hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub sample: f64,
    pub travelled: f64,
}

/// Sphere-tracing iterator. Yields one [`Step`] per distance sample and stops
/// after the sample that hits, escapes, or uses up the last step.
pub struct Steps<'a, R: Renderable + ?Sized> {
    r: &'a R,
    ray: Ray,
    travelled: f64,
    taken: usize,
    done: bool,
}

impl<'a, R: Renderable + ?Sized> Iterator for Steps<'a, R> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.done || self.taken >= MAX_STEPS {
            return None;
        }
        let point = self.ray.at(self.travelled);
        let sample = self.r.sdf(&point);
        self.travelled += sample;
        self.taken += 1;
        if self.travelled > MAX_DIST || sample < SURF_DIST {
            self.done = true;
        }
        Some(Step {
            sample,
            travelled: self.travelled,
        })
    }
}

/// Steps along `dir` from `origin`. `dir` is used as given, so it should be
/// normalized by the caller.
pub fn steps<'a, R: Renderable + ?Sized>(r: &'a R, origin: &V3, dir: &V3) -> Steps<'a, R> {
    Steps {
        r,
        ray: Ray {
            x: *origin,
            d: *dir,
        },
        travelled: 0.,
        taken: 0,
        done: false,
    }
}

pub fn march<R: Renderable + ?Sized>(r: &R, origin: &V3, dir: &V3) -> March {
    let mut last: Option<Step> = None;
    let mut count = 0;
    for step in steps(r, origin, dir) {
        last = Some(step);
        count += 1;
    }
    match last {
        Some(Step {
            sample, travelled, ..
        }) => March {
            distance: travelled,
            steps: count,
            outcome: if sample < SURF_DIST {
                Outcome::Hit
            } else if travelled > MAX_DIST {
                Outcome::Escaped
            } else {
                Outcome::Exhausted
            },
        },
        None => March {
            distance: 0.,
            steps: 0,
            outcome: Outcome::Exhausted,
        },
    }
}

/// Distance travelled before a hit, an escape or the step limit.
pub fn ray_march<R: Renderable + ?Sized>(r: &R, origin: &V3, dir: &V3) -> f64 {
    march(r, origin, dir).distance
}

// One-sided: each axis is d(x) - d(x - eps * axis), not a central difference.
fn dsdf<R: Renderable + ?Sized>(r: &R, x: &V3) -> V3 {
    let d = r.sdf(x);
    let dx = mul(NORMAL_EPS, &B1);
    let dy = mul(NORMAL_EPS, &B2);
    let dz = mul(NORMAL_EPS, &B3);

    v(
        d - r.sdf(&sub(x, &dx)),
        d - r.sdf(&sub(x, &dy)),
        d - r.sdf(&sub(x, &dz)),
    )
}

/// Surface normal at `x`. Falls back to `+y` where the gradient vanishes.
pub fn estimate_normal<R: Renderable + ?Sized>(r: &R, x: &V3) -> V3 {
    normalize_or(&dsdf(r, x), B2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{abs, normalize, O};

    fn ground_and_ball() -> Cup {
        Cup::default()
            .with(Plane {
                point: O,
                axis: B2,
            })
            .with(Sphere {
                center: v(2., 1., 10.),
                radius: 1.,
            })
    }

    #[test]
    fn sphere_sdf_is_signed() {
        let s = Sphere {
            center: O,
            radius: 1.,
        };
        assert_eq!(s.sdf(&v(3., 0., 0.)), 2.);
        assert_eq!(s.sdf(&O), -1.);
    }

    #[test]
    fn cup_takes_minimum() {
        let scene = ground_and_ball();
        assert_eq!(scene.sdf(&v(2., 3., 10.)), 1.);
        assert_eq!(scene.sdf(&v(-4., 0.5, 0.)), 0.5);
        assert_eq!(Cup::default().sdf(&O), f64::INFINITY);
    }

    #[test]
    fn straight_down_hits_ground_at_one() {
        let m = march(&ground_and_ball(), &v(0., 1., 0.), &v(0., -1., 0.));
        assert!(m.hit());
        assert!((m.distance - 1.).abs() < SURF_DIST);
        assert_eq!(m.steps, 2);
    }

    #[test]
    fn straight_up_escapes() {
        let m = march(&ground_and_ball(), &v(0., 1., 0.), &B2);
        assert_eq!(m.outcome, Outcome::Escaped);
        assert!(m.distance > MAX_DIST);
    }

    #[test]
    fn skimming_the_ground_runs_out_of_steps() {
        let m = march(&ground_and_ball(), &v(0., 0.02, 0.), &-B1);
        assert_eq!(m.outcome, Outcome::Exhausted);
        assert_eq!(m.steps, MAX_STEPS);
        assert!((m.distance - 2.).abs() < 1e-9);
    }

    #[test]
    fn ray_march_returns_march_distance() {
        let scene = ground_and_ball();
        let dir = normalize(&v(0.2, -0.1, 1.));
        let origin = v(0., 1., 0.);
        assert_eq!(
            ray_march(&scene, &origin, &dir),
            march(&scene, &origin, &dir).distance
        );
    }

    #[test]
    fn travelled_distance_never_decreases() {
        let scene = ground_and_ball();
        let origin = v(0., 1., 0.);
        for dir in [
            v(0.2, -0.1, 1.),
            v(0.1, 0., 1.),
            v(-0.4, 0.3, 1.),
            v(0., -0.02, 1.),
        ] {
            let mut prev = 0.;
            for step in steps(&scene, &origin, &normalize(&dir)) {
                assert!(step.sample >= 0.);
                assert!(step.travelled >= prev);
                prev = step.travelled;
            }
        }
    }

    #[test]
    fn ground_normal_points_up() {
        let n = estimate_normal(&ground_and_ball(), &v(-5., 0., 0.));
        assert!(abs(&sub(&n, &B2)) < 1e-9);
    }

    #[test]
    fn top_of_ball_normal_points_up() {
        let n = estimate_normal(&ground_and_ball(), &v(2., 2., 10.));
        assert!(abs(&sub(&n, &B2)) < 1e-2);
    }

    #[test]
    fn normals_are_unit_away_from_surfaces() {
        let scene = ground_and_ball();
        for p in [v(0., 5., 0.), v(2., 1., 13.), v(-3., 0.5, 4.), v(4., 3., 9.)] {
            let n = estimate_normal(&scene, &p);
            assert!((abs(&n) - 1.).abs() < 1e-9);
        }
    }

    #[test]
    fn flat_field_normal_falls_back_to_up() {
        assert_eq!(estimate_normal(&Cup::default(), &O), B2);
    }
}
