//! The demo scene: a ground plane and a sphere, lit by a point light that
//! orbits the sphere's center. Everything here is a pure function of its
//! arguments, so pixels can be evaluated in any order.

use crate::config::SceneConfig;
use crate::marcher::{
    estimate_normal, march, ray_march, Cup, March, Plane, Renderable, Sphere, SURF_DIST,
};
use crate::math::{add, dist, dot, mul, normalize, normalize_or, sub, v, B2, O, V2, V3};

/// Camera position. It looks down `+z` with no lens model.
pub const CAMERA: V3 = V3 {
    x: 0.,
    y: 1.,
    z: 0.,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn gray(i: f64) -> Color {
        Color { r: i, g: i, b: i }
    }

    /// 8-bit RGBA with alpha fixed at 255.
    pub fn to_rgba8(&self) -> image::Rgba<u8> {
        let q = |c: f64| (c.clamp(0., 1.) * 255.).round() as u8;
        image::Rgba([q(self.r), q(self.g), q(self.b), 255])
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub base: V3,
    pub orbit_radius: f64,
    pub orbit_period: f64,
}

impl Light {
    /// Orbits `base` in the horizontal plane; `t` is in milliseconds.
    pub fn position(&self, t: f64) -> V3 {
        let angle = t / self.orbit_period;
        add(
            &self.base,
            &v(
                angle.sin() * self.orbit_radius,
                0.,
                angle.cos() * self.orbit_radius,
            ),
        )
    }
}

pub struct Scene {
    shapes: Cup,
    pub light: Light,
    pub shadow_floor: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new(&SceneConfig::default())
    }
}

impl Renderable for Scene {
    fn sdf(&self, x: &V3) -> f64 {
        self.shapes.sdf(x)
    }
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Scene {
        let shapes = Cup::default()
            .with(Plane {
                point: O,
                axis: B2,
            })
            .with(Sphere {
                center: config.sphere_center,
                radius: config.sphere_radius,
            });
        Scene {
            shapes,
            light: Light {
                base: config.light_base,
                orbit_radius: config.orbit_radius,
                orbit_period: config.orbit_period,
            },
            shadow_floor: config.shadow_floor,
        }
    }

    pub fn distance(&self, p: &V3) -> f64 {
        self.sdf(p)
    }

    /// Diffuse intensity at surface point `p`, dimmed by `shadow_floor` when
    /// something lies between `p` and the light.
    ///
    /// If `p` sits exactly on the light the direction to it is undefined and
    /// the diffuse term is 0.
    pub fn shade(&self, p: &V3, t: f64) -> f64 {
        let light_pos = self.light.position(t);
        let to_light = sub(&light_pos, p);
        let l = normalize_or(&to_light, O);
        let n = estimate_normal(self, p);

        let mut dif = dot(&n, &l).clamp(0., 1.);
        let origin = add(p, &mul(SURF_DIST * 2., &n));
        let d = ray_march(self, &origin, &l);
        if d < dist(&light_pos, p) {
            dif *= self.shadow_floor;
        }
        dif
    }

    /// Primary ray through `uv`, one unit in front of the camera.
    pub fn camera_dir(uv: V2) -> V3 {
        normalize(&v(uv.x, uv.y, 1.))
    }

    /// Primary march for `uv`, with its hit/miss outcome.
    pub fn trace(&self, uv: V2) -> March {
        march(self, &CAMERA, &Scene::camera_dir(uv))
    }

    /// Color seen through `uv` at time `t`. Rays that miss are shaded at the
    /// point where marching stopped, the same as hits.
    pub fn render(&self, uv: V2, t: f64) -> Color {
        let rd = Scene::camera_dir(uv);
        let d = ray_march(self, &CAMERA, &rd);
        let p = add(&CAMERA, &mul(d, &rd));
        Color::gray(self.shade(&p, t))
    }
}
