use crate::config::RenderConfig;
use crate::math::{uv, V2};
use crate::scene::{Color, Scene};
use image::{ImageBuffer, Rgba};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

pub type Frame = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Sampling {
    pub antialias: u32,
    pub jitter: bool,
    pub seed: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling {
            antialias: 1,
            jitter: false,
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    pub fn sampling(&self) -> Sampling {
        Sampling {
            antialias: self.antialias,
            jitter: self.jitter,
            seed: self.seed,
        }
    }

    pub fn frame_time(&self, frame: u64) -> f64 {
        frame_time(frame, self.fps)
    }
}

/// Milliseconds since the first frame.
pub fn frame_time(frame: u64, fps: f64) -> f64 {
    frame as f64 * 1000. / fps
}

/// Maps a screen coordinate (origin bottom-left, in pixels) to a centred,
/// height-normalized coordinate.
pub fn to_uv(frag: (f64, f64), res: Resolution) -> V2 {
    let w = res.width as f64;
    let h = res.height as f64;
    uv((frag.0 - w * 0.5) / h, (frag.1 - h * 0.5) / h)
}

/// Screen coordinate of the centre of image pixel `(x, y)`, with image rows
/// counted from the top.
pub fn frag_coord(x: u32, y: u32, res: Resolution) -> (f64, f64) {
    (x as f64 + 0.5, (res.height - 1 - y) as f64 + 0.5)
}

// Offsets from the pixel centre, one per sample, within (-0.5, 0.5).
fn subpixel_offsets(sampling: Sampling, pixel: u64) -> Vec<(f64, f64)> {
    let n = sampling.antialias.max(1);
    let cell = 1. / n as f64;
    let mut rng = sampling.jitter.then(|| {
        StdRng::seed_from_u64(sampling.seed ^ pixel.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    });
    let mut offsets = Vec::with_capacity((n * n) as usize);
    for i in 0..n {
        for j in 0..n {
            let (fx, fy) = match rng.as_mut() {
                Some(rng) => (rng.gen::<f64>(), rng.gen::<f64>()),
                None => (0.5, 0.5),
            };
            offsets.push((
                (i as f64 + fx) * cell - 0.5,
                (j as f64 + fy) * cell - 0.5,
            ));
        }
    }
    offsets
}

/// Averaged color of one image pixel.
pub fn render_pixel(
    scene: &Scene,
    x: u32,
    y: u32,
    res: Resolution,
    t: f64,
    sampling: Sampling,
) -> Color {
    let (fx, fy) = frag_coord(x, y, res);
    let pixel = y as u64 * res.width as u64 + x as u64;
    let offsets = subpixel_offsets(sampling, pixel);
    let mut sum = Color::gray(0.);
    for (dx, dy) in offsets.iter() {
        let c = scene.render(to_uv((fx + dx, fy + dy), res), t);
        sum.r += c.r;
        sum.g += c.g;
        sum.b += c.b;
    }
    let k = 1. / offsets.len() as f64;
    Color {
        r: sum.r * k,
        g: sum.g * k,
        b: sum.b * k,
    }
}

/// Evaluates every pixel in parallel at time `t` (milliseconds).
pub fn render_frame(scene: &Scene, res: Resolution, t: f64, sampling: Sampling) -> Frame {
    let start = Instant::now();
    let w = res.width;
    let pixel_vec: Vec<Color> = (0..(w as u64 * res.height as u64))
        .into_par_iter()
        .map(move |i| ((i % w as u64) as u32, (i / w as u64) as u32))
        .map(|(x, y)| render_pixel(scene, x, y, res, t, sampling))
        .collect();

    let mut img: Frame = ImageBuffer::new(res.width, res.height);
    for (x, y, p) in img.enumerate_pixels_mut() {
        *p = pixel_vec[(x + y * w) as usize].to_rgba8();
    }
    log::debug!(
        "rendered {}x{} frame at t={:.1}ms in {:.3}s",
        res.width,
        res.height,
        t,
        start.elapsed().as_secs_f32()
    );
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: Resolution = Resolution {
        width: 33,
        height: 21,
    };

    #[test]
    fn frame_time_is_sixtieths_of_a_second() {
        assert_eq!(frame_time(0, 60.), 0.);
        assert_eq!(frame_time(60, 60.), 1000.);
        assert!((frame_time(1, 60.) - 1000. / 60.).abs() < 1e-12);
    }

    #[test]
    fn centre_pixel_maps_to_origin() {
        let frag = frag_coord(16, 10, SMALL);
        assert_eq!(to_uv(frag, SMALL), uv(0., 0.));
    }

    #[test]
    fn top_rows_look_up() {
        let top = to_uv(frag_coord(16, 0, SMALL), SMALL);
        let bottom = to_uv(frag_coord(16, 20, SMALL), SMALL);
        assert!(top.y > 0.);
        assert!(bottom.y < 0.);
        assert!((top.y + bottom.y).abs() < 1e-12);
    }

    #[test]
    fn uv_is_scaled_by_height() {
        let right = to_uv((33., 10.5), SMALL);
        assert!((right.x - 16.5 / 21.).abs() < 1e-12);
    }

    #[test]
    fn single_sample_is_pixel_centre() {
        assert_eq!(subpixel_offsets(Sampling::default(), 5), vec![(0., 0.)]);
    }

    #[test]
    fn grid_samples_are_centred() {
        let offsets = subpixel_offsets(
            Sampling {
                antialias: 2,
                ..Sampling::default()
            },
            0,
        );
        assert_eq!(offsets, vec![(-0.25, -0.25), (-0.25, 0.25), (0.25, -0.25), (0.25, 0.25)]);
    }

    #[test]
    fn jittered_samples_stay_in_cells_and_repeat() {
        let sampling = Sampling {
            antialias: 3,
            jitter: true,
            seed: 42,
        };
        let a = subpixel_offsets(sampling, 17);
        let b = subpixel_offsets(sampling, 17);
        assert_eq!(a, b);
        assert_ne!(a, subpixel_offsets(sampling, 18));
        for (dx, dy) in a {
            assert!((-0.5..0.5).contains(&dx));
            assert!((-0.5..0.5).contains(&dy));
        }
    }

    #[test]
    fn frame_has_requested_size_and_opaque_alpha() {
        let img = render_frame(&Scene::default(), SMALL, 0., Sampling::default());
        assert_eq!(img.dimensions(), (33, 21));
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn frame_pixels_match_single_pixel_render() {
        let scene = Scene::default();
        let img = render_frame(&scene, SMALL, 500., Sampling::default());
        for (x, y) in [(0, 0), (16, 10), (32, 20), (5, 17)] {
            let expected = render_pixel(&scene, x, y, SMALL, 500., Sampling::default()).to_rgba8();
            assert_eq!(*img.get_pixel(x, y), expected);
        }
    }
}
