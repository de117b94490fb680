use crate::bvh::Bvh;
use crate::integrator;
use crate::math::Color;
use crate::scene::Scene;
use image::{ImageBuffer, Rgb};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::Path;

const OUTPUT_GAMMA: f64 = 1.0 / 2.2;

/// Owns the scene and its BVH and drives the frame loop: each frame
/// parallelizes over image rows, accumulates one sample per pixel (the
/// average of the camera's four supersampled rays), and writes out the
/// accumulator divided by the frame count as an 8-bit PNG.
pub struct Renderer<'a> {
    scene: &'a Scene,
    bvh: Option<Bvh>,
    accumulator: Vec<Color>,
}

impl<'a> Renderer<'a> {
    /// Builds the BVH once from the scene's triangle list. A scene with no
    /// triangles renders every pixel from the background/skybox alone.
    pub fn new(scene: &'a Scene) -> Self {
        let bvh = if scene.triangles.is_empty() {
            None
        } else {
            Some(Bvh::build(&scene.triangles))
        };
        let accumulator = vec![Color::zero(); (scene.width * scene.height) as usize];
        Renderer {
            scene,
            bvh,
            accumulator,
        }
    }

    /// Renders `scene.render_num` frames into `out_dir`, writing
    /// `out_NNN.png` after each one.
    pub fn render(&mut self, out_dir: impl AsRef<Path>) -> std::io::Result<()> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let width = self.scene.width;
        let height = self.scene.height;
        let mut progress = FrameProgress::new(self.scene.render_num);

        for frame in 1..=self.scene.render_num {
            let scene: &Scene = self.scene;
            let bvh = self.bvh.as_ref();

            self.accumulator
                .par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(row, row_pixels)| {
                    let mut rng = SmallRng::from_entropy();
                    for (col, pixel) in row_pixels.iter_mut().enumerate() {
                        let rays = scene.camera.get_rays(col as u32, row as u32);
                        let sample = rays
                            .iter()
                            .fold(Color::zero(), |acc, &ray| {
                                acc + integrator::color(scene, bvh, 0, ray, &mut rng)
                            })
                            * 0.25;
                        *pixel += sample;
                    }
                });

            let path = out_dir.join(format!("out_{frame:03}.png"));
            write_png(&path, &self.accumulator, width, height, frame as f64)?;
            progress.tick(frame);
        }
        progress.finish();
        Ok(())
    }
}

/// Divides the accumulator by the frame count, gamma-encodes, clamps to
/// 8-bit, and hands the result to the `image` crate's PNG encoder.
fn write_png(
    path: &Path,
    accumulator: &[Color],
    width: u32,
    height: u32,
    frame_count: f64,
) -> std::io::Result<()> {
    let mut img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    for (i, pixel) in accumulator.iter().enumerate() {
        let averaged = *pixel / frame_count;
        let encoded = to_srgb8(averaged);
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        img.put_pixel(x, y, Rgb(encoded));
    }
    img.save(path)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
}

fn to_srgb8(c: Color) -> [u8; 3] {
    let encode = |channel: f64| -> u8 {
        (channel.max(0.0).powf(OUTPUT_GAMMA) * 255.0).round().clamp(0.0, 255.0) as u8
    };
    [encode(c.x), encode(c.y), encode(c.z)]
}

/// A text-only progress reporter, printed to stderr between frames.
struct FrameProgress {
    total: u32,
    start: std::time::Instant,
}

impl FrameProgress {
    fn new(total: u32) -> Self {
        Self {
            total,
            start: std::time::Instant::now(),
        }
    }

    fn tick(&self, frame: u32) {
        let elapsed = self.start.elapsed().as_secs_f64();
        eprintln!(
            "  frame {frame:>3}/{:<3}  {:.2}s elapsed",
            self.total, elapsed
        );
    }

    fn finish(&self) {
        eprintln!("  done in {:.2}s", self.start.elapsed().as_secs_f64());
    }
}
