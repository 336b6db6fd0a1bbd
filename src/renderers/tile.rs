// Copyright @yucwang 2026

use crate::core::integrator::make_integrator;
use crate::core::rng::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::is_finite;
use crate::sensors::perspective::PerspectiveCamera;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

const TILE_SIZE: usize = 16;

pub struct RenderOutput {
    // width * height * 3, linear RGB, row-major, top-left origin.
    pub pixels: Vec<Float>,
    pub width: usize,
    pub height: usize,
    // Non-finite integrator estimates dropped during accumulation.
    pub dropped_samples: u64,
    pub cancelled: bool,
}

// Tile-parallel renderer: a shared atomic counter hands 16x16 tiles
// to scoped worker threads, each tile is rendered into a local buffer
// and merged into the image under a mutex.
pub struct TileRenderer {
    workers: usize,
}

impl TileRenderer {
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(|| {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        });
        Self { workers: workers.max(1) }
    }

    pub fn render(&self, scene: &Scene) -> RenderOutput {
        self.render_with_cancel(scene, &AtomicBool::new(false))
    }

    pub fn render_with_cancel(&self, scene: &Scene, cancel: &AtomicBool) -> RenderOutput {
        let width = scene.camera.width;
        let height = scene.camera.height;
        let spp = scene.camera.spp;
        let inv_spp = 1.0 / spp as Float;

        let camera = PerspectiveCamera::new(&scene.camera);
        let integrator = make_integrator(&scene.integrator);

        let tiles_x = (width + TILE_SIZE - 1) / TILE_SIZE;
        let tiles_y = (height + TILE_SIZE - 1) / TILE_SIZE;
        let total_tiles = tiles_x * tiles_y;
        log::debug!("rendering {}x{} with {} workers, {} tiles",
                    width, height, self.workers, total_tiles);

        let progress = ProgressBar::new(total_tiles as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let output = Arc::new(Mutex::new(vec![0.0f32; width * height * 3]));
        let next_tile = Arc::new(AtomicUsize::new(0));
        let dropped = AtomicU64::new(0);
        let integrator_ref = integrator.as_ref();
        let camera_ref = &camera;
        let dropped_ref = &dropped;

        thread::scope(|scope| {
            for _ in 0..self.workers {
                let output = Arc::clone(&output);
                let next_tile = Arc::clone(&next_tile);
                let progress = progress.clone();
                scope.spawn(move || {
                    let mut tile_dropped = 0u64;
                    loop {
                        // Workers observe the flag before taking more
                        // work; in-flight tiles run to completion.
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let tile_index = next_tile.fetch_add(1, Ordering::Relaxed);
                        if tile_index >= total_tiles {
                            break;
                        }

                        let x0 = (tile_index % tiles_x) * TILE_SIZE;
                        let y0 = (tile_index / tiles_x) * TILE_SIZE;
                        let x1 = (x0 + TILE_SIZE).min(width);
                        let y1 = (y0 + TILE_SIZE).min(height);

                        let mut tile = vec![Vector3f::zeros(); (x1 - x0) * (y1 - y0)];
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let pixel_index = (y * width + x) as u64;
                                let mut sampler = Sampler::new(pixel_index, 0);
                                let mut color = Vector3f::zeros();
                                for _ in 0..spp {
                                    let jitter = Vector2f::new(
                                        (x as Float + sampler.next_f32()) / width as Float,
                                        (y as Float + sampler.next_f32()) / height as Float,
                                    );
                                    let ray = camera_ref.sample_ray(&jitter);
                                    let estimate = integrator_ref.li(scene, ray, &mut sampler);
                                    if is_finite(&estimate) {
                                        color += estimate;
                                    } else {
                                        tile_dropped += 1;
                                    }
                                }
                                tile[(x - x0) + (x1 - x0) * (y - y0)] = color * inv_spp;
                            }
                        }

                        let mut pixels = match output.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let src = tile[(x - x0) + (x1 - x0) * (y - y0)];
                                let dst = (y * width + x) * 3;
                                pixels[dst] = src.x;
                                pixels[dst + 1] = src.y;
                                pixels[dst + 2] = src.z;
                            }
                        }
                        progress.inc(1);
                    }
                    dropped_ref.fetch_add(tile_dropped, Ordering::Relaxed);
                });
            }
        });
        progress.finish_and_clear();

        let cancelled = cancel.load(Ordering::Relaxed);
        let dropped_samples = dropped.into_inner();
        if dropped_samples > 0 {
            log::warn!("dropped {} non-finite samples", dropped_samples);
        }

        let pixels = match Arc::try_unwrap(output) {
            Ok(mutex) => match mutex.into_inner() {
                Ok(pixels) => pixels,
                Err(poisoned) => poisoned.into_inner(),
            },
            Err(arc) => arc.lock()
                .map(|pixels| pixels.clone())
                .unwrap_or_else(|e| e.into_inner().clone()),
        };

        RenderOutput {
            pixels,
            width,
            height,
            dropped_samples,
            cancelled,
        }
    }
}
