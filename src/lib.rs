// Copyright @yucwang 2026

pub mod core;
pub mod emitters;
pub mod integrators;
pub mod materials;
pub mod math;
pub mod renderers;
pub mod sensors;
pub mod shapes;

pub use crate::core::config::SceneConfig;
pub use crate::core::error::Error;
pub use crate::core::scene::Scene;
pub use crate::renderers::tile::{RenderOutput, TileRenderer};

// Build the scene and render it with the configured integrator.
pub fn render(config: &SceneConfig) -> Result<RenderOutput, Error> {
    let scene = Scene::build(config)?;
    Ok(TileRenderer::new(None).render(&scene))
}
