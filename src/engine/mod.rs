// Engine module - scene, simulation and input pieces used by the render loop

pub mod camera;
pub mod components;
pub mod debug_overlay;
pub mod flight;
pub mod input;
pub mod mesh;
pub mod scene;
pub mod systems;
pub mod texture;
pub mod tick;

// Re-export commonly used items
pub use components::*;
