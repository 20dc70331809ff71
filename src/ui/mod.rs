pub mod art;
pub mod canvas;
pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
