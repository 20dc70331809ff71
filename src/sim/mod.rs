pub mod event;
pub mod level;
pub mod spawn;
pub mod step;
pub mod world;
