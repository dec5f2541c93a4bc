//! Full-viewport grid backdrop whose lines light up around a smoothed cursor.

pub mod backend;
pub mod color;
pub mod config;
pub mod cursor;
pub mod error;
pub mod grid;
pub mod input;
pub mod raster_backend;
pub mod renderer;
pub mod scene;
pub mod ticker;

pub use config::{AppConfig, GridConfig};
pub use error::{GridError, Result};
pub use scene::{Frame, Scene};
