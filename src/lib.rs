// Library exports for lifegrid

pub mod codec;
pub mod config;
pub mod country;
pub mod device;
pub mod error;
pub mod grid;
pub mod settings;
pub mod theme;

// Rendering pipeline
pub mod ir;
pub mod layout;
pub mod render;
pub mod runtime;

pub mod server;

pub use error::{Error, Result};
pub use runtime::Engine;
pub use settings::Settings;
