pub mod resize;

pub use resize::{AllowedMapping, OutputFormat, ResizeMode, ResizeRequest};
