//! Rocket adapter over the serving pipelines.

pub mod error;
pub mod image;

use rocket::figment::Figment;
use rocket::{Build, Rocket};

pub use error::ApiError;

use crate::registry::HandlerRegistry;

/// Mounts the image route on a Rocket instance configured by `figment`.
pub fn server(figment: Figment, registry: HandlerRegistry) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(registry)
        .mount("/", routes![image::serve_image])
        .register("/", catchers![error::not_found, error::internal_error])
}
