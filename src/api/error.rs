use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::{Request, Response};
use serde_json::json;

use crate::pipeline::ServeError;

#[derive(Debug)]
pub enum ApiError {
    Serve(ServeError),
}

impl From<ServeError> for ApiError {
    fn from(error: ServeError) -> Self {
        ApiError::Serve(error)
    }
}

fn json_body(status: Status, error: &str, message: &str) -> rocket::response::Result<'static> {
    let body = json!({
        "error": error,
        "message": message
    })
    .to_string();

    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        match self {
            // Details were logged by the pipeline and stay server-side
            ApiError::Serve(_) => json_body(
                Status::InternalServerError,
                "Internal error",
                "The image could not be served",
            ),
        }
    }
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> (Status, (ContentType, String)) {
    let body = json!({
        "error": "Not found",
        "message": format!("No image at {}", req.uri().path())
    })
    .to_string();
    (Status::NotFound, (ContentType::JSON, body))
}

#[catch(500)]
pub fn internal_error() -> (Status, (ContentType, String)) {
    let body = json!({
        "error": "Internal error",
        "message": "The image could not be served"
    })
    .to_string();
    (Status::InternalServerError, (ContentType::JSON, body))
}
