use std::io::Cursor;
use std::sync::Arc;

use rocket::http::{ContentType, Header, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::{self, Responder, Response};
use rocket::{Request, Shutdown};

use crate::api::ApiError;
use crate::cancel::CancelToken;
use crate::pipeline::{PipelineResponse, RequestConditions, ResponseHeaders, ServingPipeline};
use crate::registry::HandlerRegistry;

/// A request whose path belongs to one of the registered pipelines.
pub struct ImageRequest {
    pipeline: Arc<ServingPipeline>,
    path: String,
    conditions: RequestConditions,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ImageRequest {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let registry = match req.rocket().state::<HandlerRegistry>() {
            Some(registry) => registry,
            None => {
                log::error!("Handler registry is not managed by Rocket");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        // The parser decodes segments itself, so hand it the raw path
        let path = req.uri().path().as_str();
        match registry.resolve(path) {
            Some(pipeline) => {
                let headers = req.headers();
                Outcome::Success(ImageRequest {
                    pipeline,
                    path: path.to_string(),
                    conditions: RequestConditions::from_headers(
                        headers.get_one("If-None-Match"),
                        headers.get_one("If-Modified-Since"),
                        headers.get_one("Accept"),
                    ),
                })
            }
            None => Outcome::Forward(Status::NotFound),
        }
    }
}

pub enum ImageReply {
    Image {
        headers: ResponseHeaders,
        content_type: &'static str,
        body: Arc<[u8]>,
    },
    NotModified(ResponseHeaders),
}

fn apply_headers(response: &mut response::Builder<'_>, headers: ResponseHeaders) {
    response.header(Header::new("Cache-Control", headers.cache_control));
    if let Some(etag) = headers.etag {
        response.header(Header::new("ETag", etag));
    }
    if let Some(last_modified) = headers.last_modified {
        response.header(Header::new("Last-Modified", last_modified));
    }
    if headers.vary_accept {
        response.header(Header::new("Vary", "Accept"));
    }
}

impl<'r> Responder<'r, 'static> for ImageReply {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Response::build();
        match self {
            ImageReply::NotModified(headers) => {
                response.status(Status::NotModified);
                apply_headers(&mut response, headers);
            }
            ImageReply::Image {
                headers,
                content_type,
                body,
            } => {
                let content_type =
                    ContentType::parse_flexible(content_type).unwrap_or(ContentType::Binary);
                response.header(content_type);
                apply_headers(&mut response, headers);
                response.sized_body(body.len(), Cursor::new(body));
            }
        }
        response.ok()
    }
}

/// Serves every path that a registered prefix claims. Anything else falls
/// through to the 404 catcher.
#[get("/<_..>", rank = 20)]
pub async fn serve_image(
    request: ImageRequest,
    shutdown: Shutdown,
) -> Result<Option<ImageReply>, ApiError> {
    let ImageRequest {
        pipeline,
        path,
        conditions,
    } = request;

    // Cancels the resize if Rocket drops this future
    let cancel = CancelToken::new();
    let guard = cancel.drop_guard();

    // Shutdown cancels like any other abandoned request and yields a 404
    let result = tokio::select! {
        biased;
        _ = shutdown => {
            log::debug!("Shutting down, dropping {}", path);
            cancel.cancel();
            return Ok(None);
        }
        result = pipeline.handle(&path, &conditions, &cancel) => result,
    };
    guard.disarm();

    match result? {
        PipelineResponse::Ok {
            headers,
            content_type,
            body,
        } => Ok(Some(ImageReply::Image {
            headers,
            content_type,
            body,
        })),
        PipelineResponse::NotModified { headers } => Ok(Some(ImageReply::NotModified(headers))),
        PipelineResponse::Skip | PipelineResponse::NotFound => Ok(None),
    }
}
