//! Read-only admin endpoint exposing the route table

use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::tokio::TokioIo;
use route_core::RouteTable;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Accept admin connections until the task is dropped
pub async fn serve(listener: TcpListener, table: Arc<RouteTable>) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Error accepting admin connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let table = table.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let table = table.clone();
                async move { Ok::<_, Infallible>(handle_request(&req, &table)) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving admin connection from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Route an admin request:
/// - `GET /healthz`: liveness
/// - `GET /routes`: all route definitions
/// - `GET /routes/{namespace}/{name}`: one route definition
pub fn handle_request<B>(req: &Request<B>, table: &RouteTable) -> Response<Full<Bytes>> {
    let method = req.method();
    let path = req.uri().path();
    debug!("{} {}", method, path);

    if method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n");
    }

    match path {
        "/healthz" => text(StatusCode::OK, "OK\n"),
        "/routes" => json(&table.list_routes()),
        _ => match path.strip_prefix("/routes/") {
            Some(id) => match table.get_route(id) {
                Ok(route) => json(route.as_ref()),
                Err(e) => text(StatusCode::NOT_FOUND, format!("{}\n", e)),
            },
            None => text(StatusCode::NOT_FOUND, "Not Found\n"),
        },
    }
}

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn json<T: Serialize + ?Sized>(body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            warn!("Failed to serialize admin response: {}", e);
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
        }
    }
}
