use crate::files::document_root::{DocumentRoot, Resolution};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};

/// Chooses the response for a request.
///
/// GET and HEAD share one resolution: a path escaping the root or naming a
/// directory is 403, a missing path is 404. TRACE echoes the request head.
/// Every other method is 501. Nothing is read from disk here beyond
/// metadata; file contents are streamed by the writer.
pub fn route(request: &Request, root: &DocumentRoot) -> Response {
    match request.method {
        Method::GET | Method::HEAD => serve_path(request, root),
        Method::TRACE => Response::echo(request.raw.clone()),
        Method::Other(_) => Response::empty(StatusCode::NotImplemented),
    }
}

fn serve_path(request: &Request, root: &DocumentRoot) -> Response {
    let path = match root.resolve(&request.path) {
        Resolution::Outside => {
            tracing::debug!(path = %request.path, "Path escapes document root");
            return Response::empty(StatusCode::Forbidden);
        }
        Resolution::Directory(_) => return Response::empty(StatusCode::Forbidden),
        Resolution::Missing => return Response::empty(StatusCode::NotFound),
        Resolution::File(path) => path,
    };

    let built = if request.method == Method::HEAD {
        Response::head(StatusCode::Ok, path.clone())
    } else {
        Response::file(StatusCode::Ok, path.clone())
    };

    // Sockets, FIFOs and files removed since resolution end up here
    built.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Cannot serve path");
        Response::empty(StatusCode::NotFound)
    })
}
