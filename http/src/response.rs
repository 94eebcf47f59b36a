use coffer_types::{HttpStatus, ResourceError};
use reqwest::header::HeaderMap;

/// A successful (2xx) response with a decoded body.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status: HttpStatus,
    pub headers: HeaderMap,
    pub body: T,
}

impl<T> Response<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }

    pub fn try_map<U>(
        self,
        f: impl FnOnce(T) -> Result<U, ResourceError>,
    ) -> Result<Response<U>, ResourceError> {
        Ok(Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body)?,
        })
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn map_keeps_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-portal", HeaderValue::from_static("open"));
        let response = Response {
            status: HttpStatus::OK,
            headers,
            body: b"42".to_vec(),
        };

        let mapped = response
            .try_map(|body| {
                String::from_utf8(body).map_err(ResourceError::StringDecodingFailed)
            })
            .expect("utf-8");

        assert_eq!(mapped.status, HttpStatus::OK);
        assert_eq!(mapped.header("x-portal"), Some("open"));
        assert_eq!(mapped.map(|s| s.len()).into_body(), 2);
    }
}
