//! Resource loading: `about:` built-ins plus HTTP(S) fetching with
//! decompression and charset decoding.

mod decode;
mod http;
mod transport;

use flint_core::EngineError;
use flint_core::EngineResult;
use log::debug;
use url::Url;

const MAX_REDIRECTS: usize = 10;

const ABOUT_BLANK: &str = "<html><body></body></html>";
const ABOUT_HOME: &str = "<html>\
<head><title>Flint</title></head>\
<body><h1>Flint</h1>\
<p>A tiny retained-mode browser engine.</p>\
<p><a href=\"about:blank\">about:blank</a></p>\
</body></html>";

/// A fetched resource.
///
/// Failures never surface as a `Resource`; the loader returns a distinguished
/// error so the caller can render an error page instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub body: String,
    pub content_type: String,
    pub status_code: u16,
    pub url: Url,
}

/// Fetches resources for the session layer.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    max_redirects: usize,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self {
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl ResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `input`, following redirects for HTTP(S) schemes.
    pub fn load(&self, input: &str) -> EngineResult<Resource> {
        let url = Url::parse(input).map_err(|error| {
            EngineError::new("net.url_invalid", format!("`{input}` is not a URL: {error}"))
        })?;

        match url.scheme() {
            "about" => about_resource(url),
            "http" | "https" => self.load_http(url),
            other => Err(EngineError::new(
                "net.scheme_unsupported",
                format!("scheme `{other}` is not supported"),
            )),
        }
    }

    fn load_http(&self, mut url: Url) -> EngineResult<Resource> {
        for _ in 0..=self.max_redirects {
            debug!("GET {url}");
            let response = http::fetch_once(&url)?;

            if response.is_redirect() {
                if let Some(location) = response.header("location") {
                    url = url.join(location).map_err(|error| {
                        EngineError::new(
                            "net.redirect_invalid",
                            format!("bad redirect target `{location}`: {error}"),
                        )
                    })?;
                    continue;
                }
            }

            let content_type = response
                .header("content-type")
                .unwrap_or("text/html")
                .to_owned();
            let body = decode::decode_body(&response)?;
            debug!("{} {} ({} bytes)", response.status, url, body.len());

            return Ok(Resource {
                body,
                content_type,
                status_code: response.status,
                url,
            });
        }

        Err(EngineError::new(
            "net.redirect_loop",
            format!("gave up after {} redirects", self.max_redirects),
        ))
    }
}

fn about_resource(url: Url) -> EngineResult<Resource> {
    let body = match url.path() {
        "blank" => ABOUT_BLANK,
        "home" | "" => ABOUT_HOME,
        other => {
            return Err(EngineError::new(
                "net.about_unknown",
                format!("no built-in page `about:{other}`"),
            ));
        }
    };

    Ok(Resource {
        body: body.to_owned(),
        content_type: "text/html".to_owned(),
        status_code: 200,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::ResourceLoader;

    #[test]
    fn about_home_is_built_in() {
        let loader = ResourceLoader::new();
        let resource = match loader.load("about:home") {
            Ok(resource) => resource,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(resource.status_code, 200);
        assert_eq!(resource.content_type, "text/html");
        assert!(resource.body.contains("<h1>"));
    }

    #[test]
    fn about_blank_is_empty_markup() {
        let loader = ResourceLoader::new();
        let resource = match loader.load("about:blank") {
            Ok(resource) => resource,
            Err(error) => panic!("{error}"),
        };
        assert!(resource.body.contains("<body>"));
    }

    #[test]
    fn unknown_about_page_is_an_error() {
        let loader = ResourceLoader::new();
        let error = match loader.load("about:chipmunks") {
            Ok(_) => panic!("unknown about page must fail"),
            Err(error) => error,
        };
        assert_eq!(error.code, "net.about_unknown");
    }

    #[test]
    fn invalid_urls_are_distinguished_errors() {
        let loader = ResourceLoader::new();
        let error = match loader.load("not a url at all") {
            Ok(_) => panic!("invalid url must fail"),
            Err(error) => error,
        };
        assert_eq!(error.code, "net.url_invalid");
    }

    #[test]
    fn unsupported_schemes_are_rejected() {
        let loader = ResourceLoader::new();
        let error = match loader.load("ftp://example.com/file.txt") {
            Ok(_) => panic!("ftp must be unsupported"),
            Err(error) => error,
        };
        assert_eq!(error.code, "net.scheme_unsupported");
    }
}
