//! Purpose: Build and fire the single management POST the probe exists for.
//! Exports: `ProbeTarget`, `Probe`, `ProbeReply`, endpoint defaults.
//! Role: Thin blocking HTTP client; one request, one captured reply, no retries.
//! Invariants: Any HTTP status is a successful probe; only failing to obtain a
//! Invariants: response at all (DNS, connect, timeout, broken read) is an error.
//! Invariants: The reply body is captured as text even when it is not valid UTF-8.

use serde::Serialize;
use std::io::Read;
use std::time::Duration;
use url::Url;

use crate::error::{Error, ErrorKind};

pub const DEFAULT_ENDPOINT: &str = "http://template.vitrine/management/changeFavicon";
pub const DEFAULT_IMAGE_NAME: &str = "test.png";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type ProbeResult<T> = Result<T, Error>;

#[derive(Serialize)]
struct FaviconChange<'a> {
    #[serde(rename = "imageName")]
    image_name: &'a str,
}

/// A validated management endpoint URL.
#[derive(Clone, Debug)]
pub struct ProbeTarget {
    url: Url,
}

impl ProbeTarget {
    pub fn parse(raw: &str) -> ProbeResult<Self> {
        let url = Url::parse(raw).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid endpoint url")
                .with_url(raw)
                .with_source(err)
        })?;
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("endpoint url must use http or https scheme")
                .with_url(raw)
                .with_hint("Write the endpoint as http://host/path or https://host/path."));
        }
        if !url.has_host() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("endpoint url is missing a host")
                .with_url(raw));
        }
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// What came back over the wire, before any JSON interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct Probe {
    agent: ureq::Agent,
    target: ProbeTarget,
}

impl Probe {
    pub fn new(target: ProbeTarget, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, target }
    }

    /// POST the changeFavicon command and capture whatever the server answers.
    ///
    /// Non-2xx statuses are part of the diagnosis, so they fold back into a
    /// normal `ProbeReply` instead of erroring.
    pub fn change_favicon(&self, image_name: &str) -> ProbeResult<ProbeReply> {
        let payload =
            serde_json::to_string(&FaviconChange { image_name }).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode request json")
                    .with_source(err)
            })?;
        tracing::debug!(
            url = self.target.as_str(),
            payload_bytes = payload.len(),
            "sending management probe"
        );

        let response = self
            .agent
            .request("POST", self.target.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&payload);

        match response {
            Ok(resp) => self.capture_reply(resp),
            Err(ureq::Error::Status(_, resp)) => self.capture_reply(resp),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_url(self.target.as_str())
                .with_source(err)),
        }
    }

    fn capture_reply(&self, response: ureq::Response) -> ProbeResult<ProbeReply> {
        let status = response.status();
        let content_type = response.header("Content-Type").map(str::to_string);
        let mut raw = Vec::new();
        response.into_reader().read_to_end(&mut raw).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_url(self.target.as_str())
                .with_source(err)
        })?;
        let body = String::from_utf8_lossy(&raw).into_owned();
        tracing::debug!(status, body_bytes = body.len(), "captured reply");
        Ok(ProbeReply {
            status,
            content_type,
            body,
        })
    }
}
