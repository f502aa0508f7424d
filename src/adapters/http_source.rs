//! HTTP(S) image source.
//!
//! Implements [`ImageSource`] for the OTA streaming loop.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection`, one GET per attempt.
//!   The server is authenticated according to the request's
//!   [`TrustAnchor`](crate::config::TrustAnchor).
//! - **all other targets**: serves an in-memory body, with fault injection.

use log::{info, warn};

use crate::config::OtaRequest;
use crate::ota::OtaError;
use crate::ota::stream::ImageSource;

#[cfg(target_os = "espidf")]
use crate::config::TrustAnchor;
#[cfg(target_os = "espidf")]
use crate::ota::stream::CHUNK_SIZE;
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    http::Method,
    http::client::{Configuration, EspHttpConnection},
    tls::X509,
};

pub struct HttpImageSource {
    #[cfg(target_os = "espidf")]
    conn: Option<EspHttpConnection>,

    #[cfg(not(target_os = "espidf"))]
    body: Vec<u8>,
    #[cfg(not(target_os = "espidf"))]
    pos: usize,
    #[cfg(not(target_os = "espidf"))]
    status: u16,
    #[cfg(not(target_os = "espidf"))]
    send_length: bool,
    #[cfg(not(target_os = "espidf"))]
    reachable: bool,
    /// Simulation: reads fail once this many body bytes have been served.
    #[cfg(not(target_os = "espidf"))]
    fail_after: Option<usize>,
    #[cfg(not(target_os = "espidf"))]
    requested: Option<String>,
}

// SAFETY: the connection handle is only touched by the single update task
// that owns this source; ESP-IDF's HTTP client has no thread affinity.
#[cfg(target_os = "espidf")]
unsafe impl Send for HttpImageSource {}

#[cfg(target_os = "espidf")]
impl HttpImageSource {
    pub fn new() -> Self {
        Self { conn: None }
    }

    fn configuration(request: &OtaRequest) -> Configuration {
        let mut cfg = Configuration {
            buffer_size: Some(CHUNK_SIZE),
            ..Default::default()
        };
        match request.trust_anchor {
            TrustAnchor::None => {}
            TrustAnchor::Pem(pem) => cfg.server_certificate = Some(X509::pem(pem)),
            TrustAnchor::CertBundle => {
                cfg.crt_bundle_attach = Some(esp_idf_svc::sys::esp_crt_bundle_attach);
            }
        }
        cfg
    }
}

#[cfg(target_os = "espidf")]
impl Default for HttpImageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl ImageSource for HttpImageSource {
    fn open(&mut self, request: &OtaRequest) -> Result<Option<u32>, OtaError> {
        let mut conn = EspHttpConnection::new(&Self::configuration(request)).map_err(|e| {
            warn!("HTTP: client init failed: {}", e);
            OtaError::Transport
        })?;

        conn.initiate_request(Method::Get, request.url(), &[])
            .map_err(|e| {
                warn!("HTTP: request failed: {}", e);
                OtaError::Transport
            })?;
        conn.initiate_response().map_err(|e| {
            warn!("HTTP: no response: {}", e);
            OtaError::Transport
        })?;

        let status = conn.status();
        if status != 200 {
            warn!("HTTP: status {}", status);
            return Err(OtaError::HttpStatus(status));
        }

        let declared = conn.header("Content-Length").and_then(|v| v.trim().parse().ok());
        info!("HTTP: {} OK", status);
        self.conn = Some(conn);
        Ok(declared)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, OtaError> {
        let conn = self.conn.as_mut().ok_or(OtaError::Transport)?;
        conn.read(buf).map_err(|e| {
            warn!("HTTP: body read failed: {}", e);
            OtaError::Transport
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpImageSource {
    /// Serve `body` with status 200 and a correct `Content-Length`.
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body,
            pos: 0,
            status: 200,
            send_length: true,
            reachable: true,
            fail_after: None,
            requested: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn without_content_length(mut self) -> Self {
        self.send_length = false;
        self
    }

    /// Every request fails at the transport layer.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    /// URL of the last GET, if any.
    pub fn requested_url(&self) -> Option<&str> {
        self.requested.as_deref()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ImageSource for HttpImageSource {
    fn open(&mut self, request: &OtaRequest) -> Result<Option<u32>, OtaError> {
        self.requested = Some(request.url().to_owned());
        self.pos = 0;
        if !self.reachable {
            warn!("HTTP(sim): host unreachable");
            return Err(OtaError::Transport);
        }
        if self.status != 200 {
            warn!("HTTP(sim): status {}", self.status);
            return Err(OtaError::HttpStatus(self.status));
        }
        info!("HTTP(sim): {} OK, {} bytes", self.status, self.body.len());
        Ok(self.send_length.then_some(self.body.len() as u32))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, OtaError> {
        if self.fail_after.is_some_and(|limit| self.pos >= limit) {
            return Err(OtaError::Transport);
        }
        let end = match self.fail_after {
            Some(limit) => self.body.len().min(limit),
            None => self.body.len(),
        };
        let n = buf.len().min(end - self.pos.min(end));
        buf[..n].copy_from_slice(&self.body[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
