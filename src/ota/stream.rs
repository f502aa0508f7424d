//! Stream an HTTP response body into the inactive OTA partition.
//!
//! The loop is transport- and flash-agnostic: an [`ImageSource`] yields
//! body bytes, a [`PartitionWriter`] receives them.  Any failure after
//! the partition was opened aborts it, so a half-written slot is never
//! marked bootable.

use log::{info, warn};

use super::{FlashReport, OtaError};
use crate::app::ports::FirmwareFetcher;
use crate::config::OtaRequest;

/// Size of one read/write chunk.
pub const CHUNK_SIZE: usize = 2048;

/// Body side of an HTTP GET.
pub trait ImageSource {
    /// Send the request and read response headers.
    ///
    /// Returns the declared `Content-Length`, if the server sent one.
    /// Non-2xx status codes are reported as [`OtaError::HttpStatus`].
    fn open(&mut self, request: &OtaRequest) -> Result<Option<u32>, OtaError>;

    /// Read up to `buf.len()` body bytes.  `Ok(0)` is end of body.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, OtaError>;
}

/// Inactive OTA slot.
pub trait PartitionWriter {
    /// Open the next update partition.
    fn begin(&mut self) -> Result<(), OtaError>;

    /// Append image bytes.
    fn write(&mut self, data: &[u8]) -> Result<(), OtaError>;

    /// Validate the written image and make it the next boot partition.
    fn finalize(&mut self) -> Result<(), OtaError>;

    /// Discard the partially written image.
    fn abort(&mut self);
}

/// Download `request` from `source` into `partition`, chunk by chunk.
pub fn stream_image(
    source: &mut impl ImageSource,
    partition: &mut impl PartitionWriter,
    request: &OtaRequest,
    buf: &mut [u8],
) -> Result<FlashReport, OtaError> {
    let declared = source.open(request)?;
    match declared {
        Some(0) => return Err(OtaError::EmptyImage),
        Some(len) if len > request.max_image_size => {
            warn!(
                "OTA: declared size {} exceeds cap {}",
                len, request.max_image_size
            );
            return Err(OtaError::ImageTooLarge);
        }
        Some(len) => info!("OTA: Content-Length {} bytes", len),
        None => info!("OTA: no Content-Length, streaming until EOF"),
    }

    partition.begin()?;

    match copy_body(source, partition, request, declared, buf) {
        Ok(report) => {
            partition.finalize()?;
            Ok(report)
        }
        Err(e) => {
            partition.abort();
            Err(e)
        }
    }
}

fn copy_body(
    source: &mut impl ImageSource,
    partition: &mut impl PartitionWriter,
    request: &OtaRequest,
    declared: Option<u32>,
    buf: &mut [u8],
) -> Result<FlashReport, OtaError> {
    let mut hasher = hmac_sha256::Hash::new();
    let mut total: u32 = 0;

    loop {
        let n = source.read(buf)?;
        if n == 0 {
            break;
        }
        let next = total
            .checked_add(n as u32)
            .filter(|&t| t <= request.max_image_size)
            .ok_or(OtaError::ImageTooLarge)?;
        let chunk = &buf[..n];
        partition.write(chunk)?;
        hasher.update(chunk);
        total = next;
    }

    if total == 0 {
        return Err(OtaError::EmptyImage);
    }
    if let Some(expected) = declared.filter(|&d| d != total) {
        return Err(OtaError::SizeMismatch {
            expected,
            actual: total,
        });
    }

    let sha256 = hasher.finalize();
    if request.expected_sha256.is_some_and(|want| want != sha256) {
        return Err(OtaError::DigestMismatch);
    }

    Ok(FlashReport {
        bytes_written: total,
        sha256,
    })
}

// ── Fetcher ───────────────────────────────────────────────────

/// [`FirmwareFetcher`] composed from a body source and a partition writer.
pub struct StreamingFetcher<S, P> {
    source: S,
    partition: P,
    buf: Vec<u8>,
}

impl<S, P> StreamingFetcher<S, P>
where
    S: ImageSource,
    P: PartitionWriter,
{
    pub fn new(source: S, partition: P) -> Self {
        Self {
            source,
            partition,
            // Heap, not the 8 KB task stack.
            buf: vec![0u8; CHUNK_SIZE],
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn partition(&self) -> &P {
        &self.partition
    }
}

impl<S, P> FirmwareFetcher for StreamingFetcher<S, P>
where
    S: ImageSource + Send,
    P: PartitionWriter + Send,
{
    fn fetch_and_flash(&mut self, request: &OtaRequest) -> Result<FlashReport, OtaError> {
        info!("OTA: GET {}", request.url());
        stream_image(&mut self.source, &mut self.partition, request, &mut self.buf)
    }
}
