//! Fuzz target: `stream_image`
//!
//! Drives the streaming loop with an adversarial source: arbitrary
//! declared lengths, short reads, mid-body errors and tiny image caps.
//! Verifies:
//! - No panics under arbitrary inputs
//! - A success never exceeds the cap and matches the written bytes
//! - Any failure after `begin` aborts the slot; nothing is ever finalized
//!   on an error path
//!
//! cargo fuzz run fuzz_image_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use ota_basic::config::OtaRequest;
use ota_basic::ota::OtaError;
use ota_basic::ota::stream::{ImageSource, PartitionWriter, stream_image};

struct FuzzSource<'a> {
    declared: Option<u32>,
    steps: &'a [u8],
    body: &'a [u8],
}

impl ImageSource for FuzzSource<'_> {
    fn open(&mut self, _request: &OtaRequest) -> Result<Option<u32>, OtaError> {
        Ok(self.declared)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, OtaError> {
        let Some((&step, rest)) = self.steps.split_first() else {
            return Ok(0);
        };
        self.steps = rest;
        if step == 0xFF {
            return Err(OtaError::Transport);
        }
        let n = (step as usize).min(buf.len()).min(self.body.len());
        buf[..n].copy_from_slice(&self.body[..n]);
        self.body = &self.body[n..];
        Ok(n)
    }
}

#[derive(Default)]
struct Slot {
    open: bool,
    finalized: bool,
    aborted: bool,
    written: Vec<u8>,
}

impl PartitionWriter for Slot {
    fn begin(&mut self) -> Result<(), OtaError> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), OtaError> {
        assert!(self.open, "write before begin");
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), OtaError> {
        self.finalized = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let declared = (data[0] & 1 == 1).then(|| u16::from_le_bytes([data[1], data[2]]) as u32);
    let cap = u16::from_le_bytes([data[3], data[4]]) as u32;
    let split = (data[5] as usize).min(data.len() - 6);
    let (steps, body) = data[6..].split_at(split);

    let Ok(request) = OtaRequest::new("http://fuzz.local/firmware.bin") else {
        return;
    };
    let request = request.with_max_image_size(cap);

    let mut source = FuzzSource {
        declared,
        steps,
        body,
    };
    let mut slot = Slot::default();
    let mut buf = [0u8; 64];

    match stream_image(&mut source, &mut slot, &request, &mut buf) {
        Ok(report) => {
            assert!(slot.finalized && !slot.aborted);
            assert!(report.bytes_written <= cap);
            assert_eq!(report.bytes_written as usize, slot.written.len());
            assert_eq!(report.sha256, hmac_sha256::Hash::hash(&slot.written));
        }
        Err(_) => {
            assert!(!slot.finalized);
            assert_eq!(slot.open, slot.aborted, "opened slot must be aborted");
        }
    }
});
