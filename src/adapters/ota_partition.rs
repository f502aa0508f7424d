//! Inactive OTA slot.
//!
//! Implements [`PartitionWriter`].
//!
//! - **`target_os = "espidf"`**: `esp_ota::OtaUpdate` (esp_ota_begin / write / end).
//! - **all other targets**: an in-memory slot with fault injection.

use log::{info, warn};

use crate::ota::OtaError;
use crate::ota::stream::PartitionWriter;

#[cfg(target_os = "espidf")]
use esp_ota::OtaUpdate;

/// Simulation slot lifecycle.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Closed,
    Open,
    Bootable,
    Aborted,
}

pub struct OtaPartition {
    #[cfg(target_os = "espidf")]
    update: Option<OtaUpdate>,

    #[cfg(not(target_os = "espidf"))]
    state: SlotState,
    #[cfg(not(target_os = "espidf"))]
    image: Vec<u8>,
    #[cfg(not(target_os = "espidf"))]
    begin_fault: Option<OtaError>,
    #[cfg(not(target_os = "espidf"))]
    finalize_fault: Option<OtaError>,
}

// SAFETY: the OTA handle and partition pointer are used only by the update
// task that owns this writer; esp_ota_* calls are not tied to a task.
#[cfg(target_os = "espidf")]
unsafe impl Send for OtaPartition {}

impl OtaPartition {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self { update: None }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: SlotState::Closed,
            image: Vec::new(),
            begin_fault: None,
            finalize_fault: None,
        }
    }

    /// Simulation: no inactive slot can be opened.
    #[cfg(not(target_os = "espidf"))]
    pub fn without_free_slot(mut self) -> Self {
        self.begin_fault = Some(OtaError::BeginFailed);
        self
    }

    /// Simulation: `finalize` fails with `e` (e.g. image validation).
    #[cfg(not(target_os = "espidf"))]
    pub fn failing_finalize(mut self, e: OtaError) -> Self {
        self.finalize_fault = Some(e);
        self
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

impl Default for OtaPartition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl PartitionWriter for OtaPartition {
    fn begin(&mut self) -> Result<(), OtaError> {
        let update = OtaUpdate::begin().map_err(|e| {
            warn!("OTA: begin failed: {:?}", e);
            OtaError::BeginFailed
        })?;
        info!("OTA: inactive partition opened");
        self.update = Some(update);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), OtaError> {
        let update = self.update.as_mut().ok_or(OtaError::WriteFailed)?;
        update.write(data).map_err(|e| {
            warn!("OTA: write failed: {:?}", e);
            OtaError::WriteFailed
        })
    }

    fn finalize(&mut self) -> Result<(), OtaError> {
        let update = self.update.take().ok_or(OtaError::VerifyFailed)?;
        let mut completed = update.finalize().map_err(|e| {
            warn!("OTA: image verification failed: {:?}", e);
            OtaError::VerifyFailed
        })?;
        completed.set_as_boot_partition().map_err(|e| {
            warn!("OTA: set boot partition failed: {:?}", e);
            OtaError::BootSetFailed
        })?;
        info!("OTA: new image set as boot partition");
        Ok(())
    }

    fn abort(&mut self) {
        // Dropping the handle aborts the esp-ota session.
        if self.update.take().is_some() {
            warn!("OTA: partition write aborted");
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl PartitionWriter for OtaPartition {
    fn begin(&mut self) -> Result<(), OtaError> {
        if let Some(e) = self.begin_fault {
            warn!("OTA(sim): begin failed");
            return Err(e);
        }
        self.image.clear();
        self.state = SlotState::Open;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), OtaError> {
        if self.state != SlotState::Open {
            return Err(OtaError::WriteFailed);
        }
        self.image.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), OtaError> {
        if self.state != SlotState::Open {
            return Err(OtaError::VerifyFailed);
        }
        if let Some(e) = self.finalize_fault {
            self.state = SlotState::Aborted;
            return Err(e);
        }
        self.state = SlotState::Bootable;
        info!("OTA(sim): {} bytes marked bootable", self.image.len());
        Ok(())
    }

    fn abort(&mut self) {
        if self.state == SlotState::Open {
            self.state = SlotState::Aborted;
        }
    }
}
