// ABOUTME: In-memory mock of the transfer seam.
// ABOUTME: Records transfer calls so pipeline tests can assert on ordering.

use async_trait::async_trait;
use parking_lot::Mutex;

use caravel::transfer::{Transport, TransferError};
use caravel::types::{Arch, ImageRef};

#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn stage_files(&self) -> Result<(), TransferError> {
        self.calls.lock().push("stage_files".to_string());
        Ok(())
    }

    async fn stream_images(
        &self,
        images: &[ImageRef],
        _host_arch: &Arch,
    ) -> Result<(), TransferError> {
        self.calls
            .lock()
            .push(format!("stream_images {}", images.len()));
        Ok(())
    }

    async fn verify_images(&self, images: &[ImageRef]) -> Result<(), TransferError> {
        self.calls
            .lock()
            .push(format!("verify_images {}", images.len()));
        Ok(())
    }
}
