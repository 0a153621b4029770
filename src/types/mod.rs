// ABOUTME: Validated domain types shared across the deploy pipeline.
// ABOUTME: Release tags, architectures, service names, and image references.

mod arch;
mod image_ref;
mod release_tag;
mod service_name;

pub use arch::Arch;
pub use image_ref::{ImageRef, ParseImageRefError};
pub use release_tag::{ReleaseTag, ReleaseTagError};
pub use service_name::{ServiceName, ServiceNameError};
