use cust::error::CudaError;
use thiserror::Error;

/// Failures surfaced by a sort call. Allocation errors during setup tear
/// down everything already allocated; any device error after launch leaves
/// the output buffers indeterminate and is terminal for the call.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("device allocation failed for {what}")]
    DeviceAllocationFailed {
        what: &'static str,
        #[source]
        source: CudaError,
    },

    #[error("host allocation failed for {what}")]
    HostAllocationFailed {
        what: &'static str,
        #[source]
        source: CudaError,
    },

    #[error("device operation failed during {stage}")]
    LaunchFailed {
        stage: &'static str,
        #[source]
        source: CudaError,
    },

    #[error("invalid configuration: {reason}")]
    ConfigurationInvalid { reason: String },
}

impl SortError {
    pub(crate) fn device_alloc(what: &'static str) -> impl FnOnce(CudaError) -> Self {
        move |source| Self::DeviceAllocationFailed { what, source }
    }

    pub(crate) fn host_alloc(what: &'static str) -> impl FnOnce(CudaError) -> Self {
        move |source| Self::HostAllocationFailed { what, source }
    }

    pub(crate) fn launch(stage: &'static str) -> impl FnOnce(CudaError) -> Self {
        move |source| Self::LaunchFailed { stage, source }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            reason: reason.into(),
        }
    }
}
