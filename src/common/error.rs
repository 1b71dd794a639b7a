use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    #[error("Invalid input: data is empty or unsupported")]
    InvalidInput,
    #[error("Capacity exceeded: data doesn't fit in the symbol")]
    CapacityExceeded,
    #[error("Invalid version")]
    InvalidVersion,
    #[error("Invalid masking pattern")]
    InvalidMask,
    #[error("Placement overrun: data modules don't match the payload")]
    PlacementOverrun,
}

pub type QRResult<T> = Result<T, QRError>;
