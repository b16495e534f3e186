use std::error::Error;

#[derive(Debug)]
pub struct DeviceError(pub &'static str);

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "device error: {}", self.0)
    }
}

impl Error for DeviceError {}
