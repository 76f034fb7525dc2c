use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Sample count must be >= 1.")]
    ZeroSamples,
    #[error("Window size must be >= 1.")]
    ZeroWindow,
    #[error("Sample count {samples} exceeds window size {window}.")]
    SamplesExceedWindow { samples: usize, window: usize },
    #[error("Out-of-order observation: sequence {actual} is not after {last}.")]
    OutOfOrder { last: u64, actual: u64 },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
