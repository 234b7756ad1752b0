pub mod decoder;
pub mod resample;

/// Decoded mono PCM in `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}
