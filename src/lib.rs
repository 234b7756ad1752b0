//! Prosodic feature extraction for speech corpora.
//!
//! An intensity contour is split into silent and sounding stretches and
//! searched for syllable nuclei to estimate speech rate; formant tracks are
//! averaged around voiced pitch samples. Acoustic curves come from an
//! [`acoustics::AcousticCurveProvider`], so the numeric stages run on any
//! source of curves.

pub mod acoustics;
pub mod audio;
pub mod batch;
pub mod cli;
pub mod config;
pub mod curve;
pub mod error;
pub mod features;
pub mod nuclei;
pub mod types;

pub use error::{ProsodyError, Result};
