/// PCM sample representations
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{ImmersiveError, Result};

/// Scale used to bring 16-bit integer samples into [-1.0, 1.0)
pub const INT16_SCALE: f32 = 32768.0;

/// Declared representation of a PCM buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed 16-bit integer samples
    Int16,
    /// 32-bit float samples
    Float32,
}

impl SampleFormat {
    /// Parse the integer tag used by the encoder session (0 = int16, 1 = float32)
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Int16),
            1 => Ok(Self::Float32),
            other => Err(ImmersiveError::UnsupportedSampleFormat(other)),
        }
    }

    /// Integer tag of this format
    pub fn tag(self) -> i32 {
        match self {
            Self::Int16 => 0,
            Self::Float32 => 1,
        }
    }

    /// Size of one sample in bytes
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Float32 => 4,
        }
    }
}

/// Planar PCM samples in either supported representation
///
/// Borrowed when the caller already holds typed samples, owned when decoded
/// from raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer<'a> {
    Int16(Cow<'a, [i16]>),
    Float32(Cow<'a, [f32]>),
}

impl<'a> SampleBuffer<'a> {
    /// Borrow 16-bit samples
    pub fn int16(samples: &'a [i16]) -> Self {
        Self::Int16(Cow::Borrowed(samples))
    }

    /// Borrow float samples
    pub fn float32(samples: &'a [f32]) -> Self {
        Self::Float32(Cow::Borrowed(samples))
    }

    /// Decode little-endian bytes according to an integer format tag
    ///
    /// # Errors
    /// Unknown tags yield [`ImmersiveError::UnsupportedSampleFormat`]; a byte
    /// count that is not a whole number of samples yields
    /// [`ImmersiveError::BufferMismatch`].
    pub fn from_le_bytes(tag: i32, bytes: &[u8]) -> Result<SampleBuffer<'static>> {
        let format = SampleFormat::from_tag(tag)?;
        let width = format.bytes_per_sample();
        if bytes.len() % width != 0 {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "{} bytes is not a whole number of {:?} samples",
                bytes.len(),
                format
            )));
        }

        Ok(match format {
            SampleFormat::Int16 => SampleBuffer::Int16(Cow::Owned(
                bytes
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect(),
            )),
            SampleFormat::Float32 => SampleBuffer::Float32(Cow::Owned(
                bytes
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
            )),
        })
    }

    /// Representation of the samples
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::Int16(_) => SampleFormat::Int16,
            Self::Float32(_) => SampleFormat::Float32,
        }
    }

    /// Number of samples (all channels)
    pub fn len(&self) -> usize {
        match self {
            Self::Int16(samples) => samples.len(),
            Self::Float32(samples) => samples.len(),
        }
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index` normalised to float
    #[inline]
    pub fn sample(&self, index: usize) -> f32 {
        match self {
            Self::Int16(samples) => f32::from(samples[index]) / INT16_SCALE,
            Self::Float32(samples) => samples[index],
        }
    }

    /// All samples normalised to float
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            Self::Int16(samples) => samples
                .iter()
                .map(|s| f32::from(*s) / INT16_SCALE)
                .collect(),
            Self::Float32(samples) => samples.to_vec(),
        }
    }
}
