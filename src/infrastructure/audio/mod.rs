use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("audio contains no samples")]
    Empty,
    #[error("invalid sample rate: {0}")]
    SampleRate(u32),
}

/// Encode mono f32 samples as a 16-bit PCM WAV file.
///
/// Samples are hard clamped to [-1, 1] before quantization.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::SampleRate(sample_rate));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV file into mono f32 samples in [-1, 1].
///
/// Integer PCM is scaled by its full-scale value, float audio whose peak
/// exceeds 1.0 is peak-normalized, and multi-channel audio is averaged
/// down to a single channel.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let interleaved = match spec.sample_format {
        SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => {
            let mut samples = reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?;
            let peak = samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
            if peak > 1.0 + 1e-6 {
                samples.iter_mut().for_each(|s| *s /= peak + 1e-12);
            }
            samples
        }
    };

    if interleaved.is_empty() {
        return Err(AudioError::Empty);
    }

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect()
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| {
                let sum: f32 = frame.iter().map(|s| s.clamp(-1.0, 1.0)).sum();
                sum / frame.len() as f32
            })
            .collect()
    };

    Ok((mono, spec.sample_rate))
}
