use crate::GatewayError;

const WAVE_FORMAT_PCM: u16 = 1;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Mono 16-bit PCM decoded from a RIFF/WAVE file.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl PcmAudio {
    /// Little-endian sample bytes, as sent with `audio/l16`.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Cheap magic check used before an upload is staged.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

struct Format {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Decode a 16-bit PCM WAV. Multi-channel audio is downmixed to mono by
/// averaging each frame.
pub fn decode(bytes: &[u8]) -> Result<PcmAudio, GatewayError> {
    if !is_wav(bytes) {
        return Err(unsupported("not a RIFF/WAVE file"));
    }

    let mut format = None;
    let mut data = None;
    let mut pos = 12;

    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]) as usize;
        let start = pos + 8;
        // Streaming writers leave the data size at 0 or 0xFFFFFFFF; the
        // samples then run to end of file. Other sizes are clamped.
        let open_ended = id == b"data" && (size == 0 || size == u32::MAX as usize);
        let end = if open_ended {
            bytes.len()
        } else {
            start.saturating_add(size).min(bytes.len())
        };
        let body = &bytes[start..end];

        match id {
            b"fmt " => format = Some(parse_format(body)?),
            b"data" => data = Some(body),
            _ => {}
        }

        // Chunks are word aligned.
        pos = end + (size & 1);
    }

    let format = format.ok_or_else(|| unsupported("missing fmt chunk"))?;
    let data = data.ok_or_else(|| unsupported("missing data chunk"))?;

    if format.bits_per_sample != 16 {
        return Err(unsupported(&format!("{}-bit samples, expected 16-bit", format.bits_per_sample)));
    }
    if format.channels == 0 || format.sample_rate == 0 {
        return Err(unsupported("invalid channel count or sample rate"));
    }

    let channels = format.channels as usize;
    let frame_bytes = 2 * channels;
    let samples: Vec<i16> = data
        .chunks_exact(frame_bytes)
        .map(|frame| {
            let sum: i32 = frame
                .chunks_exact(2)
                .map(|s| i16::from_le_bytes([s[0], s[1]]) as i32)
                .sum();
            (sum / channels as i32) as i16
        })
        .collect();

    if samples.is_empty() {
        return Err(unsupported("no audio samples"));
    }

    Ok(PcmAudio {
        sample_rate: format.sample_rate,
        samples,
    })
}

fn parse_format(body: &[u8]) -> Result<Format, GatewayError> {
    if body.len() < 16 {
        return Err(unsupported("truncated fmt chunk"));
    }
    let u16_at = |i: usize| u16::from_le_bytes([body[i], body[i + 1]]);

    let audio_format = u16_at(0);
    if audio_format != WAVE_FORMAT_PCM && audio_format != WAVE_FORMAT_EXTENSIBLE {
        return Err(unsupported(&format!("compressed format tag {audio_format:#06x}")));
    }

    Ok(Format {
        channels: u16_at(2),
        sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
        bits_per_sample: u16_at(14),
    })
}

fn unsupported(reason: &str) -> GatewayError {
    GatewayError::UnsupportedAudio(reason.to_string())
}

/// Test helper shared with the speech client tests.
#[cfg(test)]
pub(crate) fn encode_pcm16(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    out.extend_from_slice(&(channels * 2).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
