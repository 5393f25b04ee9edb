//! Streaming WAV framing for captured PCM
//!
//! The first capture chunk starts with a WAV header whose length fields hold
//! the "unknown length" marker, and every chunk carries raw 16-bit
//! little-endian samples. Concatenating the chunks therefore yields a WAV
//! stream without knowing its length up front. [`seal`] writes the real
//! lengths into a copy for decoders that insist on them.

use std::io::Cursor;

/// Length value written while the total length is still unknown
pub const UNKNOWN_LENGTH: u32 = u32::MAX;

const RIFF_SIZE_OFFSET: usize = 4;
const FIRST_CHUNK_OFFSET: usize = 12;

/// Build a 16-bit PCM WAV header for a stream of unknown length
pub fn stream_header(sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    hound::WavWriter::new(&mut cursor, spec)?.finalize()?;
    let mut header = cursor.into_inner();

    if let Some((size_offset, _)) = find_data_chunk(&header) {
        write_u32(&mut header, RIFF_SIZE_OFFSET, UNKNOWN_LENGTH);
        write_u32(&mut header, size_offset, UNKNOWN_LENGTH);
    }

    Ok(header)
}

/// Encode samples as little-endian 16-bit PCM
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Whether the bytes start with a RIFF/WAVE header
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= FIRST_CHUNK_OFFSET && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Copy of `bytes` with the RIFF and data lengths set to the real values.
/// Anything that is not a WAV stream is returned unchanged.
pub fn seal(bytes: &[u8]) -> Vec<u8> {
    let mut sealed = bytes.to_vec();

    if let Some((size_offset, data_start)) = find_data_chunk(&sealed) {
        let riff_len = clamp_u32(sealed.len() - 8);
        let data_len = clamp_u32(sealed.len() - data_start);
        write_u32(&mut sealed, RIFF_SIZE_OFFSET, riff_len);
        write_u32(&mut sealed, size_offset, data_len);
    }

    sealed
}

/// Locate the `data` chunk: (offset of its size field, offset of its payload)
fn find_data_chunk(bytes: &[u8]) -> Option<(usize, usize)> {
    if !is_wav(bytes) {
        return None;
    }

    let mut pos = FIRST_CHUNK_OFFSET;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        if id == b"data" {
            return Some((pos + 4, pos + 8));
        }
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]);
        // Chunks are padded to an even length
        let padded = size as usize + (size as usize & 1);
        pos = pos.checked_add(8 + padded)?;
    }

    None
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn clamp_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(UNKNOWN_LENGTH)
}
