//! Raw chunked container written by [`crate::encoder::VirtualEncoder`].
//!
//! A take is a `CRV1` header followed by any number of `SLCE` records:
//!
//! ```text
//! "CRV1" | width u32 | height u32 | sample_rate u32 | channels u16
//! "SLCE" | frame_index u64 | frame_len u32 | rgba[frame_len] | pcm_len u32 | pcm_s16le[pcm_len]
//! ```
//!
//! All integers are little-endian. Takes can be concatenated byte-wise; a
//! new header simply starts a new take.

use camrec_core::models::error::CaptureError;
use camrec_core::models::media::VideoFrame;
use camrec_core::processing::mixer::AudioMixer;

pub const MIME_TYPE: &str = "video/x-camrec-raw";

const HEADER_MAGIC: &[u8; 4] = b"CRV1";
const SLICE_MAGIC: &[u8; 4] = b"SLCE";

/// Take-level parameters written once at the start of a take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub width: u32,
    pub height: u32,
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18);
        out.extend_from_slice(HEADER_MAGIC);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out
    }
}

/// Encode one timeslice. `frame` is omitted when the raster has not changed.
pub fn encode_slice(frame: Option<&VideoFrame>, audio: &[f32]) -> Vec<u8> {
    let pcm = AudioMixer::convert_to_int16_pcm(audio);
    let (index, rgba): (u64, &[u8]) = match frame {
        Some(f) => (f.index, &f.rgba),
        None => (0, &[]),
    };

    let mut out = Vec::with_capacity(20 + rgba.len() + pcm.len());
    out.extend_from_slice(SLICE_MAGIC);
    out.extend_from_slice(&index.to_le_bytes());
    out.extend_from_slice(&(rgba.len() as u32).to_le_bytes());
    out.extend_from_slice(rgba);
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(&pcm);
    out
}

/// Summary of one take found in a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeSummary {
    pub header: StreamHeader,
    pub frames: usize,
    pub audio_samples: usize,
    pub last_frame_index: u64,
}

impl TakeSummary {
    pub fn audio_duration_secs(&self) -> f64 {
        if self.header.sample_rate == 0 {
            return 0.0;
        }
        self.audio_samples as f64 / self.header.channels.max(1) as f64 / self.header.sample_rate as f64
    }
}

/// Walk a (possibly concatenated) recording and summarize each take.
pub fn parse(data: &[u8]) -> Result<Vec<TakeSummary>, CaptureError> {
    let mut reader = Reader { data, pos: 0 };
    let mut takes: Vec<TakeSummary> = Vec::new();

    while !reader.is_done() {
        let magic = reader.take(4)?;
        if magic == HEADER_MAGIC {
            let header = StreamHeader {
                width: reader.u32()?,
                height: reader.u32()?,
                sample_rate: reader.u32()?,
                channels: reader.u16()?,
            };
            takes.push(TakeSummary {
                header,
                frames: 0,
                audio_samples: 0,
                last_frame_index: 0,
            });
        } else if magic == SLICE_MAGIC {
            let take = takes
                .last_mut()
                .ok_or_else(|| malformed("slice before stream header", reader.pos))?;
            let index = reader.u64()?;
            let frame_len = reader.u32()? as usize;
            if frame_len > 0 {
                let expected = take.header.width as usize * take.header.height as usize * 4;
                if frame_len != expected {
                    return Err(malformed("frame size does not match header", reader.pos));
                }
                reader.take(frame_len)?;
                take.frames += 1;
                take.last_frame_index = index;
            }
            let pcm_len = reader.u32()? as usize;
            reader.take(pcm_len)?;
            take.audio_samples += pcm_len / 2;
        } else {
            return Err(malformed("unknown record", reader.pos - 4));
        }
    }
    Ok(takes)
}

fn malformed(what: &str, pos: usize) -> CaptureError {
    CaptureError::PlaybackFailed(format!("{} at byte {}", what, pos))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn is_done(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CaptureError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| malformed("truncated record", self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CaptureError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, CaptureError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, CaptureError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, CaptureError> {
        self.array().map(u64::from_le_bytes)
    }
}
