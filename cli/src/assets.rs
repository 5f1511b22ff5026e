use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use neurolearn_core::TTS_SAMPLE_RATE;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes generated lesson assets to disk so they can be opened outside the terminal
#[derive(Debug, Clone)]
pub struct AssetWriter {
    dir: PathBuf,
}

impl AssetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create asset directory {}", self.dir.display()))
    }

    /// Decodes a base64 image and writes it as `<id>.<ext>`, the extension
    /// following the image's signature bytes
    pub fn save_image(&self, message_id: &str, encoded: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .context("Image payload is not valid base64")?;

        let path = self
            .dir
            .join(format!("{}.{}", message_id, image_extension(&bytes)));
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write image to {}", path.display()))?;
        Ok(path)
    }

    /// Wraps 16-bit little-endian mono PCM in a WAV container as `<id>.wav`
    pub fn save_audio(&self, message_id: &str, pcm: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(format!("{}.wav", message_id));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: TTS_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        // A trailing odd byte is not a full sample
        for chunk in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))
                .context("Failed to write audio sample")?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(path)
    }
}

/// File extension for an encoded image. Unrecognized data is assumed to be PNG.
fn image_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_image_decodes_base64() {
        let dir = tempdir().unwrap();
        let writer = AssetWriter::new(dir.path().join("assets"));

        let path = writer.save_image("msg-1", &BASE64.encode(b"\x89PNG")).unwrap();

        assert_eq!(path.file_name().unwrap(), "msg-1.png");
        assert_eq!(fs::read(path).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_save_image_extension_follows_format() {
        let dir = tempdir().unwrap();
        let writer = AssetWriter::new(dir.path());

        let jpeg = writer
            .save_image("msg-3", &BASE64.encode(b"\xFF\xD8\xFF\xE0rest"))
            .unwrap();
        assert_eq!(jpeg.file_name().unwrap(), "msg-3.jpg");

        let webp = writer
            .save_image("msg-4", &BASE64.encode(b"RIFF\x10\0\0\0WEBPVP8 "))
            .unwrap();
        assert_eq!(webp.file_name().unwrap(), "msg-4.webp");

        assert_eq!(image_extension(b"GIF89a"), "gif");
        assert_eq!(image_extension(b""), "png");
    }

    #[test]
    fn test_save_image_rejects_garbage() {
        let dir = tempdir().unwrap();
        let writer = AssetWriter::new(dir.path());
        assert!(writer.save_image("msg-1", "*** nope ***").is_err());
    }

    #[test]
    fn test_save_audio_writes_playable_wav() {
        let dir = tempdir().unwrap();
        let writer = AssetWriter::new(dir.path());
        let samples: [i16; 3] = [0, -2, 1000];
        let mut pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        pcm.push(0x7f);

        let path = writer.save_audio("msg-2", &pcm).unwrap();

        let mut reader = hound::WavReader::open(path).unwrap();
        assert_eq!(reader.spec().sample_rate, TTS_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }
}
