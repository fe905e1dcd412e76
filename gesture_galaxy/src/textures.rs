//! Background photo decoding.
//!
//! The render loop never decodes.  It hands `(index, source)` jobs to the
//! loader thread and, once per frame, folds finished thumbnails back into the
//! pool with [`TextureLoader::drain_into`].  Until then a photo stays
//! `Pending`; a decode failure turns it `Failed`.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use photo_formation::{ImageSource, PhotoPool, Texture, TextureSlot};

use crate::error::{GalaxyError, TextureError};

/// Thumbnail edge length in pixels.
pub const THUMB_SIZE: u32 = 96;

struct Job {
    index:  usize,
    source: ImageSource,
}

struct Done {
    index: usize,
    slot:  TextureSlot,
}

pub struct TextureLoader {
    jobs:      Sender<Job>,
    done:      Receiver<Done>,
    in_flight: usize,
}

impl TextureLoader {
    pub fn spawn(thumb_size: u32) -> Result<Self, GalaxyError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<Done>();

        thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                for job in job_rx {
                    let slot = match decode_thumbnail(&job.source, thumb_size) {
                        Ok(tex) => TextureSlot::Ready(Arc::new(tex)),
                        Err(e)  => {
                            warn!(index = job.index, error = %e, "photo unavailable");
                            TextureSlot::Failed(e.to_string())
                        }
                    };
                    if done_tx.send(Done { index: job.index, slot }).is_err() {
                        return;
                    }
                }
                debug!("texture loader stopped");
            })
            .map_err(|source| GalaxyError::Spawn { what: "texture loader", source })?;

        Ok(TextureLoader { jobs: job_tx, done: done_rx, in_flight: 0 })
    }

    /// Queue every photo in `range` of `pool` for decoding.
    pub fn request(&mut self, pool: &PhotoPool, range: std::ops::Range<usize>) {
        for index in range {
            let Some(photo) = pool.get(index) else { continue };
            if self.jobs.send(Job { index, source: photo.source.clone() }).is_ok() {
                self.in_flight += 1;
            }
        }
    }

    /// Store every finished texture in `pool`.  Returns how many arrived.
    pub fn drain_into(&mut self, pool: &mut PhotoPool) -> usize {
        let mut n = 0;
        loop {
            match self.done.try_recv() {
                Ok(Done { index, slot }) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    if let Err(e) = pool.set_texture(index, slot) {
                        warn!(error = %e, "texture for unknown photo");
                    }
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.in_flight = 0;
                    break;
                }
            }
        }
        n
    }

    /// Photos queued but not decoded yet.
    pub fn in_flight(&self) -> usize { self.in_flight }

    pub fn is_busy(&self) -> bool { self.in_flight > 0 }
}

// ════════════════════════════════════════════════════════════════════════════
// Decoding
// ════════════════════════════════════════════════════════════════════════════

/// Decode `source` and centre-crop it to a `size`×`size` thumbnail.
pub fn decode_thumbnail(source: &ImageSource, size: u32) -> Result<Texture, TextureError> {
    let img: DynamicImage = match source {
        ImageSource::File(path) => {
            let bytes = std::fs::read(path)
                .map_err(|e| TextureError::Io { path: path.clone(), source: e })?;
            image::load_from_memory(&bytes)
                .map_err(|e| TextureError::Decode { name: source.name(), source: e })?
        }
        ImageSource::Bytes { data, .. } => image::load_from_memory(data)
            .map_err(|e| TextureError::Decode { name: source.name(), source: e })?,
    };
    if img.width() == 0 || img.height() == 0 {
        return Err(TextureError::Empty { name: source.name() });
    }

    let size = size.max(1);
    let rgb = img.resize_to_fill(size, size, FilterType::Triangle).to_rgb8();
    let pixels = rgb
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect();
    Ok(Texture::new(rgb.width() as usize, rgb.height() as usize, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use image::{ImageOutputFormat, Rgb, RgbImage};

    fn png(w: u32, h: u32, color: [u8; 3]) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_to_square_thumbnail() {
        let src = ImageSource::bytes("red.png", png(40, 20, [255, 0, 0]));
        let tex = decode_thumbnail(&src, 16).unwrap();
        assert_eq!((tex.width, tex.height), (16, 16));
        assert!(tex.pixels.iter().all(|&p| p == 0x00ff_0000));
    }

    #[test]
    fn missing_file_is_io_error() {
        let src = ImageSource::File(PathBuf::from("/nonexistent/41.jpg"));
        assert!(matches!(decode_thumbnail(&src, 16), Err(TextureError::Io { .. })));
    }

    #[test]
    fn garbage_is_decode_error() {
        let src = ImageSource::bytes("x.png", vec![1u8, 2, 3, 4]);
        assert!(matches!(decode_thumbnail(&src, 16), Err(TextureError::Decode { .. })));
    }

    #[test]
    fn loader_fills_pool() {
        let mut pool = PhotoPool::new();
        let range = pool.append(vec![
            ImageSource::bytes("ok.png", png(8, 8, [0, 0, 255])),
            ImageSource::File(PathBuf::from("/nonexistent/2.jpg")),
        ]);
        let mut loader = TextureLoader::spawn(8).unwrap();
        loader.request(&pool, range);
        assert_eq!(loader.in_flight(), 2);

        let deadline = Instant::now() + Duration::from_secs(5);
        while loader.is_busy() && Instant::now() < deadline {
            loader.drain_into(&mut pool);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(pool.get(0).unwrap().texture(), TextureSlot::Ready(_)));
        assert!(matches!(pool.get(1).unwrap().texture(), TextureSlot::Failed(_)));
        assert_eq!(pool.pending(), 0);
    }
}
