//! The append-only photo pool.
//!
//! Photos are only ever added, never removed or reordered, so a photo's
//! index doubles as its particle id for the life of a session.  Uploads
//! from other threads arrive through an [`UploadSender`] and are folded in
//! by the render loop with [`PhotoPool::drain_uploads`].

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PoolError;

// ════════════════════════════════════════════════════════════════════════════
// Image sources and decoded textures
// ════════════════════════════════════════════════════════════════════════════

/// Where a photo's pixels come from.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file on disk (the static collection).
    File(PathBuf),
    /// An uploaded image already read into memory.
    Bytes { name: String, data: Arc<[u8]> },
}

impl ImageSource {
    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::Bytes { name: name.into(), data: data.into() }
    }

    /// Short label for logs and the HUD.
    pub fn name(&self) -> String {
        match self {
            ImageSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ImageSource::Bytes { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ImageSource::Bytes { name, data } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// A decoded thumbnail, 0x00RRGGBB per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Texture {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        Texture { width, height, pixels }
    }

    /// Nearest-neighbour sample at normalised `(u, v)`, both clamped to 0–1.
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = ((u.clamp(0.0, 1.0) * self.width as f32) as usize).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f32) as usize).min(self.height - 1);
        self.pixels.get(y * self.width + x).copied().unwrap_or(0)
    }
}

/// Load state of one photo's texture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureSlot {
    #[default]
    Pending,
    Ready(Arc<Texture>),
    /// Decoding failed; the photo keeps its particle and draws a placeholder.
    Failed(String),
}

impl TextureSlot {
    pub fn is_pending(&self) -> bool { matches!(self, TextureSlot::Pending) }
}

#[derive(Clone, Debug)]
pub struct Photo {
    pub index:   usize,
    pub source:  ImageSource,
    texture:     TextureSlot,
}

impl Photo {
    pub fn texture(&self) -> &TextureSlot { &self.texture }
}

// ════════════════════════════════════════════════════════════════════════════
// Pool
// ════════════════════════════════════════════════════════════════════════════

pub struct PhotoPool {
    photos:  Vec<Photo>,
    uploads: Option<Receiver<Vec<ImageSource>>>,
}

/// Cloneable handle for pushing upload batches into a [`PhotoPool`] from
/// another thread.
#[derive(Clone)]
pub struct UploadSender {
    tx: Sender<Vec<ImageSource>>,
}

impl UploadSender {
    /// Queue one batch.  Empty batches are accepted and ignored.
    pub fn send(&self, batch: Vec<ImageSource>) -> Result<(), PoolError> {
        self.tx.send(batch).map_err(|_| PoolError::Closed)
    }
}

impl fmt::Debug for UploadSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UploadSender")
    }
}

impl Default for PhotoPool {
    fn default() -> Self { Self::new() }
}

impl PhotoPool {
    /// A pool with no upload channel.
    pub fn new() -> Self {
        PhotoPool { photos: Vec::new(), uploads: None }
    }

    /// A pool plus the sender half of its upload channel.
    pub fn with_uploads() -> (Self, UploadSender) {
        let (tx, rx) = mpsc::channel();
        (PhotoPool { photos: Vec::new(), uploads: Some(rx) }, UploadSender { tx })
    }

    /// Append `images` in order and return the index range they received.
    pub fn append(&mut self, images: Vec<ImageSource>) -> Range<usize> {
        let start = self.photos.len();
        for source in images {
            let index = self.photos.len();
            debug!(index, name = %source.name(), "photo added");
            self.photos.push(Photo { index, source, texture: TextureSlot::Pending });
        }
        start..self.photos.len()
    }

    /// Fold every queued upload batch into the pool.  Returns the combined
    /// index range of the new photos, or `None` when nothing arrived.
    pub fn drain_uploads(&mut self) -> Option<Range<usize>> {
        let start = self.photos.len();
        loop {
            let rx = self.uploads.as_ref()?;
            match rx.try_recv() {
                Ok(batch) => { self.append(batch); }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("upload channel closed");
                    self.uploads = None;
                    break;
                }
            }
        }
        let end = self.photos.len();
        if end > start {
            info!(added = end - start, total = end, "uploads merged");
            Some(start..end)
        } else {
            None
        }
    }

    pub fn all(&self) -> &[Photo] { &self.photos }
    pub fn len(&self) -> usize { self.photos.len() }
    pub fn is_empty(&self) -> bool { self.photos.is_empty() }
    pub fn get(&self, index: usize) -> Option<&Photo> { self.photos.get(index) }

    pub fn set_texture(&mut self, index: usize, slot: TextureSlot) -> Result<(), PoolError> {
        let photo = self.photos.get_mut(index).ok_or(PoolError::NoSuchPhoto(index))?;
        photo.texture = slot;
        Ok(())
    }

    /// Photos whose texture has not arrived yet.
    pub fn pending(&self) -> usize {
        self.photos.iter().filter(|p| p.texture.is_pending()).count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<ImageSource> {
        names.iter().map(|n| ImageSource::File(PathBuf::from(format!("photos/{}", n)))).collect()
    }

    #[test]
    fn append_assigns_sequential_indices() {
        let mut pool = PhotoPool::new();
        assert_eq!(pool.append(files(&["1.jpg", "2.jpg"])), 0..2);
        assert_eq!(pool.append(files(&["3.jpg"])), 2..3);
        for (i, p) in pool.all().iter().enumerate() {
            assert_eq!(p.index, i);
            assert!(p.texture().is_pending());
        }
        assert_eq!(pool.get(2).map(|p| p.source.name()), Some("3.jpg".to_string()));
    }

    #[test]
    fn empty_append_is_noop() {
        let mut pool = PhotoPool::new();
        assert_eq!(pool.append(Vec::new()), 0..0);
        assert!(pool.is_empty());
    }

    #[test]
    fn uploads_merge_in_send_order() {
        let (mut pool, tx) = PhotoPool::with_uploads();
        pool.append(files(&["1.jpg"]));
        tx.send(vec![ImageSource::bytes("a.png", vec![1u8, 2, 3])]).unwrap();
        tx.send(vec![ImageSource::bytes("b.png", vec![4u8]), ImageSource::bytes("c.png", vec![5u8])]).unwrap();

        assert_eq!(pool.drain_uploads(), Some(1..4));
        let names: Vec<_> = pool.all().iter().map(|p| p.source.name()).collect();
        assert_eq!(names, ["1.jpg", "a.png", "b.png", "c.png"]);
        assert_eq!(pool.drain_uploads(), None);
    }

    #[test]
    fn sender_errors_once_pool_dropped() {
        let (pool, tx) = PhotoPool::with_uploads();
        drop(pool);
        assert_eq!(tx.send(Vec::new()), Err(PoolError::Closed));
    }

    #[test]
    fn drain_survives_disconnected_sender() {
        let (mut pool, tx) = PhotoPool::with_uploads();
        tx.send(files(&["x.jpg"])).unwrap();
        drop(tx);
        assert_eq!(pool.drain_uploads(), Some(0..1));
        assert_eq!(pool.drain_uploads(), None);
    }

    #[test]
    fn set_texture_checks_index() {
        let mut pool = PhotoPool::new();
        pool.append(files(&["1.jpg"]));
        let tex = Arc::new(Texture::new(1, 1, vec![0x00ff_0000]));
        pool.set_texture(0, TextureSlot::Ready(tex)).unwrap();
        assert_eq!(pool.pending(), 0);
        assert_eq!(pool.set_texture(5, TextureSlot::Pending), Err(PoolError::NoSuchPhoto(5)));
    }

    #[test]
    fn texture_sample_clamps() {
        let t = Texture::new(2, 1, vec![1, 2]);
        assert_eq!(t.sample(-1.0, 0.5), 1);
        assert_eq!(t.sample(2.0, 0.5), 2);
        assert_eq!(Texture::new(0, 0, Vec::new()).sample(0.5, 0.5), 0);
    }
}
