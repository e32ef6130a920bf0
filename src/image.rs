//! Image placements (sixel / iTerm2) and their hibernation to disk.
//!
//! Images that scroll out of the visible region are serialized into a
//! shared anonymous temp file and their pixel buffers freed; they are
//! thawed on the next paint. One pool is shared by all live images.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Upper size of one pool file before a new one is started.
const POOL_FILE_MAX: u64 = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("hibernated segment length mismatch")]
    BadSegment,
}

#[derive(Debug)]
struct PoolFile {
    file: File,
    len: u64,
}

#[derive(Debug, Default)]
struct PoolInner {
    current: Option<Arc<Mutex<PoolFile>>>,
}

/// Shared handle to the hibernation temp-file pool. Files are anonymous
/// (`tempfile::tempfile`) and vanish when the last segment drops.
#[derive(Debug, Clone, Default)]
pub struct TempFilePool {
    inner: Arc<Mutex<PoolInner>>,
}

/// A hibernated pixel buffer: which file, where, and how long.
#[derive(Debug, Clone)]
pub struct Segment {
    file: Arc<Mutex<PoolFile>>,
    pub offset: u64,
    pub len: u64,
}

impl TempFilePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_file(&self) -> Result<Arc<Mutex<PoolFile>>, ImageError> {
        let mut inner = self.inner.lock();
        if let Some(current) = &inner.current {
            if current.lock().len <= POOL_FILE_MAX {
                return Ok(Arc::clone(current));
            }
        }
        let file = tempfile::tempfile()?;
        let fresh = Arc::new(Mutex::new(PoolFile { file, len: 0 }));
        inner.current = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Append a buffer to the pool, returning its segment handle.
    pub fn store(&self, data: &[u8]) -> Result<Segment, ImageError> {
        let handle = self.current_file()?;
        let mut pf = handle.lock();
        let offset = pf.len;
        pf.file.seek(SeekFrom::Start(offset))?;
        pf.file.write_all(data)?;
        pf.len = offset + data.len() as u64;
        drop(pf);
        Ok(Segment {
            file: handle,
            offset,
            len: data.len() as u64,
        })
    }

    /// Read a segment back.
    pub fn load(&self, seg: &Segment) -> Result<Vec<u8>, ImageError> {
        let mut pf = seg.file.lock();
        let mut buf = vec![0u8; seg.len as usize];
        pf.file.seek(SeekFrom::Start(seg.offset))?;
        pf.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Buffer format of a placed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Row-major RGBA, pixelwidth * pixelheight * 4 bytes (sixel).
    Rgba,
    /// An encoded image file (iTerm2 upload); the host rasterizes it.
    Encoded,
}

/// One placed image. `top` is in virtual-line coordinates: the total
/// number of lines ever scrolled off plus the row at placement time, so
/// a placement stays put as the screen scrolls.
#[derive(Debug)]
pub struct Image {
    pub imgi: u32,
    /// Resident buffer; None while hibernated.
    pub pixels: Option<Vec<u8>>,
    /// On-disk handle while hibernated.
    pub strage: Option<Segment>,
    pub format: ImageFormat,
    pub left: u16,
    pub top: i64,
    /// Size in cells.
    pub width: u16,
    pub height: u16,
    pub pixelwidth: u32,
    pub pixelheight: u32,
    /// Blink attribute bits captured at placement time.
    pub blink: bool,
}

impl Image {
    fn byte_len(&self) -> u64 {
        self.pixelwidth as u64 * self.pixelheight as u64 * 4
    }
}

/// The per-screen image list. The original keeps a doubly linked list;
/// a Vec ordered by placement gives the same paint order.
#[derive(Debug, Default)]
pub struct ImageList {
    images: Vec<Image>,
    pool: TempFilePool,
    next_imgi: u32,
}

impl ImageList {
    pub fn new(pool: TempFilePool) -> Self {
        Self {
            images: Vec::new(),
            pool,
            next_imgi: 1,
        }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next_imgi;
        self.next_imgi += 1;
        id
    }

    /// Append a newly decoded image (newest paints last).
    pub fn place(&mut self, img: Image) {
        self.images.push(img);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn get(&self, imgi: u32) -> Option<&Image> {
        self.images.iter().find(|i| i.imgi == imgi)
    }

    /// Destroy all images (reset, screen clear).
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Destroy images whose bottom line scrolled above the given virtual
    /// line (i.e. out of the scrollback ring).
    pub fn expire_above(&mut self, min_virtual_line: i64) {
        self.images
            .retain(|img| img.top + img.height as i64 > min_virtual_line);
    }

    /// Hibernate every image outside the visible virtual-line window.
    /// Failures leave the image resident and are reported once.
    pub fn hibernate_outside(&mut self, first_visible: i64, last_visible: i64) {
        for img in &mut self.images {
            let visible =
                img.top <= last_visible && img.top + img.height as i64 > first_visible;
            if visible || img.pixels.is_none() {
                continue;
            }
            let Some(pixels) = img.pixels.take() else {
                continue;
            };
            match self.pool.store(&pixels) {
                Ok(seg) => img.strage = Some(seg),
                Err(err) => {
                    tracing::warn!("image hibernation failed: {err}");
                    img.pixels = Some(pixels);
                }
            }
        }
    }

    /// Bring a hibernated image back for painting.
    pub fn thaw(&mut self, imgi: u32) -> Result<(), ImageError> {
        let pool = self.pool.clone();
        let Some(img) = self.images.iter_mut().find(|i| i.imgi == imgi) else {
            return Ok(());
        };
        if img.pixels.is_some() {
            return Ok(());
        }
        let Some(seg) = &img.strage else {
            return Err(ImageError::BadSegment);
        };
        if img.format == ImageFormat::Rgba && seg.len != img.byte_len() {
            return Err(ImageError::BadSegment);
        }
        img.pixels = Some(pool.load(seg)?);
        img.strage = None;
        Ok(())
    }

    /// Invariant check used by tests: every image is resident or has a
    /// segment of exactly pixelwidth * pixelheight * 4 bytes.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        for img in &self.images {
            match (&img.pixels, &img.strage) {
                (Some(p), _) if img.format == ImageFormat::Rgba => {
                    assert_eq!(p.len() as u64, img.byte_len());
                }
                (Some(_), _) => {}
                (None, Some(seg)) => {
                    if img.format == ImageFormat::Rgba {
                        assert_eq!(seg.len, img.byte_len());
                    }
                }
                (None, None) => panic!("image {} neither resident nor stored", img.imgi),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(imgi: u32, top: i64) -> Image {
        Image {
            imgi,
            pixels: Some(vec![imgi as u8; 2 * 3 * 4]),
            strage: None,
            format: ImageFormat::Rgba,
            left: 0,
            top,
            width: 1,
            height: 1,
            pixelwidth: 2,
            pixelheight: 3,
            blink: false,
        }
    }

    #[test]
    fn hibernate_and_thaw_round_trip() {
        let pool = TempFilePool::new();
        let mut list = ImageList::new(pool);
        list.place(sample(1, 0));
        list.place(sample(2, 100));
        // window shows lines 90..120: image 1 hibernates
        list.hibernate_outside(90, 120);
        assert!(list.get(1).unwrap().pixels.is_none());
        assert!(list.get(1).unwrap().strage.is_some());
        assert!(list.get(2).unwrap().pixels.is_some());
        list.check_invariants();

        list.thaw(1).unwrap();
        assert_eq!(
            list.get(1).unwrap().pixels.as_deref().unwrap(),
            &[1u8; 24][..]
        );
        list.check_invariants();
    }

    #[test]
    fn expire_drops_scrolled_out_images() {
        let mut list = ImageList::new(TempFilePool::new());
        list.place(sample(1, 0));
        list.place(sample(2, 50));
        list.expire_above(10);
        assert!(list.get(1).is_none());
        assert!(list.get(2).is_some());
    }

    #[test]
    fn pool_segments_are_stable_across_files() {
        let pool = TempFilePool::new();
        let a = pool.store(&[1, 2, 3, 4]).unwrap();
        let b = pool.store(&[9, 9]).unwrap();
        assert_eq!(pool.load(&a).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(pool.load(&b).unwrap(), vec![9, 9]);
        assert_eq!(b.offset, 4);
    }
}
