//! Mirroring a 16 bits per pixel Linux framebuffer (`/dev/fb0`) to the panel.
//!
//! [`Framebuffer`] maps the device read-only. [`Mirror`] decides once whether
//! frames need scaling, then copies each frame into its own buffer and sends
//! it with [`Lcd::blit_raw`], which byte-swaps that copy in place.

use crate::image::resize::NearestNeighbour;
use crate::image::{ImageError, BYTES_PER_PIXEL};
use crate::lcd::interface::Interface;
use crate::lcd::{Lcd, LcdError};
use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::{io, ptr, slice};
use thiserror::Error;
use tracing::{debug, info};

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

#[derive(Debug, Error)]
pub enum FramebufferError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{bits} bits per pixel, only 16 is supported")]
    UnsupportedDepth { bits: u32 },
    #[error("{width}x{height} framebuffer is too large")]
    TooLarge { width: u32, height: u32 },
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
struct BitField {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
struct VariableScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: BitField,
    green: BitField,
    blue: BitField,
    transp: BitField,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo`
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
struct FixedScreenInfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    kind: u32,
    kind_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// A framebuffer device mapped read-only.
#[derive(Debug)]
pub struct Framebuffer {
    _file: File,
    map: *const u8,
    len: usize,
    width: i16,
    height: i16,
    pitch: usize,
}

impl Framebuffer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Framebuffer, FramebufferError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let fd = file.as_raw_fd();

        let mut fixed = FixedScreenInfo::default();
        let mut variable = VariableScreenInfo::default();
        unsafe {
            if libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &mut fixed as *mut FixedScreenInfo) == -1 {
                return Err(io::Error::last_os_error().into());
            }
            if libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut variable as *mut VariableScreenInfo)
                == -1
            {
                return Err(io::Error::last_os_error().into());
            }
        }

        if variable.bits_per_pixel != 16 {
            return Err(FramebufferError::UnsupportedDepth {
                bits: variable.bits_per_pixel,
            });
        }
        let (Ok(width), Ok(height)) = (i16::try_from(variable.xres), i16::try_from(variable.yres))
        else {
            return Err(FramebufferError::TooLarge {
                width: variable.xres,
                height: variable.yres,
            });
        };

        let len = fixed.smem_len as usize;
        let map = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if map == libc::MAP_FAILED {
            return Err(io::Error::last_os_error().into());
        }

        info!(
            "Opened {}: {}x{}, {} bytes per line, {} bytes mapped",
            path.display(),
            width,
            height,
            fixed.line_length,
            len
        );

        Ok(Framebuffer {
            _file: file,
            map: map as *const u8,
            len,
            width,
            height,
            pitch: fixed.line_length as usize,
        })
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    /// Bytes per line, padding included.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// The mapped frame in host byte order. The kernel may be writing to it
    /// while it is read.
    pub fn frame(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.map, self.len) }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.map as *mut libc::c_void, self.len);
        }
    }
}

/// Copies frames of one geometry onto the panel, centred and, when the
/// geometry differs from the panel's, scaled down with the aspect ratio kept.
#[derive(Debug)]
pub struct Mirror {
    resize: Option<NearestNeighbour>,
    source_pitch: usize,
    x: i16,
    y: i16,
    width: i16,
    height: i16,
    buffer: Vec<u8>,
}

impl Mirror {
    pub fn new(
        source_width: i16,
        source_height: i16,
        source_pitch: usize,
        panel_width: i16,
        panel_height: i16,
    ) -> Result<Mirror, ImageError> {
        let tight = source_width.max(0) as usize * BYTES_PER_PIXEL;
        let resize = if source_width != panel_width
            || source_height != panel_height
            || source_pitch != tight
        {
            Some(NearestNeighbour::new(
                panel_width,
                panel_height,
                source_width,
                source_height,
                true,
            )?)
        } else {
            None
        };

        let (width, height) = match &resize {
            Some(resize) => (resize.destination_width(), resize.destination_height()),
            None => (panel_width, panel_height),
        };
        let x = (panel_width - width) / 2;
        let y = (panel_height - height) / 2;
        debug!(
            "Mirroring {}x{} (pitch {}) to {}x{} at ({}, {}), resize: {}",
            source_width,
            source_height,
            source_pitch,
            width,
            height,
            x,
            y,
            resize.is_some()
        );

        Ok(Mirror {
            resize,
            source_pitch,
            x,
            y,
            width,
            height,
            buffer: vec![0; width.max(0) as usize * height.max(0) as usize * BYTES_PER_PIXEL],
        })
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    /// Panel position and size the frames are drawn at.
    pub fn area(&self) -> (i16, i16, i16, i16) {
        (self.x, self.y, self.width, self.height)
    }

    /// Copy `frame` and send it to the panel.
    pub fn show<I: Interface>(&mut self, frame: &[u8], lcd: &mut Lcd<I>) -> Result<bool, LcdError> {
        let pitch = self.width.max(0) as usize * BYTES_PER_PIXEL;

        match &self.resize {
            Some(resize) => resize.resize(&mut self.buffer, pitch, frame, self.source_pitch)?,
            None => {
                let Some(source) = frame.get(..self.buffer.len()) else {
                    return Err(ImageError::BufferTooSmall {
                        required: self.buffer.len(),
                        actual: frame.len(),
                    }
                    .into());
                };
                self.buffer.copy_from_slice(source);
            }
        }

        lcd.blit_raw(self.x, self.y, self.width, self.height, pitch, &mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn matching_geometry_is_copied() {
        let mirror = Mirror::new(320, 240, 640, 320, 240).unwrap();
        assert!(!mirror.is_resizing());
        assert_eq!(mirror.area(), (0, 0, 320, 240));
    }

    #[test]
    fn padded_lines_are_resized() {
        let mirror = Mirror::new(320, 240, 704, 320, 240).unwrap();
        assert!(mirror.is_resizing());
        assert_eq!(mirror.area(), (0, 0, 320, 240));
    }

    #[test]
    fn wide_frames_are_letterboxed() {
        let mirror = Mirror::new(1920, 1080, 3840, 320, 240).unwrap();
        assert!(mirror.is_resizing());
        assert_eq!(mirror.area(), (0, 30, 320, 180));
    }

    #[test]
    fn empty_geometry_is_rejected() {
        assert_eq!(
            Mirror::new(0, 480, 0, 320, 240).unwrap_err(),
            ImageError::InvalidDimensions { width: 0, height: 480 }
        );
    }

    #[test]
    fn regular_files_are_not_framebuffers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0; 64]).unwrap();
        assert!(matches!(
            Framebuffer::open(file.path()),
            Err(FramebufferError::Io(_))
        ));
    }
}
