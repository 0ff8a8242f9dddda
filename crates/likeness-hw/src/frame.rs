//! Frame type and pixel conversions — YUYV decode, RGB emission, resize.
//!
//! Frames are packed BGR24 internally; RGB conversion happens only when a
//! frame is emitted to the display.

/// A captured color camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Packed BGR pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("crop region {x},{y} {width}x{height} exceeds frame {frame_width}x{frame_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

impl Frame {
    /// A frame with no pixel data; capture substitutes these away.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// Extract a BGR sub-region as a new frame.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Frame, FrameError> {
        if x + width > self.width || y + height > self.height {
            return Err(FrameError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                frame_width: self.width,
                frame_height: self.height,
            });
        }

        let src_stride = self.width as usize * 3;
        let row_bytes = width as usize * 3;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in y..y + height {
            let start = row as usize * src_stride + x as usize * 3;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        Ok(Frame {
            data,
            width,
            height,
            timestamp: self.timestamp,
            sequence: self.sequence,
        })
    }

    /// Packed RGB copy of the pixel data, for emission to the display.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        rgb
    }

    /// Bilinear resize. Returns a clone when the dimensions already match,
    /// which is the expected case for crop output.
    pub fn resize(&self, new_width: u32, new_height: u32) -> Frame {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let nw = new_width as usize;
        let nh = new_height as usize;
        let scale_x = w as f32 / nw as f32;
        let scale_y = h as f32 / nh as f32;

        let mut data = vec![0u8; nw * nh * 3];
        for y in 0..nh {
            let src_y = (y as f32 + 0.5) * scale_y - 0.5;
            let y0 = (src_y.floor() as i64).clamp(0, h as i64 - 1) as usize;
            let y1 = (y0 + 1).min(h - 1);
            let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

            for x in 0..nw {
                let src_x = (x as f32 + 0.5) * scale_x - 0.5;
                let x0 = (src_x.floor() as i64).clamp(0, w as i64 - 1) as usize;
                let x1 = (x0 + 1).min(w - 1);
                let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

                for c in 0..3 {
                    let tl = self.data[(y0 * w + x0) * 3 + c] as f32;
                    let tr = self.data[(y0 * w + x1) * 3 + c] as f32;
                    let bl = self.data[(y1 * w + x0) * 3 + c] as f32;
                    let br = self.data[(y1 * w + x1) * 3 + c] as f32;
                    let val = tl * (1.0 - fx) * (1.0 - fy)
                        + tr * fx * (1.0 - fy)
                        + bl * (1.0 - fx) * fy
                        + br * fx * fy;
                    data[(y * nw + x) * 3 + c] = val.round().clamp(0.0, 255.0) as u8;
                }
            }
        }

        Frame {
            data,
            width: new_width,
            height: new_height,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

/// Convert packed YUYV (4:2:2) to packed BGR using BT.601 coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; U and V are shared
/// by the pixel pair.
pub fn yuyv_to_bgr(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut bgr = Vec::with_capacity(pixels * 3);
    for quad in yuyv[..expected].chunks_exact(4) {
        let u = quad[1] as f32 - 128.0;
        let v = quad[3] as f32 - 128.0;
        for &y in &[quad[0], quad[2]] {
            let c = 1.164 * (y as f32 - 16.0);
            let b = (c + 2.017 * u).round().clamp(0.0, 255.0) as u8;
            let g = (c - 0.392 * u - 0.813 * v).round().clamp(0.0, 255.0) as u8;
            let r = (c + 1.596 * v).round().clamp(0.0, 255.0) as u8;
            bgr.extend_from_slice(&[b, g, r]);
        }
    }
    Ok(bgr)
}
