#![allow(dead_code)]

pub mod image_server;
pub mod scripted;

use image::{ImageFormat, RgbImage};
use std::io::Cursor;

/// A small valid image encoded as `format`.
pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]))
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}
