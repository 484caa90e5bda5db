// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic page photographs for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use notescan_core::Point2D;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub const BACKGROUND: u8 = 30;
pub const PAPER: u8 = 230;

/// A light rectangular page rotated about the image centre on a dark table.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPage {
    pub width: u32,
    pub height: u32,
    pub page_w: f64,
    pub page_h: f64,
    pub angle_deg: f64,
}

impl SyntheticPage {
    /// 1000 x 1300 photograph of a 600 x 850 page turned by 5 degrees.
    pub fn tilted() -> Self {
        Self {
            width: 1000,
            height: 1300,
            page_w: 600.0,
            page_h: 850.0,
            angle_deg: 5.0,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.page_w / self.page_h
    }

    fn center(&self) -> Point2D {
        Point2D::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// True when pixel centre (x, y) lies on the page.
    fn on_page(&self, x: f64, y: f64) -> bool {
        let c = self.center();
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        let (dx, dy) = (x - c.x, y - c.y);
        // Rotate back into the page frame.
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;
        u.abs() <= self.page_w / 2.0 && v.abs() <= self.page_h / 2.0
    }

    /// Page corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point2D; 4] {
        let c = self.center();
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        let (hw, hh) = (self.page_w / 2.0, self.page_h / 2.0);
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(u, v)| Point2D::new(c.x + u * cos - v * sin, c.y + u * sin + v * cos))
    }

    pub fn render(&self) -> DynamicImage {
        let img = GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.on_page(x as f64, y as f64) {
                Luma([PAPER])
            } else {
                Luma([BACKGROUND])
            }
        });
        DynamicImage::ImageLuma8(img)
    }
}

/// Featureless image with no page boundary at all.
pub fn blank(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([128u8])))
}

/// Uniformly random pixels, grayscale or colour.
pub fn noise(width: u32, height: u32, seed: u64, colour: bool) -> DynamicImage {
    let channels = if colour { 3 } else { 1 };
    let mut data = vec![0u8; (width * height * channels) as usize];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    if colour {
        DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, data).expect("rgb buffer"))
    } else {
        DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, data).expect("gray buffer"))
    }
}

/// 1000 x 1000 photograph of a page whose bottom-right corner lies far past
/// the frame: three corners are visible, the fourth is at (1500, 1500).
pub fn cut_off_page() -> DynamicImage {
    let corners = [
        Point2D::new(200.0, 200.0),
        Point2D::new(800.0, 200.0),
        Point2D::new(1500.0, 1500.0),
        Point2D::new(200.0, 800.0),
    ];
    let img = GrayImage::from_fn(1000, 1000, |x, y| {
        let p = Point2D::new(x as f64, y as f64);
        // Convex and clockwise in image coordinates: inside when every edge
        // turns the same way.
        let inside = (0..4).all(|i| {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x) >= 0.0
        });
        Luma([if inside { PAPER } else { BACKGROUND }])
    });
    DynamicImage::ImageLuma8(img)
}
