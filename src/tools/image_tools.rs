use std::io::Cursor;

use image::{imageops::{self, FilterType}, DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::{tools::detection::FaceRegion, Error, Result};

/// Width of one resized half face, and thus half of the final composite.
pub const HALF_WIDTH: u32 = 125;
/// Shared height of both halves and of the final composite.
pub const HALF_HEIGHT: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HalfSide {
    Left,
    Right,
}

/// Crop rectangle within a source image, already clamped to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub fn load_image(data: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(data)?)
}

/// Row-major grayscale buffer for the detector.
pub fn to_gray(image: &DynamicImage) -> (Vec<u8>, u32, u32) {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    (gray.into_raw(), width, height)
}

/// Lateral half of a detected face box, relative to the box itself.
/// The detector can hand back boxes that poke past the frame, so the result
/// is clamped to the image dimensions.
pub fn half_region(face: &FaceRegion, side: HalfSide, image_width: u32, image_height: u32) -> Result<CropRegion> {
    let half_width = face.width / 2;
    let crop_x = match side {
        HalfSide::Left => face.x,
        HalfSide::Right => face.x + half_width as i32,
    };

    let x = crop_x.max(0) as u32;
    let y = face.y.max(0) as u32;
    if x >= image_width || y >= image_height {
        return Err(Error::Error { message: format!("Face region {:?} outside image {}x{}", face, image_width, image_height) });
    }
    let width = half_width.min(image_width - x);
    let height = face.height.min(image_height - y);
    if width == 0 || height == 0 {
        return Err(Error::Error { message: format!("Empty half crop for face region {:?}", face) });
    }

    Ok(CropRegion { x, y, width, height })
}

/// Extract one lateral half of the face and bring it to the shared half
/// geometry (cover fit, like the original pipeline).
pub fn crop_half_face(image: &DynamicImage, face: &FaceRegion, side: HalfSide) -> Result<DynamicImage> {
    let region = half_region(face, side, image.width(), image.height())?;
    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    Ok(cropped.resize_to_fill(HALF_WIDTH, HALF_HEIGHT, FilterType::Lanczos3))
}

/// Composite two equally sized halves side by side on a transparent canvas
/// and encode as PNG. Both halves share the same geometry by construction;
/// the check guards against a malformed canvas all the same.
pub fn blend_halves(left: &DynamicImage, right: &DynamicImage) -> Result<Vec<u8>> {
    if left.width() != right.width() || left.height() != right.height() {
        return Err(Error::Error { message: format!("Mismatched half sizes {}x{} vs {}x{}", left.width(), left.height(), right.width(), right.height()) });
    }

    let mut canvas = RgbaImage::from_pixel(left.width() * 2, left.height(), Rgba([255, 255, 255, 0]));
    imageops::overlay(&mut canvas, &left.to_rgba8(), 0, 0);
    imageops::overlay(&mut canvas, &right.to_rgba8(), left.width() as i64, 0);

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Full alignment geometry: left half of the target face, right half of the
/// swap face, both resized to the shared half size, composited into one PNG.
pub fn align_faces(target: &DynamicImage, target_face: &FaceRegion, swap: &DynamicImage, swap_face: &FaceRegion) -> Result<Vec<u8>> {
    let left = crop_half_face(target, target_face, HalfSide::Left)?;
    let right = crop_half_face(swap, swap_face, HalfSide::Right)?;
    blend_halves(&left, &right)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: i32, y: i32, width: u32, height: u32) -> FaceRegion {
        FaceRegion { x, y, width, height, score: 1.0 }
    }

    fn flat_image(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn half_regions_follow_face_box() {
        // target 800x600 with face box (100,50,200,200)
        let left = half_region(&region(100, 50, 200, 200), HalfSide::Left, 800, 600).unwrap();
        assert_eq!(left, CropRegion { x: 100, y: 50, width: 100, height: 200 });

        // swap 600x800 with face box (50,100,150,150)
        let right = half_region(&region(50, 100, 150, 150), HalfSide::Right, 600, 800).unwrap();
        assert_eq!(right, CropRegion { x: 125, y: 100, width: 75, height: 150 });
    }

    #[test]
    fn half_region_clamps_to_image() {
        let clamped = half_region(&region(-10, -5, 100, 100), HalfSide::Left, 60, 60).unwrap();
        assert_eq!(clamped.x, 0);
        assert_eq!(clamped.y, 0);
        assert_eq!(clamped.width, 50);
        assert_eq!(clamped.height, 60);

        let off = half_region(&region(200, 10, 100, 100), HalfSide::Left, 60, 60);
        assert!(off.is_err());
    }

    #[test]
    fn composite_has_fixed_geometry() {
        let target = flat_image(800, 600, [255, 0, 0, 255]);
        let swap = flat_image(600, 800, [0, 0, 255, 255]);

        let png = align_faces(&target, &region(100, 50, 200, 200), &swap, &region(50, 100, 150, 150)).unwrap();
        let composite = image::load_from_memory(&png).unwrap();
        assert_eq!(composite.width(), HALF_WIDTH * 2);
        assert_eq!(composite.height(), HALF_HEIGHT);

        // target colors on the left, swap colors on the right
        let rgba = composite.to_rgba8();
        assert_eq!(rgba.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(rgba.get_pixel(HALF_WIDTH + 10, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn composite_is_deterministic() {
        let target = flat_image(400, 400, [10, 20, 30, 255]);
        let swap = flat_image(500, 300, [40, 50, 60, 255]);
        let face_a = region(40, 40, 120, 160);
        let face_b = region(100, 30, 90, 110);

        let first = align_faces(&target, &face_a, &swap, &face_b).unwrap();
        let second = align_faces(&target, &face_a, &swap, &face_b).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_halves_rejected() {
        let left = flat_image(125, 250, [0, 0, 0, 255]);
        let right = flat_image(100, 250, [0, 0, 0, 255]);
        assert!(blend_halves(&left, &right).is_err());
    }
}
