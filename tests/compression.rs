mod common;

use common::fixtures::{bmp_asset, encode, png_asset};
use facelab_client::{ClientError, CompressOptions, ImageAsset, ImageCompressor};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

const MIB: u64 = 1024 * 1024;

fn noise_rgb(width: u32, height: u32) -> RgbImage {
    let mut seed = 0x9e37_79b9_u32;
    RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    })
}

fn jpeg_at(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(img).unwrap();
    bytes
}

#[test]
fn large_bitmap_is_resized_and_reencoded() {
    let original = bmp_asset("photo.bmp", 4000, 3000);
    assert!(original.size() > 2 * MIB);

    let compressed = ImageCompressor::default().compress(&original).unwrap();

    assert_eq!(compressed.name(), "photo.bmp");
    assert_eq!(compressed.mime(), "image/jpeg");
    assert!(compressed.size() <= 2 * MIB, "{} bytes", compressed.size());
    let decoded = image::load_from_memory(compressed.bytes()).unwrap();
    let (w, h) = decoded.dimensions();
    assert!(w <= 1920 && h <= 1920);
    let aspect = w as f64 / h as f64;
    assert!((aspect - 4.0 / 3.0).abs() / (4.0 / 3.0) < 0.01, "{w}x{h}");
    assert_eq!(compressed.dimensions().unwrap().width, w);
}

#[test]
fn tall_image_is_clamped_on_height() {
    let original = bmp_asset("tall.bmp", 1000, 3000);
    let compressed = ImageCompressor::default().compress(&original).unwrap();
    let dims = compressed.dimensions().unwrap();
    assert_eq!(dims.height, 1920);
    assert_eq!(dims.width, 640);
}

#[test]
fn small_file_passes_through_untouched() {
    let original = png_asset("small.png", 64, 64);
    let compressed = ImageCompressor::default().compress(&original).unwrap();
    assert!(compressed.shares_bytes(&original));
    assert_eq!(compressed.mime(), "image/png");
}

#[test]
fn transparent_pixels_flatten_to_black() {
    // Noise keeps the PNG over the limit; the left half is fully transparent.
    let mut seed = 0x2545_f491_u32;
    let img = RgbaImage::from_fn(1200, 1200, |x, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgba([r, g, b, if x < 600 { 0 } else { 255 }])
    });
    let original = ImageAsset::new("noise.png", "image/png", encode(DynamicImage::ImageRgba8(img), ImageFormat::Png));
    assert!(original.size() > 2 * MIB);

    let compressed = ImageCompressor::default().compress(&original).unwrap();

    let decoded = image::load_from_memory(compressed.bytes()).unwrap().to_rgb8();
    let px = decoded.get_pixel(100, decoded.height() / 2);
    assert!(px.0.iter().all(|&c| c <= 8), "{px:?}");
}

#[test]
fn reencode_never_grows_an_image_already_inside_the_bounds() {
    let noise = noise_rgb(600, 600);
    let original = ImageAsset::new("noise.jpg", "image/jpeg", jpeg_at(&noise, 40));
    // Straight re-encode at the configured quality would be larger.
    assert!(jpeg_at(&noise, 85).len() as u64 > original.size());
    let options = CompressOptions { max_size_bytes: 1, ..Default::default() };

    let compressed = ImageCompressor::new(options).compress(&original).unwrap();

    assert!(compressed.size() <= original.size(), "grew: {} -> {}", original.size(), compressed.size());
    assert!(!compressed.shares_bytes(&original));
    assert_eq!(compressed.mime(), "image/jpeg");
    let dims = compressed.dimensions().unwrap();
    assert_eq!((dims.width, dims.height), (600, 600));
}

#[test]
fn input_smaller_than_any_jpeg_is_an_encode_error() {
    let tiny = png_asset("dot.png", 4, 4);
    let options = CompressOptions { max_size_bytes: 1, ..Default::default() };
    let err = ImageCompressor::new(options).compress(&tiny).unwrap_err();
    assert!(matches!(err, ClientError::Encode { ref name, .. } if name == "dot.png"), "{err}");
}

#[test]
fn undecodable_input_is_a_decode_error() {
    let garbage = ImageAsset::new("garbage.jpg", "image/jpeg", vec![7u8; 3 * MIB as usize]);
    let err = ImageCompressor::default().compress(&garbage).unwrap_err();
    assert!(matches!(err, ClientError::Decode { ref name, .. } if name == "garbage.jpg"));
}

#[test]
fn custom_limits_are_respected() {
    let options = CompressOptions { max_width: 320, max_height: 320, max_size_bytes: 1, ..Default::default() };
    let compressed = ImageCompressor::new(options).compress(&bmp_asset("p.bmp", 800, 400)).unwrap();
    let dims = compressed.dimensions().unwrap();
    assert_eq!((dims.width, dims.height), (320, 160));
}

#[tokio::test]
async fn batch_keeps_order() {
    let options = CompressOptions { max_size_bytes: 1, max_width: 100, max_height: 100, ..Default::default() };
    let inputs = vec![bmp_asset("a.bmp", 400, 200), bmp_asset("b.bmp", 200, 400), bmp_asset("c.bmp", 60, 60)];

    let outputs = ImageCompressor::new(options).compress_all(inputs).await.unwrap();

    let names: Vec<&str> = outputs.iter().map(ImageAsset::name).collect();
    assert_eq!(names, ["a.bmp", "b.bmp", "c.bmp"]);
    assert_eq!(outputs[0].dimensions().unwrap().height, 50);
    assert_eq!(outputs[1].dimensions().unwrap().width, 50);
}

#[tokio::test]
async fn file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.bmp");
    tokio::fs::write(&input, bmp_asset("scan.bmp", 2600, 1300).bytes()).await.unwrap();

    let asset = ImageAsset::from_path(&input).await.unwrap();
    assert_eq!(asset.mime(), "image/bmp");
    let compressed = ImageCompressor::default().compress_async(asset).await.unwrap();

    let output = dir.path().join("scan.jpg");
    tokio::fs::write(&output, compressed.bytes()).await.unwrap();
    let reread = ImageAsset::from_path(&output).await.unwrap();
    assert_eq!(reread.mime(), "image/jpeg");
    let dims = reread.dimensions().unwrap();
    assert_eq!((dims.width, dims.height), (1920, 960));
}
