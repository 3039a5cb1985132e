//! Single-page PDF assembly from image sources
//!
//! Scanned uploads arriving as PNG or JPEG are normalized to PDF before
//! filing so the indexed buckets hold a uniform format. The image is
//! re-encoded as JPEG and embedded as a DCTDecode XObject on a page
//! sized to the pixel dimensions (one pixel per point).

use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

use crate::error::{Error, Result};

const JPEG_QUALITY: u8 = 90;

/// Decode `src` and write a one-page PDF containing it to `dest`
pub fn image_to_pdf(src: &Path, dest: &Path) -> Result<()> {
    let filename = src.display().to_string();

    let img = image::open(src).map_err(|e| Error::conversion(&filename, e.to_string()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(
            rgb.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::conversion(&filename, e.to_string()))?;

    let doc = assemble_pdf(jpeg, width, height);
    save_pdf(doc, dest).map_err(|e| Error::conversion(&filename, e.to_string()))
}

fn assemble_pdf(jpeg: Vec<u8>, width: u32, height: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
    });

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ", width, height);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save_pdf(mut doc: Document, dest: &Path) -> std::result::Result<(), lopdf::Error> {
    doc.compress();
    doc.save(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_becomes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("page.png");
        let dest = dir.path().join("page.pdf");
        image::RgbImage::from_pixel(16, 12, image::Rgb([10, 120, 240]))
            .save(&src)
            .unwrap();

        image_to_pdf(&src, &dest).unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // Source is left in place; the caller decides when to remove it
        assert!(src.exists());
    }

    #[test]
    fn test_undecodable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("fake.png");
        let dest = dir.path().join("fake.pdf");
        std::fs::write(&src, b"definitely not a png").unwrap();

        let err = image_to_pdf(&src, &dest).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert!(!dest.exists());
    }
}
