use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use super::page::{place, PageFormat, Placement};
use crate::config::FitPolicy;
use crate::error::{Error, ErrorKind, Result};

const MM_PER_INCH: f32 = 25.4;

/// An encoded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Assembles bitmaps into a binary document.
pub trait DocumentWriter: Send {
    fn assemble(
        &mut self,
        image: &RgbImage,
        page: PageFormat,
        fill: f32,
        policy: FitPolicy,
        title: &str,
    ) -> Result<Document>;
}

#[derive(Debug, Default)]
pub struct PrintPdfWriter;

impl PrintPdfWriter {
    pub fn new() -> Self {
        PrintPdfWriter
    }
}

impl DocumentWriter for PrintPdfWriter {
    fn assemble(
        &mut self,
        image: &RgbImage,
        page: PageFormat,
        fill: f32,
        policy: FitPolicy,
        title: &str,
    ) -> Result<Document> {
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(Error::new(ErrorKind::GenerationFailed, "empty image"));
        }

        let placements = place(width_px, height_px, page, fill, policy);

        let (doc, first_page, first_layer) = PdfDocument::new(
            title,
            Mm(page.width_mm),
            Mm(page.height_mm),
            "Calendar",
        );

        for (idx, placement) in placements.iter().enumerate() {
            let layer = if idx == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_idx, layer_idx) =
                    doc.add_page(Mm(page.width_mm), Mm(page.height_mm), "Calendar");
                doc.get_page(page_idx).get_layer(layer_idx)
            };

            xobject(image).add_to_layer(layer, transform(placement, width_px, page));
        }

        let bytes = doc.save_to_bytes()?;
        log::debug!(
            "Assembled {} page(s), {} bytes, from a {}x{} image",
            placements.len(),
            bytes.len(),
            width_px,
            height_px
        );

        Ok(Document {
            bytes,
            pages: placements.len(),
        })
    }
}

fn xobject(image: &RgbImage) -> Image {
    let (width, height) = image.dimensions();
    Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: image.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    })
}

/// PDF places images by their bottom-left corner, measured from the bottom of the
/// page, and sizes them through the DPI.
fn transform(placement: &Placement, width_px: u32, page: PageFormat) -> ImageTransform {
    let dpi = width_px as f32 / (placement.width_mm / MM_PER_INCH);
    ImageTransform {
        translate_x: Some(Mm(placement.x_mm)),
        translate_y: Some(Mm(page.height_mm - placement.y_mm - placement.height_mm)),
        dpi: Some(dpi),
        ..Default::default()
    }
}
