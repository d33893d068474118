use std::io::Cursor;
use std::process::Command;
use std::sync::Arc;

use crate::error::OcrError;

/// Page recogniser: renders PDF pages with `pdftoppm` (poppler-utils) and
/// runs Tesseract over the image.
#[derive(Clone)]
pub struct TesseractRecognizer {
    inner: Arc<RecognizerSettings>,
}

struct RecognizerSettings {
    languages: String,
    dpi: u32,
}

impl TesseractRecognizer {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let languages = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(RecognizerSettings { languages, dpi }),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    pub fn recognize_page(&self, pdf_bytes: &[u8], page_num: u32) -> Result<String, OcrError> {
        let image = render_page(pdf_bytes, page_num, self.inner.dpi)?;
        self.recognize_image(&image)
    }

    /// Recognises every page of a PDF lopdf could not parse; the page count
    /// comes from `pdfinfo`.
    pub fn recognize_pdf(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
        let page_count = count_pages(pdf_bytes)?;
        (1..=page_count)
            .map(|page_num| self.recognize_page(pdf_bytes, page_num))
            .collect()
    }

    pub fn recognize_image(&self, image_data: &[u8]) -> Result<String, OcrError> {
        let _span = tracing::info_span!("ocr.tesseract").entered();

        let img = image::load_from_memory(image_data)
            .map_err(|e| OcrError::Service(format!("failed to load image: {e}")))?;

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| OcrError::Service(format!("failed to convert image: {e}")))?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages)
            .map_err(|e| OcrError::Service(format!("failed to initialize Tesseract: {e}")))?;
        lt.set_image_from_mem(&png_data)
            .map_err(|e| OcrError::Service(format!("failed to set image: {e}")))?;
        lt.get_utf8_text()
            .map_err(|e| OcrError::Service(format!("recognition failed: {e}")))
    }
}

struct TempPdf(std::path::PathBuf);

impl TempPdf {
    fn write(pdf_bytes: &[u8]) -> Result<Self, OcrError> {
        let path = std::env::temp_dir().join(format!("respondr_{}.pdf", uuid::Uuid::new_v4()));
        std::fs::write(&path, pdf_bytes)
            .map_err(|e| OcrError::Service(format!("failed to write temp PDF: {e}")))?;
        Ok(Self(path))
    }
}

impl Drop for TempPdf {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn count_pages(pdf_bytes: &[u8]) -> Result<u32, OcrError> {
    let pdf = TempPdf::write(pdf_bytes)?;
    let output = Command::new("pdfinfo").arg(&pdf.0).output().map_err(|e| {
        OcrError::Service(format!("failed to run pdfinfo: {e}. Is poppler-utils installed?"))
    })?;

    if !output.status.success() {
        return Err(OcrError::Service(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
        .ok_or_else(|| OcrError::Service("pdfinfo reported no page count".to_string()))
}

fn render_page(pdf_bytes: &[u8], page_num: u32, dpi: u32) -> Result<Vec<u8>, OcrError> {
    let pdf = TempPdf::write(pdf_bytes)?;
    let output_prefix = std::env::temp_dir().join(format!("respondr_page_{}", uuid::Uuid::new_v4()));
    let page = page_num.to_string();

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page])
        .arg(&pdf.0)
        .arg(&output_prefix)
        .output()
        .map_err(|e| {
            OcrError::Service(format!("failed to run pdftoppm: {e}. Is poppler-utils installed?"))
        })?;

    if !output.status.success() {
        return Err(OcrError::Service(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm zero-pads the page suffix depending on the document's page count.
    let prefix = output_prefix.display();
    let candidates = [
        format!("{prefix}-{page_num}.png"),
        format!("{prefix}-{page_num:02}.png"),
        format!("{prefix}-{page_num:03}.png"),
    ];
    let image_path = candidates
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .ok_or_else(|| OcrError::Service("rendered page image not found".to_string()))?;

    let image = std::fs::read(image_path)
        .map_err(|e| OcrError::Service(format!("failed to read rendered page: {e}")));
    let _ = std::fs::remove_file(image_path);
    image
}
