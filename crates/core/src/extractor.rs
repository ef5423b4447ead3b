use crate::error::ExtractionError;
use lopdf::Document;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor: Send + Sync {
    /// Returns one entry per page, in page order. Pages without readable text carry an empty string.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = self.extract_pages(bytes)?;
        Ok(join_pages(&pages))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

        let pages = document
            .get_pages()
            .into_keys()
            .map(|page_no| {
                let text = document.extract_text(&[page_no]).unwrap_or_else(|error| {
                    warn!(page = page_no, %error, "page has no extractable text");
                    String::new()
                });
                PageText {
                    number: page_no,
                    text,
                }
            })
            .collect();

        Ok(pages)
    }
}

pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn extract_page_texts(bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
    LopdfExtractor.extract_pages(bytes)
}

#[cfg(test)]
mod tests {
    use super::{join_pages, LopdfExtractor, PageText, PdfExtractor};
    use crate::error::ExtractionError;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn two_page_pdf() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello World!")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let first_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let blank_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![first_page.into(), blank_page.into()],
            "Count" => 2,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    #[test]
    fn pages_are_extracted_in_order_and_blank_pages_are_kept() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = two_page_pdf()?;
        let pages = LopdfExtractor.extract_pages(&bytes)?;

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        assert!(pages[0].text.contains("Hello World"));
        assert!(pages[1].text.trim().is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_buffer_is_an_extraction_error() {
        let result = LopdfExtractor.extract_text(b"%PDF-1.4\n%broken");
        assert!(matches!(result, Err(ExtractionError::PdfParse(_))));

        let result = LopdfExtractor.extract_text(b"not a pdf at all");
        assert!(matches!(result, Err(ExtractionError::PdfParse(_))));
    }

    #[test]
    fn empty_pages_keep_their_slot_when_joined() {
        let pages = vec![
            PageText {
                number: 1,
                text: "first".to_string(),
            },
            PageText {
                number: 2,
                text: String::new(),
            },
            PageText {
                number: 3,
                text: "third".to_string(),
            },
        ];

        assert_eq!(join_pages(&pages), "first\n\nthird");
    }
}
