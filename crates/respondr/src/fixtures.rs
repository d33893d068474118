//! Minimal text-layer PDF writer and a set of sample safety documents.

use lopdf::{dictionary, Document, Object, Stream};

const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const TOP_MARGIN: i64 = 750;
const LEFT_MARGIN: i64 = 50;

/// Builds a PDF with one page per entry of `pages`, each line of a page
/// rendered as its own text object in Courier.
pub fn build_text_pdf<S: AsRef<str>>(pages: &[Vec<S>]) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(lines)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn page_content<S: AsRef<str>>(lines: &[S]) -> Vec<u8> {
    let mut content = String::new();
    for (index, line) in lines.iter().enumerate() {
        let y = TOP_MARGIN - LEADING * index as i64;
        content.push_str(&format!(
            "BT /F1 {FONT_SIZE} Tf {LEFT_MARGIN} {y} Td ({}) Tj ET\n",
            escape_pdf_string(line.as_ref())
        ));
    }
    content.into_bytes()
}

/// Escapes a literal string operand; non-ASCII characters become `?`.
fn escape_pdf_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// A sample document ready to be rendered with [`build_text_pdf`].
#[derive(Debug, Clone)]
pub struct SampleDocument {
    pub file_name: &'static str,
    pub pages: Vec<Vec<&'static str>>,
}

impl SampleDocument {
    pub fn to_pdf(&self) -> Result<Vec<u8>, lopdf::Error> {
        build_text_pdf(&self.pages)
    }
}

pub fn sample_documents() -> Vec<SampleDocument> {
    vec![
        SampleDocument {
            file_name: "evacuation_plan.pdf",
            pages: vec![
                vec![
                    "Emergency Evacuation Plan - Building A",
                    "Version 2.1",
                    "Effective Date: 01/15/2024",
                    "Prepared by: Dana Whitfield",
                    "Site: Building A, Floor 3, Richmond, VA",
                    "Purpose: orderly evacuation during fire, flood or other disaster.",
                ],
                vec![
                    "Security officers clear each floor and meet responders.",
                    "The safety team decides when re-entry is allowed.",
                    "Assembly point: north parking lot.",
                    "Security desk: 555-201-4400",
                ],
            ],
        },
        SampleDocument {
            file_name: "chemical_storage_sop.pdf",
            pages: vec![vec![
                "Standard Operating Procedure: Chemical Storage",
                "Version 3.0",
                "Effective Date: 02/01/2024",
                "Author: Priya Raman",
                "Location: Room 301, Building B",
                "This procedure covers receiving and storing corrosive and toxic materials.",
                "Report any spill to EHS at ehs-desk@example.com.",
            ]],
        },
        SampleDocument {
            file_name: "loading_dock_incident_report.pdf",
            pages: vec![vec![
                "Incident Report: Loading Dock Injury",
                "Date: 03/12/2024",
                "Written by: Marcus Bell",
                "Location: Building C, Floor 1",
                "A forklift struck a pallet rack; one worker had a minor injury.",
                "First aid was given by the site nurse. Maintenance inspected the rack.",
            ]],
        },
        SampleDocument {
            file_name: "visitor_access_policy.pdf",
            pages: vec![vec![
                "Visitor Access Policy",
                "Rev. 1.4",
                "Effective: 04/01/2024",
                "All visitors sign in with the security guard at the front desk.",
                "This policy supports compliance with the corporate guideline on site access.",
            ]],
        },
        SampleDocument {
            file_name: "fire_warden_training.pdf",
            pages: vec![vec![
                "Fire Warden Training Course",
                "v1.2",
                "This workshop prepares floor wardens for fire and smoke events.",
                "Certification is renewed every year by Human Resources.",
            ]],
        },
    ]
}
