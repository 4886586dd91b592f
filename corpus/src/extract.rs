use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use thiserror::Error;

use crate::legacy_doc::{self, CfbStreams, DecodeError};
use crate::types::TermDictionary;

/// Closed set of supported document formats, resolved once from the
/// extension chain at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Pdf,
    OfficeXml,
    LegacyBinary,
    Unsupported,
}

impl DocFormat {
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".pdf" => DocFormat::Pdf,
            ".docx" => DocFormat::OfficeXml,
            ".doc" => DocFormat::LegacyBinary,
            _ => DocFormat::Unsupported,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No relevant parser implemented")]
    NoParser,
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("docx extraction failed: {0}")]
    OfficeXml(String),
    #[error(transparent)]
    LegacyDoc(#[from] DecodeError),
}

/// Turn raw document bytes into a per-document term dictionary.
///
/// PDF and docx delegate to collaborator crates; the legacy binary
/// format goes through our own decoder. All paths tokenize on
/// whitespace and normalize identically.
pub fn parse_document(format: DocFormat, data: &[u8]) -> Result<TermDictionary, ExtractError> {
    match format {
        DocFormat::Pdf => parse_pdf(data),
        DocFormat::OfficeXml => parse_docx(data),
        DocFormat::LegacyBinary => parse_legacy_doc(data),
        DocFormat::Unsupported => Err(ExtractError::NoParser),
    }
}

fn parse_pdf(data: &[u8]) -> Result<TermDictionary, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(TermDictionary::from_text(&text))
}

/// Unzip the container, parse the main document part, and count the
/// text runs inside paragraph elements.
fn parse_docx(data: &[u8]) -> Result<TermDictionary, ExtractError> {
    let err = |e: &dyn std::fmt::Display| ExtractError::OfficeXml(e.to_string());

    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| err(&e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| err(&e))?
        .read_to_string(&mut xml)
        .map_err(|e| err(&e))?;

    let mut reader = Reader::from_str(&xml);
    let mut dict = TermDictionary::default();
    let mut paragraph_depth = 0usize;
    let mut in_text_run = false;
    loop {
        match reader.read_event().map_err(|e| err(&e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => paragraph_depth += 1,
                b"t" if paragraph_depth > 0 => in_text_run = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => paragraph_depth = paragraph_depth.saturating_sub(1),
                b"t" => in_text_run = false,
                _ => {}
            },
            Event::Text(e) if in_text_run => {
                let text = e.unescape().map_err(|e| err(&e))?;
                dict.extend_tokens(text.split_whitespace());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(dict)
}

fn parse_legacy_doc(data: &[u8]) -> Result<TermDictionary, ExtractError> {
    let mut streams = CfbStreams::open(data.to_vec())?;
    let text = legacy_doc::extract_text(&mut streams)?;
    Ok(TermDictionary::from_text(&text))
}
