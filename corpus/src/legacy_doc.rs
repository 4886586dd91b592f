//! From-scratch decoder for legacy binary Word documents.
//!
//! The document lives inside a compound-file container exposing named
//! streams. The decoder itself only needs "read stream by name", so the
//! container is abstracted behind [`StreamProvider`]; [`CfbStreams`] is
//! the production implementation.

use lazy_static::lazy_static;
use regex::Regex;
use std::io::{Cursor, Read};
use thiserror::Error;

pub const WORD_DOCUMENT_STREAM: &str = "/WordDocument";
pub const TABLE_STREAM_1: &str = "/1Table";
pub const TABLE_STREAM_0: &str = "/0Table";

const MAGIC_WORD97: u16 = 0xA5EC;
const MAGIC_WORD95: u16 = 0xA5DC;

lazy_static! {
    static ref NON_ASCII_8: Regex = Regex::new(r"[\x7F-\xFF]").expect("valid regex");
    static ref NON_ASCII_16: Regex = Regex::new(r"[\x7F-\u{FFFF}]").expect("valid regex");
    // Table cell and column separators embedded in the text stream.
    static ref TABLE_CLEAN: Regex = Regex::new(r"[\x01-\x08]").expect("valid regex");
    // Field escape: begin marker, HYPERLINK keyword, quoted URI,
    // separator marker, display text, end marker.
    static ref HYPERLINK: Regex =
        Regex::new("\u{13}.*HYPERLINK.*\"(?P<uri>.*)\".*\u{14}(?P<display>.*)\u{15}")
            .expect("valid regex");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid format - not a legacy Word file")]
    UnsupportedFormat,
    #[error("unsupported Word version {0}")]
    UnsupportedVersion(u16),
    #[error("not a compound-file container: {0}")]
    Container(String),
    #[error("stream `{0}` is missing or unreadable")]
    Stream(String),
    #[error("no table stream found")]
    MissingTableStream,
    #[error("invalid piece table marker in the table stream")]
    InvalidTableMarker,
    #[error("piece table has no final character position")]
    MalformedTable,
    #[error("stream truncated at offset {0}")]
    Truncated(usize),
}

/// Byte access to the named streams of a compound-file container.
pub trait StreamProvider {
    fn has_stream(&self, name: &str) -> bool;
    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>, DecodeError>;
}

/// [`StreamProvider`] backed by an in-memory compound file.
pub struct CfbStreams {
    inner: cfb::CompoundFile<Cursor<Vec<u8>>>,
}

impl CfbStreams {
    pub fn open(data: Vec<u8>) -> Result<Self, DecodeError> {
        let inner = cfb::CompoundFile::open(Cursor::new(data))
            .map_err(|e| DecodeError::Container(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl StreamProvider for CfbStreams {
    fn has_stream(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn read_stream(&mut self, name: &str) -> Result<Vec<u8>, DecodeError> {
        let mut stream = self
            .inner
            .open_stream(name)
            .map_err(|_| DecodeError::Stream(name.to_string()))?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|_| DecodeError::Stream(name.to_string()))?;
        Ok(buf)
    }
}

fn get_u8(buf: &[u8], off: usize) -> Result<u8, DecodeError> {
    buf.get(off).copied().ok_or(DecodeError::Truncated(off))
}

fn get_u16(buf: &[u8], off: usize) -> Result<u16, DecodeError> {
    buf.get(off..off + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(DecodeError::Truncated(off))
}

fn get_u32(buf: &[u8], off: usize) -> Result<u32, DecodeError> {
    buf.get(off..off + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(DecodeError::Truncated(off))
}

/// Decode the document text from a legacy Word container.
///
/// Supports the Word 95 generation (text bounded by a start/end offset
/// pair) and Word 97 and later (text split into runs described by a
/// piece table inside the table stream). Structural failures are
/// per-document: the caller records the reason and moves on.
pub fn extract_text(streams: &mut dyn StreamProvider) -> Result<String, DecodeError> {
    let word_stream = streams.read_stream(WORD_DOCUMENT_STREAM)?;

    let magic = get_u16(&word_stream, 0)?;
    let version = get_u16(&word_stream, 2)?;
    let _flags = get_u16(&word_stream, 10)?;
    if magic != MAGIC_WORD97 && magic != MAGIC_WORD95 {
        return Err(DecodeError::UnsupportedFormat);
    }

    if version < 101 {
        Err(DecodeError::UnsupportedVersion(version))
    } else if version == 101 || (103..105).contains(&version) {
        tracing::debug!(version, "decoding Word 95 class document");
        decode_word95(&word_stream)
    } else if version >= 193 {
        tracing::debug!(version, "decoding Word 97 class document");
        decode_word97(streams, &word_stream)
    } else {
        Err(DecodeError::UnsupportedVersion(version))
    }
}

/// Word marks hyperlinks up as field escapes; keep the display text and
/// the target instead of dropping both.
fn clean_hyperlinks(buff: &str) -> String {
    HYPERLINK
        .replace_all(buff, "${display} (link: ${uri})")
        .into_owned()
}

fn clean_narrow(raw: &[u8]) -> String {
    let buff = String::from_utf8_lossy(raw);
    let buff = NON_ASCII_8.replace_all(&buff, "");
    let buff = TABLE_CLEAN.replace_all(&buff, " ");
    clean_hyperlinks(&buff)
}

fn clean_wide(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let buff = String::from_utf16_lossy(&units);
    let buff = clean_hyperlinks(&buff);
    let buff = NON_ASCII_16.replace_all(&buff, "");
    TABLE_CLEAN.replace_all(&buff, " ").into_owned()
}

/// Word 95 keeps the whole text as one single-byte region whose bounds
/// sit near the start of the stream.
fn decode_word95(doc: &[u8]) -> Result<String, DecodeError> {
    let start = get_u32(doc, 0x18)? as usize;
    let end = get_u32(doc, 0x1C)? as usize;
    let slice = doc.get(start..end).ok_or(DecodeError::Truncated(start))?;
    Ok(clean_narrow(slice).replace('\r', "\r\n"))
}

fn decode_word97(streams: &mut dyn StreamProvider, doc: &[u8]) -> Result<String, DecodeError> {
    let table_name = if streams.has_stream(TABLE_STREAM_1) {
        TABLE_STREAM_1
    } else if streams.has_stream(TABLE_STREAM_0) {
        TABLE_STREAM_0
    } else {
        return Err(DecodeError::MissingTableStream);
    };

    let mut offset = 62usize;
    let count = get_u16(doc, offset)? as usize;
    offset += 2;

    // Declared character counts: main text plus footnotes, headers,
    // macros, annotations, endnotes, textboxes, header textboxes.
    let mut sizes = [0u32; 8];
    for (i, size) in sizes.iter_mut().enumerate() {
        *size = get_u32(doc, offset + 12 + i * 4)?;
    }
    let text_size = sizes[0];
    let extra: u32 = sizes[1..].iter().sum();
    // The extra character past the non-text regions is part of the format.
    let final_cp = if extra > 0 { text_size + extra + 1 } else { text_size };

    // Skip the variable-length block and the fixed main block to reach
    // the piece table location within the table stream.
    offset += count * 4;
    offset += 66 * 4 + 2;
    let clx_offset = get_u32(doc, offset)? as usize;
    let _clx_size = get_u32(doc, offset + 4)?;

    let table = streams.read_stream(table_name)?;
    let marker = get_u8(&table, clx_offset)?;
    let size = get_u16(&table, clx_offset + 1)? as usize;
    if marker != 0x02 {
        return Err(DecodeError::InvalidTableMarker);
    }

    let mut cps: Vec<u32> = Vec::new();
    let mut pos = clx_offset + 5;
    let mut found_final = false;
    for _ in 0..size / 4 {
        let cp = get_u32(&table, pos)?;
        cps.push(cp);
        pos += 4;
        if cp == final_cp {
            found_final = true;
            break;
        }
    }
    if !found_final {
        return Err(DecodeError::MalformedTable);
    }

    // One descriptor per run follows the cp list; the fc word sits two
    // bytes into each 8-byte entry.
    let mut buff = String::new();
    for pair in cps.windows(2) {
        let fc = get_u32(&table, pos + 2)?;
        pos += 8;
        let stream_offset = (fc & 0x3FFF_FFFF) as usize;
        let compressed = fc & (1 << 30) != 0;
        buff.push_str(&decode_run(doc, stream_offset, pair[0], pair[1], compressed)?);
    }

    Ok(buff.replace('\r', "\r\n"))
}

fn decode_run(
    doc: &[u8],
    stream_offset: usize,
    cp: u32,
    next_cp: u32,
    compressed: bool,
) -> Result<String, DecodeError> {
    let chars = next_cp.saturating_sub(cp) as usize;
    if compressed {
        // Single-byte run: the stored offset is doubled in the descriptor.
        let start = stream_offset / 2;
        let end = start + chars;
        let slice = doc.get(start..end).ok_or(DecodeError::Truncated(start))?;
        Ok(clean_narrow(slice))
    } else {
        let end = stream_offset + 2 * chars;
        let slice = doc
            .get(stream_offset..end)
            .ok_or(DecodeError::Truncated(stream_offset))?;
        Ok(clean_wide(slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStreams(HashMap<&'static str, Vec<u8>>);

    impl StreamProvider for MapStreams {
        fn has_stream(&self, name: &str) -> bool {
            self.0.contains_key(name)
        }
        fn read_stream(&mut self, name: &str) -> Result<Vec<u8>, DecodeError> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| DecodeError::Stream(name.to_string()))
        }
    }

    fn put_u16(buf: &mut [u8], off: usize, v: u16) {
        buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u32(buf: &mut [u8], off: usize, v: u32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn word95_stream(text: &[u8]) -> Vec<u8> {
        let mut doc = vec![0u8; 128 + text.len()];
        put_u16(&mut doc, 0, MAGIC_WORD95);
        put_u16(&mut doc, 2, 101);
        put_u32(&mut doc, 0x18, 128);
        put_u32(&mut doc, 0x1C, 128 + text.len() as u32);
        doc[128..].copy_from_slice(text);
        doc
    }

    /// Two runs: cp 0..4 stored single-byte at offset 512, cp 4..8
    /// stored UTF-16LE at offset 520.
    fn word97_streams() -> MapStreams {
        let mut doc = vec![0u8; 1024];
        put_u16(&mut doc, 0, MAGIC_WORD97);
        put_u16(&mut doc, 2, 193);
        put_u16(&mut doc, 62, 0); // variable-length block is empty
        put_u32(&mut doc, 76, 8); // text size; every other size zero
        put_u32(&mut doc, 330, 0); // piece table offset in table stream
        put_u32(&mut doc, 334, 64);
        doc[512..516].copy_from_slice(b"abcd");
        for (i, unit) in "wxyz".encode_utf16().enumerate() {
            put_u16(&mut doc, 520 + 2 * i, unit);
        }

        let mut table = vec![0u8; 64];
        table[0] = 0x02;
        put_u16(&mut table, 1, 12); // room for three cp entries
        put_u32(&mut table, 5, 0);
        put_u32(&mut table, 9, 4);
        put_u32(&mut table, 13, 8); // final cp
        put_u32(&mut table, 19, (1 << 30) | 1024); // compressed, offset doubled
        put_u32(&mut table, 27, 520);

        MapStreams(HashMap::from([
            (WORD_DOCUMENT_STREAM, doc),
            (TABLE_STREAM_1, table),
        ]))
    }

    /// Like `word97_streams`, but with three footnote characters
    /// declared, so the expected final cp is text + footnotes + 1 and
    /// the second run covers cp 4..12.
    fn word97_streams_with_footnotes() -> MapStreams {
        let mut doc = vec![0u8; 1024];
        put_u16(&mut doc, 0, MAGIC_WORD97);
        put_u16(&mut doc, 2, 193);
        put_u16(&mut doc, 62, 0);
        put_u32(&mut doc, 76, 8); // text size
        put_u32(&mut doc, 80, 3); // footnote size -> final cp = 8 + 3 + 1
        put_u32(&mut doc, 330, 0);
        put_u32(&mut doc, 334, 64);
        doc[512..516].copy_from_slice(b"abcd");
        for (i, unit) in "wxyzWXYZ".encode_utf16().enumerate() {
            put_u16(&mut doc, 520 + 2 * i, unit);
        }

        let mut table = vec![0u8; 64];
        table[0] = 0x02;
        put_u16(&mut table, 1, 12);
        put_u32(&mut table, 5, 0);
        put_u32(&mut table, 9, 4);
        put_u32(&mut table, 13, 12); // final cp including non-text regions
        put_u32(&mut table, 19, (1 << 30) | 1024);
        put_u32(&mut table, 27, 520);

        MapStreams(HashMap::from([
            (WORD_DOCUMENT_STREAM, doc),
            (TABLE_STREAM_1, table),
        ]))
    }

    #[test]
    fn word95_text_between_offsets() {
        let mut streams = MapStreams(HashMap::from([(
            WORD_DOCUMENT_STREAM,
            word95_stream(b"Hello legacy\rworld"),
        )]));
        let text = extract_text(&mut streams).unwrap();
        assert_eq!(text, "Hello legacy\r\nworld");
    }

    #[test]
    fn word95_table_separators_become_spaces() {
        let mut streams = MapStreams(HashMap::from([(
            WORD_DOCUMENT_STREAM,
            word95_stream(b"cell\x07next"),
        )]));
        assert_eq!(extract_text(&mut streams).unwrap(), "cell next");
    }

    #[test]
    fn word95_hyperlink_field_expanded() {
        let mut streams = MapStreams(HashMap::from([(
            WORD_DOCUMENT_STREAM,
            word95_stream(b"see \x13HYPERLINK \"http://example.com\"\x14Example\x15 end"),
        )]));
        assert_eq!(
            extract_text(&mut streams).unwrap(),
            "see Example (link: http://example.com) end"
        );
    }

    #[test]
    fn word97_runs_concatenated_in_cp_order() {
        let mut streams = word97_streams();
        assert_eq!(extract_text(&mut streams).unwrap(), "abcdwxyz");
    }

    #[test]
    fn word97_final_cp_counts_non_text_regions() {
        let mut streams = word97_streams_with_footnotes();
        assert_eq!(extract_text(&mut streams).unwrap(), "abcdwxyzWXYZ");
    }

    #[test]
    fn word97_list_stopping_at_text_size_is_malformed() {
        // With footnotes declared, a cp list that only reaches the
        // text size never matches the expected final position.
        let mut streams = word97_streams_with_footnotes();
        let table = streams.0.get_mut(TABLE_STREAM_1).unwrap();
        put_u32(table, 13, 8);
        assert_eq!(extract_text(&mut streams), Err(DecodeError::MalformedTable));
    }

    #[test]
    fn corrupted_magic_is_unsupported() {
        let mut doc = word95_stream(b"whatever");
        put_u16(&mut doc, 0, 0x1234);
        let mut streams = MapStreams(HashMap::from([(WORD_DOCUMENT_STREAM, doc)]));
        assert_eq!(extract_text(&mut streams), Err(DecodeError::UnsupportedFormat));
    }

    #[test]
    fn pre_word95_version_is_unsupported() {
        let mut doc = word95_stream(b"whatever");
        put_u16(&mut doc, 2, 100);
        let mut streams = MapStreams(HashMap::from([(WORD_DOCUMENT_STREAM, doc)]));
        assert_eq!(
            extract_text(&mut streams),
            Err(DecodeError::UnsupportedVersion(100))
        );
    }

    #[test]
    fn word97_without_table_stream_fails() {
        let mut streams = word97_streams();
        streams.0.remove(TABLE_STREAM_1);
        assert_eq!(extract_text(&mut streams), Err(DecodeError::MissingTableStream));
    }

    #[test]
    fn bad_piece_table_marker_fails() {
        let mut streams = word97_streams();
        streams.0.get_mut(TABLE_STREAM_1).unwrap()[0] = 0x07;
        assert_eq!(extract_text(&mut streams), Err(DecodeError::InvalidTableMarker));
    }

    #[test]
    fn missing_final_cp_is_malformed() {
        let mut streams = word97_streams();
        // Shrink the declared list so the final cp is never reached.
        let table = streams.0.get_mut(TABLE_STREAM_1).unwrap();
        put_u16(table, 1, 8);
        assert_eq!(extract_text(&mut streams), Err(DecodeError::MalformedTable));
    }
}
