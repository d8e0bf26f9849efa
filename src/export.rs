//! Single-sheet `.xlsx` export of report tables.
//!
//! The workbook is written as a bare Office Open XML package: a content
//! types part, the package and workbook relationships, the workbook with
//! one sheet named [`SHEET_NAME`], and the sheet itself using inline
//! strings, so no shared string table is needed.

use std::io::{Cursor, Read, Write};

use chrono::NaiveDateTime;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::report::{cell_text, Table};

pub const SHEET_NAME: &str = "Datos";

const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Error al generar el archivo: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Error al generar el archivo: {0}")]
    Io(#[from] std::io::Error),
    #[error("Hoja de cálculo inválida: {0}")]
    Xml(String),
}

/// Which of the two campaign tables a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sent,
    Received,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Sent => "SMS Enviados",
            ReportKind::Received => "SMS Recibidos",
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            ReportKind::Sent => "sms_enviados",
            ReportKind::Received => "sms_recibidos",
        }
    }
}

/// `sms_enviados_20240101_093000.xlsx` and the like.
pub fn download_file_name(kind: ReportKind, at: NaiveDateTime) -> String {
    format!("{}_{}.xlsx", kind.file_prefix(), at.format("%Y%m%d_%H%M%S"))
}

pub fn to_spreadsheet_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    );

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        (SHEET_PATH, sheet_xml(table)),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
    }

    let bytes = writer.finish()?.into_inner();
    tracing::debug!("exported {} rows ({} bytes)", table.len(), bytes.len());
    Ok(bytes)
}

fn sheet_xml(table: &Table) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if !table.columns().is_empty() {
        let header = table
            .columns()
            .iter()
            .map(|name| Value::String(name.clone()));
        push_row(&mut xml, 1, header);
    }
    for (index, row) in table.rows().iter().enumerate() {
        push_row(&mut xml, index + 2, row.iter().cloned());
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, number: usize, cells: impl Iterator<Item = Value>) {
    xml.push_str(&format!(r#"<row r="{}">"#, number));
    for (column, value) in cells.enumerate() {
        let reference = format!("{}{}", column_name(column), number);
        let cell = match value {
            Value::Null => continue,
            Value::Number(n) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n),
            Value::Bool(b) => format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, b as u8),
            other => format!(
                r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                reference,
                escape(&escape_forbidden(&cell_text(&other)))
            ),
        };
        xml.push_str(&cell);
    }
    xml.push_str("</row>");
}

/// Characters XML 1.0 does not allow in a document.
fn is_forbidden(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

/// Writes forbidden characters as `_xHHHH_`. A literal `_x` becomes
/// `_x005F_x` so it is not mistaken for an escape when read back.
fn escape_forbidden(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' && chars.peek() == Some(&'x') {
            out.push_str("_x005F_");
        } else if is_forbidden(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses [`escape_forbidden`].
fn unescape_forbidden(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| tail.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Zero-based column index to spreadsheet letters: 0 -> `A`, 26 -> `AA`.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Column letters of a cell reference (`AB12`) back to a zero-based index.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_uppercase())
        .collect();
    // Sheets end at column XFD.
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(number - 1)
}

/// Reads the sheet of a workbook written by [`to_spreadsheet_bytes`] back
/// into text rows, header row first. Absent cells read as empty strings.
pub fn read_spreadsheet_bytes(bytes: &[u8]) -> Result<Vec<Vec<String>>, ExportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(SHEET_PATH)?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut column = 0;
    let mut boolean = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExportError::Xml(e.to_string()))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    column = row.len();
                    boolean = false;
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value);
                        match attr.key.as_ref() {
                            b"r" => {
                                column = column_index(&value).ok_or_else(|| {
                                    ExportError::Xml(format!("bad cell reference {}", value))
                                })?;
                            }
                            b"t" => boolean = value == "b",
                            _ => {}
                        }
                    }
                    if row.len() <= column {
                        row.resize(column + 1, String::new());
                    }
                }
                b"v" | b"t" => in_text = true,
                _ => {}
            },
            Event::Text(text) if in_text => {
                let text = text.unescape().map_err(|e| ExportError::Xml(e.to_string()))?;
                let Some(cell) = row.get_mut(column) else {
                    return Err(ExportError::Xml("text outside of a cell".to_string()));
                };
                if boolean {
                    cell.push_str(if text == "1" { "true" } else { "false" });
                } else {
                    cell.push_str(&unescape_forbidden(&text));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"row" => rows.push(std::mem::take(&mut row)),
                b"v" | b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"row" => rows.push(Vec::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}
