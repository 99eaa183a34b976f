//! Placeholder substitution inside a `.docx` package.
//!
//! A docx is a zip archive; the body lives in `word/document.xml`. Word freely splits
//! text across runs (`<w:r>`), so a placeholder is matched against a paragraph's
//! concatenated text rather than any single run. A paragraph that contains one is
//! rebuilt as a single run in the configured font; every other part of the package
//! is copied byte-for-byte.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const PROFILE_PLACEHOLDER: &str = "<*profile*>";
pub const SKILLS_PLACEHOLDER: &str = "<*skills*>";

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid docx package {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{part} in {} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf, part: String },

    #[error("{} has no word/document.xml", .path.display())]
    MissingDocument { path: PathBuf },
}

/// Font applied to every run of a rewritten paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub name: String,
    pub size_pt: f32,
    pub bold: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            name: "Times New Roman".to_string(),
            size_pt: 12.0,
            bold: false,
        }
    }
}

impl FontSpec {
    fn run_properties(&self) -> String {
        let name = escape_xml(&self.name);
        let bold = if self.bold {
            "<w:b/>"
        } else {
            "<w:b w:val=\"0\"/>"
        };
        // Word sizes are in half-points.
        let half_points = (self.size_pt * 2.0).round() as u32;
        format!(
            "<w:rPr><w:rFonts w:ascii=\"{name}\" w:hAnsi=\"{name}\"/>{bold}\
             <w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/></w:rPr>"
        )
    }
}

/// Replaces placeholders in the docx at `path`, saving in place.
///
/// Returns the number of paragraphs that were rewritten.
pub fn fill_placeholders(
    path: &Path,
    replacements: &[(&str, &str)],
    font: &FontSpec,
) -> Result<usize, DocxError> {
    let io_err = |source| DocxError::Io {
        path: path.to_path_buf(),
        source,
    };
    let zip_err = |source| DocxError::Zip {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(io_err)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_err)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut rewritten = None;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_err)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer.add_directory(name, options).map_err(zip_err)?;
            continue;
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(io_err)?;

        if name == DOCUMENT_PART {
            let xml = String::from_utf8(data).map_err(|_| DocxError::Encoding {
                path: path.to_path_buf(),
                part: name.clone(),
            })?;
            let (new_xml, count) = rewrite_document_xml(&xml, replacements, font);
            rewritten = Some(count);
            data = new_xml.into_bytes();
        }

        writer.start_file(name, options).map_err(zip_err)?;
        writer.write_all(&data).map_err(io_err)?;
    }

    let count = rewritten.ok_or_else(|| DocxError::MissingDocument {
        path: path.to_path_buf(),
    })?;
    let output = writer.finish().map_err(zip_err)?.into_inner();
    fs::write(path, output).map_err(io_err)?;
    Ok(count)
}

/// Plain text of every paragraph in the document, one per line.
#[cfg(test)]
pub fn document_text(path: &Path) -> Result<String, DocxError> {
    let io_err = |source| DocxError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(io_err)?;
    let mut archive = ZipArchive::new(file).map_err(|source| DocxError::Zip {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| DocxError::MissingDocument {
            path: path.to_path_buf(),
        })?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(io_err)?;

    Ok(paragraph_spans(&xml)
        .into_iter()
        .map(|(start, end)| paragraph_text(&xml[start..end]))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Rewrites every paragraph containing a placeholder. Returns the new XML and the
/// number of paragraphs touched.
pub fn rewrite_document_xml(
    xml: &str,
    replacements: &[(&str, &str)],
    font: &FontSpec,
) -> (String, usize) {
    let mut output = xml.to_string();
    let mut count = 0;

    // Back to front so earlier offsets stay valid.
    for (start, end) in paragraph_spans(xml).into_iter().rev() {
        let paragraph = &xml[start..end];
        let text = paragraph_text(paragraph);
        if !replacements.iter().any(|(needle, _)| text.contains(needle)) {
            continue;
        }

        let mut new_text = text;
        for (needle, value) in replacements {
            if new_text.contains(needle) {
                new_text = new_text.replace(needle, value);
            }
        }

        output.replace_range(start..end, &rebuild_paragraph(paragraph, &new_text, font));
        count += 1;
    }

    (output, count)
}

fn paragraph_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:p(?:\s[^>]*)?>|</w:p>").expect("valid regex"))
}

/// Text nodes, run-level tabs and line breaks. Tab stops inside `<w:tabs>` always
/// carry attributes, so only the bare `<w:tab/>` counts as a tab character.
fn run_content_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>")
            .expect("valid regex")
    })
}

fn paragraph_props_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:pPr(?:\s[^>]*)?/>|<w:pPr(?:\s[^>]*)?>.*?</w:pPr>")
            .expect("valid regex")
    })
}

/// Byte spans of every innermost `<w:p>` element (paragraphs nested in text boxes
/// are returned instead of their host paragraph).
fn paragraph_spans(xml: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    // (start offset, contains a nested paragraph)
    let mut open: Vec<(usize, bool)> = Vec::new();

    for tag in paragraph_tag_re().find_iter(xml) {
        let raw = tag.as_str();
        if raw == "</w:p>" {
            if let Some((start, has_child)) = open.pop() {
                if !has_child {
                    spans.push((start, tag.end()));
                }
                if let Some(parent) = open.last_mut() {
                    parent.1 = true;
                }
            }
        } else if !raw.ends_with("/>") {
            open.push((tag.start(), false));
        }
    }

    spans.sort_unstable();
    spans
}

fn paragraph_text(paragraph: &str) -> String {
    let mut text = String::new();
    for caps in run_content_re().captures_iter(paragraph) {
        match caps.get(1) {
            Some(node) => text.push_str(&unescape_xml(node.as_str())),
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn rebuild_paragraph(paragraph: &str, text: &str, font: &FontSpec) -> String {
    let open_end = paragraph.find('>').map(|i| i + 1).unwrap_or(0);
    let open_tag = &paragraph[..open_end];
    let props = paragraph_props_re()
        .find(paragraph)
        .map(|m| m.as_str())
        .unwrap_or("");

    let mut run = String::from("<w:r>");
    run.push_str(&font.run_properties());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.push_str("<w:br/>");
        }
        for (j, chunk) in line.split('\t').enumerate() {
            if j > 0 {
                run.push_str("<w:tab/>");
            }
            if !chunk.is_empty() {
                run.push_str("<w:t xml:space=\"preserve\">");
                run.push_str(&escape_xml(chunk));
                run.push_str("</w:t>");
            }
        }
    }
    run.push_str("</w:r>");

    format!("{open_tag}{props}{run}</w:p>")
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
