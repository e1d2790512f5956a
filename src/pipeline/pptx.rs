//! PPTX extraction: per-slide text runs and picture shapes.
//!
//! A `.pptx` file is a ZIP container of OOXML parts. We read it directly
//! with [`zip`] + [`quick_xml`] instead of pulling in a full presentation
//! object model: the pipeline only needs the text runs (`<a:t>`) and the
//! picture references (`<a:blip r:embed="...">`) of each slide, resolved
//! through the slide's relationship part to the raster bytes under
//! `ppt/media/`.
//!
//! Slide-number placeholder fields render as the glyph `‹#›` in the text
//! run; those runs are skipped so the model never sees them.

use crate::error::{SummarizeError, UnitError};
use crate::pipeline::{repair_umlauts, Unit};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Slide-number placeholder glyphs as they appear in text runs.
const PLACEHOLDER_GLYPHS: [&str; 2] = ["‹#›", "<#>"];

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Extract one [`Unit`] per slide of a PPTX file.
///
/// Runs inside `spawn_blocking`; ZIP inflation and image decoding are
/// CPU-bound.
pub async fn extract_units(pptx_path: &Path) -> Result<Vec<Unit>, SummarizeError> {
    let path = pptx_path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_units_blocking(&path))
        .await
        .map_err(|e| SummarizeError::Internal(format!("PPTX extraction task panicked: {e}")))?
}

fn extract_units_blocking(pptx_path: &Path) -> Result<Vec<Unit>, SummarizeError> {
    let bytes = std::fs::read(pptx_path).map_err(|e| SummarizeError::CorruptDocument {
        path: pptx_path.to_path_buf(),
        expected: "PPTX",
        detail: e.to_string(),
    })?;

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| SummarizeError::CorruptDocument {
            path: pptx_path.to_path_buf(),
            expected: "PPTX",
            detail: e.to_string(),
        })?;

    // Slide parts in deck order: slide1.xml, slide2.xml, ... — the name
    // index is authoritative, directory order inside the ZIP is not.
    let mut slide_parts: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            RE_SLIDE_PART
                .captures(name)
                .and_then(|c| c[1].parse::<usize>().ok())
                .map(|n| (n, name.to_string()))
        })
        .collect();
    slide_parts.sort_unstable_by_key(|(n, _)| *n);

    if slide_parts.is_empty() {
        return Err(SummarizeError::CorruptDocument {
            path: pptx_path.to_path_buf(),
            expected: "PPTX",
            detail: "no slide parts found under ppt/slides/".into(),
        });
    }
    info!("PPTX loaded: {} slides", slide_parts.len());
    if slide_parts.len() > 20 {
        warn!(
            "Deck has {} slides; the summary may strain the model's token budget",
            slide_parts.len()
        );
    }

    let mut units = Vec::with_capacity(slide_parts.len());

    for (unit_num, (slide_no, part_name)) in slide_parts.iter().enumerate() {
        let unit_num = unit_num + 1;
        let xml = read_part_string(&mut archive, part_name)?;

        let (text, rel_ids) = match parse_slide_xml(&xml) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Slide {}: unparseable XML: {}", slide_no, e);
                units.push(Unit {
                    unit_num,
                    text: String::new(),
                    images: Vec::new(),
                    error: Some(UnitError::ExtractFailed {
                        unit: unit_num,
                        detail: format!("slide XML unparseable: {e}"),
                    }),
                });
                continue;
            }
        };

        // Resolve picture relationship ids to media parts, then decode.
        let mut images = Vec::new();
        if !rel_ids.is_empty() {
            let rels_name = format!("ppt/slides/_rels/slide{slide_no}.xml.rels");
            let targets = match read_part_string(&mut archive, &rels_name)
                .and_then(|xml| parse_relationships(&xml).map_err(SummarizeError::Internal))
            {
                Ok(t) => t,
                Err(e) => {
                    warn!("Slide {}: relationships unreadable: {}", slide_no, e);
                    HashMap::new()
                }
            };

            for rel_id in &rel_ids {
                let Some(target) = targets.get(rel_id) else {
                    warn!("Slide {}: no relationship for {}", slide_no, rel_id);
                    continue;
                };
                let media_name = resolve_media_target(target);
                match read_part_bytes(&mut archive, &media_name) {
                    Ok(raw) => match image::load_from_memory(&raw) {
                        Ok(img) => images.push(img),
                        Err(e) => {
                            warn!("Slide {}: undecodable image {}: {}", slide_no, media_name, e)
                        }
                    },
                    Err(e) => warn!("Slide {}: missing media part {}: {}", slide_no, media_name, e),
                }
            }
        }

        debug!(
            "Slide {}: {} chars text, {} images",
            slide_no,
            text.len(),
            images.len()
        );

        units.push(Unit {
            unit_num,
            text: repair_umlauts(&text),
            images,
            error: None,
        });
    }

    Ok(units)
}

fn read_part_string<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, SummarizeError> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| SummarizeError::Internal(format!("missing part '{name}': {e}")))?;
    let mut s = String::new();
    part.read_to_string(&mut s)
        .map_err(|e| SummarizeError::Internal(format!("unreadable part '{name}': {e}")))?;
    Ok(s)
}

fn read_part_bytes<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, String> {
    let mut part = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut buf = Vec::new();
    part.read_to_end(&mut buf).map_err(|e| e.to_string())?;
    Ok(buf)
}

/// Pull text runs and picture relationship ids out of one slide part.
///
/// Returns the concatenated text (one line per paragraph, placeholder
/// runs dropped) and the `r:embed` ids of `<a:blip>` elements in shape
/// order.
pub(crate) fn parse_slide_xml(xml: &str) -> Result<(String, Vec<String>), String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut rel_ids = Vec::new();
    let mut in_text_run = false;
    let mut run = String::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                match e.name().as_ref() {
                    b"a:t" => {
                        in_text_run = true;
                        run.clear();
                    }
                    b"a:blip" => {
                        if let Some(id) = embed_attr(&e) {
                            rel_ids.push(id);
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"a:blip" {
                    if let Some(id) = embed_attr(&e) {
                        rel_ids.push(id);
                    }
                }
            }
            Event::Text(t) => {
                if in_text_run {
                    run.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => {
                    in_text_run = false;
                    if !PLACEHOLDER_GLYPHS.contains(&run.as_str()) {
                        text.push_str(&run);
                    }
                }
                b"a:p" => {
                    if !text.ends_with('\n') && !text.is_empty() {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((text, rel_ids))
}

fn embed_attr(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r:embed")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a `.rels` part into an id → target map.
pub(crate) fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut map = HashMap::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = attr.unescape_value().ok().map(|v| v.into_owned()),
                            b"Target" => {
                                target = attr.unescape_value().ok().map(|v| v.into_owned())
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        map.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(map)
}

/// Resolve a slide-relative relationship target to a ZIP part name.
///
/// Targets are relative to `ppt/slides/`; media lives one level up.
pub(crate) fn resolve_media_target(target: &str) -> String {
    if let Some(rest) = target.strip_prefix("../") {
        format!("ppt/{rest}")
    } else if let Some(rest) = target.strip_prefix('/') {
        rest.to_string()
    } else {
        format!("ppt/slides/{target}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp><p:txBody>
      <a:p><a:r><a:t>Einf&#252;hrung in Rust</a:t></a:r></a:p>
      <a:p><a:r><a:t>Ownership </a:t></a:r><a:r><a:t>und Borrowing</a:t></a:r></a:p>
    </p:txBody></p:sp>
    <p:sp><p:txBody><a:p><a:fld><a:t>&#8249;#&#8250;</a:t></a:fld></a:p></p:txBody></p:sp>
    <p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>
  </p:spTree></p:cSld>
</p:sld>"#;

    const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

    #[test]
    fn slide_text_runs_concatenated_per_paragraph() {
        let (text, rel_ids) = parse_slide_xml(SLIDE_XML).unwrap();
        assert_eq!(text, "Einführung in Rust\nOwnership und Borrowing\n");
        assert_eq!(rel_ids, vec!["rId2"]);
    }

    #[test]
    fn slide_number_placeholder_is_skipped() {
        let (text, _) = parse_slide_xml(SLIDE_XML).unwrap();
        assert!(!text.contains("‹#›"));
    }

    #[test]
    fn relationships_map_ids_to_targets() {
        let map = parse_relationships(RELS_XML).unwrap();
        assert_eq!(map.get("rId2").map(String::as_str), Some("../media/image1.png"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn media_target_resolution() {
        assert_eq!(resolve_media_target("../media/image1.png"), "ppt/media/image1.png");
        assert_eq!(resolve_media_target("/ppt/media/x.jpeg"), "ppt/media/x.jpeg");
        assert_eq!(resolve_media_target("media/y.png"), "ppt/slides/media/y.png");
    }

    #[test]
    fn slide_part_regex_matches_only_slides() {
        assert!(RE_SLIDE_PART.is_match("ppt/slides/slide12.xml"));
        assert!(!RE_SLIDE_PART.is_match("ppt/slides/_rels/slide12.xml.rels"));
        assert!(!RE_SLIDE_PART.is_match("ppt/slideLayouts/slideLayout1.xml"));
    }

    fn write_pptx(slides: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        use std::io::Write;

        let tmp = tempfile::Builder::new().suffix(".pptx").tempfile().unwrap();
        let mut zip = zip::ZipWriter::new(tmp.reopen().unwrap());
        let opts = zip::write::SimpleFileOptions::default();
        for (name, content) in slides {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
        tmp
    }

    #[test]
    fn unparseable_slide_is_marked_as_extraction_failure() {
        // A corrupt slide must not be indistinguishable from a blank one.
        let tmp = write_pptx(&[
            ("ppt/slides/slide1.xml", b"<p:sld><a:t>kaputt</wrong>" as &[u8]),
            (
                "ppt/slides/slide2.xml",
                br#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
                    <a:p><a:r><a:t>intakt</a:t></a:r></a:p></p:sld>"#,
            ),
        ]);

        let units = extract_units_blocking(tmp.path()).unwrap();
        assert_eq!(units.len(), 2);

        assert!(units[0].text.is_empty());
        match units[0].error {
            Some(UnitError::ExtractFailed { unit, .. }) => assert_eq!(unit, 1),
            ref other => panic!("expected ExtractFailed marker, got {other:?}"),
        }

        assert_eq!(units[1].text, "intakt\n");
        assert!(units[1].error.is_none());
    }
}
