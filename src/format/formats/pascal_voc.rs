//! Pascal VOC XML format implementation.
//!
//! One XML document per image with absolute integer-pixel boxes. This is the
//! only format that keeps the per-object `difficult` flag and the document
//! `verified` flag, and it can carry the image bytes in an `<imagedata>`
//! element.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::format::error::FormatError;
use crate::format::registry::LabelFormat;
use crate::format::traits::{
    AnnotationCodec, CodecContext, DecodedAnnotations, ImageSize, record_bounds,
};
use crate::model::{AnnotationRecord, BoundingBox};

const ROOT: &str = "annotation";
const VERIFIED_ATTR: &str = "verified";

/// Pascal VOC XML format.
///
/// Supports:
/// - Bounding boxes (polygons are reduced to their bounds)
/// - `difficult` per object, `verified` per document
/// - Optional base64 image embedding
pub struct PascalVocFormat;

impl AnnotationCodec for PascalVocFormat {
    fn format(&self) -> LabelFormat {
        LabelFormat::PascalVoc
    }

    fn display_name(&self) -> &'static str {
        "Pascal VOC (XML)"
    }

    fn preserves_difficult(&self) -> bool {
        true
    }

    fn preserves_verified(&self) -> bool {
        true
    }

    fn embeds_image(&self) -> bool {
        true
    }

    fn encode(
        &self,
        records: &[AnnotationRecord],
        context: &CodecContext<'_>,
    ) -> Result<Vec<u8>, FormatError> {
        let size = context.image_size.unwrap_or_else(|| {
            log::warn!("Encoding Pascal VOC without image dimensions, using 0x0");
            ImageSize::new(0, 0)
        });

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(|e| FormatError::Xml(e.into()))?;

        let mut root = BytesStart::new(ROOT);
        if context.verified {
            root.push_attribute((VERIFIED_ATTR, "yes"));
        }
        writer
            .write_event(Event::Start(root))
            .map_err(|e| FormatError::Xml(e.into()))?;

        if let Some(image_path) = context.image_path {
            let folder = image_path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            write_text_element(&mut writer, "folder", &folder)?;
            write_text_element(
                &mut writer,
                "filename",
                &context.image_file_name().unwrap_or_default(),
            )?;
            write_text_element(&mut writer, "path", &image_path.to_string_lossy())?;
        }

        writer
            .write_event(Event::Start(BytesStart::new("source")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        write_text_element(&mut writer, "database", "Unknown")?;
        writer
            .write_event(Event::End(BytesEnd::new("source")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::Start(BytesStart::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        write_text_element(&mut writer, "width", &size.width.to_string())?;
        write_text_element(&mut writer, "height", &size.height.to_string())?;
        write_text_element(&mut writer, "depth", &size.depth.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("size")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        write_text_element(&mut writer, "segmented", "0")?;

        for record in records {
            write_object(&mut writer, record, size)?;
        }

        if let Some(data) = context.image_data {
            writer
                .write_event(Event::Start(
                    BytesStart::new("imagedata").with_attributes([("encoding", "base64")]),
                ))
                .map_err(|e| FormatError::Xml(e.into()))?;
            writer
                .write_event(Event::Text(BytesText::new(&BASE64_STANDARD.encode(data))))
                .map_err(|e| FormatError::Xml(e.into()))?;
            writer
                .write_event(Event::End(BytesEnd::new("imagedata")))
                .map_err(|e| FormatError::Xml(e.into()))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(|e| FormatError::Xml(e.into()))?;

        log::debug!("Encoded {} Pascal VOC objects", records.len());
        Ok(writer.into_inner())
    }

    fn decode(
        &self,
        bytes: &[u8],
        _context: &CodecContext<'_>,
    ) -> Result<DecodedAnnotations, FormatError> {
        let content = std::str::from_utf8(bytes)
            .map_err(|_| FormatError::decode("Pascal VOC document is not valid UTF-8"))?;
        read_document(content).map_err(|e| match e {
            FormatError::Xml(e) => FormatError::decode(format!("invalid XML: {e}")),
            other => other,
        })
    }
}

/// Parse a whole Pascal VOC document. XML syntax errors are returned as is.
fn read_document(content: &str) -> Result<DecodedAnnotations, FormatError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut decoded = DecodedAnnotations::default();
    let mut stack: Vec<String> = Vec::new();
    let mut root_seen = false;
    let mut size = SizeBuilder::default();
    let mut filename: Option<String> = None;
    let mut path: Option<String> = None;
    let mut object: Option<ObjectBuilder> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if stack.is_empty() {
                    decoded.verified = read_root(e, &name, &mut root_seen)?;
                } else if stack.len() == 1 && name == "object" {
                    object = Some(ObjectBuilder::default());
                }
                stack.push(name);
            }
            Event::Empty(ref e) => {
                if stack.is_empty() {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    decoded.verified = read_root(e, &name, &mut root_seen)?;
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                if stack.len() == 1 && closed.as_deref() == Some("object") {
                    if let Some(builder) = object.take() {
                        decoded.records.push(builder.finish()?);
                    }
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                let text = text.trim();
                let tags: Vec<&str> = stack.iter().map(String::as_str).collect();

                match tags.as_slice() {
                    [ROOT, "filename"] => filename = Some(text.to_string()),
                    [ROOT, "path"] => path = Some(text.to_string()),
                    [ROOT, "size", field] => size.set(field, text)?,
                    [ROOT, "object", "name"] => {
                        if let Some(builder) = object.as_mut() {
                            builder.name = Some(text.to_string());
                        }
                    }
                    [ROOT, "object", "difficult"] => {
                        if let Some(builder) = object.as_mut() {
                            builder.difficult = parse_flag(text)?;
                        }
                    }
                    [ROOT, "object", "bndbox", field] => {
                        if let Some(builder) = object.as_mut() {
                            builder.set_coordinate(field, text)?;
                        }
                    }
                    [ROOT, "imagedata"] => {
                        decoded.image_data = Some(BASE64_STANDARD.decode(text)?);
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(FormatError::decode("missing <annotation> root element"));
    }
    if !stack.is_empty() {
        return Err(FormatError::decode(format!(
            "unexpected end of document inside <{}>",
            stack.join("/")
        )));
    }

    decoded.image_size = size.finish();
    decoded.image_path = path.or(filename).filter(|p| !p.is_empty()).map(Into::into);

    log::debug!(
        "Decoded {} Pascal VOC objects (verified: {})",
        decoded.records.len(),
        decoded.verified
    );
    Ok(decoded)
}

/// Check the root element and read its verified attribute.
fn read_root(e: &BytesStart<'_>, name: &str, root_seen: &mut bool) -> Result<bool, FormatError> {
    if name != ROOT || *root_seen {
        return Err(FormatError::decode(format!(
            "expected a single <{ROOT}> root element, found <{name}>"
        )));
    }
    *root_seen = true;

    let attr = e
        .try_get_attribute(VERIFIED_ATTR)
        .map_err(|e| FormatError::Xml(e.into()))?;
    let verified = match attr {
        Some(attr) => attr.unescape_value()?.trim() == "yes",
        None => false,
    };
    Ok(verified)
}

/// Write one `<object>` element for a record.
fn write_object<W: Write>(
    writer: &mut Writer<W>,
    record: &AnnotationRecord,
    size: ImageSize,
) -> Result<(), FormatError> {
    let bbox = record_bounds(record)?;
    let xmin = bbox.min_x.round() as i64;
    let ymin = bbox.min_y.round() as i64;
    let xmax = bbox.max_x.round() as i64;
    let ymax = bbox.max_y.round() as i64;

    // Boxes touching the image border are marked as truncated
    let truncated = size.is_valid()
        && (xmin <= 0
            || ymin <= 0
            || xmax >= i64::from(size.width)
            || ymax >= i64::from(size.height));

    writer
        .write_event(Event::Start(BytesStart::new("object")))
        .map_err(|e| FormatError::Xml(e.into()))?;

    write_text_element(writer, "name", &record.label)?;
    write_text_element(writer, "pose", "Unspecified")?;
    write_text_element(writer, "truncated", if truncated { "1" } else { "0" })?;
    write_text_element(writer, "difficult", if record.difficult { "1" } else { "0" })?;

    writer
        .write_event(Event::Start(BytesStart::new("bndbox")))
        .map_err(|e| FormatError::Xml(e.into()))?;
    write_text_element(writer, "xmin", &xmin.to_string())?;
    write_text_element(writer, "ymin", &ymin.to_string())?;
    write_text_element(writer, "xmax", &xmax.to_string())?;
    write_text_element(writer, "ymax", &ymax.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new("bndbox")))
        .map_err(|e| FormatError::Xml(e.into()))?;

    writer
        .write_event(Event::End(BytesEnd::new("object")))
        .map_err(|e| FormatError::Xml(e.into()))?;
    Ok(())
}

/// Write a simple text element.
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    Ok(())
}

/// Parse a 0/1 style flag.
fn parse_flag(text: &str) -> Result<bool, FormatError> {
    match text {
        "" | "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        other => other
            .parse::<i64>()
            .map(|v| v != 0)
            .map_err(|_| FormatError::decode(format!("invalid flag value '{other}'"))),
    }
}

#[derive(Default)]
struct SizeBuilder {
    width: u32,
    height: u32,
    depth: Option<u32>,
}

impl SizeBuilder {
    fn set(&mut self, field: &str, text: &str) -> Result<(), FormatError> {
        let slot = match field {
            "width" => &mut self.width,
            "height" => &mut self.height,
            "depth" => self.depth.insert(0),
            _ => return Ok(()),
        };
        // Some tools write sizes as floats
        *slot = text
            .parse::<u32>()
            .or_else(|_| text.parse::<f32>().map(|v| v.round() as u32))
            .map_err(|_| FormatError::decode(format!("invalid image {field} '{text}'")))?;
        Ok(())
    }

    fn finish(self) -> Option<ImageSize> {
        let size = ImageSize::new(self.width, self.height).with_depth(self.depth.unwrap_or(3));
        size.is_valid().then_some(size)
    }
}

#[derive(Default)]
struct ObjectBuilder {
    name: Option<String>,
    difficult: bool,
    xmin: Option<f32>,
    ymin: Option<f32>,
    xmax: Option<f32>,
    ymax: Option<f32>,
}

impl ObjectBuilder {
    fn set_coordinate(&mut self, field: &str, text: &str) -> Result<(), FormatError> {
        let slot = match field {
            "xmin" => &mut self.xmin,
            "ymin" => &mut self.ymin,
            "xmax" => &mut self.xmax,
            "ymax" => &mut self.ymax,
            _ => return Ok(()),
        };
        let value = text
            .parse::<f32>()
            .map_err(|_| FormatError::decode(format!("invalid {field} value '{text}'")))?;
        *slot = Some(value);
        Ok(())
    }

    fn finish(self) -> Result<AnnotationRecord, FormatError> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| FormatError::decode("<object> without a <name>"))?;

        let (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) =
            (self.xmin, self.ymin, self.xmax, self.ymax)
        else {
            return Err(FormatError::decode(format!(
                "<object> '{name}' has an incomplete <bndbox>"
            )));
        };

        let bbox = BoundingBox::new(xmin.min(xmax), ymin.min(ymax), xmin.max(xmax), ymin.max(ymax));
        Ok(AnnotationRecord::rectangle(name, bbox).with_difficult(self.difficult))
    }
}
