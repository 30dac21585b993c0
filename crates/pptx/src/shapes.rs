//! Shape locator: finds shapes, their positions, and their text in slide XML.
//!
//! The same walk serves slides, notes slides, layouts, and masters. Text
//! comes from `a:t` inside paragraphs of a shape's `p:txBody`; every
//! paragraph end and every `a:br` starts a new line. Shapes nested in
//! groups are reported individually, with their offsets mapped from the
//! group's child coordinate space into slide space.

use crate::xml::{attr, attr_i64, local_name, xml_error};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use xtract_core::Result;

/// Top-left corner of a shape, in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Offset {
    pub x: i64,
    pub y: i64,
}

/// Width and height, in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Extent {
    cx: i64,
    cy: i64,
}

/// The `p:ph` marker of a placeholder shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder {
    pub kind: String,
    pub idx: u32,
}

impl Placeholder {
    /// The placeholder type a slide master uses for this kind.
    pub fn master_kind(&self) -> &str {
        match self.kind.as_str() {
            "ctrTitle" => "title",
            "subTitle" | "obj" => "body",
            other => other,
        }
    }
}

/// A shape found in a part, with or without text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LocatedShape {
    pub placeholder: Option<Placeholder>,
    /// Offset in slide space; `None` when the shape has no `a:xfrm`.
    pub offset: Option<Offset>,
    /// Raw paragraph text, one entry per line.
    pub lines: Vec<String>,
}

impl LocatedShape {
    pub fn has_text(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }
}

/// `a:xfrm` of a group shape.
#[derive(Debug, Clone, Copy, Default)]
struct GroupTransform {
    off: Offset,
    ext: Extent,
    ch_off: Offset,
    ch_ext: Extent,
}

impl GroupTransform {
    /// Map a point from the group's child space into its parent's space.
    fn apply(&self, p: Offset) -> Offset {
        Offset {
            x: map_axis(p.x, self.ch_off.x, self.off.x, self.ext.cx, self.ch_ext.cx),
            y: map_axis(p.y, self.ch_off.y, self.off.y, self.ext.cy, self.ch_ext.cy),
        }
    }
}

fn map_axis(value: i64, ch_off: i64, off: i64, ext: i64, ch_ext: i64) -> i64 {
    let delta = i128::from(value) - i128::from(ch_off);
    let scaled = if ch_ext == 0 {
        delta
    } else {
        delta * i128::from(ext) / i128::from(ch_ext)
    };
    let mapped = i128::from(off) + scaled;
    mapped.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[derive(Debug, Clone, Copy)]
enum TransformOwner {
    Shape,
    Group,
}

/// Text state of the shape currently being read.
#[derive(Debug, Default)]
struct ShapeBuilder {
    shape: LocatedShape,
    in_text_body: bool,
    paragraph: Option<String>,
    in_text_run: bool,
}

#[derive(Debug, Default)]
struct Locator {
    /// Local names of the currently open elements.
    path: Vec<Vec<u8>>,
    groups: Vec<GroupTransform>,
    current: Option<ShapeBuilder>,
    shapes: Vec<LocatedShape>,
}

impl Locator {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.path.last().is_some_and(|p| p == name)
    }

    /// The element `n` levels above the current parent.
    fn ancestor(&self, n: usize) -> Option<&[u8]> {
        self.path
            .len()
            .checked_sub(n + 1)
            .map(|i| self.path[i].as_slice())
    }

    fn open(&mut self, name: &[u8], e: &BytesStart) {
        match name {
            b"sp" => self.current = Some(ShapeBuilder::default()),
            b"grpSp" => self.groups.push(GroupTransform::default()),
            b"off" | b"ext" | b"chOff" | b"chExt" if self.parent_is(b"xfrm") => {
                self.read_transform(name, e)
            }
            b"ph" if self.parent_is(b"nvPr") => {
                if let Some(builder) = self.current.as_mut() {
                    builder.shape.placeholder = Some(Placeholder {
                        kind: attr(e, b"type").unwrap_or_else(|| "obj".to_string()),
                        idx: attr(e, b"idx").and_then(|v| v.parse().ok()).unwrap_or(0),
                    });
                }
            }
            b"txBody" if self.parent_is(b"sp") => {
                if let Some(builder) = self.current.as_mut() {
                    builder.in_text_body = true;
                }
            }
            b"p" if self.parent_is(b"txBody") => {
                if let Some(builder) = self.current.as_mut().filter(|b| b.in_text_body) {
                    builder.paragraph = Some(String::new());
                }
            }
            b"br" => {
                if let Some(builder) = self.current.as_mut() {
                    if let Some(line) = builder.paragraph.as_mut() {
                        builder.shape.lines.push(std::mem::take(line));
                    }
                }
            }
            b"t" => {
                if let Some(builder) = self.current.as_mut() {
                    builder.in_text_run = builder.paragraph.is_some();
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"sp" => {
                if let Some(builder) = self.current.take() {
                    let mut shape = builder.shape;
                    shape.offset = shape.offset.map(|o| self.to_slide_space(o));
                    self.shapes.push(shape);
                }
            }
            b"grpSp" => {
                self.groups.pop();
            }
            b"txBody" => {
                if let Some(builder) = self.current.as_mut() {
                    builder.in_text_body = false;
                }
            }
            b"p" => {
                if let Some(builder) = self.current.as_mut() {
                    if let Some(line) = builder.paragraph.take() {
                        builder.shape.lines.push(line);
                    }
                }
            }
            b"t" => {
                if let Some(builder) = self.current.as_mut() {
                    builder.in_text_run = false;
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(builder) = self.current.as_mut().filter(|b| b.in_text_run) {
            if let Some(line) = builder.paragraph.as_mut() {
                line.push_str(text);
            }
        }
    }

    /// Record an `a:xfrm` child for the enclosing shape or group.
    ///
    /// Expected path: `.../<sp|grpSp>/<spPr|grpSpPr>/xfrm`.
    fn read_transform(&mut self, name: &[u8], e: &BytesStart) {
        let point = || Offset {
            x: attr_i64(e, b"x").unwrap_or(0),
            y: attr_i64(e, b"y").unwrap_or(0),
        };
        let size = || Extent {
            cx: attr_i64(e, b"cx").unwrap_or(0),
            cy: attr_i64(e, b"cy").unwrap_or(0),
        };

        let owner = match (self.ancestor(2), self.ancestor(1)) {
            (Some(b"sp"), Some(b"spPr")) => Some(TransformOwner::Shape),
            (Some(b"grpSp"), Some(b"grpSpPr")) => Some(TransformOwner::Group),
            _ => None,
        };

        match owner {
            Some(TransformOwner::Shape) => {
                if let Some(builder) = self.current.as_mut() {
                    if name == b"off" {
                        builder.shape.offset = Some(point());
                    }
                }
            }
            Some(TransformOwner::Group) => {
                if let Some(group) = self.groups.last_mut() {
                    match name {
                        b"off" => group.off = point(),
                        b"ext" => group.ext = size(),
                        b"chOff" => group.ch_off = point(),
                        b"chExt" => group.ch_ext = size(),
                        _ => {}
                    }
                }
            }
            None => {}
        }
    }

    /// Map an offset through every enclosing group, innermost first.
    fn to_slide_space(&self, offset: Offset) -> Offset {
        self.groups.iter().rev().fold(offset, |p, g| g.apply(p))
    }
}

/// Find every shape in a slide-like part, in document order.
///
/// `part` is only used in error messages. Content under `mc:Fallback` is
/// skipped so shapes wrapped in markup-compatibility blocks are read once.
pub(crate) fn locate_shapes(xml: &str, part: &str) -> Result<Vec<LocatedShape>> {
    let mut reader = Reader::from_str(xml);
    let mut locator = Locator::default();
    let mut skip_depth: Option<usize> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if skip_depth.is_none() {
                    if name == b"Fallback" {
                        skip_depth = Some(locator.path.len());
                    } else {
                        locator.open(&name, e);
                    }
                }
                locator.path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if skip_depth.is_none() {
                    let name = local_name(e.name().as_ref()).to_vec();
                    locator.open(&name, e);
                    locator.close(&name);
                }
            }
            Ok(Event::End(_)) => {
                let name = locator.path.pop().unwrap_or_default();
                match skip_depth {
                    Some(depth) if depth == locator.path.len() => skip_depth = None,
                    Some(_) => {}
                    None => locator.close(&name),
                }
            }
            Ok(Event::Text(ref e)) => {
                if skip_depth.is_none() {
                    let text = e.unescape().map_err(|err| xml_error(part, err))?;
                    locator.text(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if skip_depth.is_none() {
                    locator.text(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }

    Ok(locator.shapes)
}

/// Placeholder positions declared by a slide layout or master.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlaceholderMap {
    entries: Vec<(Placeholder, Option<Offset>)>,
}

impl PlaceholderMap {
    pub fn from_shapes(shapes: &[LocatedShape]) -> Self {
        Self {
            entries: shapes
                .iter()
                .filter_map(|s| s.placeholder.clone().map(|p| (p, s.offset)))
                .collect(),
        }
    }

    /// Find the entry a slide placeholder inherits from.
    ///
    /// Non-zero indices match on `idx`; otherwise, or when no index
    /// matches, the normalized type decides.
    pub fn lookup(&self, ph: &Placeholder) -> Option<&(Placeholder, Option<Offset>)> {
        let by_idx = (ph.idx != 0)
            .then(|| self.entries.iter().find(|(p, _)| p.idx == ph.idx))
            .flatten();

        by_idx.or_else(|| self.by_kind(ph.master_kind()))
    }

    /// First entry whose normalized type is `kind`.
    pub fn by_kind(&self, kind: &str) -> Option<&(Placeholder, Option<Offset>)> {
        self.entries.iter().find(|(p, _)| p.master_kind() == kind)
    }
}
