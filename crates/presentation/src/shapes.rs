//! DrawingML for the shapes placed on a slide.

use std::fmt::Write as _;

use serde_json::Value;

use crate::{
    error::Result,
    schema::{Align, BulletItem, ChartKind, Position, TextOptions},
    xml::{emu, escape, hex_color},
};

const DEFAULT_BAR_COLOR: &str = "4472C4";
const HEADER_FILL: &str = "D9E1F2";

/// A rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl From<&Position> for Rect {
    fn from(p: &Position) -> Self {
        Self {
            x: emu(p.x),
            y: emu(p.y),
            w: emu(p.w),
            h: emu(p.h),
        }
    }
}

impl Rect {
    fn xfrm(&self) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.x,
            self.y,
            self.w.max(0),
            self.h.max(0)
        )
    }
}

/// Character formatting for one run.
#[derive(Debug, Clone)]
pub(crate) struct RunStyle {
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<String>,
}

impl RunStyle {
    pub fn from_options(options: &TextOptions) -> Result<Self> {
        Ok(Self {
            size: options.size,
            bold: options.bold,
            italic: options.italic,
            color: options.color.as_deref().map(hex_color).transpose()?,
        })
    }

    pub fn sized(size: f64) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
            color: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn rpr(&self) -> String {
        let mut attrs = format!(r#"lang="en-US" sz="{}""#, (self.size * 100.0).round() as i64);
        if self.bold {
            attrs.push_str(r#" b="1""#);
        }
        if self.italic {
            attrs.push_str(r#" i="1""#);
        }
        match self.color {
            Some(ref color) => format!(
                r#"<a:rPr {attrs} dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:rPr>"#
            ),
            None => format!(r#"<a:rPr {attrs} dirty="0"/>"#),
        }
    }
}

fn algn(align: Align) -> &'static str {
    match align {
        Align::Left => "l",
        Align::Center => "ctr",
        Align::Right => "r",
    }
}

fn paragraph(text: &str, style: &RunStyle, ppr: &str) -> String {
    if text.is_empty() {
        return format!(
            r#"<a:p>{ppr}<a:endParaRPr lang="en-US" sz="{}" dirty="0"/></a:p>"#,
            (style.size * 100.0).round() as i64
        );
    }
    format!(
        "<a:p>{ppr}<a:r>{}<a:t>{}</a:t></a:r></a:p>",
        style.rpr(),
        escape(text)
    )
}

fn bullet_ppr(level: u8, align: Align) -> String {
    let level = level.min(8);
    let indent = 342_900 + i64::from(level) * 457_200;
    format!(
        r#"<a:pPr marL="{indent}" lvl="{level}" indent="-285750" algn="{}"><a:buFont typeface="Arial"/><a:buChar char="•"/></a:pPr>"#,
        algn(align)
    )
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Geometry of a drawn bar chart.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BarLayout {
    pub title: Option<Rect>,
    pub bars: Vec<Rect>,
    pub labels: Vec<Rect>,
    pub value_labels: Vec<Rect>,
}

/// Lay out one bar per value inside `area`, scaled so the largest value fills
/// the plot. Negative values draw as empty bars.
pub(crate) fn bar_layout(kind: ChartKind, area: Rect, values: &[f64], has_title: bool) -> BarLayout {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let ratio = |v: f64| if max > 0.0 { v.max(0.0) / max } else { 0.0 };
    let n = values.len().max(1) as i64;
    let title_h = if has_title { (area.h / 8).min(emu(0.5)) } else { 0 };
    let title = has_title.then_some(Rect {
        h: title_h,
        ..area
    });

    let mut layout = BarLayout {
        title,
        bars: Vec::with_capacity(values.len()),
        labels: Vec::with_capacity(values.len()),
        value_labels: Vec::with_capacity(values.len()),
    };

    match kind {
        ChartKind::Column => {
            let label_h = emu(0.35);
            let value_h = emu(0.3);
            let plot_top = area.y + title_h + value_h;
            let plot_bottom = area.y + area.h - label_h;
            let plot_h = (plot_bottom - plot_top).max(0);
            let slot = area.w / n;
            let bar_w = slot * 6 / 10;

            for (i, v) in values.iter().enumerate() {
                let slot_x = area.x + slot * i as i64;
                let bar_h = (ratio(*v) * plot_h as f64).round() as i64;
                let bar_y = plot_bottom - bar_h;
                layout.bars.push(Rect {
                    x: slot_x + (slot - bar_w) / 2,
                    y: bar_y,
                    w: bar_w,
                    h: bar_h,
                });
                layout.labels.push(Rect {
                    x: slot_x,
                    y: plot_bottom,
                    w: slot,
                    h: label_h,
                });
                layout.value_labels.push(Rect {
                    x: slot_x,
                    y: bar_y - value_h,
                    w: slot,
                    h: value_h,
                });
            }
        },
        ChartKind::Bar => {
            let label_w = area.w / 4;
            let value_w = emu(0.8);
            let plot_left = area.x + label_w;
            let plot_w = (area.w - label_w - value_w).max(0);
            let top = area.y + title_h;
            let slot = (area.h - title_h).max(0) / n;
            let bar_h = slot * 6 / 10;

            for (i, v) in values.iter().enumerate() {
                let slot_y = top + slot * i as i64;
                let bar_w = (ratio(*v) * plot_w as f64).round() as i64;
                layout.bars.push(Rect {
                    x: plot_left,
                    y: slot_y + (slot - bar_h) / 2,
                    w: bar_w,
                    h: bar_h,
                });
                layout.labels.push(Rect {
                    x: area.x,
                    y: slot_y,
                    w: label_w,
                    h: slot,
                });
                layout.value_labels.push(Rect {
                    x: plot_left + bar_w,
                    y: slot_y,
                    w: value_w,
                    h: slot,
                });
            }
        },
    }
    layout
}

/// The `<p:spTree>` children of one slide.
pub(crate) struct ShapeTree {
    xml: String,
    next_id: u32,
}

impl ShapeTree {
    pub fn new() -> Self {
        // id 1 is the group shape itself
        Self {
            xml: String::new(),
            next_id: 2,
        }
    }

    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn sp(&mut self, name: &str, rect: Rect, fill: Option<&str>, anchor: &str, paragraphs: &str) {
        let id = self.id();
        let fill = match fill {
            Some(color) => format!(
                r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:ln><a:noFill/></a:ln>"#
            ),
            None => "<a:noFill/>".to_string(),
        };
        let tx_box = if paragraphs.is_empty() { "" } else { r#" txBox="1""# };
        let _ = write!(
            self.xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name} {id}"/><p:cNvSpPr{tx_box}/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>{fill}</p:spPr>"#,
            rect.xfrm()
        );
        if !paragraphs.is_empty() {
            let _ = write!(
                self.xml,
                r#"<p:txBody><a:bodyPr wrap="square" lIns="45720" rIns="45720" anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody>"#
            );
        }
        self.xml.push_str("</p:sp>");
    }

    /// A text box; each line of `text` becomes a paragraph.
    pub fn text(&mut self, rect: Rect, text: &str, style: &RunStyle, align: Align) {
        let ppr = format!(r#"<a:pPr algn="{}"/>"#, algn(align));
        let paragraphs: String = text.split('\n').map(|line| paragraph(line, style, &ppr)).collect();
        self.sp("TextBox", rect, None, "t", &paragraphs);
    }

    fn label(&mut self, rect: Rect, text: &str, style: &RunStyle, align: Align) {
        let ppr = format!(r#"<a:pPr algn="{}"/>"#, algn(align));
        self.sp("Label", rect, None, "ctr", &paragraph(text, style, &ppr));
    }

    pub fn bullets(
        &mut self,
        rect: Rect,
        items: &[BulletItem],
        level: u8,
        style: &RunStyle,
        align: Align,
    ) {
        let paragraphs: String = items
            .iter()
            .map(|item| paragraph(item.text(), style, &bullet_ppr(item.level(level), align)))
            .collect();
        self.sp("Bullets", rect, None, "t", &paragraphs);
    }

    pub fn table(&mut self, rect: Rect, rows: &[Vec<Value>], header: bool, font_size: f64) {
        let id = self.id();
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0).max(1) as i64;
        let col_w = rect.w / cols;
        let row_h = rect.h / (rows.len().max(1) as i64);

        let mut grid = String::new();
        for c in 0..cols {
            // last column absorbs the rounding remainder
            let w = if c == cols - 1 { rect.w - col_w * (cols - 1) } else { col_w };
            let _ = write!(grid, r#"<a:gridCol w="{w}"/>"#);
        }

        let mut body = String::new();
        for (r, row) in rows.iter().enumerate() {
            let is_header = header && r == 0;
            let style = if is_header {
                RunStyle::sized(font_size).bold()
            } else {
                RunStyle::sized(font_size)
            };
            let tc_pr = if is_header {
                format!(r#"<a:tcPr><a:solidFill><a:srgbClr val="{HEADER_FILL}"/></a:solidFill></a:tcPr>"#)
            } else {
                "<a:tcPr/>".to_string()
            };
            let _ = write!(body, r#"<a:tr h="{row_h}">"#);
            for c in 0..cols as usize {
                let text = row.get(c).map(cell_text).unwrap_or_default();
                let _ = write!(
                    body,
                    "<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody>{tc_pr}</a:tc>",
                    paragraph(&text, &style, "")
                );
            }
            body.push_str("</a:tr>");
        }

        let _ = write!(
            self.xml,
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="{}" bandRow="1"/><a:tblGrid>{grid}</a:tblGrid>{body}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            u8::from(header)
        );
    }

    pub fn chart(
        &mut self,
        rect: Rect,
        kind: ChartKind,
        categories: &[String],
        values: &[f64],
        title: Option<&str>,
        color: Option<&str>,
    ) -> Result<()> {
        let color = match color {
            Some(raw) => hex_color(raw)?,
            None => DEFAULT_BAR_COLOR.to_string(),
        };
        let layout = bar_layout(kind, rect, values, title.is_some());

        if let (Some(title_rect), Some(title)) = (layout.title, title) {
            self.label(title_rect, title, &RunStyle::sized(16.0).bold(), Align::Center);
        }
        let label_align = match kind {
            ChartKind::Column => Align::Center,
            ChartKind::Bar => Align::Right,
        };
        let value_align = match kind {
            ChartKind::Column => Align::Center,
            ChartKind::Bar => Align::Left,
        };
        let small = RunStyle::sized(11.0);
        for (i, value) in values.iter().enumerate() {
            self.sp("Bar", layout.bars[i], Some(&color), "ctr", "");
            self.label(layout.labels[i], &categories[i], &small, label_align);
            self.label(layout.value_labels[i], &value.to_string(), &small, value_align);
        }
        Ok(())
    }

    pub fn picture(&mut self, rect: Rect, rel_id: &str, description: &str) {
        let id = self.id();
        let _ = write!(
            self.xml,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            escape(description),
            rect.xfrm()
        );
    }

    pub fn finish(self) -> String {
        self.xml
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn area() -> Rect {
        Rect::from(&Position {
            x: 1.0,
            y: 1.0,
            w: 8.0,
            h: 4.0,
        })
    }

    #[test]
    fn column_bars_scale_to_largest_value() {
        let layout = bar_layout(ChartKind::Column, area(), &[50.0, 100.0, 0.0], false);
        assert_eq!(layout.bars.len(), 3);
        let (half, full, zero) = (layout.bars[0], layout.bars[1], layout.bars[2]);
        assert!((half.h * 2 - full.h).abs() <= 1);
        assert_eq!(zero.h, 0);
        // bars share a baseline
        assert_eq!(half.y + half.h, full.y + full.h);
        assert!(full.y >= area().y);
        assert!(layout.title.is_none());
    }

    #[test]
    fn horizontal_bars_stay_inside_area() {
        let a = area();
        let layout = bar_layout(ChartKind::Bar, a, &[3.0, 12.0], true);
        let title = layout.title.unwrap();
        for bar in &layout.bars {
            assert!(bar.y >= title.y + title.h);
            assert!(bar.x + bar.w <= a.x + a.w);
            assert!(bar.y + bar.h <= a.y + a.h);
        }
        assert!(layout.bars[1].w > layout.bars[0].w);
    }

    #[test]
    fn negative_and_all_zero_values_draw_empty_bars() {
        let layout = bar_layout(ChartKind::Column, area(), &[-5.0, 0.0], false);
        assert!(layout.bars.iter().all(|b| b.h == 0));
    }

    #[test]
    fn text_runs_carry_formatting() {
        let mut tree = ShapeTree::new();
        let style = RunStyle::from_options(&TextOptions {
            size: 24.0,
            bold: true,
            color: Some("#ff0000".into()),
            ..Default::default()
        })
        .unwrap();
        tree.text(area(), "Line <1>\nLine 2", &style, Align::Center);
        let xml = tree.finish();
        assert!(xml.contains(r#"sz="2400" b="1""#));
        assert!(xml.contains(r#"<a:srgbClr val="FF0000"/>"#));
        assert!(xml.contains("<a:t>Line &lt;1&gt;</a:t>"));
        assert_eq!(xml.matches("<a:p>").count(), 2);
        assert!(xml.contains(r#"<a:pPr algn="ctr"/>"#));
    }

    #[test]
    fn table_pads_short_rows() {
        let mut tree = ShapeTree::new();
        let rows = vec![
            vec![json!("Region"), json!("Units"), json!("Share")],
            vec![json!("North"), json!(12)],
        ];
        tree.table(area(), &rows, true, 12.0);
        let xml = tree.finish();
        assert_eq!(xml.matches("<a:gridCol").count(), 3);
        assert_eq!(xml.matches("<a:tc>").count(), 6);
        assert!(xml.contains("<a:t>12</a:t>"));
        assert_eq!(xml.matches(r#"b="1""#).count(), 3);
    }

    #[test]
    fn shape_ids_are_unique() {
        let mut tree = ShapeTree::new();
        tree.text(area(), "a", &RunStyle::sized(12.0), Align::Left);
        tree.picture(area(), "rId2", "logo");
        tree.chart(area(), ChartKind::Column, &["x".into()], &[1.0], Some("t"), None)
            .unwrap();
        let xml = tree.finish();
        let ids: Vec<&str> = xml
            .match_indices(r#"<p:cNvPr id=""#)
            .map(|(i, m)| {
                let rest = &xml[i + m.len()..];
                &rest[..rest.find('"').unwrap()]
            })
            .collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids.first(), Some(&"2"));
    }
}
