//! Assembling the Office Open XML package.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use {
    chrono::{SecondsFormat, Utc},
    serde::Serialize,
    tracing::{debug, info},
    zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions},
};

use crate::{
    error::{PresentationError, Result},
    schema::{Align, Element, Layout, Position, SLIDE_HEIGHT_IN, SLIDE_WIDTH_IN, Slide, SlideDeck},
    shapes::{Rect, RunStyle, ShapeTree},
    xml::{XML_DECL, emu, escape, hex_color, pml_namespaces},
};

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";

const CLR_MAP: &str = r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#;

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="docpilot"><a:themeElements><a:clrScheme name="docpilot"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="docpilot"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="docpilot"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationReport {
    pub path: PathBuf,
    pub slides: usize,
    pub images: usize,
}

struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
}

fn relationships(rels: &[Relationship]) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    for rel in rels {
        let kind = if rel.kind.starts_with("http") {
            rel.kind.to_string()
        } else {
            format!("{REL_BASE}/{}", rel.kind)
        };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{kind}" Target="{}"/>"#,
            rel.id,
            escape(&rel.target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn rel(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Relationship {
    Relationship {
        id: id.into(),
        kind,
        target: target.into(),
    }
}

/// Image bytes embedded in the package.
struct Media {
    name: String,
    data: Vec<u8>,
}

fn image_extension(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => Ok("png"),
        Some("jpg" | "jpeg") => Ok("jpeg"),
        Some("gif") => Ok("gif"),
        _ => Err(PresentationError::UnsupportedImage(path.to_path_buf())),
    }
}

/// Every part of the package, in write order.
#[derive(Default)]
struct Package {
    parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<(String, String)>,
}

impl Package {
    fn add(&mut self, name: impl Into<String>, content_type: Option<String>, body: String) {
        let name = name.into();
        if let Some(ct) = content_type {
            self.overrides.push((format!("/{name}"), ct));
        }
        self.parts.push((name, body.into_bytes()));
    }

    fn content_types(&self) -> String {
        let mut xml = format!(
            r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="gif" ContentType="image/gif"/>"#
        );
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(r#"<Override PartName="{part}" ContentType="{ct}"/>"#));
        }
        xml.push_str("</Types>");
        xml
    }

    fn write(self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut zip = ZipWriter::new(File::create(path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types().as_bytes())?;
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        zip.finish()?;
        Ok(())
    }
}

fn slide_xml(slide: &Slide, image_rels: &[String]) -> Result<String> {
    let mut tree = ShapeTree::new();
    let full_width = |y, h| Rect::from(&Position {
        x: 0.5,
        y,
        w: SLIDE_WIDTH_IN - 1.0,
        h,
    });
    match slide.layout {
        Layout::Title => {
            if let Some(ref title) = slide.title {
                tree.text(full_width(2.3, 1.5), title, &RunStyle::sized(44.0).bold(), Align::Center);
            }
            if let Some(ref subtitle) = slide.subtitle {
                tree.text(full_width(4.0, 1.0), subtitle, &RunStyle::sized(24.0), Align::Center);
            }
        },
        Layout::Content => {
            if let Some(ref title) = slide.title {
                tree.text(full_width(0.3, 1.0), title, &RunStyle::sized(32.0).bold(), Align::Left);
            }
        },
        Layout::Blank => {},
    }

    let mut images = image_rels.iter();
    for element in &slide.elements {
        match element {
            Element::Text {
                text,
                position,
                options,
            } => tree.text(
                position.into(),
                text,
                &RunStyle::from_options(options)?,
                options.align,
            ),
            Element::Bullet {
                items,
                level,
                position,
                options,
            } => tree.bullets(
                position.into(),
                items,
                *level,
                &RunStyle::from_options(options)?,
                options.align,
            ),
            Element::Table {
                rows,
                header,
                position,
                font_size,
            } => tree.table(position.into(), rows, *header, font_size.unwrap_or(12.0)),
            Element::Chart {
                chart_type,
                categories,
                values,
                title,
                color,
                position,
            } => tree.chart(
                position.into(),
                *chart_type,
                categories,
                values,
                title.as_deref(),
                color.as_deref(),
            )?,
            Element::Image { path, position } => {
                let rel_id = images.next().ok_or_else(|| {
                    PresentationError::InvalidDeck("image relationship missing".into())
                })?;
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("image");
                tree.picture(position.into(), rel_id, name);
            },
        }
    }

    let background = match slide.background {
        Some(ref color) => format!(
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            hex_color(color)?
        ),
        None => String::new(),
    };

    Ok(format!(
        r#"{XML_DECL}<p:sld {}><p:cSld>{background}<p:spTree>{GROUP_PROPS}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        pml_namespaces(),
        tree.finish()
    ))
}

fn notes_xml(notes: &str) -> String {
    let paragraphs: String = notes
        .split('\n')
        .map(|line| {
            format!(
                r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            )
        })
        .collect();
    format!(
        r#"{XML_DECL}<p:notes {}><p:cSld><p:spTree>{GROUP_PROPS}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#,
        pml_namespaces()
    )
}

fn master_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster {}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld>{CLR_MAP}<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        pml_namespaces()
    )
}

fn layout_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout {} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        pml_namespaces()
    )
}

fn notes_master_xml() -> String {
    format!(
        r#"{XML_DECL}<p:notesMaster {}><p:cSld><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld>{CLR_MAP}</p:notesMaster>"#,
        pml_namespaces()
    )
}

fn core_xml(deck: &SlideDeck) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = deck.title.as_deref().map(escape).unwrap_or_default();
    let author = deck.author.as_deref().map(escape).unwrap_or_else(|| "docpilot".into());
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:creator>{author}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#
    )
}

fn app_xml(slides: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>docpilot</Application><Slides>{slides}</Slides></Properties>"#
    )
}

/// Write `deck` as a `.pptx` file at `path`.
pub fn build_presentation(deck: &SlideDeck, path: &Path) -> Result<PresentationReport> {
    deck.validate()?;

    let mut package = Package::default();
    let mut media: Vec<Media> = Vec::new();
    let has_notes = deck.slides.iter().any(|s| s.notes.is_some());

    package.add(
        "_rels/.rels",
        None,
        relationships(&[
            rel("rId1", "officeDocument", "ppt/presentation.xml"),
            rel(
                "rId2",
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
                "docProps/core.xml",
            ),
            rel("rId3", "extended-properties", "docProps/app.xml"),
        ]),
    );
    package.add(
        "docProps/core.xml",
        Some("application/vnd.openxmlformats-package.core-properties+xml".into()),
        core_xml(deck),
    );
    package.add(
        "docProps/app.xml",
        Some("application/vnd.openxmlformats-officedocument.extended-properties+xml".into()),
        app_xml(deck.slides.len()),
    );

    // Presentation-level relationships: master, theme, slides, notes master.
    let mut pres_rels = vec![
        rel("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        rel("rId2", "theme", "theme/theme1.xml"),
    ];
    let mut slide_ids = String::new();
    for (index, slide) in deck.slides.iter().enumerate() {
        let n = index + 1;
        let rel_id = format!("rId{}", n + 2);
        slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{rel_id}"/>"#, 255 + n));
        pres_rels.push(rel(rel_id, "slide", format!("slides/slide{n}.xml")));

        let mut slide_rels = vec![rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];
        let mut image_rels = Vec::new();
        for element in &slide.elements {
            if let Element::Image { path: image, .. } = element {
                let ext = image_extension(image)?;
                let data = std::fs::read(image).map_err(|source| PresentationError::Image {
                    path: image.clone(),
                    source,
                })?;
                let name = format!("image{}.{ext}", media.len() + 1);
                let rel_id = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push(rel(rel_id.clone(), "image", format!("../media/{name}")));
                image_rels.push(rel_id);
                media.push(Media { name, data });
            }
        }
        if let Some(ref notes) = slide.notes {
            let rel_id = format!("rId{}", slide_rels.len() + 1);
            slide_rels.push(rel(rel_id, "notesSlide", format!("../notesSlides/notesSlide{n}.xml")));
            package.add(
                format!("ppt/notesSlides/notesSlide{n}.xml"),
                Some(format!("{CT_PML}.notesSlide+xml")),
                notes_xml(notes),
            );
            package.add(
                format!("ppt/notesSlides/_rels/notesSlide{n}.xml.rels"),
                None,
                relationships(&[
                    rel("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
                    rel("rId2", "slide", format!("../slides/slide{n}.xml")),
                ]),
            );
        }

        package.add(
            format!("ppt/slides/slide{n}.xml"),
            Some(format!("{CT_PML}.slide+xml")),
            slide_xml(slide, &image_rels)?,
        );
        package.add(
            format!("ppt/slides/_rels/slide{n}.xml.rels"),
            None,
            relationships(&slide_rels),
        );
        debug!(slide = n, elements = slide.elements.len(), "built slide");
    }

    let notes_master = if has_notes {
        let rel_id = format!("rId{}", pres_rels.len() + 1);
        pres_rels.push(rel(rel_id.clone(), "notesMaster", "notesMasters/notesMaster1.xml"));
        package.add(
            "ppt/notesMasters/notesMaster1.xml",
            Some(format!("{CT_PML}.notesMaster+xml")),
            notes_master_xml(),
        );
        package.add(
            "ppt/notesMasters/_rels/notesMaster1.xml.rels",
            None,
            relationships(&[rel("rId1", "theme", "../theme/theme2.xml")]),
        );
        package.add(
            "ppt/theme/theme2.xml",
            Some("application/vnd.openxmlformats-officedocument.theme+xml".into()),
            format!("{XML_DECL}{THEME}"),
        );
        format!(r#"<p:notesMasterIdLst><p:notesMasterId r:id="{rel_id}"/></p:notesMasterIdLst>"#)
    } else {
        String::new()
    };

    package.add(
        "ppt/presentation.xml",
        Some(format!("{CT_PML}.presentation.main+xml")),
        format!(
            r#"{XML_DECL}<p:presentation {} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{notes_master}<p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            pml_namespaces(),
            emu(SLIDE_WIDTH_IN),
            emu(SLIDE_HEIGHT_IN)
        ),
    );
    package.add("ppt/_rels/presentation.xml.rels", None, relationships(&pres_rels));
    package.add(
        "ppt/slideMasters/slideMaster1.xml",
        Some(format!("{CT_PML}.slideMaster+xml")),
        master_xml(),
    );
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        None,
        relationships(&[
            rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            rel("rId2", "theme", "../theme/theme1.xml"),
        ]),
    );
    package.add(
        "ppt/slideLayouts/slideLayout1.xml",
        Some(format!("{CT_PML}.slideLayout+xml")),
        layout_xml(),
    );
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        None,
        relationships(&[rel("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    );
    package.add(
        "ppt/theme/theme1.xml",
        Some("application/vnd.openxmlformats-officedocument.theme+xml".into()),
        format!("{XML_DECL}{THEME}"),
    );

    let images = media.len();
    for Media { name, data } in media {
        package.parts.push((format!("ppt/media/{name}"), data));
    }
    package.write(path)?;

    info!(
        path = %path.display(),
        slides = deck.slides.len(),
        images,
        "presentation written"
    );
    Ok(PresentationReport {
        path: path.to_path_buf(),
        slides: deck.slides.len(),
        images,
    })
}
