//! PDF report for one stored analysis.
//!
//! Layout is computed first as a flat list of `ReportLine`s, then paginated and
//! drawn with printpdf's built-in Helvetica.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use thiserror::Error;

use crate::analysis::scoring::recommend;
use crate::models::analysis::AnalysisRow;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.5;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineStyle {
    Title,
    Heading,
    Body,
    Blank,
}

impl LineStyle {
    fn font_size_pt(self) -> f32 {
        match self {
            LineStyle::Title => 18.0,
            LineStyle::Heading => 13.0,
            LineStyle::Body | LineStyle::Blank => 11.0,
        }
    }

    fn height_mm(self) -> f32 {
        self.font_size_pt() * PT_TO_MM * LINE_SPACING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub style: LineStyle,
}

impl ReportLine {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new(LineStyle::Blank, "")
    }
}

/// Lays out the report content, wrapping long lines to the printable width.
pub fn build_report_lines(row: &AnalysisRow) -> Vec<ReportLine> {
    let recommendation = recommend(row.score, &row.missing.0);
    let mut lines = vec![
        ReportLine::new(LineStyle::Title, "Course Skill Alignment Report"),
        ReportLine::blank(),
    ];

    for (label, value) in [
        ("Course", row.course_name.as_str()),
        ("Major", row.major.as_str()),
        ("Level", row.level.as_str()),
        ("Date", row.date.as_str()),
    ] {
        push_wrapped(&mut lines, LineStyle::Body, &format!("{label}: {value}"));
    }
    push_wrapped(
        &mut lines,
        LineStyle::Body,
        &format!("Coverage score: {:.2}%", row.score),
    );

    push_section(&mut lines, "Matched skills", &row.matched.0);
    push_section(&mut lines, "Missing skills", &row.missing.0);

    lines.push(ReportLine::blank());
    lines.push(ReportLine::new(LineStyle::Heading, "Recommendation"));
    push_wrapped(&mut lines, LineStyle::Body, &recommendation);

    lines
}

fn push_section(lines: &mut Vec<ReportLine>, heading: &str, skills: &[String]) {
    lines.push(ReportLine::blank());
    lines.push(ReportLine::new(
        LineStyle::Heading,
        format!("{heading} ({})", skills.len()),
    ));
    if skills.is_empty() {
        lines.push(ReportLine::new(LineStyle::Body, "- none"));
    }
    for skill in skills {
        push_wrapped(lines, LineStyle::Body, &format!("- {skill}"));
    }
}

fn push_wrapped(lines: &mut Vec<ReportLine>, style: LineStyle, text: &str) {
    for chunk in wrap_text(text, max_chars_per_line(style)) {
        lines.push(ReportLine::new(style, chunk));
    }
}

fn max_chars_per_line(style: LineStyle) -> usize {
    let printable_mm = A4_WIDTH_MM - 2.0 * MARGIN_MM;
    let glyph_mm = style.font_size_pt() * AVG_GLYPH_EM * PT_TO_MM;
    (printable_mm / glyph_mm).floor().max(1.0) as usize
}

/// Greedy word wrap. Words longer than `width` are split hard.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            out.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Splits lines into pages that fit between the top and bottom margins.
pub fn paginate(lines: Vec<ReportLine>) -> Vec<Vec<ReportLine>> {
    let usable_mm = A4_HEIGHT_MM - 2.0 * MARGIN_MM;
    let mut pages = vec![Vec::new()];
    let mut used_mm = 0.0;

    for line in lines {
        let h = line.style.height_mm();
        if used_mm + h > usable_mm && pages.last().is_some_and(|p| !p.is_empty()) {
            pages.push(Vec::new());
            used_mm = 0.0;
        }
        used_mm += h;
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}

/// Renders the report for `row` and returns the PDF bytes.
pub fn render_report(row: &AnalysisRow) -> Result<Vec<u8>, ReportError> {
    let title = format!("Analysis {} - {}", row.id, latin1(&row.course_name));
    let (doc, first_page, first_layer) = PdfDocument::new(
        title.as_str(),
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font: {e:?}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font: {e:?}")))?;

    for (index, page_lines) in paginate(build_report_lines(row)).into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = A4_HEIGHT_MM - MARGIN_MM;
        for line in page_lines {
            y -= line.style.height_mm();
            if line.style == LineStyle::Blank {
                continue;
            }
            let font: &IndirectFontRef = match line.style {
                LineStyle::Title | LineStyle::Heading => &bold,
                _ => &regular,
            };
            layer.use_text(
                latin1(&line.text),
                line.style.font_size_pt(),
                Mm(MARGIN_MM),
                Mm(y),
                font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ReportError::Pdf(format!("save: {e:?}")))
}

/// Built-in PDF fonts only cover Latin-1.
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect()
}
