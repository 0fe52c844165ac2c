//! Text PDF for submitted QC forms. Long remarks flow onto extra pages.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use crate::model::{Machine, QcForm};

const PAGE_WIDTH: f32 = 595.0; // A4 in points
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const LINE_HEIGHT: f32 = 18.0;
const FONT_SIZE: f32 = 12.0;
const MAX_LINE_CHARS: usize = 90;
const REMARKS_INDENT: &str = "         ";

/// Body lines per page; the last line slot holds the page footer.
const BODY_LINES: usize = ((PAGE_HEIGHT - 2.0 * MARGIN) / LINE_HEIGHT) as usize - 2;

const FONT: Name<'static> = Name(b"F1");

/// Render the inspection record as a PDF document.
pub fn render_qc_form(form: &QcForm, machine: &Machine) -> Vec<u8> {
    let pages = paginate(&form_lines(form, machine));
    let page_count = pages.len();

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let page_ids: Vec<(Ref, Ref)> = (0..page_count as i32)
        .map(|i| (Ref::new(4 + 2 * i), Ref::new(5 + 2 * i)))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_count as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (i, (lines, (page_id, content_id))) in pages.iter().zip(&page_ids).enumerate() {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(*content_id);
        page.resources().fonts().pair(FONT, font_id);
        page.finish();

        let mut content = Content::new();
        content.begin_text();
        content.set_font(FONT, FONT_SIZE);
        content.next_line(MARGIN, PAGE_HEIGHT - MARGIN);
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                content.next_line(0.0, -LINE_HEIGHT);
            }
            content.show(Str(&win_ansi(line)));
        }
        content.end_text();

        content.begin_text();
        content.set_font(FONT, FONT_SIZE - 3.0);
        content.next_line(MARGIN, MARGIN);
        content.show(Str(&win_ansi(&format!("Page {} of {}", i + 1, page_count))));
        content.end_text();
        pdf.stream(*content_id, &content.finish());
    }

    pdf.finish()
}

fn form_lines(form: &QcForm, machine: &Machine) -> Vec<String> {
    let mut lines = vec![
        "QC Inspection Form".to_string(),
        String::new(),
        format!("QC Form ID: {}", form.id),
        format!("Machine ID: {}", form.machine_id),
        format!("Product No.: {}", machine.product_no),
        format!("Model: {}", machine.model),
        format!("Block: {}", machine.block_no),
        format!("Inspector Name: {}", form.inspector_name),
        format!("Status: {}", form.status.as_str()),
    ];
    let remarks = form.remarks.as_deref().unwrap_or("");
    for (i, chunk) in wrap(remarks, MAX_LINE_CHARS - REMARKS_INDENT.len())
        .into_iter()
        .enumerate()
    {
        let prefix = if i == 0 { "Remarks: " } else { REMARKS_INDENT };
        lines.push(format!("{}{}", prefix, chunk));
    }
    if let Some(at) = form.create_at.as_deref() {
        lines.push(String::new());
        lines.push(format!("Submitted: {}", at));
    }
    lines
}

/// Split lines into pages of at most `BODY_LINES`. Always at least one page.
fn paginate(lines: &[String]) -> Vec<Vec<String>> {
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines.chunks(BODY_LINES).map(<[String]>::to_vec).collect()
}

/// Encode text for the standard Helvetica font under WinAnsiEncoding.
/// Latin-1 maps one-to-one; characters outside the code page become `?`.
fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            'Š' => 0x8a,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '\u{2014}' => 0x97,
            '™' => 0x99,
            'š' => 0x9a,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

/// Word-wrap to `width` characters. Words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(width) {
                if len > 0 && len + 1 + piece.len() > width {
                    lines.push(std::mem::take(&mut current));
                    len = 0;
                }
                if len > 0 {
                    current.push(' ');
                    len += 1;
                }
                current.extend(piece);
                len += piece.len();
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QcStatus;

    fn fixtures() -> (QcForm, Machine) {
        let machine: Machine = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "blockNo": 3,
            "model": "CPT425-SERRA",
            "productNo": "1234567",
        }))
        .unwrap();
        let form = QcForm {
            id: "q1".into(),
            machine_id: "m1".into(),
            inspector_name: "J. Smith".into(),
            status: QcStatus::Pass,
            remarks: Some("Torque checked".into()),
            pdf_path: None,
            pdf_generated_at: None,
            create_at: Some("2025-06-10T08:00:00+00:00".into()),
        };
        (form, machine)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn renders_form_fields() {
        let (form, machine) = fixtures();
        let bytes = render_qc_form(&form, &machine);
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"%%EOF"));
        assert!(contains(&bytes, b"Product No.: 1234567"));
        assert!(contains(&bytes, b"Status: PASS"));
        assert!(contains(&bytes, b"Inspector Name: J. Smith"));
        assert!(contains(&bytes, b"Remarks: Torque checked"));
        assert!(contains(&bytes, b"Page 1 of 1"));
    }

    #[test]
    fn long_remarks_flow_onto_more_pages() {
        let (mut form, machine) = fixtures();
        form.remarks = Some(format!("{}FINAL-SIGNOFF", "torque ok ".repeat(400)));

        let pages = paginate(&form_lines(&form, &machine));
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| p.len() <= BODY_LINES));
        let last = pages.last().unwrap();
        assert!(last.last().unwrap().starts_with("Submitted: "));
        assert!(pages.concat().iter().any(|l| l.contains("FINAL-SIGNOFF")));

        let bytes = render_qc_form(&form, &machine);
        assert!(contains(&bytes, b"FINAL-SIGNOFF"));
        assert!(contains(&bytes, b"Submitted: 2025-06-10"));
        let footer = format!("Page {} of {}", pages.len(), pages.len());
        assert!(contains(&bytes, footer.as_bytes()));
    }

    #[test]
    fn latin_names_keep_their_accents() {
        let (mut form, machine) = fixtures();
        form.inspector_name = "José Müller".into();
        let bytes = render_qc_form(&form, &machine);

        // Non-ASCII strings may be written as literal or hex strings.
        let encoded = win_ansi("Inspector Name: José Müller");
        let hex: String = encoded.iter().map(|b| format!("{:02x}", b)).collect();
        assert!(
            contains(&bytes, &encoded) || contains(&bytes.to_ascii_lowercase(), hex.as_bytes())
        );
    }

    #[test]
    fn win_ansi_encoding() {
        assert_eq!(win_ansi("Müller"), b"M\xfcller");
        assert_eq!(win_ansi("5 € – ok"), b"5 \x80 \x96 ok");
        assert_eq!(win_ansi("検査"), b"??");
    }

    #[test]
    fn wrap_long_remarks() {
        let text = "word ".repeat(40);
        let lines = wrap(&text, 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(wrap("", 20), vec![String::new()]);

        let unbroken = "x".repeat(45);
        assert_eq!(wrap(&unbroken, 20).len(), 3);
    }
}
