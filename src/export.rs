//! Coupon rendering: a self-contained SVG ticket and a minimal one-page
//! PDF. The PDF is assembled by hand (header, objects, xref, trailer)
//! because the ticket only ever needs Helvetica text lines.

use crate::coupon::Coupon;

// ---------------------------------------------------------------------------
// Shared ticket lines
// ---------------------------------------------------------------------------

fn ticket_lines(coupon: &Coupon) -> Vec<String> {
    let mut lines = vec![
        format!("PENALTY COUPON - {} profile", coupon.risk_profile),
        String::new(),
    ];
    for (i, pick) in coupon.picks.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, pick.teams));
        lines.push(format!(
            "   {} @ {:.3}  (confidence {:.0})",
            pick.bet_label, pick.odds, pick.confidence
        ));
    }
    lines.push(String::new());
    lines.push(format!("Combined odds: {:.3}", coupon.combined_odds));
    lines.push(format!("Average confidence: {:.1}", coupon.average_confidence));
    if let Some(warning) = &coupon.warning {
        lines.push(format!("Note: {warning}"));
    }
    lines
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn coupon_svg(coupon: &Coupon) -> String {
    let lines = ticket_lines(coupon);
    let line_height = 22;
    let height = 60 + lines.len() * line_height + 20;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"640\" height=\"{height}\" \
         viewBox=\"0 0 640 {height}\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#0f172a\"/>\n");
    svg.push_str("<rect x=\"8\" y=\"8\" width=\"624\" height=\"40\" rx=\"6\" fill=\"#1d4ed8\"/>\n");
    svg.push_str(
        "<text x=\"320\" y=\"34\" text-anchor=\"middle\" fill=\"#ffffff\" \
         font-family=\"monospace\" font-size=\"18\">Virtual Penalty Ticket</text>\n",
    );
    for (i, line) in lines.iter().enumerate() {
        let y = 70 + i * line_height;
        svg.push_str(&format!(
            "<text x=\"24\" y=\"{y}\" fill=\"#e2e8f0\" font-family=\"monospace\" \
             font-size=\"14\" xml:space=\"preserve\">{}</text>\n",
            escape_xml(line)
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

pub fn coupon_pdf(coupon: &Coupon) -> Vec<u8> {
    let lines = ticket_lines(coupon);

    let mut content = String::from("BT\n/F1 12 Tf\n14 TL\n50 780 Td\n");
    for line in &lines {
        content.push_str(&format!("({}) Tj\nT*\n", escape_pdf_text(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
    ];

    let mut pdf: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}
