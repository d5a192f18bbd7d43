//! HTML pages for the annotate endpoint

use std::fmt::Write as _;

use crate::explanations::ExplanationPaths;

/// Multipart field the upload form sends the image in
pub const UPLOAD_FIELD: &str = "img";

/// Message shown before anything was uploaded
pub const INSTRUCTIONS: &str = "Please submit the file and wait for approximately one minute.";

/// Render the upload page, optionally with an analysis result
pub fn render_page(out: &str, paths: Option<&ExplanationPaths>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Image analysis</title>\n</head>\n<body>\n");
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"{}\" accept=\"image/*\">\n\
         <input type=\"submit\" value=\"Upload\">\n</form>\n",
        UPLOAD_FIELD
    );
    let _ = writeln!(html, "<p id=\"out\">{}</p>", escape(out));

    if let Some(paths) = paths {
        let _ = writeln!(
            html,
            "<h2>Original image</h2>\n<img src=\"{}\" alt=\"original image\">",
            escape(&paths.original)
        );
        html.push_str("<h2>Most activated prototypes</h2>\n<ol>\n");
        for (i, path) in paths.activation_maps.iter().enumerate() {
            let _ = writeln!(
                html,
                "<li><img src=\"{}\" alt=\"activation map for top-{} prototype\"></li>",
                escape(path),
                i + 1
            );
        }
        html.push_str("</ol>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
