//! Export pipeline: rendered resume document to PDF.
//!
//! 1. `render_document` turns markdown into the preview page (`#resume-pdf`).
//! 2. `prepare_for_print` locates that node and normalizes it for print:
//!    light background, dark text, qualified links opening in a new context.
//! 3. A `PdfConverter` turns the normalized page into PDF bytes.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, error, info};

pub const TARGET_ID: &str = "resume-pdf";

const ROOT_STYLE: &str = "background: #ffffff; color: #000000; padding: 0px 20px; font-family: system-ui, -apple-system, sans-serif";
const NAME_PRINT_STYLE: &str = "margin-top: 0; padding-top: 0; margin-bottom: 0;";
const RULE_PRINT_STYLE: &str = "margin-top: 10px; margin-bottom: 10px;";
const LINK_STYLE: &str = "color: #0000EE; text-decoration: underline";
const MM_PER_INCH: f64 = 25.4;

static TARGET: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#resume-pdf").expect("static selector is valid"));
static NAME_DIV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div style="([^"]*font-size: 24px[^"]*)">"#).expect("valid regex"));
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<hr\b[^>]*>").expect("valid regex"));
static ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a\b([^>]*)>").expect("valid regex"));
static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:^|\s)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex"));
static REWRITTEN_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+(?:href|target|style)\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
});

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Resume content element not found")]
    MissingTarget,

    #[error("PDF conversion failed: {0}")]
    Conversion(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperSize {
    A4,
}

impl PaperSize {
    /// Width and height in millimetres, portrait.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
        }
    }

    fn css_name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
        }
    }
}

/// Fixed conversion settings for resume export.
///
/// Chromium prints vector output with live links, so there are no raster settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub filename: String,
    /// `[vertical, horizontal]` margins in millimetres.
    pub margins_mm: [f64; 2],
    pub paper: PaperSize,
    pub landscape: bool,
    /// Never split an element across pages.
    pub avoid_page_breaks: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: "resume.pdf".to_string(),
            margins_mm: [0.0, 15.0],
            paper: PaperSize::A4,
            landscape: false,
            avoid_page_breaks: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering and print normalization
// ────────────────────────────────────────────────────────────────────────────

/// Renders markdown into the preview page. Raw HTML (the contact header) passes through.
pub fn render_document(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, Parser::new_ext(markdown, options));

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Resume</title></head>\
         <body><div id=\"{TARGET_ID}\">{body}</div></body></html>"
    )
}

/// Locates the resume node in `document` and returns a print-ready page built
/// from a normalized copy of it.
pub fn prepare_for_print(document: &str, options: &ExportOptions) -> Result<String, ExportError> {
    let parsed = Html::parse_document(document);
    let target = parsed
        .select(&TARGET)
        .next()
        .ok_or(ExportError::MissingTarget)?;

    let inner = normalize_fragment(&target.inner_html());

    Ok(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Resume</title>\
         <style>{}</style></head><body><div id=\"{TARGET_ID}\" style=\"{ROOT_STYLE}\">{inner}</div></body></html>",
        print_css(options)
    ))
}

fn normalize_fragment(fragment: &str) -> String {
    let fragment = NAME_DIV.replace(fragment, |caps: &Captures| {
        format!("<div style=\"{} {NAME_PRINT_STYLE}\">", caps[1].trim_end())
    });
    let fragment = RULE.replace(&fragment, format!("<hr style=\"{RULE_PRINT_STYLE}\">"));
    ANCHOR
        .replace_all(&fragment, |caps: &Captures| {
            let href = HREF
                .captures(&caps[1])
                .and_then(|href| href.get(1).or_else(|| href.get(2)))
                .map(|href| qualify_link(href.as_str()))
                .filter(|href| !href.is_empty());
            let kept = REWRITTEN_ATTR.replace_all(&caps[1], "");
            let kept = kept.trim_end();
            match href {
                Some(href) => format!(
                    "<a href=\"{href}\" target=\"_blank\" style=\"{LINK_STYLE}\"{kept}>"
                ),
                None => format!("<a target=\"_blank\" style=\"{LINK_STYLE}\"{kept}>"),
            }
        })
        .into_owned()
}

fn qualify_link(href: &str) -> String {
    if href.is_empty() || href.starts_with("http") || href.starts_with("mailto:") {
        href.to_string()
    } else {
        format!("https://{href}")
    }
}

fn print_css(options: &ExportOptions) -> String {
    let orientation = if options.landscape {
        "landscape"
    } else {
        "portrait"
    };
    let [vertical, horizontal] = options.margins_mm;
    let mut css = format!(
        "@page {{ size: {} {orientation}; margin: {vertical}mm {horizontal}mm; }} \
         body {{ margin: 0; background: #ffffff; }}",
        options.paper.css_name()
    );
    if options.avoid_page_breaks {
        css.push_str(&format!(" #{TARGET_ID} * {{ break-inside: avoid; page-break-inside: avoid; }}"));
    }
    css
}

// ────────────────────────────────────────────────────────────────────────────
// Conversion
// ────────────────────────────────────────────────────────────────────────────

/// HTML-to-PDF conversion backend. Carried in `AppState` as `Arc<dyn PdfConverter>`.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html: &str, options: &ExportOptions) -> Result<Bytes, ExportError>;
}

/// Converter backed by a Gotenberg-compatible Chromium conversion service.
#[derive(Clone)]
pub struct HttpPdfConverter {
    client: Client,
    endpoint: String,
}

impl HttpPdfConverter {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: format!(
                "{}/forms/chromium/convert/html",
                base_url.trim_end_matches('/')
            ),
        }
    }

    /// Form fields understood by the conversion service. Lengths are in inches.
    pub fn form_fields(options: &ExportOptions) -> Vec<(&'static str, String)> {
        let (width, height) = options.paper.dimensions_mm();
        let [vertical, horizontal] = options.margins_mm;
        let inches = |mm: f64| format!("{:.2}", mm / MM_PER_INCH);

        vec![
            ("paperWidth", inches(width)),
            ("paperHeight", inches(height)),
            ("marginTop", inches(vertical)),
            ("marginBottom", inches(vertical)),
            ("marginLeft", inches(horizontal)),
            ("marginRight", inches(horizontal)),
            ("landscape", options.landscape.to_string()),
            ("printBackground", "true".to_string()),
            ("preferCssPageSize", "false".to_string()),
        ]
    }
}

#[async_trait]
impl PdfConverter for HttpPdfConverter {
    async fn convert(&self, html: &str, options: &ExportOptions) -> Result<Bytes, ExportError> {
        let file = Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html")
            .map_err(|e| ExportError::Conversion(e.to_string()))?;

        let form = Self::form_fields(options)
            .into_iter()
            .fold(Form::new().part("files", file), |form, (name, value)| {
                form.text(name, value)
            });

        let output_name = options.filename.trim_end_matches(".pdf").to_string();
        debug!("Posting resume ({} bytes) to {}", html.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Gotenberg-Output-Filename", output_name)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExportError::Conversion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("PDF converter returned {status}: {body}");
            return Err(ExportError::Conversion(format!("converter returned {status}")));
        }

        let pdf = response
            .bytes()
            .await
            .map_err(|e| ExportError::Conversion(e.to_string()))?;
        info!("Generated PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

/// Runs the full export for the currently rendered document, if any.
pub async fn export_pdf(
    rendered: Option<&str>,
    converter: &dyn PdfConverter,
    options: &ExportOptions,
) -> Result<Bytes, ExportError> {
    let document = rendered.ok_or(ExportError::MissingTarget)?;
    let page = prepare_for_print(document, options)?;
    converter.convert(&page, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::form::{ContactInfo, ResumeForm};
    use crate::resume::markdown::assemble;
    use std::sync::Mutex;

    struct RecordingConverter {
        pages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingConverter {
        fn new(fail: bool) -> Self {
            Self {
                pages: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl PdfConverter for RecordingConverter {
        async fn convert(&self, html: &str, _options: &ExportOptions) -> Result<Bytes, ExportError> {
            self.pages.lock().unwrap().push(html.to_string());
            if self.fail {
                Err(ExportError::Conversion("boom".to_string()))
            } else {
                Ok(Bytes::from_static(b"%PDF-1.7"))
            }
        }
    }

    fn sample_document() -> String {
        let form = ResumeForm {
            contact_info: ContactInfo {
                email: "ada@example.com".to_string(),
                github: "github.com/ada".to_string(),
                ..Default::default()
            },
            summary: "See [my site](ada.dev) for more.".to_string(),
            ..Default::default()
        };
        render_document(&assemble(&form, "Ada Lovelace"))
    }

    #[test]
    fn test_render_document_wraps_target_and_keeps_raw_html() {
        let page = render_document("## Skills\n\nRust");
        assert!(page.contains("<div id=\"resume-pdf\">"));
        assert!(page.contains("<h2>Skills</h2>"));

        let page = sample_document();
        assert!(page.contains("<hr style="));
        assert!(page.contains("href=\"mailto:ada@example.com\""));
    }

    #[test]
    fn test_prepare_for_print_missing_target() {
        let result = prepare_for_print("<html><body><p>nothing</p></body></html>", &ExportOptions::default());
        assert!(matches!(result, Err(ExportError::MissingTarget)));
    }

    #[test]
    fn test_prepare_for_print_forces_light_theme() {
        let page = prepare_for_print(&sample_document(), &ExportOptions::default()).unwrap();
        assert!(page.contains(&format!("<div id=\"resume-pdf\" style=\"{ROOT_STYLE}\">")));
        assert!(page.contains("@page { size: A4 portrait; margin: 0mm 15mm; }"));
        assert!(page.contains("break-inside: avoid"));
    }

    #[test]
    fn test_prepare_for_print_adjusts_name_and_rule_spacing() {
        let page = prepare_for_print(&sample_document(), &ExportOptions::default()).unwrap();
        assert!(page.contains("font-weight: bold; margin-top: 0; padding-top: 0; margin-bottom: 0;\">Ada Lovelace</div>"));
        assert!(page.contains("<hr style=\"margin-top: 10px; margin-bottom: 10px;\">"));
    }

    #[test]
    fn test_prepare_for_print_qualifies_and_styles_links() {
        let page = prepare_for_print(&sample_document(), &ExportOptions::default()).unwrap();
        assert!(page.contains("<a href=\"https://ada.dev\" target=\"_blank\" style=\"color: #0000EE; text-decoration: underline\">"));
        assert!(page.contains("<a href=\"mailto:ada@example.com\" target=\"_blank\""));
        assert!(page.contains("<a href=\"https://github.com/ada\" target=\"_blank\""));
        assert!(!page.contains("href=\"ada.dev\""));
    }

    #[test]
    fn test_link_rewrite_keeps_other_attributes() {
        let document = render_document("See [site](ada.dev \"My site\").");
        let page = prepare_for_print(&document, &ExportOptions::default()).unwrap();
        assert!(page.contains(&format!(
            "<a href=\"https://ada.dev\" target=\"_blank\" style=\"{LINK_STYLE}\" title=\"My site\">site</a>"
        )));

        let document = render_document(
            "<p><a id='home' href='ada.dev' style='color: red' rel=\"me\">home</a></p>",
        );
        let page = prepare_for_print(&document, &ExportOptions::default()).unwrap();
        assert!(page.contains(&format!(
            "<a href=\"https://ada.dev\" target=\"_blank\" style=\"{LINK_STYLE}\" id=\"home\" rel=\"me\">home</a>"
        )));
        assert!(!page.contains("color: red"));
    }

    #[test]
    fn test_qualify_link() {
        assert_eq!(qualify_link("example.com"), "https://example.com");
        assert_eq!(qualify_link("http://example.com"), "http://example.com");
        assert_eq!(qualify_link("mailto:a@b.com"), "mailto:a@b.com");
        assert_eq!(qualify_link(""), "");
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.filename, "resume.pdf");
        assert_eq!(options.margins_mm, [0.0, 15.0]);
        assert_eq!(options.paper, PaperSize::A4);
        assert!(!options.landscape);
        assert!(options.avoid_page_breaks);
    }

    #[test]
    fn test_orientation_and_page_breaks_reach_the_converter() {
        let options = ExportOptions {
            landscape: true,
            avoid_page_breaks: false,
            ..Default::default()
        };
        let fields = HttpPdfConverter::form_fields(&options);
        assert!(fields.contains(&("landscape", "true".to_string())));

        let css = print_css(&options);
        assert!(css.contains("size: A4 landscape;"));
        assert!(!css.contains("break-inside"));
    }

    #[test]
    fn test_form_fields_convert_millimetres_to_inches() {
        let fields = HttpPdfConverter::form_fields(&ExportOptions::default());
        let get = |name: &str| {
            fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value.as_str())
                .unwrap()
        };
        assert_eq!(get("paperWidth"), "8.27");
        assert_eq!(get("paperHeight"), "11.69");
        assert_eq!(get("marginTop"), "0.00");
        assert_eq!(get("marginLeft"), "0.59");
        assert_eq!(get("landscape"), "false");
    }

    #[tokio::test]
    async fn test_export_without_rendered_document_fails_cleanly() {
        let converter = RecordingConverter::new(false);
        let result = export_pdf(None, &converter, &ExportOptions::default()).await;
        assert!(matches!(result, Err(ExportError::MissingTarget)));
        assert!(converter.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_hands_normalized_page_to_converter() {
        let converter = RecordingConverter::new(false);
        let document = sample_document();
        let pdf = export_pdf(Some(&document), &converter, &ExportOptions::default())
            .await
            .unwrap();
        assert_eq!(&pdf[..], b"%PDF-1.7");
        let pages = converter.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains(ROOT_STYLE));
    }

    #[tokio::test]
    async fn test_export_surfaces_converter_failure() {
        let converter = RecordingConverter::new(true);
        let document = sample_document();
        let result = export_pdf(Some(&document), &converter, &ExportOptions::default()).await;
        assert!(matches!(result, Err(ExportError::Conversion(_))));
    }
}
