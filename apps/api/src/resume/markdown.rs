//! Markdown assembly: turns a `ResumeForm` snapshot into the resume document.
//!
//! Section order is fixed: contact block, summary, skills, work experience,
//! education, projects. Empty sections are dropped entirely, so an empty form
//! assembles to an empty string. Output is a pure function of its inputs.

use pulldown_cmark_escape::{escape_html, FmtWriter};

use crate::resume::form::{ContactInfo, Entry, ResumeForm};

const NAME_STYLE: &str =
    "margin-top: 0; padding-top: 0; text-align: center; font-size: 24px; font-weight: bold;";
const RULE_STYLE: &str = "margin-top: 15px; margin-bottom: 15px;";
const CHANNEL_SEPARATOR: &str = " | ";

/// Assembles the full markdown document for a form.
pub fn assemble(form: &ResumeForm, display_name: &str) -> String {
    let sections = [
        contact_markdown(&form.contact_info, display_name),
        text_section("Professional Summary", &form.summary),
        text_section("Skills", &form.skills),
        entries_to_markdown(&form.experience, "Work Experience"),
        entries_to_markdown(&form.education, "Education"),
        entries_to_markdown(&form.projects, "Projects"),
    ];

    sections.into_iter().flatten().collect::<Vec<_>>().join("\n\n")
}

/// Renders a list of entries under a `##` heading. `None` for an empty list.
pub fn entries_to_markdown(entries: &[Entry], heading: &str) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let blocks = entries.iter().map(entry_block).collect::<Vec<_>>();
    Some(format!("## {heading}\n\n{}", blocks.join("\n\n")))
}

fn entry_block(entry: &Entry) -> String {
    let mut block = format!("### {} @ {}", entry.title.trim(), entry.organization.trim());

    if let Some(range) = date_range(entry) {
        block.push('\n');
        block.push_str(&range);
    }

    let description = entry.description.trim();
    if !description.is_empty() {
        block.push_str("\n\n");
        block.push_str(description);
    }

    block
}

fn date_range(entry: &Entry) -> Option<String> {
    let start = entry.start_date.trim();
    let end = if entry.current {
        "Present"
    } else {
        entry.end_date.trim()
    };

    if start.is_empty() && end.is_empty() {
        None
    } else {
        Some(format!("{start} - {end}"))
    }
}

fn text_section(heading: &str, body: &str) -> Option<String> {
    let body = body.trim();
    (!body.is_empty()).then(|| format!("## {heading}\n\n{body}"))
}

/// The centered name/rule/channels header. Omitted when no channel is filled in.
fn contact_markdown(contact: &ContactInfo, display_name: &str) -> Option<String> {
    let channels = contact_channels(contact);
    if channels.is_empty() {
        return None;
    }

    Some(format!(
        "<div style=\"{NAME_STYLE}\">{}</div>\n<hr style=\"{RULE_STYLE}\">\n<div align=\"center\">{}</div>",
        escape(&single_line(display_name).unwrap_or_default()),
        channels.join(CHANNEL_SEPARATOR),
    ))
}

fn contact_channels(contact: &ContactInfo) -> Vec<String> {
    let mut parts = Vec::new();

    if let Some(email) = single_line(&contact.email) {
        let email = escape(&email);
        parts.push(format!(
            "📧 <a href=\"mailto:{email}\" target=\"_blank\">{email}</a>"
        ));
    }
    if let Some(mobile) = single_line(&contact.mobile) {
        parts.push(format!("📱 {}", escape(&mobile)));
    }
    if let Some(address) = single_line(&contact.address) {
        parts.push(format!("📍 {}", escape(&address)));
    }
    for (icon, value) in [
        ("💼", &contact.linkedin),
        ("💻", &contact.github),
        ("🐦", &contact.twitter),
    ] {
        if let Some(url) = single_line(value) {
            let url = escape(&qualify_url(&url));
            parts.push(format!("{icon} <a href=\"{url}\" target=\"_blank\">{url}</a>"));
        }
    }

    parts
}

/// Collapses every whitespace run to a single space. The header is a raw HTML
/// block, which a blank line inside a value would terminate.
fn single_line(value: &str) -> Option<String> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!value.is_empty()).then_some(value)
}

/// Prefixes `https://` onto a URL that carries no scheme.
pub fn qualify_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    // Writing into a String cannot fail.
    let _ = escape_html(FmtWriter(&mut escaped), value);
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, organization: &str, current: bool) -> Entry {
        Entry {
            title: title.to_string(),
            organization: organization.to_string(),
            start_date: "Jan 2020".to_string(),
            end_date: if current {
                String::new()
            } else {
                "Mar 2022".to_string()
            },
            current,
            description: "Shipped the billing pipeline.".to_string(),
        }
    }

    fn full_form() -> ResumeForm {
        ResumeForm {
            contact_info: ContactInfo {
                email: "ada@example.com".to_string(),
                mobile: "+1 555 0100".to_string(),
                linkedin: "linkedin.com/in/ada".to_string(),
                twitter: "https://twitter.com/ada".to_string(),
                github: "github.com/ada".to_string(),
                address: "London, UK".to_string(),
            },
            summary: "Engineer with a taste for compilers.".to_string(),
            skills: "Rust, SQL".to_string(),
            experience: vec![entry("Staff Engineer", "Acme", true)],
            education: vec![entry("BSc Mathematics", "UCL", false)],
            projects: vec![entry("Analytical Engine", "Personal", false)],
        }
    }

    #[test]
    fn test_empty_form_assembles_to_empty_string() {
        assert_eq!(assemble(&ResumeForm::default(), "Ada Lovelace"), "");
    }

    #[test]
    fn test_blank_fields_are_treated_as_empty() {
        let form = ResumeForm {
            summary: "   ".to_string(),
            skills: "\n".to_string(),
            ..Default::default()
        };
        assert_eq!(assemble(&form, "Ada"), "");
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let form = full_form();
        assert_eq!(assemble(&form, "Ada"), assemble(&form, "Ada"));
    }

    #[test]
    fn test_sections_appear_in_fixed_order() {
        let md = assemble(&full_form(), "Ada");
        let positions: Vec<usize> = [
            "<div style=",
            "## Professional Summary",
            "## Skills",
            "## Work Experience",
            "## Education",
            "## Projects",
        ]
        .iter()
        .map(|needle| md.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{md}");
    }

    #[test]
    fn test_email_only_contact_renders_single_mailto_channel() {
        let form = ResumeForm {
            contact_info: ContactInfo {
                email: "a@b.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let md = assemble(&form, "Ada");
        let channels = md.lines().last().unwrap();
        assert_eq!(
            channels,
            "<div align=\"center\">📧 <a href=\"mailto:a@b.com\" target=\"_blank\">a@b.com</a></div>"
        );
        assert!(!md.contains(" | "));
        assert_eq!(md.matches("<a ").count(), 1);
    }

    #[test]
    fn test_contact_block_layout() {
        let form = ResumeForm {
            contact_info: ContactInfo {
                mobile: "555".to_string(),
                address: "Paris".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let md = assemble(&form, "Ada Lovelace");
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(">Ada Lovelace</div>"));
        assert!(lines[1].starts_with("<hr"));
        assert_eq!(lines[2], "<div align=\"center\">📱 555 | 📍 Paris</div>");
    }

    #[test]
    fn test_url_without_scheme_gets_https() {
        let form = ResumeForm {
            contact_info: ContactInfo {
                linkedin: "linkedin.com/in/x".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let md = assemble(&form, "X");
        assert!(md.contains("href=\"https://linkedin.com/in/x\""));
        assert!(md.contains(">https://linkedin.com/in/x</a>"));
    }

    #[test]
    fn test_url_with_scheme_is_kept() {
        assert_eq!(qualify_url("http://x.dev"), "http://x.dev");
        assert_eq!(qualify_url("https://x.dev"), "https://x.dev");
        assert_eq!(qualify_url("x.dev"), "https://x.dev");
    }

    #[test]
    fn test_no_contact_block_without_channels() {
        let form = ResumeForm {
            summary: "Hello".to_string(),
            ..Default::default()
        };
        let md = assemble(&form, "Ada");
        assert_eq!(md, "## Professional Summary\n\nHello");
        assert!(!md.contains("<hr"));
    }

    #[test]
    fn test_only_experience_heading_when_other_lists_empty() {
        let form = ResumeForm {
            experience: vec![entry("Engineer", "Acme", false)],
            ..Default::default()
        };
        let md = assemble(&form, "Ada");
        assert!(md.contains("## Work Experience"));
        assert!(!md.contains("## Education"));
        assert!(!md.contains("## Projects"));
    }

    #[test]
    fn test_entry_block_format() {
        let md = entries_to_markdown(
            &[entry("Engineer", "Acme", true), entry("Intern", "Initech", false)],
            "Work Experience",
        )
        .unwrap();
        assert_eq!(
            md,
            "## Work Experience\n\n\
             ### Engineer @ Acme\nJan 2020 - Present\n\nShipped the billing pipeline.\n\n\
             ### Intern @ Initech\nJan 2020 - Mar 2022\n\nShipped the billing pipeline."
        );
    }

    #[test]
    fn test_entry_without_dates_or_description() {
        let bare = Entry {
            title: "Hackathon".to_string(),
            organization: "ETH".to_string(),
            ..Default::default()
        };
        assert_eq!(
            entries_to_markdown(&[bare], "Projects").unwrap(),
            "## Projects\n\n### Hackathon @ ETH"
        );
    }

    #[test]
    fn test_empty_entry_list_renders_nothing() {
        assert!(entries_to_markdown(&[], "Education").is_none());
    }

    #[test]
    fn test_contact_values_are_escaped() {
        let form = ResumeForm {
            contact_info: ContactInfo {
                address: "<script>".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let md = assemble(&form, "Tom & Jerry");
        assert!(md.contains("Tom &amp; Jerry"));
        assert!(md.contains("📍 &lt;script&gt;"));
    }

    #[test]
    fn test_multiline_contact_values_stay_inside_header() {
        let form = ResumeForm {
            contact_info: ContactInfo {
                address: "221B Baker St\n\nLondon".to_string(),
                mobile: " +44  20\t7946 ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let md = assemble(&form, "Sherlock\nHolmes");
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 3, "{md}");
        assert!(lines[0].ends_with(">Sherlock Holmes</div>"));
        assert_eq!(
            lines[2],
            "<div align=\"center\">📱 +44 20 7946 | 📍 221B Baker St London</div>"
        );

        let page = crate::resume::export::render_document(&md);
        assert!(page.contains("📍 221B Baker St London</div>"));
        assert!(!page.contains("<p>London"));
    }
}
