//! Best-effort public profile scraping.
//!
//! Every field lookup returns `Option`; absent values are rendered as
//! `Not found` (top-level fields) or `Not specified` (list entries).

use std::fmt::Write as _;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::ScraperSettings;
use crate::core::errors::RagError;

const MAX_EXPERIENCES: usize = 5;
const MAX_EDUCATIONS: usize = 3;
const NOT_FOUND: &str = "Not found";
const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub title: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Education {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub about: Option<String>,
    pub experiences: Vec<Position>,
    pub educations: Vec<Education>,
}

impl ProfileFields {
    /// Plain-text document handed to the indexing pipeline.
    pub fn render(&self, url: &str) -> String {
        let mut out = String::from("LINKEDIN PROFILE ANALYSIS\n\n");
        let _ = writeln!(out, "Profile URL: {}", url);
        let _ = writeln!(out, "Name: {}", or_not_found(&self.name));
        let _ = writeln!(out, "Headline: {}", or_not_found(&self.headline));
        out.push_str(&"=".repeat(60));
        out.push_str("\n\n");

        out.push_str("ABOUT:\n");
        let _ = writeln!(out, "{}\n", or_not_found(&self.about));

        out.push_str("EXPERIENCE:\n");
        for (i, exp) in self.experiences.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} at {} ({})",
                i + 1,
                or_not_specified(&exp.title),
                or_not_specified(&exp.company),
                or_not_specified(&exp.duration)
            );
        }
        out.push('\n');

        out.push_str("EDUCATION:\n");
        for (i, edu) in self.educations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} at {} ({})",
                i + 1,
                or_not_specified(&edu.degree),
                or_not_specified(&edu.school),
                or_not_specified(&edu.duration)
            );
        }

        out
    }
}

fn or_not_found(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_FOUND)
}

fn or_not_specified(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_SPECIFIED)
}

pub fn extract_profile(html: &str) -> ProfileFields {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let experiences = first_match(
        root,
        &["section.experience, section.experience-section"],
    )
    .map(|section| {
        select_all(section, "li.experience-item, li.experience-list__item")
            .into_iter()
            .take(MAX_EXPERIENCES)
            .map(|item| Position {
                title: first_text(item, &["h3, h4"]),
                company: first_text(item, &["h4, h5"]),
                duration: first_text(item, &["span.date-range, span.experience-item__duration"]),
            })
            .collect()
    })
    .unwrap_or_default();

    let educations = first_match(
        root,
        &["section.education, section.education-section"],
    )
    .map(|section| {
        select_all(section, "li.education__item, li.education-list__item")
            .into_iter()
            .take(MAX_EDUCATIONS)
            .map(|item| Education {
                school: first_text(item, &["h3, h4"]),
                degree: first_text(item, &["h4, h5"]),
                duration: first_text(item, &["span.date-range, span.education__item--duration"]),
            })
            .collect()
    })
    .unwrap_or_default();

    ProfileFields {
        name: first_text(root, &["h1.top-card-layout__title, h1.text-heading-xlarge", "h1"]),
        headline: first_text(
            root,
            &["h2.top-card-layout__headline, h2.text-body-medium", "h2"],
        ),
        about: first_text(
            root,
            &[
                "section.summary, section.about",
                "div.core-section-container__content, div.break-words",
            ],
        ),
        experiences,
        educations,
    }
}

/// First element matched by the earliest selector in `candidates` that
/// matches anything.
fn first_match<'a>(scope: ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    candidates.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        scope.select(&selector).next()
    })
}

fn first_text(scope: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    first_match(scope, candidates).and_then(element_text)
}

fn select_all<'a>(scope: ElementRef<'a>, raw: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(raw) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub struct ProfileScraper {
    client: Client,
}

impl ProfileScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetches `url` and renders the extracted fields as a document.
    pub async fn fetch(&self, url: &str) -> Result<String, RagError> {
        let parsed = Url::parse(url.trim())
            .map_err(|err| RagError::InvalidInput(format!("invalid profile URL: {}", err)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RagError::InvalidInput(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        debug!("Fetching profile from: {}", parsed);
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|err| RagError::SourceUnavailable(format!("Error extracting profile: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::SourceUnavailable(format!(
                "Failed to access profile. Status: {}",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|err| RagError::SourceUnavailable(format!("Error extracting profile: {}", err)))?;

        let fields = extract_profile(&html);
        info!(
            experiences = fields.experiences.len(),
            educations = fields.educations.len(),
            "Extracted profile fields"
        );
        Ok(fields.render(url.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_HTML: &str = r#"
        <html><body>
          <h1 class="top-card-layout__title">  Ada   Lovelace </h1>
          <h2 class="top-card-layout__headline">Analyst at Analytical Engine</h2>
          <section class="summary"><p>Wrote the first published algorithm.</p></section>
          <section class="experience">
            <ul>
              <li class="experience-item">
                <h3>Collaborator</h3><h4>Analytical Engine</h4>
                <span class="date-range">1842 - 1843</span>
              </li>
              <li class="experience-item"><h3>Translator</h3></li>
            </ul>
          </section>
          <section class="education">
            <ul>
              <li class="education__item">
                <h3>Private tutoring</h3><h4>Mathematics</h4>
              </li>
            </ul>
          </section>
        </body></html>
    "#;

    #[test]
    fn extracts_fields_with_explicit_absence() {
        let fields = extract_profile(PROFILE_HTML);

        assert_eq!(fields.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(fields.headline.as_deref(), Some("Analyst at Analytical Engine"));
        assert_eq!(fields.about.as_deref(), Some("Wrote the first published algorithm."));
        assert_eq!(fields.experiences.len(), 2);
        assert_eq!(fields.experiences[0].company.as_deref(), Some("Analytical Engine"));
        assert_eq!(fields.experiences[1].company, None);
        assert_eq!(fields.experiences[1].duration, None);
        assert_eq!(fields.educations[0].school.as_deref(), Some("Private tutoring"));
        assert_eq!(fields.educations[0].degree.as_deref(), Some("Mathematics"));
    }

    #[test]
    fn falls_back_to_plain_headings() {
        let fields = extract_profile("<h1>Bob</h1><h2>Teacher</h2>");
        assert_eq!(fields.name.as_deref(), Some("Bob"));
        assert_eq!(fields.headline.as_deref(), Some("Teacher"));
        assert_eq!(fields.about, None);
        assert!(fields.experiences.is_empty());
    }

    #[test]
    fn experience_list_is_capped() {
        let items: String = (0..8)
            .map(|i| format!(r#"<li class="experience-item"><h3>Role {i}</h3></li>"#))
            .collect();
        let html = format!(r#"<section class="experience"><ul>{items}</ul></section>"#);
        assert_eq!(extract_profile(&html).experiences.len(), 5);
    }

    #[test]
    fn render_uses_sentinels_for_missing_values() {
        let fields = extract_profile(PROFILE_HTML);
        let text = fields.render("https://www.linkedin.com/in/ada");

        assert!(text.starts_with("LINKEDIN PROFILE ANALYSIS\n\nProfile URL: https://www.linkedin.com/in/ada\n"));
        assert!(text.contains("Name: Ada Lovelace\n"));
        assert!(text.contains(&format!("{}\n\nABOUT:\n", "=".repeat(60))));
        assert!(text.contains("1. Collaborator at Analytical Engine (1842 - 1843)\n"));
        assert!(text.contains("2. Translator at Not specified (Not specified)\n"));
        assert!(text.contains("EDUCATION:\n1. Mathematics at Private tutoring (Not specified)\n"));

        let empty = ProfileFields::default().render("https://example.com/in/x");
        assert!(empty.contains("Name: Not found\nHeadline: Not found\n"));
        assert!(empty.contains("ABOUT:\nNot found\n\nEXPERIENCE:\n\nEDUCATION:\n"));
    }
}
