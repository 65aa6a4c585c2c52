pub mod blocks;
pub mod document;
pub mod extract;
pub mod sanitize;
pub mod sections;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::profile::Profile;
use crate::render::{self, Theme};
use blocks::Classifier;
use extract::{ScalarAssessment, Step};
use sections::SectionMap;

pub use sanitize::sanitize;

/// Everything the engine derives from one model response.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub markup: String,
    pub sections: SectionMap,
    pub assessment: ScalarAssessment,
    pub steps: Vec<Step>,
}

/// Four-stage pipeline: raw → sanitized → blocks → document → markup.
pub fn format_text(raw: &str, profile: &Profile, theme: &Theme) -> String {
    let classifier = Classifier::new(profile);
    format_with(raw, &classifier, theme, &profile.placeholder)
}

pub fn format_with(raw: &str, classifier: &Classifier, theme: &Theme, placeholder: &str) -> String {
    let clean = sanitize(raw);
    let blocks = classifier.classify(&clean);
    let doc = document::assemble(blocks);
    render::render(&doc, theme, placeholder)
}

/// Render each found section through the formatting pipeline.
pub fn render_sections(map: &SectionMap, profile: &Profile, theme: &Theme) -> SectionMap {
    let classifier = Classifier::new(profile);
    map.map_found(|text| format_with(text, &classifier, theme, &profile.placeholder))
}

/// Format, split and assess one response. Sections hold sanitized text;
/// pass them to [`render_sections`] for markup.
pub fn process_response(raw: &str, profile: &Profile, theme: &Theme) -> Report {
    let clean = sanitize(raw);
    let classifier = Classifier::new(profile);
    let doc = document::assemble(classifier.classify(&clean));

    Report {
        markup: render::render(&doc, theme, &profile.placeholder),
        sections: sections::split_sections(&clean, &profile.anchors),
        assessment: extract::assess(&clean),
        steps: extract::extract_steps(&clean),
    }
}

/// Compile a caller-supplied pattern case-insensitively. A pattern that
/// fails to compile is matched as a literal instead.
pub(crate) fn compile_lenient(pattern: &str) -> Option<Regex> {
    if pattern.trim().is_empty() {
        return None;
    }
    match Regex::new(&format!("(?i){}", pattern)) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(pattern, error = %err, "invalid pattern, matching literally");
            Regex::new(&format!("(?i){}", regex::escape(pattern))).ok()
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract::Classification;
    use crate::parser::sections::SectionValue;

    #[test]
    fn step_document_renders_bold_headings() {
        let html = format_text(
            "Step 1: Revenue\nGrowth rate is 5%.\n\nStep 2: Cost\nCosts rose.",
            &Profile::vocabulary(),
            &Theme::html(),
        );
        assert!(html.contains("<strong>Step 1: Revenue</strong><br>Growth rate is 5%."));
        assert!(html.contains("<strong>Step 2: Cost</strong><br>Costs rose."));
        assert_eq!(html.matches("<p ").count(), 2);
    }

    #[test]
    fn key_values_share_a_paragraph() {
        let html = format_text("Account: Acme Corp\nIndustry: Retail", &Profile::generic(), &Theme::html());
        assert!(html.contains("<strong>Account:</strong> Acme Corp<br><strong>Industry:</strong> Retail"));
        assert_eq!(html.matches("<p ").count(), 1);
    }

    #[test]
    fn empty_input_gives_placeholder() {
        let profile = Profile::vocabulary();
        assert_eq!(format_text("", &profile, &Theme::html()), "No vocabulary data available");
        assert_eq!(format_text(" \n\t", &profile, &Theme::plain()), "No vocabulary data available");
    }

    #[test]
    fn totality_on_odd_inputs() {
        let profiles = [Profile::generic(), Profile::vocabulary(), Profile::current_system(), Profile::hardness()];
        for input in ["", "   ", "•", "• • •\n•\n\n•", ":", "1.", "Step :", "<<>>", "**"] {
            for profile in &profiles {
                let report = process_response(input, profile, &Theme::plain());
                assert_eq!(report.sections.len(), profile.anchors.len());
                if let Some(v) = report.assessment.score {
                    assert!((0.0..=5.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn current_system_report() {
        let raw = std::fs::read_to_string("tests/fixtures/current_system.txt").unwrap();
        let profile = Profile::current_system();
        let report = process_response(&raw, &profile, &Theme::html());
        assert_eq!(report.sections.found_count(), 5);
        assert!(report.markup.contains("<strong>Current System"));

        let rendered = render_sections(&report.sections, &profile, &Theme::html());
        match rendered.get("pain_points") {
            Some(SectionValue::Found(html)) => assert!(html.contains("<p ")),
            other => panic!("pain points not rendered: {:?}", other),
        }
    }

    #[test]
    fn hardness_report() {
        let raw = std::fs::read_to_string("tests/fixtures/hardness.txt").unwrap();
        let report = process_response(&raw, &Profile::hardness(), &Theme::plain());
        assert_eq!(report.assessment.classification, Classification::Hard);
        assert_eq!(report.sections.get("hardness_level").unwrap().as_str(), "Hard");
        assert!(report.sections.get("key_takeaways").unwrap().is_found());
    }

    #[test]
    fn vocabulary_report_has_steps() {
        let raw = std::fs::read_to_string("tests/fixtures/vocabulary.txt").unwrap();
        let report = process_response(&raw, &Profile::vocabulary(), &Theme::html());
        assert_eq!(report.steps.len(), 3);
        assert!(report.markup.contains("<strong>Step 1:"));
        assert!(report.sections.is_empty());
    }

    #[test]
    fn lenient_compile() {
        assert!(compile_lenient("").is_none());
        assert!(compile_lenient("step\\s+\\d").unwrap().is_match("STEP 4"));
        assert!(compile_lenient("a(b").unwrap().is_match("xA(Bx"));
    }
}
