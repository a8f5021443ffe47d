use regex::Regex;
use serde::{Deserialize, Serialize};

const MANUAL_TAG: &str = "SOURCE: MANUAL";
const GENERAL_TAG: &str = "SOURCE: GENERAL";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclaredSource {
	Manual,
	General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
	Accepted,
	Rejected,
}

/// Result of inspecting one raw generation output. Pure data; the caller
/// decides whether a rejection escalates or refuses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
	pub declared_source: Option<DeclaredSource>,
	pub body: String,
	pub has_citation: bool,
	pub has_ungrounded_numeric: bool,
	pub verdict: Verdict,
	pub needs_verify_nudge: bool,
}

/// Inspect a raw answer against the provenance protocol.
///
/// The first line may carry an exact `SOURCE: MANUAL` or `SOURCE: GENERAL`
/// tag; it is stripped from the body. A missing tag is treated as general
/// knowledge — grounding is never assumed.
pub fn inspect(raw_text: &str, allowed_sources: Option<&[String]>) -> Inspection {
	let (declared_source, body) = split_source_tag(raw_text);
	let has_citation = contains_citation(&body, allowed_sources);
	let has_ungrounded_numeric = contains_unit_anchored_numeric(&body);

	let effective = declared_source.unwrap_or(DeclaredSource::General);
	let verdict = match effective {
		DeclaredSource::Manual => Verdict::Accepted,
		DeclaredSource::General =>
			if has_ungrounded_numeric {
				Verdict::Rejected
			} else {
				Verdict::Accepted
			},
	};
	let needs_verify_nudge = effective == DeclaredSource::Manual && !has_citation;

	Inspection {
		declared_source,
		body,
		has_citation,
		has_ungrounded_numeric,
		verdict,
		needs_verify_nudge,
	}
}

fn split_source_tag(raw_text: &str) -> (Option<DeclaredSource>, String) {
	let mut lines = raw_text.lines();
	let Some(first) = lines.next() else {
		return (None, String::new());
	};

	let declared = match first.trim() {
		MANUAL_TAG => Some(DeclaredSource::Manual),
		GENERAL_TAG => Some(DeclaredSource::General),
		_ => None,
	};

	if declared.is_none() {
		return (None, raw_text.trim().to_string());
	}

	let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();

	(declared, body)
}

fn contains_citation(body: &str, allowed_sources: Option<&[String]>) -> bool {
	let patterns = [
		// Numbered bracket tags matching the context-block convention.
		r"\[\d+\]",
		// Page markers.
		r"\bp\.\s*\d+",
		// Section markers.
		r"§\s*\d+",
	];

	for pattern in patterns {
		if Regex::new(pattern).map(|re| re.is_match(body)).unwrap_or(false) {
			return true;
		}
	}

	let Some(sources) = allowed_sources else {
		return false;
	};
	let Ok(bracketed) = Regex::new(r"\[([^\]]+)\]") else {
		return false;
	};

	for capture in bracketed.captures_iter(body) {
		let tag = capture[1].to_lowercase();

		if sources.iter().any(|source| {
			let name = source.trim().to_lowercase();

			!name.is_empty() && tag.contains(&name)
		}) {
			return true;
		}
	}

	false
}

fn contains_unit_anchored_numeric(body: &str) -> bool {
	let patterns = [
		// Electrical ratings.
		r"\b\d+(?:\.\d+)?\s?(?:mV|kV|V|mA|A|kW|W|kHz|Hz)\b",
		// Measurements and torque.
		r"\b\d+(?:\.\d+)?\s?(?:Nm|mm|cm|km|m|kg|g|L|mL)\b",
		// Pressure.
		r"\b\d+(?:\.\d+)?\s?(?:kPa|Pa|psi|bar)\b",
		// Durations.
		r"\b\d+(?:\.\d+)?\s?(?:ms|s|sec|min|h|hr|hours?|minutes?|seconds?)\b",
		// Percentages.
		r"\b\d+(?:\.\d+)?\s?%",
		// Temperatures.
		r"\b\d+(?:\.\d+)?\s?°\s?[CF]\b",
		// Currency.
		r"\$\s?\d[\d,]*(?:\.\d+)?",
	];

	for pattern in patterns {
		if Regex::new(pattern).map(|re| re.is_match(body)).unwrap_or(false) {
			return true;
		}
	}

	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn manual_tag_is_parsed_and_stripped() {
		let inspection = inspect("SOURCE: MANUAL\nTorque to spec [1].", None);

		assert_eq!(inspection.declared_source, Some(DeclaredSource::Manual));
		assert_eq!(inspection.body, "Torque to spec [1].");
		assert_eq!(inspection.verdict, Verdict::Accepted);
	}

	#[test]
	fn missing_tag_defaults_to_general() {
		let inspection = inspect("The torque spec is 45 Nm.", None);

		assert_eq!(inspection.declared_source, None);
		assert_eq!(inspection.verdict, Verdict::Rejected);
	}

	#[test]
	fn general_without_numeric_is_accepted() {
		let inspection = inspect("SOURCE: GENERAL\nCheck the manufacturer manual first.", None);

		assert_eq!(inspection.verdict, Verdict::Accepted);
		assert!(!inspection.has_ungrounded_numeric);
	}

	#[test]
	fn general_with_unit_anchored_numeric_is_rejected() {
		for claim in ["Rated at 230V.", "Set clearance to 40mm.", "Expect a 15% drop."] {
			let inspection = inspect(&format!("SOURCE: GENERAL\n{claim}"), None);

			assert_eq!(inspection.verdict, Verdict::Rejected, "claim: {claim}");
			assert!(inspection.has_ungrounded_numeric, "claim: {claim}");
		}
	}

	#[test]
	fn manual_without_citation_needs_nudge() {
		let inspection = inspect("SOURCE: MANUAL\nTighten to 45 Nm.", None);

		assert_eq!(inspection.verdict, Verdict::Accepted);
		assert!(inspection.needs_verify_nudge);
	}

	#[test]
	fn page_and_section_markers_count_as_citations() {
		assert!(inspect("SOURCE: MANUAL\nSee p.12 for details.", None).has_citation);
		assert!(inspect("SOURCE: MANUAL\nCovered under §4.", None).has_citation);
	}

	#[test]
	fn allowed_source_names_count_as_citations() {
		let sources = vec!["manual.pdf".to_string()];
		let inspection =
			inspect("SOURCE: MANUAL\nTorque is 45 Nm [manual.pdf, p.12].", Some(&sources));

		assert!(inspection.has_citation);
		assert!(!inspection.needs_verify_nudge);
	}

	#[test]
	fn unknown_bracketed_tags_do_not_count_without_digits() {
		let sources = vec!["manual.pdf".to_string()];
		let inspection = inspect("SOURCE: MANUAL\nSee [somewhere else].", Some(&sources));

		assert!(!inspection.has_citation);
	}

	#[test]
	fn inspect_is_deterministic() {
		let raw = "SOURCE: GENERAL\nThe fuse is rated 10A.";
		let first = inspect(raw, None);
		let second = inspect(raw, None);

		assert_eq!(first, second);
	}
}
