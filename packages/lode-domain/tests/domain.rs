use lode_domain::{
	guardrail::{self, DeclaredSource, Verdict},
	scope::{self, ScopeLabel},
};

#[test]
fn decision_table_manual_with_citation_is_accepted() {
	let inspection = guardrail::inspect("SOURCE: MANUAL\nTorque to 45 Nm [1].", None);

	assert_eq!(inspection.declared_source, Some(DeclaredSource::Manual));
	assert_eq!(inspection.verdict, Verdict::Accepted);
	assert!(!inspection.needs_verify_nudge);
}

#[test]
fn decision_table_manual_without_citation_is_accepted_with_nudge() {
	for body in ["Torque to 45 Nm.", "Follow the torque sequence."] {
		let inspection = guardrail::inspect(&format!("SOURCE: MANUAL\n{body}"), None);

		assert_eq!(inspection.verdict, Verdict::Accepted, "body: {body}");
		assert!(inspection.needs_verify_nudge, "body: {body}");
	}
}

#[test]
fn decision_table_general_with_numeric_is_rejected() {
	let inspection = guardrail::inspect("SOURCE: GENERAL\nThe spec is 45 Nm.", None);

	assert_eq!(inspection.verdict, Verdict::Rejected);
}

#[test]
fn decision_table_general_without_numeric_is_accepted() {
	let inspection =
		guardrail::inspect("SOURCE: GENERAL\nConsult the installation manual for exact values.", None);

	assert_eq!(inspection.verdict, Verdict::Accepted);
}

#[test]
fn scope_order_is_uploads_before_library() {
	let library = vec!["vs_lib_a".to_string(), "vs_lib_b".to_string()];
	let scopes = scope::build_scopes(Some("vs_session"), &library, true);
	let labels: Vec<ScopeLabel> = scopes.iter().map(|s| s.label).collect();

	assert_eq!(labels, vec![ScopeLabel::UploadsOnly, ScopeLabel::UploadsPlusLibrary]);
}
