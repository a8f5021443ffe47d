use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLabel {
	UploadsOnly,
	UploadsPlusLibrary,
	LibraryOnly,
}
impl ScopeLabel {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::UploadsOnly => "uploads_only",
			Self::UploadsPlusLibrary => "uploads_plus_library",
			Self::LibraryOnly => "library_only",
		}
	}
}

/// One ordered set of index handles offered to the generation provider for
/// a single attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalScope {
	pub label: ScopeLabel,
	pub index_ids: Vec<String>,
	pub require_grounding: bool,
}

/// Build the ordered scope list for one request.
///
/// Uploads are tried in isolation first so citations are unambiguous about
/// provenance; the library is blended in only when that is insufficient.
pub fn build_scopes(
	session_index_id: Option<&str>,
	library_index_ids: &[String],
	has_uploads: bool,
) -> Vec<RetrievalScope> {
	let library = dedup(library_index_ids.iter().map(String::as_str));

	let Some(session_id) = session_index_id.filter(|_| has_uploads) else {
		return vec![RetrievalScope {
			label: ScopeLabel::LibraryOnly,
			index_ids: library,
			require_grounding: false,
		}];
	};

	let blended = dedup(
		std::iter::once(session_id).chain(library_index_ids.iter().map(String::as_str)),
	);

	vec![
		RetrievalScope {
			label: ScopeLabel::UploadsOnly,
			index_ids: vec![session_id.to_string()],
			require_grounding: true,
		},
		RetrievalScope {
			label: ScopeLabel::UploadsPlusLibrary,
			index_ids: blended,
			require_grounding: false,
		},
	]
}

fn dedup<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
	let mut out = Vec::new();

	for id in ids {
		if !out.iter().any(|existing: &String| existing == id) {
			out.push(id.to_string());
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn no_uploads_yields_single_library_scope() {
		let library = vec!["vs_lib".to_string()];
		let scopes = build_scopes(None, &library, false);

		assert_eq!(scopes.len(), 1);
		assert_eq!(scopes[0].label, ScopeLabel::LibraryOnly);
		assert_eq!(scopes[0].index_ids, vec!["vs_lib".to_string()]);
		assert!(!scopes[0].require_grounding);
	}

	#[test]
	fn uploads_yield_uploads_first_then_blended() {
		let library = vec!["vs_lib".to_string()];
		let scopes = build_scopes(Some("vs_session"), &library, true);

		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes[0].label, ScopeLabel::UploadsOnly);
		assert_eq!(scopes[0].index_ids, vec!["vs_session".to_string()]);
		assert!(scopes[0].require_grounding);
		assert_eq!(scopes[1].label, ScopeLabel::UploadsPlusLibrary);
		assert_eq!(
			scopes[1].index_ids,
			vec!["vs_session".to_string(), "vs_lib".to_string()]
		);
	}

	#[test]
	fn index_ids_are_deduplicated() {
		let library = vec!["vs_lib".to_string(), "vs_lib".to_string(), "vs_session".to_string()];
		let scopes = build_scopes(Some("vs_session"), &library, true);

		assert_eq!(
			scopes[1].index_ids,
			vec!["vs_session".to_string(), "vs_lib".to_string()]
		);
	}

	#[test]
	fn caller_lists_are_not_mutated() {
		let library = vec!["vs_lib".to_string()];
		let before = library.clone();

		build_scopes(Some("vs_session"), &library, true);

		assert_eq!(library, before);
	}

	#[test]
	fn uploads_flag_without_session_index_falls_back_to_library() {
		let library = vec!["vs_lib".to_string()];
		let scopes = build_scopes(None, &library, true);

		assert_eq!(scopes.len(), 1);
		assert_eq!(scopes[0].label, ScopeLabel::LibraryOnly);
	}
}
