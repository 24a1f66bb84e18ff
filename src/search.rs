//! Search constraints and the response-assembly pipeline.
use ldap3::{parse_refs, ResultEntry, Scope, SearchEntry, SearchOptions};
use tracing::debug;

use crate::entry::SearchEntryExt;

/// The filter a search falls back to when none is given.
pub(crate) const MATCH_ALL_FILTER: &str = "(objectClass=*)";

/// Parameters of a single directory search.
///
/// Only the base DN and the scope are mandatory; everything else defaults to
/// "unconstrained". Limits follow the protocol convention that zero (or an
/// absent value) means no limit at all.
#[derive(Clone, Debug)]
pub struct SearchRequest {
	/// The DN the search starts from.
	base: String,
	/// How far below the base the search reaches.
	scope: Scope,
	/// The search filter; empty or absent matches every entry.
	filter: Option<String>,
	/// The attributes the server should return; absent means all of them.
	attributes: Option<Vec<String>>,
	/// Ask for attribute names without their values.
	attributes_only: bool,
	/// Server-side time limit in seconds.
	time_limit: Option<i32>,
	/// Server-side cap on the number of returned entries.
	size_limit: Option<i32>,
}

impl SearchRequest {
	/// An unconstrained search request below `base`.
	#[must_use]
	pub fn new(base: &str, scope: Scope) -> Self {
		SearchRequest {
			base: base.to_owned(),
			scope,
			filter: None,
			attributes: None,
			attributes_only: false,
			time_limit: None,
			size_limit: None,
		}
	}

	/// Sets the search filter.
	#[must_use]
	pub fn filter(mut self, filter: &str) -> Self {
		self.filter = Some(filter.to_owned());
		self
	}

	/// Restricts the result to the named attributes, in the given order.
	#[must_use]
	pub fn attributes(mut self, attributes: Vec<String>) -> Self {
		self.attributes = Some(attributes);
		self
	}

	/// Asks the server for attribute names only, without values.
	#[must_use]
	pub fn attributes_only(mut self, attributes_only: bool) -> Self {
		self.attributes_only = attributes_only;
		self
	}

	/// Sets the server-side time limit in seconds.
	#[must_use]
	pub fn time_limit(mut self, seconds: i32) -> Self {
		self.time_limit = Some(seconds);
		self
	}

	/// Caps the number of entries the server returns.
	#[must_use]
	pub fn size_limit(mut self, limit: i32) -> Self {
		self.size_limit = Some(limit);
		self
	}

	/// The DN the search starts from.
	pub(crate) fn base(&self) -> &str {
		&self.base
	}

	/// The search scope.
	pub(crate) fn scope(&self) -> Scope {
		self.scope
	}

	/// The filter to put on the wire; an empty filter string counts as
	/// absent, and absent means match-all.
	pub(crate) fn effective_filter(&self) -> &str {
		match self.filter.as_deref() {
			Some(filter) if !filter.is_empty() => filter,
			_ => MATCH_ALL_FILTER,
		}
	}

	/// The attribute selection to put on the wire; an empty list asks for
	/// every attribute.
	pub(crate) fn attribute_list(&self) -> Vec<&str> {
		match &self.attributes {
			Some(attributes) => attributes.iter().map(String::as_str).collect(),
			None => Vec::new(),
		}
	}

	/// The per-request options for the transport. Limits are forwarded only
	/// when positive; zero and absent both mean "no limit".
	pub(crate) fn to_options(&self) -> SearchOptions {
		let mut options = SearchOptions::new().typesonly(self.attributes_only);
		if let Some(limit) = self.time_limit.filter(|limit| *limit > 0) {
			options = options.timelimit(limit);
		}
		if let Some(limit) = self.size_limit.filter(|limit| *limit > 0) {
			options = options.sizelimit(limit);
		}
		options
	}
}

/// One message of a search response stream, classified.
#[derive(Debug)]
pub(crate) enum ResponseMessage {
	/// A directory entry.
	Entry(SearchEntry),
	/// A continuation reference pointing at another server.
	Reference(Vec<String>),
}

impl ResponseMessage {
	/// Classifies one raw result message.
	pub(crate) fn classify(message: ResultEntry) -> Self {
		if message.is_ref() {
			ResponseMessage::Reference(parse_refs(message.0))
		} else {
			ResponseMessage::Entry(SearchEntry::construct(message))
		}
	}
}

/// Assembles the full result list from a response stream, preserving arrival
/// order. Entries without attributes are discarded; continuation references
/// are not followed and do not appear in the result.
pub(crate) fn collect_entries(messages: Vec<ResponseMessage>) -> Vec<SearchEntry> {
	let mut entries = Vec::new();
	for message in messages {
		match message {
			ResponseMessage::Entry(entry) => {
				if entry.has_attributes() {
					entries.push(entry);
				}
			}
			ResponseMessage::Reference(urls) => {
				debug!("ignoring search continuation reference: {urls:?}");
			}
		}
	}
	entries
}

/// Returns the first entry of a response stream that survives the
/// degenerate-entry filter, or `None` when no message does.
pub(crate) fn first_entry(messages: Vec<ResponseMessage>) -> Option<SearchEntry> {
	messages.into_iter().find_map(|message| match message {
		ResponseMessage::Entry(entry) if entry.has_attributes() => Some(entry),
		_ => None,
	})
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use std::collections::HashMap;

	use ldap3::{Scope, SearchEntry};

	use super::{collect_entries, first_entry, ResponseMessage, SearchRequest, MATCH_ALL_FILTER};

	fn entry(dn: &str, attrs: &[(&str, &str)]) -> SearchEntry {
		SearchEntry {
			dn: dn.to_owned(),
			attrs: attrs
				.iter()
				.map(|(name, value)| ((*name).to_owned(), vec![(*value).to_owned()]))
				.collect(),
			bin_attrs: HashMap::default(),
		}
	}

	fn empty_entry(dn: &str) -> SearchEntry {
		entry(dn, &[])
	}

	#[test]
	fn absent_and_empty_filters_match_all() {
		let request = SearchRequest::new("dc=example,dc=org", Scope::Subtree);
		assert_eq!(request.effective_filter(), MATCH_ALL_FILTER);

		let request = SearchRequest::new("dc=example,dc=org", Scope::Subtree).filter("");
		assert_eq!(request.effective_filter(), MATCH_ALL_FILTER);

		let request = SearchRequest::new("dc=example,dc=org", Scope::Subtree).filter("(cn=admin)");
		assert_eq!(request.effective_filter(), "(cn=admin)");
	}

	#[test]
	fn absent_attribute_selection_is_the_empty_list() {
		let request = SearchRequest::new("dc=example,dc=org", Scope::Base);
		assert!(request.attribute_list().is_empty());

		let request = request.attributes(vec!["cn".to_owned(), "sn".to_owned()]);
		assert_eq!(request.attribute_list(), ["cn", "sn"]);
	}

	#[test]
	fn collect_preserves_arrival_order_and_drops_degenerate_entries() {
		let messages = vec![
			ResponseMessage::Entry(entry("cn=one,dc=example,dc=org", &[("cn", "one")])),
			ResponseMessage::Entry(empty_entry("cn=ghost,dc=example,dc=org")),
			ResponseMessage::Entry(entry("cn=two,dc=example,dc=org", &[("cn", "two")])),
		];

		let entries = collect_entries(messages);
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].dn, "cn=one,dc=example,dc=org");
		assert_eq!(entries[1].dn, "cn=two,dc=example,dc=org");
	}

	#[test]
	fn references_never_reach_the_result() {
		let messages = vec![
			ResponseMessage::Reference(vec!["ldap://other.example.org/".to_owned()]),
			ResponseMessage::Entry(entry("cn=one,dc=example,dc=org", &[("cn", "one")])),
		];

		let entries = collect_entries(messages);
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].dn, "cn=one,dc=example,dc=org");
	}

	#[test]
	fn first_entry_skips_degenerate_entries_and_references() {
		let messages = vec![
			ResponseMessage::Reference(vec!["ldap://other.example.org/".to_owned()]),
			ResponseMessage::Entry(empty_entry("cn=ghost,dc=example,dc=org")),
			ResponseMessage::Entry(entry("cn=real,dc=example,dc=org", &[("cn", "real")])),
			ResponseMessage::Entry(entry("cn=later,dc=example,dc=org", &[("cn", "later")])),
		];

		let first = first_entry(messages).unwrap();
		assert_eq!(first.dn, "cn=real,dc=example,dc=org");
	}

	#[test]
	fn first_entry_of_a_dry_stream_is_none() {
		assert!(first_entry(Vec::new()).is_none());

		let messages = vec![ResponseMessage::Entry(empty_entry("cn=ghost,dc=example,dc=org"))];
		assert!(first_entry(messages).is_none());
	}
}
