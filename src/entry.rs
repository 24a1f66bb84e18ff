//! Helper methods for extracting data from search results.
use ldap3::SearchEntry;

/// An extension trait for [`SearchEntry`] that provides convenience methods
/// for inspecting decoded entries.
pub trait SearchEntryExt {
	/// Get the first value of an attribute. Will return `None` if attribute
	/// value is not valid UTF-8.
	fn attr_first(&self, attr: &str) -> Option<&str>;

	/// Get the first value of an attribute, in binary form
	fn bin_attr_first(&self, attr: &str) -> Option<&[u8]>;

	/// The number of attributes the entry carries, textual and binary.
	fn attribute_count(&self) -> usize;

	/// Whether the entry carries any attribute at all. Entries that don't
	/// are degenerate (e.g. referral placeholders misreported as entries)
	/// and never appear in search results.
	fn has_attributes(&self) -> bool {
		self.attribute_count() > 0
	}
}

impl SearchEntryExt for SearchEntry {
	fn attr_first(&self, attr: &str) -> Option<&str> {
		let attr = self.attrs.get(attr)?;
		attr.first().map(String::as_str)
	}

	fn bin_attr_first(&self, attr: &str) -> Option<&[u8]> {
		if let Some(attr) = self.attrs.get(attr) {
			return attr.first().map(String::as_bytes);
		}

		if let Some(attr) = self.bin_attrs.get(attr) {
			return attr.first().map(Vec::as_slice);
		}
		None
	}

	fn attribute_count(&self) -> usize {
		self.attrs.len() + self.bin_attrs.len()
	}
}
