//! The home page's search, filter and pagination state, as carried by the URL query string.

use url::form_urlencoded;

/// Sort orders the catalog understands, with their labels.
pub const SORT_OPTIONS: [(&str, &str); 4] = [
	("price_asc", "가격 낮은순"),
	("price_desc", "가격 높은순"),
	("name_asc", "이름순"),
	("name_desc", "이름 역순"),
];

/// Page sizes offered by the limit select.
pub const LIMIT_OPTIONS: [u32; 4] = [10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeQuery {
	pub search: String,
	pub category1: String,
	pub category2: String,
	pub sort: Option<String>,
	pub limit: u32,
	/// 1-based page number.
	pub current: u32,
}

/// A user edit to the filters. Applying one always goes back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
	Search(String),
	/// Selects a top-level category and clears the sub-category.
	Category1(String),
	Category2 { category1: String, category2: String },
	ResetCategories,
	Sort(String),
	Limit(u32),
}

impl HomeQuery {
	#[must_use]
	pub fn new(default_limit: u32) -> Self {
		Self {
			search: String::new(),
			category1: String::new(),
			category2: String::new(),
			sort: None,
			limit: default_limit,
			current: 1,
		}
	}

	/// Reads a `location.search` string (with or without leading `?`).
	///
	/// A missing, non-numeric or zero `limit` becomes `default_limit`, and likewise `current` (or its alias `page`) becomes 1.
	#[must_use]
	pub fn parse(search: &str, default_limit: u32) -> Self {
		let mut query = Self::new(default_limit);
		let mut current = None;
		let mut page = None;
		for (key, value) in form_urlencoded::parse(search.trim_start_matches('?').as_bytes()) {
			match key.as_ref() {
				"search" => query.search = value.into_owned(),
				"category1" => query.category1 = value.into_owned(),
				"category2" => query.category2 = value.into_owned(),
				"sort" if !value.is_empty() => query.sort = Some(value.into_owned()),
				"limit" => query.limit = positive(&value).unwrap_or(default_limit),
				"current" => current = Some(positive(&value)),
				"page" => page = Some(positive(&value)),
				_ => (),
			}
		}
		query.current = current.or(page).flatten().unwrap_or(1);
		query
	}

	#[must_use]
	pub fn apply(&self, change: FilterChange) -> Self {
		let mut next = self.clone();
		match change {
			FilterChange::Search(search) => next.search = search,
			FilterChange::Category1(category1) => {
				next.category1 = category1;
				next.category2.clear();
			}
			FilterChange::Category2 { category1, category2 } => {
				next.category1 = category1;
				next.category2 = category2;
			}
			FilterChange::ResetCategories => {
				next.category1.clear();
				next.category2.clear();
			}
			FilterChange::Sort(sort) => next.sort = Some(sort).filter(|sort| !sort.is_empty()),
			FilterChange::Limit(limit) => next.limit = limit.max(1),
		}
		next.current = 1;
		next
	}

	#[must_use]
	pub fn with_page(&self, current: u32) -> Self {
		Self {
			current: current.max(1),
			..self.clone()
		}
	}

	/// Query string for the address bar: empty filters and page 1 are left out. Starts with `?` unless empty.
	#[must_use]
	pub fn to_search(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());
		self.append_filters(&mut serializer);
		serializer.append_pair("limit", &self.limit.to_string());
		if self.current > 1 {
			serializer.append_pair("current", &self.current.to_string());
		}
		with_question_mark(serializer.finish())
	}

	/// Query string for the catalog API, which always gets `limit` and `current`.
	#[must_use]
	pub fn to_api_search(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());
		self.append_filters(&mut serializer);
		serializer.append_pair("limit", &self.limit.to_string());
		serializer.append_pair("current", &self.current.to_string());
		with_question_mark(serializer.finish())
	}

	/// `path` followed by [`to_search`](`HomeQuery::to_search`).
	#[must_use]
	pub fn href(&self, path: &str) -> String {
		format!("{}{}", path, self.to_search())
	}

	fn append_filters(&self, serializer: &mut form_urlencoded::Serializer<'_, String>) {
		for (key, value) in &[("search", &self.search), ("category1", &self.category1), ("category2", &self.category2)] {
			if !value.is_empty() {
				serializer.append_pair(key, value);
			}
		}
		if let Some(sort) = &self.sort {
			serializer.append_pair("sort", sort);
		}
	}
}

fn positive(value: &str) -> Option<u32> {
	value.trim().parse().ok().filter(|value| *value > 0)
}

fn with_question_mark(query: String) -> String {
	if query.is_empty() {
		query
	} else {
		format!("?{}", query)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_all_fields() {
		let query = HomeQuery::parse("?search=%EC%82%AC%EA%B3%BC+box&category1=food&category2=fruit&sort=price_desc&limit=50&current=3", 20);
		assert_eq!(query.search, "사과 box");
		assert_eq!(query.category1, "food");
		assert_eq!(query.category2, "fruit");
		assert_eq!(query.sort.as_deref(), Some("price_desc"));
		assert_eq!(query.limit, 50);
		assert_eq!(query.current, 3);
	}

	#[test]
	fn invalid_numbers_fall_back() {
		let query = HomeQuery::parse("limit=abc&current=0", 20);
		assert_eq!(query.limit, 20);
		assert_eq!(query.current, 1);

		let query = HomeQuery::parse("limit=-5&page=2", 20);
		assert_eq!(query.limit, 20);
		assert_eq!(query.current, 2);

		assert_eq!(HomeQuery::parse("", 30), HomeQuery::new(30));
	}

	#[test]
	fn current_wins_over_page() {
		assert_eq!(HomeQuery::parse("page=5&current=2", 20).current, 2);
	}

	#[test]
	fn every_filter_change_resets_the_page() {
		let query = HomeQuery::parse("category1=food&category2=fruit&current=4", 20);
		for change in vec![
			FilterChange::Search(String::from("pear")),
			FilterChange::Category1(String::from("tools")),
			FilterChange::Category2 {
				category1: String::from("food"),
				category2: String::from("veg"),
			},
			FilterChange::ResetCategories,
			FilterChange::Sort(String::from("name_asc")),
			FilterChange::Limit(50),
		] {
			assert_eq!(query.apply(change).current, 1);
		}
	}

	#[test]
	fn category1_clears_category2() {
		let query = HomeQuery::parse("category1=food&category2=fruit", 20).apply(FilterChange::Category1(String::from("tools")));
		assert_eq!(query.category1, "tools");
		assert_eq!(query.category2, "");
	}

	#[test]
	fn address_bar_round_trip() {
		let query = HomeQuery::parse("search=a%26b&category1=food&sort=name_asc&limit=10&current=2", 20);
		assert_eq!(query.to_search(), "?search=a%26b&category1=food&sort=name_asc&limit=10&current=2");
		assert_eq!(HomeQuery::parse(&query.to_search(), 20), query);
		assert_eq!(HomeQuery::new(20).href("/"), "/?limit=20");
	}

	#[test]
	fn api_search_always_has_paging() {
		assert_eq!(HomeQuery::new(20).with_page(2).to_api_search(), "?limit=20&current=2");
	}
}
