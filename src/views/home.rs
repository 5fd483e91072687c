use super::{escape, format_price, inline_error, layout, loading};
use crate::{
	api::{Categories, Pagination, Product, ProductPage},
	query::{HomeQuery, LIMIT_OPTIONS, SORT_OPTIONS},
};
use core::fmt::Write;

/// What the product section shows.
#[derive(Debug, Clone, Copy)]
pub enum HomeState<'a> {
	Loading,
	Loaded { page: &'a ProductPage, categories: &'a Categories },
	Failed(&'a str),
}

/// The whole catalog page.
///
/// `#home-page` carries the current page number and whether there's a next one,
/// which is all the infinite scroll needs to continue from the DOM.
#[must_use]
pub fn page(query: &HomeQuery, state: HomeState<'_>, cart_count: usize) -> String {
	let (pagination, categories, products) = match state {
		HomeState::Loading => (None, None, loading_grid()),
		HomeState::Loaded { page, categories } => (Some(&page.pagination), Some(categories), product_list(&page.products, &page.pagination)),
		HomeState::Failed(message) => (None, None, inline_error(message)),
	};
	let (current, has_next) = pagination.map_or((query.current, false), |pagination| (pagination.page, pagination.has_next));

	format!(
		r#"<div id="home-page" data-current-page="{current}" data-has-next="{has_next}">{content}</div>"#,
		current = current,
		has_next = has_next,
		content = layout(cart_count, &format!("{}{}", search_form(query, categories), products)),
	)
}

/// Search box, category filter, page size and sort order.
///
/// `categories` is [`None`] while they're loading.
#[must_use]
pub fn search_form(query: &HomeQuery, categories: Option<&Categories>) -> String {
	let limit = query.limit.to_string();
	format!(
		r#"<div data-search-form class="bg-white rounded-lg shadow-sm border border-gray-200 p-4 mb-4">
  <div class="mb-4">
    <div class="relative">
      <input type="text" id="search-input" placeholder="상품명을 검색해보세요..." value="{search}" class="w-full pl-10 pr-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-blue-500">
    </div>
  </div>
  <div class="space-y-3">
    {categories}
    <div class="flex gap-2 items-center justify-between">
      <div class="flex items-center gap-2">
        <label class="text-sm text-gray-600">개수:</label>
        {limit_select}
      </div>
      <div class="flex items-center gap-2">
        <label class="text-sm text-gray-600">정렬:</label>
        {sort_select}
      </div>
    </div>
  </div>
</div>"#,
		search = escape(&query.search),
		categories = category_filter(query, categories),
		limit_select = select(
			"limit-select",
			LIMIT_OPTIONS.iter().map(|limit| (limit.to_string(), format!("{}개", limit))),
			&limit
		),
		sort_select = select(
			"sort-select",
			SORT_OPTIONS.iter().map(|(value, label)| ((*value).to_owned(), (*label).to_owned())),
			query.sort.as_deref().unwrap_or(SORT_OPTIONS[0].0)
		),
	)
}

fn select(id: &str, options: impl Iterator<Item = (String, String)>, selected: &str) -> String {
	let mut markup = format!(
		r#"<select id="{}" class="text-sm border border-gray-300 rounded px-2 py-1 focus:ring-1 focus:ring-blue-500 focus:border-blue-500">"#,
		id
	);
	for (value, label) in options {
		let _ = write!(
			markup,
			r#"<option value="{}"{}>{}</option>"#,
			escape(&value),
			if value == selected { " selected" } else { "" },
			escape(&label)
		);
	}
	markup.push_str("</select>");
	markup
}

/// Breadcrumb plus either the top-level buttons or, once one is selected, its sub-categories.
#[must_use]
pub fn category_filter(query: &HomeQuery, categories: Option<&Categories>) -> String {
	let mut breadcrumb = String::from(r#"<button type="button" data-breadcrumb="reset" class="hover:text-blue-800 hover:underline">전체</button>"#);
	if !query.category1.is_empty() {
		let _ = write!(
			breadcrumb,
			r#"<span class="text-gray-400">&gt;</span><button type="button" data-breadcrumb="category1" data-category1="{0}" class="hover:text-blue-800 hover:underline">{0}</button>"#,
			escape(&query.category1)
		);
		if !query.category2.is_empty() {
			let _ = write!(
				breadcrumb,
				r#"<span class="text-gray-400">&gt;</span><button type="button" data-breadcrumb="category2" data-category1="{}" data-category2="{1}" class="hover:text-blue-800 hover:underline">{1}</button>"#,
				escape(&query.category1),
				escape(&query.category2)
			);
		}
	}

	let buttons = match categories {
		None => String::from(r#"<div class="text-sm text-gray-500 italic">카테고리 로딩 중...</div>"#),
		Some(categories) => match categories.children(&query.category1).filter(|_| !query.category1.is_empty()) {
			None => categories
				.top_level()
				.map(|category1| {
					format!(
						r#"<button type="button" data-category1="{0}" class="category1-filter-btn text-left px-3 py-2 text-sm rounded-md border transition-colors bg-white border-gray-300 text-gray-700 hover:bg-gray-50">{0}</button>"#,
						escape(category1)
					)
				})
				.collect(),
			Some([]) => String::from(r#"<div class="text-sm text-gray-500 italic">하위 카테고리가 없습니다.</div>"#),
			Some(children) => children
				.iter()
				.map(|category2| {
					let state = if *category2 == query.category2 {
						"bg-blue-100 border-blue-300 text-blue-800 hover:bg-blue-200"
					} else {
						"bg-white border-gray-300 text-gray-700 hover:bg-gray-50"
					};
					format!(
						r#"<button type="button" data-category1="{}" data-category2="{}" class="category2-filter-btn text-left px-3 py-2 text-sm rounded-md border transition-colors {}">{1}</button>"#,
						escape(&query.category1),
						escape(category2),
						state
					)
				})
				.collect(),
		},
	};

	format!(
		r#"<div class="space-y-2">
  <div class="flex items-center gap-2">
    <label class="text-sm text-gray-600">카테고리:</label>
    <div class="flex items-center gap-1 text-xs text-gray-600">{}</div>
  </div>
  <div class="flex flex-wrap gap-2">{}</div>
</div>"#,
		breadcrumb, buttons
	)
}

/// One catalog card. The card carries the product fields the add-to-cart button needs.
#[must_use]
pub fn product_card(product: &Product) -> String {
	format!(
		r#"<div class="bg-white rounded-lg shadow-sm border border-gray-200 overflow-hidden product-card" data-product-id="{id}" data-title="{title}" data-image="{image}" data-lprice="{lprice}">
  <div class="aspect-square bg-gray-100 overflow-hidden cursor-pointer product-image">
    <img src="{image}" alt="{title}" class="w-full h-full object-cover hover:scale-105 transition-transform duration-200" loading="lazy">
  </div>
  <div class="p-3">
    <div class="cursor-pointer product-info mb-3">
      <h3 class="text-sm font-medium text-gray-900 line-clamp-2 mb-1">{title}</h3>
      <p class="text-xs text-gray-500 mb-2">{brand}</p>
      <p class="text-lg font-bold text-gray-900">{price}원</p>
    </div>
    <button class="w-full bg-blue-600 text-white text-sm py-2 px-3 rounded-md hover:bg-blue-700 transition-colors add-to-cart-btn" data-product-id="{id}">장바구니 담기</button>
  </div>
</div>"#,
		id = escape(&product.product_id),
		title = escape(&product.title),
		image = escape(&product.image),
		lprice = escape(&product.lprice),
		brand = escape(&product.brand),
		price = format_price(product.price()),
	)
}

/// The cards of `products`, concatenated.
#[must_use]
pub fn product_cards(products: &[Product]) -> String {
	products.iter().map(product_card).collect()
}

fn product_list(products: &[Product], pagination: &Pagination) -> String {
	if products.is_empty() {
		return String::from(r#"<div class="text-center py-8 text-gray-500">검색 결과가 없습니다.</div>"#);
	}

	let tail = if pagination.has_next {
		format!(r#"<div data-observer-target class="h-4"></div>{}"#, loading("상품을 불러오는 중..."))
	} else {
		end_of_list().to_owned()
	};

	format!(
		r#"<div class="mb-6">
  <div class="mb-4 text-sm text-gray-600">총 <span class="font-medium text-gray-900">{total}개</span>의 상품</div>
  <div class="grid grid-cols-2 gap-4 mb-6" id="products-grid">{cards}</div>
  <div id="scroll-status">{tail}</div>
</div>"#,
		total = pagination.total,
		cards = product_cards(products),
		tail = tail,
	)
}

/// Replaces the infinite-scroll sentinel once the last page is shown.
#[must_use]
pub fn end_of_list() -> &'static str {
	r#"<div class="text-center py-4 text-sm text-gray-500">모든 상품을 확인했습니다</div>"#
}

fn loading_grid() -> String {
	let skeleton = r#"<div class="bg-white rounded-lg shadow-sm border border-gray-200 overflow-hidden animate-pulse"><div class="aspect-square bg-gray-200"></div><div class="p-3"><div class="h-4 bg-gray-200 rounded mb-2"></div><div class="h-5 bg-gray-200 rounded w-1/2"></div></div></div>"#;
	format!(
		r#"<div class="mb-6"><div class="grid grid-cols-2 gap-4 mb-6" id="products-grid">{}</div>{}</div>"#,
		skeleton.repeat(4),
		loading("상품을 불러오는 중...")
	)
}
