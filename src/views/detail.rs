use super::{detail_layout, escape, format_price, inline_error, loading};
use crate::api::Product;
use core::fmt::Write;

#[derive(Debug, Clone, Copy)]
pub enum DetailState<'a> {
	Loading,
	Loaded { product: &'a Product, related: &'a [Product] },
	Failed(&'a str),
}

#[must_use]
pub fn page(state: DetailState<'_>, quantity: u32, cart_count: usize) -> String {
	let content = match state {
		DetailState::Loading => loading("상품 정보를 불러오는 중..."),
		DetailState::Failed(message) => format!("{}{}", inline_error(message), back_to_list()),
		DetailState::Loaded { product, related } => format!(
			r#"{breadcrumb}
<div class="bg-white rounded-lg shadow-sm mb-6">
  {info}
  <div class="border-t border-gray-200 p-4">
    <div class="flex items-center justify-between mb-4">
      <span class="text-sm font-medium text-gray-900">수량</span>
      <div class="flex items-center">
        <button id="quantity-decrease" class="w-8 h-8 flex items-center justify-center border border-gray-300 rounded-l-md bg-gray-50 hover:bg-gray-100">-</button>
        <input type="number" id="quantity-input" value="{quantity}" min="1" class="w-16 h-8 text-center text-sm border-t border-b border-gray-300 focus:ring-1 focus:ring-blue-500 focus:border-blue-500">
        <button id="quantity-increase" class="w-8 h-8 flex items-center justify-center border border-gray-300 rounded-r-md bg-gray-50 hover:bg-gray-100">+</button>
      </div>
    </div>
    <button id="add-to-cart-btn" data-product-id="{id}" class="w-full bg-blue-600 text-white py-3 px-4 rounded-md hover:bg-blue-700 transition-colors font-medium">장바구니 담기</button>
  </div>
</div>
{back}
{related}"#,
			breadcrumb = breadcrumb(product),
			info = info(product),
			quantity = quantity,
			id = escape(&product.product_id),
			back = back_to_list(),
			related = related_products(related),
		),
	};
	detail_layout(cart_count, &content)
}

/// Home, then the product's categories as links back into the filtered catalog.
#[must_use]
pub fn breadcrumb(product: &Product) -> String {
	let mut markup = String::from(r#"<nav class="mb-4"><div class="flex items-center space-x-2 text-sm text-gray-600"><a href="/" data-link class="hover:text-blue-600 transition-colors">홈</a>"#);
	if !product.category1.is_empty() {
		let _ = write!(
			markup,
			r#"<span>&gt;</span><button class="breadcrumb-link" data-category1="{0}">{0}</button>"#,
			escape(&product.category1)
		);
		if !product.category2.is_empty() {
			let _ = write!(
				markup,
				r#"<span>&gt;</span><button class="breadcrumb-link" data-category1="{}" data-category2="{1}">{1}</button>"#,
				escape(&product.category1),
				escape(&product.category2)
			);
		}
	}
	markup.push_str("</div></nav>");
	markup
}

fn info(product: &Product) -> String {
	let mut markup = format!(
		r#"<div class="p-4">
  <div class="aspect-square bg-gray-100 rounded-lg overflow-hidden mb-4">
    <img src="{image}" alt="{title}" class="w-full h-full object-cover product-detail-image">
  </div>
  <div>
    <p class="text-sm text-gray-600 mb-1">{brand}</p>
    <h1 class="text-xl font-bold text-gray-900 mb-3">{title}</h1>"#,
		image = escape(&product.image),
		title = escape(&product.title),
		brand = escape(&product.brand),
	);
	if let Some(rating) = product.rating {
		let _ = write!(
			markup,
			r#"<div class="flex items-center mb-3"><span class="text-sm text-yellow-500">★ {:.1}</span><span class="ml-2 text-sm text-gray-600">리뷰 {}개</span></div>"#,
			rating,
			product.review_count.unwrap_or(0)
		);
	}
	let _ = write!(
		markup,
		r#"<div class="mb-4"><span class="text-2xl font-bold text-blue-600">{}원</span></div>"#,
		format_price(product.price())
	);
	if let Some(stock) = product.stock {
		let _ = write!(markup, r#"<div class="text-sm text-gray-600 mb-4">재고 {}개</div>"#, stock);
	}
	if let Some(description) = product.description.as_deref().filter(|description| !description.is_empty()) {
		let _ = write!(markup, r#"<div class="text-sm text-gray-700 leading-relaxed mb-6">{}</div>"#, escape(description));
	}
	markup.push_str("</div></div>");
	markup
}

fn back_to_list() -> &'static str {
	r#"<div class="mb-6">
  <button class="block w-full text-center bg-gray-100 text-gray-700 py-3 px-4 rounded-md hover:bg-gray-200 transition-colors go-to-product-list">상품 목록으로 돌아가기</button>
</div>"#
}

/// Other products of the same category.
#[must_use]
pub fn related_products(related: &[Product]) -> String {
	let cards: String = if related.is_empty() {
		String::from(r#"<p class="text-sm text-gray-500">관련 상품이 없습니다.</p>"#)
	} else {
		let cards: String = related
			.iter()
			.map(|product| {
				format!(
					r#"<div class="bg-gray-50 rounded-lg p-3 related-product-card cursor-pointer" data-product-id="{id}">
  <div class="aspect-square bg-white rounded-md overflow-hidden mb-2"><img src="{image}" alt="{title}" class="w-full h-full object-cover" loading="lazy"></div>
  <h3 class="text-sm font-medium text-gray-900 mb-1 line-clamp-2">{title}</h3>
  <p class="text-sm font-bold text-blue-600">{price}원</p>
</div>"#,
					id = escape(&product.product_id),
					image = escape(&product.image),
					title = escape(&product.title),
					price = format_price(product.price()),
				)
			})
			.collect();
		format!(r#"<div class="grid grid-cols-2 gap-3 responsive-grid">{}</div>"#, cards)
	};

	format!(
		r#"<div class="bg-white rounded-lg shadow-sm">
  <div class="p-4 border-b border-gray-200">
    <h2 class="text-lg font-bold text-gray-900">관련 상품</h2>
    <p class="text-sm text-gray-600">같은 카테고리의 다른 상품들</p>
  </div>
  <div class="p-4">{}</div>
</div>"#,
		cards
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product() -> Product {
		Product {
			product_id: String::from("85067212996"),
			title: String::from("PVC 투명 젤리 쇼핑백"),
			lprice: String::from("220"),
			brand: String::from("HYBRID"),
			category1: String::from("생활/건강"),
			category2: String::from("생활용품"),
			rating: Some(4.5),
			review_count: Some(12),
			..Product::default()
		}
	}

	#[test]
	fn loaded_page_has_the_controls() {
		let product = product();
		let markup = page(DetailState::Loaded { product: &product, related: &[] }, 3, 1);
		for needle in &[
			r#"id="quantity-decrease""#,
			r#"id="quantity-input" value="3""#,
			r#"id="quantity-increase""#,
			r#"id="add-to-cart-btn" data-product-id="85067212996""#,
			"go-to-product-list",
			"관련 상품이 없습니다",
			"★ 4.5",
			"220원",
		] {
			assert!(markup.contains(needle), "missing {}", needle);
		}
	}

	#[test]
	fn breadcrumb_links_both_levels() {
		let markup = breadcrumb(&product());
		assert!(markup.contains(r#"class="breadcrumb-link" data-category1="생활/건강">생활/건강</button>"#));
		assert!(markup.contains(r#"data-category1="생활/건강" data-category2="생활용품">생활용품</button>"#));

		let markup = breadcrumb(&Product::default());
		assert!(!markup.contains("breadcrumb-link"));
	}

	#[test]
	fn related_cards_carry_their_ids() {
		let mut other = product();
		other.product_id = String::from("2");
		assert!(related_products(&[other]).contains(r#"related-product-card cursor-pointer" data-product-id="2""#));
	}

	#[test]
	fn failure_keeps_the_way_back() {
		let markup = page(DetailState::Failed("상품을 불러오지 못했습니다."), 1, 0);
		assert!(markup.contains("상품을 불러오지 못했습니다."));
		assert!(markup.contains("go-to-product-list"));
		assert!(!markup.contains("add-to-cart-btn"));
	}
}
