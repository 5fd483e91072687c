//! Pure markup builders. Nothing in here touches the DOM.
//!
//! Every interpolated value goes through [`escape`], so catalog data can't inject markup.

pub mod cart;
pub mod detail;
pub mod home;

use core::fmt::Write;
use num_format::{Locale, ToFormattedString};

/// Escapes text for use in element content and double-quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}

/// Formats a price in whole won with thousands separators, e.g. `12,300`.
#[must_use]
pub fn format_price(amount: f64) -> String {
	if !amount.is_finite() {
		return String::from("0");
	}
	#[allow(clippy::cast_possible_truncation)]
	let whole = amount.round() as i64;
	whole.to_formatted_string(&Locale::en)
}

/// The cart button's content: icon plus item count badge (hidden while empty).
#[must_use]
pub fn cart_icon(count: usize) -> String {
	let mut markup = String::from(
		r#"<svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M3 3h2l.4 2M7 13h10l4-8H5.4M7 13L5.4 5M7 13l-2.293 2.293c-.63.63-.184 1.707.707 1.707H17m0 0a2 2 0 100 4 2 2 0 000-4zm-8 2a2 2 0 11-4 0 2 2 0 014 0z"></path></svg>"#,
	);
	if count > 0 {
		let _ = write!(
			markup,
			r#"<span id="cart-count" class="absolute -top-1 -right-1 bg-red-500 text-white text-xs rounded-full h-5 w-5 flex items-center justify-center">{}</span>"#,
			count
		);
	}
	markup
}

fn header(cart_count: usize, leading: &str) -> String {
	format!(
		r#"<header class="bg-white shadow-sm sticky top-0 z-40">
  <div class="max-w-md mx-auto px-4 py-4">
    <div class="flex items-center justify-between">
      {leading}
      <button id="cart-icon-btn" class="relative p-2 text-gray-700 hover:text-gray-900 transition-colors">{icon}</button>
    </div>
  </div>
</header>"#,
		leading = leading,
		icon = cart_icon(cart_count),
	)
}

fn footer() -> &'static str {
	r#"<footer class="bg-white shadow-sm sticky top-0 z-40">
  <div class="max-w-md mx-auto py-8 text-center text-gray-500">
    <p>&copy; 2025 항해플러스 프론트엔드 쇼핑몰</p>
  </div>
</footer>"#
}

fn shell(header: &str, children: &str) -> String {
	format!(
		r#"<div class="min-h-screen bg-gray-50">
{header}
<main class="max-w-md mx-auto px-4 py-4">
{children}
</main>
{footer}
<div id="cart-modal-root"></div>
</div>"#,
		header = header,
		children = children,
		footer = footer(),
	)
}

/// The catalog page frame: title header with cart button, content, footer and the cart modal's mount point.
#[must_use]
pub fn layout(cart_count: usize, children: &str) -> String {
	shell(
		&header(cart_count, r#"<h1 class="text-xl font-bold text-gray-900"><a href="/" data-link>쇼핑몰</a></h1>"#),
		children,
	)
}

/// Like [`layout`], with a back button and the detail title instead.
#[must_use]
pub fn detail_layout(cart_count: usize, children: &str) -> String {
	shell(
		&header(
			cart_count,
			r#"<div class="flex items-center space-x-3">
        <button onclick="window.history.back()" class="p-2 text-gray-700 hover:text-gray-900 transition-colors">
          <svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M15 19l-7-7 7-7"></path></svg>
        </button>
        <h1 class="text-lg font-bold text-gray-900">상품 상세</h1>
      </div>"#,
		),
		children,
	)
}

/// Spinner with a caption.
#[must_use]
pub fn loading(caption: &str) -> String {
	format!(
		r#"<div class="flex items-center justify-center py-8">
  <svg class="animate-spin h-5 w-5 text-blue-600 mr-2" fill="none" viewBox="0 0 24 24"><circle class="opacity-25" cx="12" cy="12" r="10" stroke="currentColor" stroke-width="4"></circle><path class="opacity-75" fill="currentColor" d="M4 12a8 8 0 018-8V0C5.373 0 0 5.373 0 12h4zm2 5.291A7.962 7.962 0 014 12H0c0 3.042 1.135 5.824 3 7.938l3-2.647z"></path></svg>
  <span class="text-sm text-gray-600">{}</span>
</div>"#,
		escape(caption)
	)
}

/// An inline failure notice, used where a section couldn't load.
#[must_use]
pub fn inline_error(message: &str) -> String {
	format!(
		r#"<div class="bg-red-50 border border-red-200 rounded-lg p-4 text-center" role="alert">
  <p class="text-sm text-red-700">{}</p>
</div>"#,
		escape(message)
	)
}

#[must_use]
pub fn not_found() -> String {
	String::from(
		r#"<main class="max-w-md mx-auto px-4 py-4">
  <div class="text-center my-4 py-20 shadow-md p-6 bg-white rounded-lg">
    <h1 class="text-6xl font-bold text-blue-600 mb-4">404</h1>
    <p class="text-xl text-gray-600 mb-6">페이지를 찾을 수 없습니다</p>
    <a href="/" data-link class="inline-block px-6 py-3 bg-blue-600 text-white rounded-lg hover:bg-blue-700 transition-colors">홈으로</a>
  </div>
</main>"#,
	)
}

/// Full-page error notice. `message` is shown to the user, so keep internals out of it.
#[must_use]
pub fn error_page(message: &str) -> String {
	format!(
		r#"<main class="max-w-md mx-auto px-4 py-4">
  <div id="error-page" class="text-center my-4 py-20 shadow-md p-6 bg-white rounded-lg">
    <h1 class="text-2xl font-bold text-red-600 mb-4">오류가 발생했습니다</h1>
    <p class="text-gray-600 mb-6">{}</p>
    <a href="/" data-link class="inline-block px-6 py-3 bg-blue-600 text-white rounded-lg hover:bg-blue-700 transition-colors">홈으로</a>
  </div>
</main>"#,
		escape(message)
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_markup_and_quotes() {
		assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
		assert_eq!(escape("사과"), "사과");
	}

	#[test]
	fn formats_prices() {
		assert_eq!(format_price(0.0), "0");
		assert_eq!(format_price(999.0), "999");
		assert_eq!(format_price(1000.0), "1,000");
		assert_eq!(format_price(1_234_567.4), "1,234,567");
		assert_eq!(format_price(-12_000.0), "-12,000");
		assert_eq!(format_price(f64::NAN), "0");
	}

	#[test]
	fn badge_only_with_items() {
		assert!(!cart_icon(0).contains("cart-count"));
		assert!(cart_icon(3).contains(r#"id="cart-count""#));
		assert!(cart_icon(3).contains(">3</span>"));
	}

	#[test]
	fn layouts_carry_the_modal_root() {
		for markup in &[layout(0, "<p>x</p>"), detail_layout(2, "<p>x</p>")] {
			assert!(markup.contains(r#"id="cart-icon-btn""#));
			assert!(markup.contains(r#"id="cart-modal-root""#));
			assert!(markup.contains("<p>x</p>"));
		}
	}

	#[test]
	fn error_page_escapes_its_message() {
		assert!(error_page("<script>").contains("&lt;script&gt;"));
	}
}
