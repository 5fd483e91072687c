use super::{escape, format_price};
use crate::cart::CartItem;

/// The open cart modal. Rendered into `#cart-modal-root`.
#[must_use]
pub fn modal(items: &[CartItem]) -> String {
	let body = if items.is_empty() { empty() } else { content(items) };
	format!(
		r#"<div class="fixed inset-0 z-50 overflow-y-auto cart-modal">
  <div class="fixed inset-0 bg-black bg-opacity-50 transition-opacity cart-modal-overlay"></div>
  <div class="flex min-h-full items-end justify-center p-0 sm:items-center sm:p-4">
    <div class="relative bg-white rounded-t-lg sm:rounded-lg shadow-xl w-full max-w-md sm:max-w-lg max-h-[90vh] overflow-hidden">
      <div class="sticky top-0 bg-white border-b border-gray-200 p-4 flex items-center justify-between">
        <h2 class="text-lg font-bold text-gray-900 flex items-center">장바구니{count}</h2>
        <button id="cart-modal-close-btn" class="text-gray-400 hover:text-gray-600 p-1">&times;</button>
      </div>
      {body}
    </div>
  </div>
</div>"#,
		count = if items.is_empty() {
			String::new()
		} else {
			format!(r#"<span class="text-sm font-normal text-gray-600 ml-1">({})</span>"#, items.len())
		},
		body = body,
	)
}

fn empty() -> String {
	String::from(
		r#"<div class="flex-1 flex items-center justify-center p-8">
  <div class="text-center">
    <h3 class="text-lg font-medium text-gray-900 mb-2">장바구니가 비어있습니다</h3>
    <p class="text-gray-600">원하는 상품을 담아보세요!</p>
  </div>
</div>"#,
	)
}

fn content(items: &[CartItem]) -> String {
	let all_checked = items.iter().all(|item| item.checked);
	let checked: Vec<&CartItem> = items.iter().filter(|item| item.checked).collect();
	let total: f64 = items.iter().map(CartItem::subtotal).sum();

	let selection = if checked.is_empty() {
		String::new()
	} else {
		format!(
			r#"<div class="flex justify-between items-center mb-3 text-sm">
  <span class="text-gray-600">선택한 상품 ({count}개)</span>
  <span class="font-medium">{price}원</span>
</div>"#,
			count = checked.len(),
			price = format_price(checked.iter().map(|item| item.subtotal()).sum()),
		)
	};
	let remove_selected = if checked.is_empty() {
		String::new()
	} else {
		format!(
			r#"<button id="cart-modal-remove-selected-btn" class="w-full bg-red-600 text-white py-2 px-4 rounded-md hover:bg-red-700 transition-colors text-sm">선택한 상품 삭제 ({}개)</button>"#,
			checked.len()
		)
	};

	format!(
		r#"<div class="flex flex-col max-h-[calc(90vh-120px)]">
  <div class="p-4 border-b border-gray-200 bg-gray-50">
    <label class="flex items-center text-sm text-gray-700">
      <input type="checkbox" id="cart-modal-select-all-checkbox" class="w-4 h-4 text-blue-600 border-gray-300 rounded focus:ring-blue-500 mr-2"{all}>
      전체선택 ({len}개)
    </label>
  </div>
  <div class="flex-1 overflow-y-auto"><div class="p-4 space-y-4">{items}</div></div>
</div>
<div class="sticky bottom-0 bg-white border-t border-gray-200 p-4">
  {selection}
  <div class="flex justify-between items-center mb-4">
    <span class="text-lg font-bold text-gray-900">총 금액</span>
    <span class="text-xl font-bold text-blue-600">{total}원</span>
  </div>
  <div class="space-y-2">
    {remove_selected}
    <div class="flex gap-2">
      <button id="cart-modal-clear-cart-btn" class="flex-1 bg-gray-600 text-white py-2 px-4 rounded-md hover:bg-gray-700 transition-colors text-sm">전체 비우기</button>
      <button id="cart-modal-checkout-btn" class="flex-1 bg-blue-600 text-white py-2 px-4 rounded-md hover:bg-blue-700 transition-colors text-sm">구매하기</button>
    </div>
  </div>
</div>"#,
		all = if all_checked { " checked" } else { "" },
		len = items.len(),
		items = items.iter().map(item).collect::<String>(),
		selection = selection,
		total = format_price(total),
		remove_selected = remove_selected,
	)
}

/// One cart line with its checkbox, quantity stepper and remove button.
#[must_use]
pub fn item(item: &CartItem) -> String {
	format!(
		r#"<div class="flex items-center py-3 border-b border-gray-100 cart-item" data-product-id="{id}">
  <label class="flex items-center mr-3">
    <input type="checkbox" class="cart-item-checkbox w-4 h-4 text-blue-600 border-gray-300 rounded focus:ring-blue-500" data-product-id="{id}"{checked}>
  </label>
  <div class="w-16 h-16 bg-gray-100 rounded-lg overflow-hidden mr-3 flex-shrink-0">
    <img src="{image}" alt="{title}" class="w-full h-full object-cover cart-item-image" data-product-id="{id}">
  </div>
  <div class="flex-1 min-w-0">
    <h4 class="text-sm font-medium text-gray-900 truncate cart-item-title" data-product-id="{id}">{title}</h4>
    <p class="text-sm text-gray-600 mt-1">{price}원</p>
    <div class="flex items-center mt-2">
      <button class="quantity-decrease-btn w-7 h-7 flex items-center justify-center border border-gray-300 rounded-l-md bg-gray-50 hover:bg-gray-100" data-product-id="{id}">-</button>
      <input type="number" value="{quantity}" min="1" class="quantity-input w-12 h-7 text-center text-sm border-t border-b border-gray-300" data-product-id="{id}">
      <button class="quantity-increase-btn w-7 h-7 flex items-center justify-center border border-gray-300 rounded-r-md bg-gray-50 hover:bg-gray-100" data-product-id="{id}">+</button>
    </div>
  </div>
  <div class="text-right ml-3">
    <p class="text-sm font-medium text-gray-900">{subtotal}원</p>
    <button class="cart-item-remove-btn mt-1 text-xs text-red-600 hover:text-red-800" data-product-id="{id}">삭제</button>
  </div>
</div>"#,
		id = escape(&item.product_id),
		checked = if item.checked { " checked" } else { "" },
		image = escape(&item.image),
		title = escape(&item.title),
		price = format_price(item.price),
		quantity = item.quantity,
		subtotal = format_price(item.subtotal()),
	)
}
