use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Once};
use storefront_dom::{
	api::{MemoryCatalog, Product},
	cart::{CartStore, LocalStorage, MemoryStorage, Storage},
	config::Config,
	listeners::{active_listeners, OBSERVER},
	pages::{self, Storefront},
	router::Router,
	schedule::Defer,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static LOG_INITIALIZED: Once = Once::new();

fn init_logging() {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);
}

#[derive(Default, Clone)]
struct Queue(Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>);
impl Queue {
	fn flush(&self) {
		loop {
			let task = self.0.borrow_mut().pop_front();
			match task {
				Some(task) => task(),
				None => break,
			}
		}
	}
}
impl Defer for Queue {
	fn defer(&self, task: Box<dyn FnOnce()>) {
		self.0.borrow_mut().push_back(task);
	}
}

/// Lets spawned futures run, then applies the renders they scheduled.
async fn settle(queue: &Queue) {
	for _ in 0..3 {
		JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await.unwrap();
	}
	queue.flush();
}

async fn sleep(ms: i32) {
	let timer = js_sys::Promise::new(&mut |resolve, _| {
		window().unwrap().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms).unwrap();
	});
	JsFuture::from(timer).await.unwrap();
}

fn go(path: &str) {
	window()
		.unwrap()
		.history()
		.unwrap()
		.push_state_with_url(&JsValue::NULL, "", Some(path))
		.unwrap();
}

fn product(id: &str, title: &str, price: &str) -> Product {
	Product {
		product_id: id.to_owned(),
		title: title.to_owned(),
		lprice: price.to_owned(),
		category1: String::from("food"),
		category2: String::from("fruit"),
		..Product::default()
	}
}

fn storefront() -> (Router<Storefront>, Queue) {
	init_logging();
	let document = window().unwrap().document().unwrap();
	let root = document.create_element("div").unwrap();
	let body = document.body().unwrap();
	body.insert_before(&root, body.first_child().as_ref()).unwrap();
	window().unwrap().scroll_to_with_x_and_y(0.0, 0.0);

	let catalog = MemoryCatalog::new(vec![product("1", "Apple", "1500"), product("2", "Banana", "800"), product("3", "Cherry", "12000")]);
	let store = Storefront::new(Rc::new(catalog), CartStore::new(MemoryStorage::new(), "cart"), Config::default());
	let queue = Queue::default();
	(Router::with_defer(root, pages::routes(), Rc::new(store), Rc::new(queue.clone())), queue)
}

fn find(router: &Router<Storefront>, selector: &str) -> Option<Element> {
	router.root().query_selector(selector).unwrap()
}

fn click(router: &Router<Storefront>, selector: &str) {
	find(router, selector).unwrap().dyn_into::<HtmlElement>().unwrap().click();
}

#[wasm_bindgen_test]
async fn home_loads_and_adds_to_cart() {
	let (router, queue) = storefront();
	go("/?limit=2");
	router.render_route();
	assert!(router.root().inner_html().contains("카테고리 로딩 중"));

	settle(&queue).await;
	let cards = router.root().query_selector_all(".product-card").unwrap();
	assert_eq!(cards.length(), 2);
	assert_eq!(find(&router, "#home-page").unwrap().get_attribute("data-has-next").as_deref(), Some("true"));
	assert!(find(&router, "[data-observer-target]").is_some());

	click(&router, ".add-to-cart-btn");
	assert_eq!(router.env().cart.len(), 1);
	assert_eq!(router.env().cart.get_state()[0].product_id, "2", "cheapest first");
	assert_eq!(find(&router, "#cart-count").unwrap().text_content().as_deref(), Some("1"));
	router.unmount();
}

#[wasm_bindgen_test]
async fn filters_navigate_back_to_page_one() {
	let (router, queue) = storefront();
	go("/?current=2&limit=2");
	router.render_route();
	settle(&queue).await;

	click(&router, ".category1-filter-btn");
	let location = window().unwrap().location();
	assert_eq!(location.pathname().unwrap(), "/");
	assert_eq!(location.search().unwrap(), "?category1=food&limit=2");
	router.unmount();
}

#[wasm_bindgen_test]
async fn detail_quantity_and_cart() {
	let (router, queue) = storefront();
	go("/products/3");
	router.render_route();
	settle(&queue).await;
	assert!(router.root().inner_html().contains("Cherry"));
	assert_eq!(router.root().query_selector_all(".related-product-card").unwrap().length(), 2);

	click(&router, "#quantity-increase");
	click(&router, "#quantity-increase");
	queue.flush();
	assert_eq!(find(&router, "#quantity-input").unwrap().get_attribute("value").as_deref(), Some("3"));

	click(&router, "#add-to-cart-btn");
	let items = router.env().cart.get_state();
	assert_eq!(items.len(), 1);
	assert_eq!(items[0].quantity, 3);
	router.unmount();
}

#[wasm_bindgen_test]
async fn unknown_product_is_reported_inline() {
	let (router, queue) = storefront();
	go("/products/404");
	router.render_route();
	settle(&queue).await;
	assert!(router.root().inner_html().contains("상품을 찾을 수 없습니다."));
	assert!(find(&router, "#add-to-cart-btn").is_none());
	router.unmount();
}

#[wasm_bindgen_test]
async fn cart_modal_follows_the_store() {
	let (router, queue) = storefront();
	go("/products/1");
	router.render_route();
	settle(&queue).await;

	click(&router, "#add-to-cart-btn");
	click(&router, "#cart-icon-btn");
	assert!(router.env().cart_modal.is_open());
	assert!(find(&router, ".cart-modal").is_some());

	click(&router, ".quantity-increase-btn");
	assert_eq!(router.env().cart.get_state()[0].quantity, 2);
	assert_eq!(find(&router, ".cart-item .quantity-input").unwrap().get_attribute("value").as_deref(), Some("2"));

	click(&router, "#cart-modal-clear-cart-btn");
	assert!(router.env().cart.is_empty());
	assert!(router.root().inner_html().contains("장바구니가 비어있습니다"));

	click(&router, "#cart-modal-close-btn");
	assert!(find(&router, ".cart-modal").is_none());
	router.unmount();
}

#[wasm_bindgen_test]
fn local_storage_round_trip() {
	init_logging();
	let key = "storefront-dom-test-cart";
	let storage = window().unwrap().local_storage().unwrap().unwrap();
	storage.remove_item(key).unwrap();

	let cart = CartStore::new(LocalStorage, key);
	cart.add_item(&product("1", "Apple", "1500"), 2.0);
	let stored = LocalStorage.load(key).unwrap().unwrap();
	assert!(stored.contains(r#""productId":"1""#));

	let restored = CartStore::new(LocalStorage, key);
	assert_eq!(*restored.get_state(), *cart.get_state());

	storage.set_item(key, "{not json").unwrap();
	assert!(CartStore::new(LocalStorage, key).is_empty());
	storage.remove_item(key).unwrap();
}

#[wasm_bindgen_test]
async fn scrolling_appends_pages_until_the_end() {
	let (router, queue) = storefront();
	go("/?limit=1");
	router.render_route();
	settle(&queue).await;
	assert_eq!(active_listeners(OBSERVER), 1);

	let home = find(&router, "#home-page").unwrap();
	for _ in 0..100 {
		if home.get_attribute("data-has-next").as_deref() == Some("false") {
			break;
		}
		sleep(20).await;
	}

	let cards = router.root().query_selector_all(".product-card").unwrap();
	let ids: Vec<String> = (0..cards.length())
		.map(|i| cards.item(i).unwrap().dyn_into::<Element>().unwrap().get_attribute("data-product-id").unwrap())
		.collect();
	assert_eq!(ids, ["2", "1", "3"]);
	assert_eq!(home.get_attribute("data-current-page").as_deref(), Some("3"));
	assert!(find(&router, "#scroll-status").unwrap().inner_html().contains("모든 상품을 확인했습니다"));
	assert!(find(&router, "[data-observer-target]").is_none());
	assert_eq!(active_listeners(OBSERVER), 0);
	router.unmount();
}

#[wasm_bindgen_test]
async fn leaving_the_catalog_stops_scrolling() {
	let (router, queue) = storefront();
	go("/?limit=1");
	router.render_route();
	settle(&queue).await;
	assert_eq!(active_listeners(OBSERVER), 1);

	router.navigate("/products/1");
	assert_eq!(active_listeners(OBSERVER), 0);
	sleep(100).await;
	settle(&queue).await;
	assert!(find(&router, "#products-grid").is_none());
	assert!(router.root().inner_html().contains("Apple"));
	router.unmount();
}
