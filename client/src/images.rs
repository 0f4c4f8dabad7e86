use std::cell::RefCell;
use std::collections::HashMap;

use futures::future::join_all;
use web_sys::HtmlImageElement;

thread_local! {
    // Decoded images by URL. Failures are not cached so a later render retries them.
    static IMAGE_CACHE: RefCell<HashMap<String, HtmlImageElement>> = RefCell::new(HashMap::new());
}

pub fn cached(url: &str) -> Option<HtmlImageElement> {
    IMAGE_CACHE.with(|cache| cache.borrow().get(url).cloned())
}

/// Load and decode one image, reusing the cache. `None` when it cannot be decoded.
pub async fn load(url: &str) -> Option<HtmlImageElement> {
    if let Some(image) = cached(url) {
        return Some(image);
    }

    let Ok(image) = HtmlImageElement::new() else {
        web_sys::console::warn_1(&format!("could not create image element for {url}").into());
        return None;
    };
    image.set_src(url);
    match wasm_bindgen_futures::JsFuture::from(image.decode()).await {
        Ok(_) => {
            // Two concurrent loads of the same URL both land here; either copy is fine.
            IMAGE_CACHE.with(|cache| {
                cache.borrow_mut().insert(url.to_owned(), image.clone());
            });
            Some(image)
        }
        Err(err) => {
            web_sys::console::warn_1(&format!("failed to decode {url}: {err:?}").into());
            None
        }
    }
}

/// Fetch every URL concurrently. The result holds only the images that decoded.
pub async fn load_all(urls: &[&str]) -> HashMap<String, HtmlImageElement> {
    let loaded = join_all(urls.iter().map(|url| async move { (*url, load(url).await) })).await;
    loaded
        .into_iter()
        .filter_map(|(url, image)| image.map(|image| (url.to_owned(), image)))
        .collect()
}
