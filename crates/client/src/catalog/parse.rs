//! CSS-selector extraction for catalog search and detail pages.
//!
//! Selectors target the catalog's result-tile and product-page markup.
//! Extraction is lenient: tiles missing a title or link are skipped, and
//! every other field is optional. Prices, ratings and review counts are
//! kept as the display strings found in the page.

use mandi_core::RawProduct;
use scraper::{ElementRef, Html, Selector};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn select_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let found = scope.select(&selector(css)).next().map(text_of)?;
    if found.is_empty() { None } else { Some(found) }
}

/// Catalog id from the `/dp/<id>` URL segment, if present.
pub(crate) fn id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/dp/")?;
    let id = rest.split(['/', '?', '#']).next().unwrap_or("");
    if id.is_empty() { None } else { Some(id.to_string()) }
}

/// Parse a search results page into result records.
///
/// Tiles without a title or product link are skipped. Relative links are
/// resolved against `base_url`.
pub fn search_results(html: &str, base_url: &str) -> Vec<RawProduct> {
    let document = Html::parse_document(html);
    let tile_selector = selector(r#".s-result-item[data-component-type="s-search-result"]"#);
    let link_selector = selector("h2 a");

    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!("invalid base URL {base_url:?}: {e}");
            return Vec::new();
        }
    };

    let mut results = Vec::new();

    for tile in document.select(&tile_selector) {
        let Some(link) = tile.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(title) = select_text(tile, "h2 a span") else {
            continue;
        };

        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            match base.join(href) {
                Ok(resolved) => resolved.to_string(),
                Err(_) => continue,
            }
        };

        let rating = select_text(tile, ".a-icon-star-small .a-icon-alt")
            .map(|r| r.split(" out").next().unwrap_or(&r).to_string());

        results.push(RawProduct {
            id: tile.value().attr("data-asin").filter(|a| !a.is_empty()).map(str::to_string),
            title,
            url,
            price: select_text(tile, ".a-price .a-offscreen"),
            rating,
            reviews_count: select_text(tile, ".a-size-base.s-underline-text"),
            image_url: tile
                .select(&selector(".s-image"))
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::to_string),
            category: None,
            availability: None,
            description: None,
        });
    }

    results
}

/// Parse a product detail page into a single record.
///
/// Returns `None` when the page has no recognizable product title; the id
/// comes from the URL's `/dp/` segment and may be absent.
pub fn product_details(html: &str, url: &str) -> Option<RawProduct> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = select_text(root, "#productTitle")?;

    let price = select_text(root, ".a-price .a-offscreen")
        .or_else(|| select_text(root, "#priceblock_ourprice"))
        .or_else(|| select_text(root, "#priceblock_dealprice"));

    Some(RawProduct {
        id: id_from_url(url),
        title,
        url: url.to_string(),
        price,
        rating: None,
        reviews_count: None,
        image_url: None,
        category: None,
        availability: select_text(root, "#availability"),
        description: select_text(root, "#feature-bullets"),
    })
}
