use accord_harvest::config::{Config, StoreConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server, with no pacing delay
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.base_delay_ms = 0;
    config.crawler.max_delay_ms = 0;
    config.crawler.jitter = false;
    config.crawler.request_timeout_secs = 5;
    config.crawler.progress_interval = 1;
    config.store = StoreConfig {
        connection: ":memory:".to_string(),
        database: "test".to_string(),
    };
    config.site.index_url = format!("{}/designers/", base_url);
    config
}

/// Index page listing the given category names
pub fn index_page(categories: &[&str]) -> String {
    let links: String = categories
        .iter()
        .map(|name| format!(r#"<li><a href="/designers/{}.html">{}</a></li>"#, name, name))
        .collect();
    format!("<html><body><h1>Designers</h1><ul>{}</ul></body></html>", links)
}

/// Category page listing `count` items
pub fn category_page(category: &str, count: usize) -> String {
    let links: String = (0..count)
        .map(|i| {
            format!(
                r#"<a href="/perfume/{}/Item-{}.html">Item {}</a>"#,
                category, i, i
            )
        })
        .collect();
    format!(
        "<html><body><h1>{} perfumes and colognes</h1>{}</body></html>",
        category, links
    )
}

/// Item page with a heading and two accord bars
pub fn item_page(name: &str) -> String {
    format!(
        r#"<html><body>
            <h1>{}</h1>
            <div class="flex flex-col w-full">
              <div class="w-full">
                <div style="width: 100%;"><span class="truncate">woody</span></div>
                <div style="width: 64.2%;"><span class="truncate">amber</span></div>
              </div>
            </div>
        </body></html>"#,
        name
    )
}

/// Item path for a category and index, as linked by `category_page`
pub fn item_path(category: &str, i: usize) -> String {
    format!("/perfume/{}/Item-{}.html", category, i)
}

/// Mounts a 200 response with the given body
pub async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a response with the given status that must be requested exactly `times`
pub async fn mount_status(server: &MockServer, page_path: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}
