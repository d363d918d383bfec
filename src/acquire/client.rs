// src/acquire/client.rs
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{header, Url};

use crate::acquire::links::{collect_workbook_links, looks_like_workbook, WorkbookLink};
use crate::storage::StorageManager;
use crate::utils::error::AcquireError;

const USER_AGENT: &str = concat!("financing_extractor/", env!("CARGO_PKG_VERSION"));
// Be polite to the state treasurer's site: one request at a time, with a pause.
const REQUEST_DELAY_MS: u64 = 150;
const PAGE_TIMEOUT_SECS: u64 = 30;
const FILE_TIMEOUT_SECS: u64 = 60;

/// Creates a reqwest client configured for the applications site.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
        .build()
}

/// Downloads the applications index page as text.
pub async fn fetch_index_page(client: &reqwest::Client, url: &Url) -> Result<String, AcquireError> {
    tracing::info!("Fetching applications index: {}", url);
    let response = client
        .get(url.clone())
        .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
        .header(header::ACCEPT, "text/html,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        return Err(AcquireError::Http(status));
    }

    Ok(response.text().await?)
}

/// Downloads one workbook and returns its bytes, rejecting payloads that are not workbooks.
pub async fn download_workbook(client: &reqwest::Client, link: &WorkbookLink) -> Result<Vec<u8>, AcquireError> {
    tokio::time::sleep(Duration::from_millis(REQUEST_DELAY_MS)).await;

    let response = client
        .get(&link.url)
        .timeout(Duration::from_secs(FILE_TIMEOUT_SECS))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("HTTP error status: {} for URL: {}", status, link.url);
        return Err(AcquireError::Http(status));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;

    if !looks_like_workbook(content_type.as_deref(), &bytes) {
        return Err(AcquireError::NotAWorkbook(link.file_name.clone()));
    }
    Ok(bytes.to_vec())
}

/// Downloads every workbook linked from `page_url` into `store`.
///
/// Files already in the store are not downloaded again but are still returned. A failure
/// on one file is logged and skipped; only failing to fetch the index page is an error.
pub async fn download_workbooks(
    page_url: &str,
    store: &StorageManager,
    limit: Option<usize>,
) -> Result<Vec<PathBuf>, AcquireError> {
    let url = Url::parse(page_url).map_err(|_| AcquireError::InvalidUrl(page_url.to_string()))?;
    let client = build_client()?;

    let html = fetch_index_page(&client, &url).await?;
    let links = collect_workbook_links(&html, &url, limit);
    tracing::info!("Found {} workbook links", links.len());

    let mut paths = Vec::new();
    for link in links {
        if store.contains(&link.file_name) {
            tracing::info!("Skipping (already exists): {}", link.file_name);
            paths.push(store.workbook_path(&link.file_name));
            continue;
        }

        match download_workbook(&client, &link).await {
            Ok(bytes) => {
                let path = store.save_workbook(&link.file_name, &bytes)?;
                tracing::info!("Downloaded: {} ({} bytes)", link.file_name, bytes.len());
                paths.push(path);
            }
            Err(AcquireError::NotAWorkbook(name)) => {
                tracing::warn!("Skipping (not Excel): {}", name);
            }
            Err(e) => {
                tracing::error!("Error downloading {}: {}", link.url, e);
            }
        }
    }

    Ok(paths)
}
