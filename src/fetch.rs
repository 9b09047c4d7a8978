// 🌐 Fetcher - Bulk-extract archive discovery, download, and unzip
//
// The registry publishes the extract as split zip archives linked from a
// landing page; every link whose href carries the "public_split" naming
// convention is an archive. Archives are fetched whole into memory and
// their file entries unpacked into the input directory the pipeline reads.

use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use tracing::{info, warn};
use zip::ZipArchive;

/// Substring that marks an anchor as a split-archive link.
const ARCHIVE_LINK_MARKER: &str = "public_split";

/// Collect every archive link from the landing page HTML.
pub fn extract_archive_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(ARCHIVE_LINK_MARKER))
        .map(str::to_string)
        .collect()
}

/// Fetch the landing page and return the archive URLs found on it.
pub fn discover_archive_urls(index_url: &str) -> Result<Vec<String>> {
    let response = reqwest::blocking::get(index_url)
        .with_context(|| format!("Failed to fetch {}", index_url))?;
    if !response.status().is_success() {
        bail!(
            "Failed to retrieve {}: status {}",
            index_url,
            response.status()
        );
    }

    let links = extract_archive_links(&response.text()?);
    info!(count = links.len(), "archive links discovered");
    Ok(links)
}

/// Unpack every file entry of a zip archive into `data_dir`.
///
/// Directory entries are skipped; entries whose names escape the target
/// directory are refused.
pub fn unpack_archive<R: Read + Seek>(reader: R, data_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let mut archive = ZipArchive::new(reader).context("Not a readable zip archive")?;
    let mut written = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "refusing entry with unsafe path");
            continue;
        };

        let dest = data_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        io::copy(&mut entry, &mut out)?;

        info!(file = %dest.display(), "extracted");
        written.push(dest);
    }

    Ok(written)
}

/// Download each archive and unpack it into `data_dir`.
///
/// A failed download is reported and skipped; the remaining archives are
/// still fetched.
pub fn download_archives(urls: &[String], data_dir: &Path) -> Result<Vec<PathBuf>> {
    let client = reqwest::blocking::Client::new();
    let mut extracted = Vec::new();

    for url in urls {
        info!(%url, "downloading archive");
        let response = match client.get(url).send() {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(%url, status = %response.status(), "download failed, skipping");
                continue;
            }
            Err(err) => {
                warn!(%url, %err, "download failed, skipping");
                continue;
            }
        };

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read body of {}", url))?;
        let files = unpack_archive(Cursor::new(bytes), data_dir)
            .with_context(|| format!("Failed to unpack {}", url))?;
        extracted.extend(files);
    }

    Ok(extracted)
}
