use crate::core::workspace::clear_subdirectories;
use crate::domain::model::TargetReport;
use crate::domain::ports::{Fetcher, Target};
use crate::utils::error::{PcbLibError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use url::Url;
use zip::ZipArchive;

const PACKAGE_MARKER: &str = "href=\"/kicad_libs/packages3d/";
const LICENSE_ENTRY: &str = "walter/license.txt";
const ARCHIVE_PREFIX: &str = "walter";

/// 從索引頁面擷取所有 3D 模型套件的網址
pub fn scrape_package_urls(html: &str, url_base: &str) -> Result<Vec<String>> {
    let base = Url::parse(url_base).map_err(|e| PcbLibError::InvalidConfigValueError {
        field: "models3d.url_base".to_string(),
        value: url_base.to_string(),
        reason: e.to_string(),
    })?;
    let link = Regex::new(r#"(?i)^<a\s+href="([^"]+)""#).map_err(|source| {
        PcbLibError::PatternError {
            file: "package index".to_string(),
            source,
        }
    })?;

    let mut urls = Vec::new();
    for line in html.lines().map(str::trim) {
        if !line.contains(PACKAGE_MARKER) {
            continue;
        }
        let Some(caps) = link.captures(line) else {
            tracing::warn!("Skipping unrecognised package line: {}", line);
            continue;
        };
        match package_url(&base, url_base, &caps[1]) {
            Ok(url) => urls.push(url.to_string()),
            Err(e) => tracing::warn!("Skipping package link {}: {}", &caps[1], e),
        }
    }
    Ok(urls)
}

/// Absolute-path links are appended to `url_base` as written, so a base with
/// a path prefix (a mirror) keeps it. Other links resolve relative to `base`.
fn package_url(base: &Url, url_base: &str, href: &str) -> std::result::Result<Url, url::ParseError> {
    if href.starts_with('/') {
        Url::parse(&format!("{}{}", url_base.trim_end_matches('/'), href))
    } else {
        base.join(href)
    }
}

/// `3d_xxx.zip` part of a package URL, or the whole URL.
pub fn package_display_name(url: &str) -> &str {
    let start = url.find("3d_");
    match start.and_then(|s| url[s..].rfind(".zip").map(|e| (s, s + e + 4))) {
        Some((s, e)) if e > s + 3 => &url[s..e],
        _ => url,
    }
}

fn write_entry(entry: &mut impl Read, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PcbLibError::filesystem(parent, e))?;
    }
    let mut file = std::fs::File::create(dest).map_err(|e| PcbLibError::filesystem(dest, e))?;
    std::io::copy(entry, &mut file).map_err(|e| PcbLibError::filesystem(dest, e))?;
    Ok(())
}

/// Extract the models (and the license, once) of one package into `output`.
///
/// Returns the number of models written and whether the license file has been
/// extracted so far.
pub fn extract_models(data: &[u8], output: &Path, license_done: bool) -> Result<(usize, bool)> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut license_done = license_done;
    let mut count = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if name == LICENSE_ENTRY && !license_done {
            write_entry(&mut entry, &output.join("license.txt"))?;
            license_done = true;
        } else if name.ends_with(".wrl") || name.ends_with(".wings") {
            let Some(enclosed) = entry.enclosed_name() else {
                tracing::warn!("Skipping unsafe archive entry {}", name);
                continue;
            };
            let relative = enclosed
                .strip_prefix(ARCHIVE_PREFIX)
                .map(Path::to_path_buf)
                .unwrap_or(enclosed);
            write_entry(&mut entry, &output.join(relative))?;
            count += 1;
        }
    }

    Ok((count, license_done))
}

pub struct ModelsTarget<F: Fetcher> {
    fetcher: F,
    index_url: String,
    url_base: String,
    output: PathBuf,
}

impl<F: Fetcher> ModelsTarget<F> {
    pub fn new(fetcher: F, index_url: String, url_base: String, output: PathBuf) -> Self {
        Self {
            fetcher,
            index_url,
            url_base,
            output,
        }
    }
}

#[async_trait]
impl<F: Fetcher> Target for ModelsTarget<F> {
    async fn build(&self) -> Result<TargetReport> {
        let start = Instant::now();
        let removed = clear_subdirectories(&self.output).await?;
        tracing::info!("🧹 Cleared {} model directories in {}", removed, self.output.display());

        let index = self.fetcher.fetch(&self.index_url).await?;
        let packages = scrape_package_urls(&String::from_utf8_lossy(&index), &self.url_base)?;
        tracing::info!("🔍 Found {} 3D model packages", packages.len());

        let mut license_done = false;
        let mut total = 0;
        for url in &packages {
            let data = self.fetcher.fetch(url).await?;
            let output = self.output.clone();
            let (count, done) = tokio::task::spawn_blocking(move || {
                extract_models(&data, &output, license_done)
            })
            .await
            .map_err(|e| PcbLibError::conversion(format!("extraction task failed: {}", e)))??;
            license_done = done;
            total += count;
            tracing::info!("Downloading {}... {} models", package_display_name(url), count);
        }

        Ok(TargetReport {
            name: self.output.display().to_string(),
            output: self.output.clone(),
            items: total,
            duration: start.elapsed(),
        })
    }

    fn name(&self) -> &str {
        "3d"
    }
}
