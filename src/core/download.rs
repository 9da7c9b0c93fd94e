use crate::domain::ports::Fetcher;
use crate::utils::error::{PcbLibError, Result};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const FREEPCB_LICENSE_NOTICE: &str = "\
IPC libraries must be downloaded from FreePCB (www.freepcb.com).
They are covered by the GNU General Public License, version 2 or
later.";

const LICENSE_PROMPT: &str = "Do you accept the license?";

fn prompt_error(e: impl std::fmt::Display) -> PcbLibError {
    PcbLibError::LicensePromptError {
        message: e.to_string(),
    }
}

/// 讀取一行回答；只有 `y` / `yes` (不分大小寫) 視為同意
pub fn read_license_answer<R: BufRead>(mut input: R) -> Result<()> {
    let mut answer = String::new();
    input.read_line(&mut answer).map_err(prompt_error)?;
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => Err(PcbLibError::LicenseDeclined),
    }
}

/// 確認 FreePCB 授權：終端機使用 dialoguer，否則從 stdin 讀取一行
pub fn confirm_freepcb_license() -> Result<()> {
    println!("{}", FREEPCB_LICENSE_NOTICE);

    if std::io::stdin().is_terminal() {
        let answer = dialoguer::Confirm::new()
            .with_prompt(LICENSE_PROMPT)
            .default(false)
            .interact_opt()
            .map_err(prompt_error)?;
        return match answer {
            Some(true) => Ok(()),
            _ => Err(PcbLibError::LicenseDeclined),
        };
    }

    print!("{} [y/N] ", LICENSE_PROMPT);
    std::io::stdout().flush().map_err(prompt_error)?;
    read_license_answer(std::io::stdin().lock())
}

type LicensePrompt = dyn Fn() -> Result<()> + Send + Sync;

/// Asks for the license at most once for every target sharing the gate.
/// A refusal is not remembered.
#[derive(Clone)]
pub struct LicenseGate {
    accepted: Arc<AtomicBool>,
    prompt: Arc<LicensePrompt>,
}

impl Default for LicenseGate {
    fn default() -> Self {
        Self::with_prompt(confirm_freepcb_license)
    }
}

impl LicenseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(prompt: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        Self {
            accepted: Arc::new(AtomicBool::new(false)),
            prompt: Arc::new(prompt),
        }
    }

    pub fn confirm(&self) -> Result<()> {
        if self.accepted.load(Ordering::SeqCst) {
            tracing::debug!("FreePCB license already accepted");
            return Ok(());
        }
        (self.prompt)()?;
        self.accepted.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted.load(Ordering::SeqCst)
    }
}

pub async fn ensure_downloaded<F: Fetcher>(fetcher: &F, url: &str, local: &Path) -> Result<PathBuf> {
    ensure_downloaded_with(fetcher, url, local, || Ok(())).await
}

/// Return `local` if it exists; otherwise run `before_fetch`, download `url`
/// and store it as `local`.
///
/// The body is written next to the target with a `.part` suffix and renamed
/// into place, so an interrupted download is never mistaken for a cached one.
pub async fn ensure_downloaded_with<F, G>(
    fetcher: &F,
    url: &str,
    local: &Path,
    before_fetch: G,
) -> Result<PathBuf>
where
    F: Fetcher,
    G: FnOnce() -> Result<()> + Send,
{
    if tokio::fs::try_exists(local)
        .await
        .map_err(|e| PcbLibError::filesystem(local, e))?
    {
        tracing::info!("📁 Using cached {}", local.display());
        return Ok(local.to_path_buf());
    }

    before_fetch()?;

    tracing::info!("⬇️ Downloading {} -> {}", url, local.display());
    let data = fetcher.fetch(url).await?;
    tracing::debug!("Downloaded {} bytes", data.len());

    if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PcbLibError::filesystem(parent, e))?;
    }

    let mut partial = local.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);
    tokio::fs::write(&partial, &data)
        .await
        .map_err(|e| PcbLibError::filesystem(&partial, e))?;
    tokio::fs::rename(&partial, local)
        .await
        .map_err(|e| PcbLibError::filesystem(local, e))?;

    Ok(local.to_path_buf())
}
