use crate::core::download::{ensure_downloaded_with, LicenseGate};
use crate::core::workspace::rebuild_output_dir;
use crate::domain::model::{ConversionOptions, TargetReport, VariantSource};
use crate::domain::ports::{Converter, Fetcher, Target};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// 一個 IPC 變體：下載 → 清空輸出目錄 → 轉換
pub struct IpcTarget<F: Fetcher> {
    name: String,
    source: VariantSource,
    fetcher: F,
    converter: Arc<dyn Converter>,
    options: ConversionOptions,
    license: LicenseGate,
}

impl<F: Fetcher> IpcTarget<F> {
    pub fn new(
        source: VariantSource,
        fetcher: F,
        converter: Arc<dyn Converter>,
        options: ConversionOptions,
    ) -> Self {
        Self {
            name: source.output.display().to_string(),
            source,
            fetcher,
            converter,
            options,
            license: LicenseGate::new(),
        }
    }

    /// Share one license confirmation between several targets.
    pub fn with_license_gate(mut self, license: LicenseGate) -> Self {
        self.license = license;
        self
    }
}

#[async_trait]
impl<F: Fetcher> Target for IpcTarget<F> {
    async fn build(&self) -> Result<TargetReport> {
        let start = Instant::now();
        let confirm = self.options.confirm_license;
        let license = self.license.clone();

        let archive = ensure_downloaded_with(
            &self.fetcher,
            &self.source.url,
            &self.source.archive,
            move || {
                if confirm {
                    license.confirm()
                } else {
                    Ok(())
                }
            },
        )
        .await?;

        rebuild_output_dir(&self.source.output).await?;

        tracing::debug!(
            "Converting {} with the {} converter",
            archive.display(),
            self.converter.name()
        );
        let items = self
            .converter
            .convert(&archive, &self.source.output, &self.options)
            .await?;

        Ok(TargetReport {
            name: self.name.clone(),
            output: self.source.output.clone(),
            items,
            duration: start.elapsed(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
