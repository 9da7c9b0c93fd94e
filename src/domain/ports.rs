use crate::domain::model::{ConversionOptions, TargetReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// 以 URL 取得完整內容
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// 把壓縮檔轉成 `.pretty` 目錄，回傳寫出的 footprint 數量
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(
        &self,
        archive: &Path,
        output_dir: &Path,
        options: &ConversionOptions,
    ) -> Result<usize>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait Target: Send + Sync {
    async fn build(&self) -> Result<TargetReport>;

    fn name(&self) -> &str;
}
