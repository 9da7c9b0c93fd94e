use crate::domain::model::{ConversionOptions, RoundingMode};
use crate::domain::ports::Converter;
use crate::freepcb;
use crate::utils::error::{PcbLibError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 內建轉換器，直接在程式內產生 `.kicad_mod`
#[derive(Debug, Clone, Default)]
pub struct NativeConverter;

#[async_trait]
impl Converter for NativeConverter {
    async fn convert(
        &self,
        archive: &Path,
        output_dir: &Path,
        options: &ConversionOptions,
    ) -> Result<usize> {
        let archive = archive.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let options = options.clone();

        tokio::task::spawn_blocking(move || {
            freepcb::convert_archive(&archive, &output_dir, &options)
        })
        .await
        .map_err(|e| PcbLibError::conversion(format!("conversion task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "native"
    }
}

impl NativeConverter {
    /// Merge plain FreePCB files and write them into `output_dir`, creating it
    /// if needed. Runs on the blocking pool.
    pub async fn convert_files(
        inputs: Vec<PathBuf>,
        output_dir: PathBuf,
        options: ConversionOptions,
    ) -> Result<usize> {
        tokio::task::spawn_blocking(move || {
            let library = freepcb::read_files(inputs.as_slice())?;
            std::fs::create_dir_all(&output_dir)
                .map_err(|e| PcbLibError::filesystem(&output_dir, e))?;
            freepcb::write_library(library, &output_dir, &options)
        })
        .await
        .map_err(|e| PcbLibError::conversion(format!("conversion task failed: {}", e)))?
    }
}

/// Runs `<python> <script> ... <archive> <output> <fp2kicad>` and checks the
/// exit status.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    pub python: OsString,
    pub script: PathBuf,
    pub fp2kicad: PathBuf,
}

impl ExternalConverter {
    /// `PYTHON` in the environment takes precedence over `python`.
    pub fn new(python: impl Into<OsString>, script: PathBuf, fp2kicad: PathBuf) -> Self {
        let python = std::env::var_os("PYTHON").unwrap_or_else(|| python.into());
        Self {
            python,
            script,
            fp2kicad,
        }
    }

    pub fn build_args(
        &self,
        archive: &Path,
        output_dir: &Path,
        options: &ConversionOptions,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.script.clone().into()];
        args.push("--no-confirm-license".into());

        let files = [
            ("--3dmap", &options.threedmap),
            ("--rounded-pad-exceptions", &options.rounded_pad_exceptions),
            ("--rounded-center-exceptions", &options.rounded_center_exceptions),
        ];
        for (flag, path) in files {
            if let Some(path) = path {
                args.push(flag.into());
                args.push(path.clone().into());
            }
        }

        if let Some(clearance) = options.courtyard_mm {
            args.push("--add-courtyard".into());
            args.push(clearance.to_string().into());
        }

        match options.rounding {
            RoundingMode::None => {}
            RoundingMode::All => args.push("--rounded-pads".into()),
            RoundingMode::AllButPin1 => args.push("--rounded-except-1".into()),
        }

        if options.hash_time {
            args.push("--hash-time".into());
        }

        args.push(archive.into());
        args.push(output_dir.into());
        args.push(self.fp2kicad.clone().into());
        args
    }
}

#[async_trait]
impl Converter for ExternalConverter {
    async fn convert(
        &self,
        archive: &Path,
        output_dir: &Path,
        options: &ConversionOptions,
    ) -> Result<usize> {
        let args = self.build_args(archive, output_dir, options);
        let command_line = std::iter::once(&self.python)
            .chain(args.iter())
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!("▶️ Running {}", command_line);

        let status = tokio::process::Command::new(&self.python)
            .args(&args)
            .status()
            .await
            .map_err(|e| PcbLibError::conversion(format!("failed to start `{}`: {}", command_line, e)))?;

        if !status.success() {
            return Err(PcbLibError::ConverterExitError {
                command: command_line,
                status: status.to_string(),
            });
        }

        count_footprints(output_dir).await
    }

    fn name(&self) -> &str {
        "external"
    }
}

async fn count_footprints(output_dir: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(output_dir)
        .await
        .map_err(|e| PcbLibError::filesystem(output_dir, e))?;
    let mut count = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PcbLibError::filesystem(output_dir, e))?
    {
        if entry.path().extension().is_some_and(|ext| ext == "kicad_mod") {
            count += 1;
        }
    }
    Ok(count)
}
