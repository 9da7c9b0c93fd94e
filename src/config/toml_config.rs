use crate::domain::model::{ConversionOptions, RoundingMode, Variant, VariantSource};
use crate::utils::error::{PcbLibError, Result};
use crate::utils::validation::{
    validate_clearance, validate_non_empty_string, validate_path, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "pcblib.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub ipc: IpcConfig,
    pub converter: ConverterConfig,
    pub models3d: Models3dConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    pub variants: Vec<Variant>,
    pub least: VariantOverride,
    pub most: VariantOverride,
    pub nominal: VariantOverride,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            variants: Variant::ALL.to_vec(),
            least: VariantOverride::default(),
            most: VariantOverride::default(),
            nominal: VariantOverride::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantOverride {
    pub url: Option<String>,
    pub archive: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterBackend {
    #[default]
    Native,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub backend: ConverterBackend,
    pub python: String,
    pub script: PathBuf,
    pub fp2kicad: PathBuf,
    pub confirm_license: bool,
    pub threedmap: Option<PathBuf>,
    pub rounded_pad_exceptions: Option<PathBuf>,
    pub rounded_center_exceptions: Option<PathBuf>,
    pub courtyard_mm: Option<f64>,
    pub rounding: RoundingMode,
    pub hash_time: bool,
    pub strip_lmn: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            backend: ConverterBackend::Native,
            python: "python".to_string(),
            script: PathBuf::from("download_ipc.py"),
            fp2kicad: PathBuf::from("freepcb2pretty.py"),
            confirm_license: false,
            threedmap: None,
            rounded_pad_exceptions: None,
            rounded_center_exceptions: None,
            courtyard_mm: Some(0.25),
            rounding: RoundingMode::AllButPin1,
            hash_time: true,
            strip_lmn: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Models3dConfig {
    pub index_url: String,
    pub url_base: String,
    pub output: PathBuf,
}

impl Default for Models3dConfig {
    fn default() -> Self {
        Self {
            index_url: "http://smisioto.no-ip.org/elettronica/kicad/kicad-en.htm".to_string(),
            url_base: "http://smisioto.no-ip.org".to_string(),
            output: PathBuf::from("3d"),
        }
    }
}

impl BuildConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PcbLibError::filesystem(path, e))?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| PcbLibError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${FREEPCB_MIRROR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|source| PcbLibError::PatternError {
            file: "env substitution".to_string(),
            source,
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn variant_override(&self, variant: Variant) -> &VariantOverride {
        match variant {
            Variant::Least => &self.ipc.least,
            Variant::Most => &self.ipc.most,
            Variant::Nominal => &self.ipc.nominal,
        }
    }

    pub fn variant_source(&self, variant: Variant) -> VariantSource {
        let defaults = VariantSource::with_defaults(variant);
        let overrides = self.variant_override(variant);
        VariantSource {
            variant,
            url: overrides.url.clone().unwrap_or(defaults.url),
            archive: overrides.archive.clone().unwrap_or(defaults.archive),
            output: overrides.output.clone().unwrap_or(defaults.output),
        }
    }

    pub fn variant_sources(&self) -> Vec<VariantSource> {
        self.ipc
            .variants
            .iter()
            .map(|v| self.variant_source(*v))
            .collect()
    }

    pub fn conversion_options(&self) -> ConversionOptions {
        let c = &self.converter;
        ConversionOptions {
            threedmap: c.threedmap.clone(),
            rounded_pad_exceptions: c.rounded_pad_exceptions.clone(),
            rounded_center_exceptions: c.rounded_center_exceptions.clone(),
            courtyard_mm: c.courtyard_mm,
            rounding: c.rounding,
            hash_time: c.hash_time,
            strip_lmn: c.strip_lmn,
            confirm_license: c.confirm_license,
        }
    }
}

impl Validate for BuildConfig {
    fn validate(&self) -> Result<()> {
        if self.ipc.variants.is_empty() {
            return Err(PcbLibError::InvalidConfigValueError {
                field: "ipc.variants".to_string(),
                value: "[]".to_string(),
                reason: "At least one variant is required".to_string(),
            });
        }

        for source in self.variant_sources() {
            let prefix = format!("ipc.{}", source.variant);
            validate_url(&format!("{}.url", prefix), &source.url)?;
            validate_path(&format!("{}.archive", prefix), &source.archive.to_string_lossy())?;
            validate_path(&format!("{}.output", prefix), &source.output.to_string_lossy())?;
        }

        let c = &self.converter;
        if let Some(clearance) = c.courtyard_mm {
            validate_clearance("converter.courtyard_mm", clearance)?;
        }
        for (field, path) in [
            ("converter.threedmap", &c.threedmap),
            ("converter.rounded_pad_exceptions", &c.rounded_pad_exceptions),
            ("converter.rounded_center_exceptions", &c.rounded_center_exceptions),
        ] {
            if let Some(path) = path {
                validate_path(field, &path.to_string_lossy())?;
            }
        }
        if c.backend == ConverterBackend::External {
            validate_non_empty_string("converter.python", &c.python)?;
            validate_path("converter.script", &c.script.to_string_lossy())?;
            validate_path("converter.fp2kicad", &c.fp2kicad.to_string_lossy())?;
        }

        validate_url("models3d.index_url", &self.models3d.index_url)?;
        validate_url("models3d.url_base", &self.models3d.url_base)?;
        validate_path("models3d.output", &self.models3d.output.to_string_lossy())?;

        Ok(())
    }
}
