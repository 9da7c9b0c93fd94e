use crate::domain::model::ConversionOptions;
use crate::freepcb::exceptions::PatternList;
use crate::freepcb::kicad::{content_hash_time, footprint_sexp, PadRules};
use crate::freepcb::library::Library;
use crate::freepcb::threedmap::apply_3dmap_file;
use crate::utils::error::{PcbLibError, Result};
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// 讀取壓縮檔中的每個檔案並合併成一個函式庫
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<Library> {
    let mut archive = ZipArchive::new(reader)?;
    let mut library = Library::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| PcbLibError::conversion(format!("{}: {}", name, e)))?;
        library.merge(Library::from_text(&name, &text)?)?;
    }

    Ok(library)
}

pub fn read_files(paths: &[impl AsRef<Path>]) -> Result<Library> {
    let mut library = Library::default();
    for path in paths {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| PcbLibError::filesystem(path, e))?;
        library.merge(Library::from_text(&path.display().to_string(), &text)?)?;
    }
    Ok(library)
}

/// Post-process `library` and write one `.kicad_mod` per footprint into
/// `output_dir`, which must already exist. Returns the number written.
pub fn write_library(
    mut library: Library,
    output_dir: &Path,
    options: &ConversionOptions,
) -> Result<usize> {
    let rules = PadRules {
        rounding: options.rounding,
        pad_exceptions: PatternList::load(options.rounded_pad_exceptions.as_deref())?,
        center_exceptions: PatternList::load(options.rounded_center_exceptions.as_deref())?,
    };

    for (kind, list) in [("pad", &rules.pad_exceptions), ("center pad", &rules.center_exceptions)] {
        if !list.is_empty() {
            tracing::debug!("Loaded {} rounded {} exceptions", list.len(), kind);
        }
    }

    if options.strip_lmn {
        library.strip_lmn();
    }

    if let Some(map) = &options.threedmap {
        apply_3dmap_file(map, &mut library)?;
    }

    if let Some(clearance) = options.courtyard_mm {
        for footprint in &mut library.footprints {
            footprint.add_courtyard(clearance)?;
        }
    }

    let now = chrono::Utc::now().timestamp() as u32;
    for footprint in &mut library.footprints {
        footprint.tedit = if options.hash_time {
            content_hash_time(footprint, &rules)?
        } else {
            now
        };
    }

    tracing::info!(
        "🛠️ Generating KiCad library: {} footprints -> {}",
        library.footprints.len(),
        output_dir.display()
    );
    for footprint in &library.footprints {
        let path = output_dir.join(format!("{}.kicad_mod", footprint.name));
        let mut body = footprint_sexp(footprint, &rules)?.to_string();
        body.push('\n');
        std::fs::write(&path, body).map_err(|e| PcbLibError::filesystem(&path, e))?;
    }

    Ok(library.footprints.len())
}

pub fn convert_archive(archive: &Path, output_dir: &Path, options: &ConversionOptions) -> Result<usize> {
    tracing::info!("📦 Loading FreePCB library from {}", archive.display());
    let file = std::fs::File::open(archive).map_err(|e| PcbLibError::filesystem(archive, e))?;
    let library = read_archive(std::io::BufReader::new(file))?;
    write_library(library, output_dir, options)
}
