use crate::freepcb::library::Library;
use crate::freepcb::reader::FreePcbReader;
use crate::utils::error::{PcbLibError, Result};
use std::path::Path;

// 3D 對照檔格式：每行一組 "key: value"
//   mod: MODULE-NAME
//   3dmod: 3D-MODEL-NAME
//   rotx / roty / rotz   旋轉角度
//   scax / scay / scaz   縮放
//   offx / offy / offz   位移 (mm)
// 除了 mod 與 3dmod 以外都可省略。

fn axis_index(key: &str) -> Option<usize> {
    match key.as_bytes().get(3..) {
        Some(b"x") => Some(0),
        Some(b"y") => Some(1),
        Some(b"z") => Some(2),
        _ => None,
    }
}

/// Apply every mapping in `text` to the footprints of `library`.
pub fn apply_3dmap(text: &str, library: &mut Library) -> Result<usize> {
    let mut reader = FreePcbReader::new("3dmap", text);
    let mut current: Option<usize> = None;
    let mut mapped = 0;

    let map_error = |line: usize, message: String| PcbLibError::ThreeDMapError { line, message };

    while !reader.at_end() {
        let (key, value) = reader
            .next_entry(false)
            .map_err(|_| map_error(reader.line(), "expected value".to_string()))?;
        let line = reader.line();

        if key == "mod" {
            let index = library
                .footprints
                .iter()
                .position(|f| f.name == value)
                .ok_or_else(|| map_error(line, format!("couldn't find module \"{}\"", value)))?;
            current = Some(index);
            continue;
        }

        let index = current.ok_or_else(|| {
            map_error(line, "cannot specify parameters before module name".to_string())
        })?;
        let model = &mut library.footprints[index].model3d;

        if key == "3dmod" {
            model.name = Some(value);
            mapped += 1;
            continue;
        }

        let target = match key.get(..3) {
            Some("rot") => &mut model.rotate,
            Some("sca") => &mut model.scale,
            Some("off") => &mut model.offset,
            _ => return Err(map_error(line, format!("unknown key \"{}\"", key))),
        };
        let axis = axis_index(&key)
            .ok_or_else(|| map_error(line, format!("unknown key \"{}\"", key)))?;
        target[axis] = value
            .parse::<f64>()
            .map_err(|_| map_error(line, format!("\"{}\" is not a number", value)))?;
    }

    Ok(mapped)
}

pub fn apply_3dmap_file(path: &Path, library: &mut Library) -> Result<usize> {
    let text = std::fs::read_to_string(path).map_err(|e| PcbLibError::filesystem(path, e))?;
    let mapped = apply_3dmap(&text, library)?;
    tracing::debug!("Applied {} 3D models from {}", mapped, path.display());
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freepcb::library::tests::SAMPLE;

    #[test]
    fn test_apply_mapping() {
        let mut library = Library::from_text("sample", SAMPLE).unwrap();
        let map = "mod: DIP8N\n3dmod: dil/dil_8.wrl\nrotz: -90\n\nscax: 0.5\noffy: 1.25\n";
        assert_eq!(apply_3dmap(map, &mut library).unwrap(), 1);

        let model = &library.footprints[1].model3d;
        assert_eq!(model.name.as_deref(), Some("dil/dil_8.wrl"));
        assert_eq!(model.rotate, [0.0, 0.0, -90.0]);
        assert_eq!(model.scale, [0.5, 1.0, 1.0]);
        assert_eq!(model.offset, [0.0, 1.25, 0.0]);
        assert!(library.footprints[0].model3d.name.is_none());
    }

    #[test]
    fn test_unknown_module() {
        let mut library = Library::from_text("sample", SAMPLE).unwrap();
        let err = apply_3dmap("mod: SOIC8\n", &mut library).unwrap_err();
        assert_eq!(err.to_string(), "3D map (line 1): couldn't find module \"SOIC8\"");
    }

    #[test]
    fn test_parameter_before_module() {
        let mut library = Library::from_text("sample", SAMPLE).unwrap();
        let err = apply_3dmap("\n3dmod: x.wrl\n", &mut library).unwrap_err();
        assert_eq!(
            err.to_string(),
            "3D map (line 2): cannot specify parameters before module name"
        );
    }

    #[test]
    fn test_unknown_key() {
        let mut library = Library::from_text("sample", SAMPLE).unwrap();
        assert!(apply_3dmap("mod: DIP8N\nrotw: 1\n", &mut library).is_err());
        assert!(apply_3dmap("mod: DIP8N\ncolor: red\n", &mut library).is_err());
    }
}
