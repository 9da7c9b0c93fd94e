use crate::freepcb::reader::{parse_string, FreePcbReader};
use crate::utils::error::{PcbLibError, Result};

/// FreePCB 的長度單位是整數奈米
pub fn nm_to_mm(n: f64) -> f64 {
    n / 1_000_000.0
}

pub fn mm_to_nm(n: f64) -> f64 {
    n * 1_000_000.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub shape: i64,
    pub width: i64,
    pub len1: i64,
    pub len2: i64,
    pub corner_radius: i64,
}

impl Pad {
    fn parse(reader: &FreePcbReader, value: &str) -> Result<Self> {
        let numbers = parse_integers(value)
            .filter(|v| v.len() == 4 || v.len() == 5)
            .ok_or_else(|| reader.error("must contain a list of four or five integers"))?;

        Ok(Self {
            shape: numbers[0],
            width: numbers[1],
            len1: numbers[2],
            len2: numbers[3],
            corner_radius: numbers.get(4).copied().unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f64, f64)>,
    pub layer: String,
    pub width_mm: f64,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>, layer: &str, width_mm: f64) -> Self {
        Self {
            points,
            layer: layer.to_string(),
            width_mm,
        }
    }

    fn parse(reader: &mut FreePcbReader) -> Result<Self> {
        let (_, value) = reader.next_entry(false)?;
        let first = parse_integers(&value)
            .filter(|v| v.len() == 3)
            .ok_or_else(|| reader.error("must contain a list of three integers"))?;

        // FreePCB 的線寬不使用，一律輸出 0.15mm
        let mut polyline = Polyline::new(vec![(first[1] as f64, first[2] as f64)], "F.SilkS", 0.15);

        while reader.peek_key() == Some("next_corner") {
            let (_, value) = reader.next_entry(false)?;
            let corner = parse_integers(&value)
                .filter(|v| v.len() == 3)
                .ok_or_else(|| reader.error("must contain a list of three integers"))?;
            polyline.points.push((corner[0] as f64, corner[1] as f64));
        }

        if reader.peek_key() == Some("close_polyline") {
            reader.next_entry(true)?;
            let first = polyline.points[0];
            polyline.points.push(first);
        }

        Ok(polyline)
    }

    /// (left, right, top, bottom), FreePCB orientation (Y up)
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let xs = self.points.iter().map(|p| p.0);
        let ys = self.points.iter().map(|p| p.1);
        (
            xs.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.clone().fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::INFINITY, f64::min),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub name: String,
    /// Footprint name as read from the file, before any L/M/N stripping.
    pub module_name: String,
    pub drill: i64,
    pub x: i64,
    pub y: i64,
    pub angle: i64,
    pub top_pad: Option<Pad>,
    pub inner_pad: Option<Pad>,
    pub bottom_pad: Option<Pad>,
}

impl Pin {
    fn parse(reader: &mut FreePcbReader, module_name: &str) -> Result<Self> {
        let (_, value) = reader.next_entry(false)?;
        let (name, consumed) = parse_string(&value);
        let rest = value.get(consumed.min(value.len())..).unwrap_or("");
        let numbers = parse_integers(rest)
            .filter(|v| v.len() == 4)
            .ok_or_else(|| reader.error("must contain a list of four integers"))?;

        let mut pin = Pin {
            name,
            module_name: module_name.to_string(),
            drill: numbers[0],
            x: numbers[1],
            y: numbers[2],
            angle: numbers[3],
            top_pad: None,
            inner_pad: None,
            bottom_pad: None,
        };

        while reader.peek_key().is_some_and(|k| k.ends_with("_pad")) {
            let (key, value) = reader.next_entry(false)?;
            let pad = Pad::parse(reader, &value)?;
            match key.as_str() {
                "top_pad" => pin.top_pad = Some(pad),
                "inner_pad" => pin.inner_pad = Some(pad),
                "bottom_pad" => pin.bottom_pad = Some(pad),
                other => return Err(reader.error(format!("Unexpected key \"{}\"", other))),
            }
        }

        Ok(pin)
    }

    /// Pad size along (x, y) in nm, after applying the pin rotation.
    pub fn pad_size(&self) -> Result<(f64, f64)> {
        let pad = self.top_pad.as_ref().ok_or_else(|| {
            PcbLibError::conversion(format!(
                "pin \"{}\" of {} has no top pad",
                self.name, self.module_name
            ))
        })?;
        let sx = pad.width as f64;
        let sy = (pad.len1 + pad.len2) as f64;
        match self.angle {
            0 => Ok((sx, sy)),
            90 => Ok((sy, sx)),
            other => Err(PcbLibError::conversion(format!(
                "pin \"{}\" of {} has unsupported angle {}",
                self.name, self.module_name, other
            ))),
        }
    }

    pub fn bounding_box(&self) -> Result<(f64, f64, f64, f64)> {
        let (sx, sy) = self.pad_size()?;
        let (x, y) = (self.x as f64, self.y as f64);
        Ok((x - sy / 2.0, x + sy / 2.0, y + sx / 2.0, y - sx / 2.0))
    }

    pub fn is_centered(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Graphic {
    Polyline(Polyline),
    Pin(Pin),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model3d {
    pub name: Option<String>,
    pub offset: [f64; 3],
    pub scale: [f64; 3],
    pub rotate: [f64; 3],
}

impl Default for Model3d {
    fn default() -> Self {
        Self {
            name: None,
            offset: [0.0; 3],
            scale: [1.0; 3],
            rotate: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub name: String,
    pub author: String,
    pub source: String,
    pub description: String,
    pub graphics: Vec<Graphic>,
    pub model3d: Model3d,
    pub tedit: u32,
}

impl Footprint {
    pub fn parse(reader: &mut FreePcbReader) -> Result<Self> {
        let mut footprint = Footprint {
            name: String::new(),
            author: String::new(),
            source: String::new(),
            description: String::new(),
            graphics: Vec::new(),
            model3d: Model3d::default(),
            tedit: 0,
        };

        while !reader.at_end() && reader.indent_level() == 0 {
            let (key, value) = reader.next_entry(false)?;
            match key.as_str() {
                "name" => footprint.name = value,
                "author" => footprint.author = value,
                "source" => footprint.source = value,
                "description" => footprint.description = value,
                other => return Err(reader.error(format!("Unexpected key \"{}\"", other))),
            }
        }

        for (field, value) in [
            ("name", &footprint.name),
            ("author", &footprint.author),
            ("source", &footprint.source),
        ] {
            if value.is_empty() {
                return Err(reader.error(format!("footprint is missing \"{}\"", field)));
            }
        }

        let mut units = None;
        let mut sel_rect = None;
        let mut ref_text = None;
        let mut centroid = "0 0 0 0".to_string();

        while !reader.at_end() && reader.indent_level() > 0 {
            let key = reader.peek_key().unwrap_or_default().to_string();
            match key.as_str() {
                "units" => units = Some(reader.next_entry(false)?.1),
                "sel_rect" => sel_rect = Some(reader.next_entry(false)?.1),
                "ref_text" => ref_text = Some(reader.next_entry(false)?.1),
                "value_text" => {
                    reader.next_entry(false)?;
                }
                "centroid" => centroid = reader.next_entry(false)?.1,
                "n_pins" => {
                    reader.next_entry(true)?;
                }
                "outline_polyline" => {
                    let polyline = Polyline::parse(reader)?;
                    footprint.graphics.push(Graphic::Polyline(polyline));
                }
                "pin" => {
                    let pin = Pin::parse(reader, &footprint.name)?;
                    footprint.graphics.push(Graphic::Pin(pin));
                }
                other => {
                    reader.next_entry(true)?;
                    return Err(reader.error(format!("Unexpected key \"{}\"", other)));
                }
            }
        }

        // 這些欄位本身用不到，只用來確認檔案格式沒有改變
        if units.as_deref() != Some("NM") {
            return Err(reader.error(format!("{}: units must be NM", footprint.name)));
        }
        if sel_rect.is_none() || ref_text.is_none() {
            return Err(reader.error(format!(
                "{}: sel_rect and ref_text are required",
                footprint.name
            )));
        }
        if centroid != "0 0 0 0" {
            return Err(reader.error(format!(
                "{}: unsupported centroid \"{}\"",
                footprint.name, centroid
            )));
        }

        Ok(footprint)
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.graphics.iter().filter_map(|g| match g {
            Graphic::Pin(pin) => Some(pin),
            Graphic::Polyline(_) => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
        self.graphics.iter().filter_map(|g| match g {
            Graphic::Polyline(polyline) => Some(polyline),
            Graphic::Pin(_) => None,
        })
    }

    pub fn strip_lmn(&mut self) {
        if self
            .name
            .chars()
            .last()
            .is_some_and(|c| "LMNlmn".contains(c))
        {
            self.name.pop();
        }
    }

    /// (left, right, top, bottom) over every polyline and pad, in nm.
    pub fn bounding_box(&self) -> Result<(f64, f64, f64, f64)> {
        let mut boxes = Vec::with_capacity(self.graphics.len());
        for graphic in &self.graphics {
            boxes.push(match graphic {
                Graphic::Polyline(p) => p.bounding_box(),
                Graphic::Pin(p) => p.bounding_box()?,
            });
        }
        if boxes.is_empty() {
            return Err(PcbLibError::conversion(format!(
                "{} has no graphics to bound",
                self.name
            )));
        }

        Ok(boxes.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, f64::INFINITY),
            |acc, b| (acc.0.min(b.0), acc.1.max(b.1), acc.2.max(b.2), acc.3.min(b.3)),
        ))
    }

    pub fn add_courtyard(&mut self, clearance_mm: f64) -> Result<()> {
        let (left, right, top, bottom) = self.bounding_box()?;
        let spacing = mm_to_nm(clearance_mm);
        let (left, right) = (left - spacing, right + spacing);
        let (top, bottom) = (top + spacing, bottom - spacing);

        let courtyard = Polyline {
            points: vec![(left, top), (right, top), (right, bottom), (left, bottom), (left, top)],
            layer: "F.CrtYd".to_string(),
            width_mm: 0.05,
        };
        self.graphics.push(Graphic::Polyline(courtyard));
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub footprints: Vec<Footprint>,
}

impl Library {
    pub fn parse(reader: &mut FreePcbReader) -> Result<Self> {
        let mut footprints = Vec::new();
        while !reader.at_end() {
            footprints.push(Footprint::parse(reader)?);
        }
        tracing::debug!(
            "Parsed {} footprints from {}",
            footprints.len(),
            reader.source_name()
        );
        Ok(Self { footprints })
    }

    pub fn from_text(source_name: &str, text: &str) -> Result<Self> {
        let mut reader = FreePcbReader::new(source_name, text);
        Self::parse(&mut reader)
    }

    /// 合併另一個函式庫；名稱重複視為錯誤
    pub fn merge(&mut self, other: Library) -> Result<()> {
        for footprint in &other.footprints {
            if self.footprints.iter().any(|f| f.name == footprint.name) {
                return Err(PcbLibError::conversion(format!(
                    "Duplicate module name \"{}\"",
                    footprint.name
                )));
            }
        }
        self.footprints.extend(other.footprints);
        Ok(())
    }

    pub fn strip_lmn(&mut self) {
        for footprint in &mut self.footprints {
            footprint.strip_lmn();
        }
    }
}

fn parse_integers(value: &str) -> Option<Vec<i64>> {
    value
        .split_whitespace()
        .map(|s| s.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"name: "RESC1005X40N"
author: "Sample Author"
source: "IPC-7351"
description: "Chip resistor 0402"
  units: NM
  sel_rect: -1000000 -500000 1000000 500000
  ref_text: 1000000 0 0 0 100000
  value_text: 1000000 0 0 0 100000
  centroid: 0 0 0 0
  outline_polyline: 100000 -900000 450000
    next_corner: 900000 450000 0
    next_corner: 900000 -450000 0
    next_corner: -900000 -450000 0
    close_polyline: 1
  n_pins: 2
  pin: "1" 0 -450000 0 0
    top_pad: 1 600000 250000 250000
  pin: "2" 0 450000 0 0
    top_pad: 1 600000 250000 250000 0

name: "DIP8N"
author: "Sample Author"
source: "IPC-7351"
  units: NM
  sel_rect: 0 0 0 0
  ref_text: 0 0 0 0 0
  pin: 1 800000 -3810000 1270000 90
    top_pad: 2 1500000 750000 750000
  pin: 2 800000 -3810000 -1270000 90
    top_pad: 2 1500000 750000 750000
"#;

    #[test]
    fn test_parse_sample_library() {
        let library = Library::from_text("sample", SAMPLE).unwrap();
        assert_eq!(library.footprints.len(), 2);

        let chip = &library.footprints[0];
        assert_eq!(chip.name, "RESC1005X40N");
        assert_eq!(chip.description, "Chip resistor 0402");
        assert_eq!(chip.polylines().count(), 1);
        assert_eq!(chip.polylines().next().unwrap().points.len(), 5);

        let pins: Vec<&Pin> = chip.pins().collect();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].name, "1");
        assert_eq!(pins[0].x, -450000);
        assert_eq!(pins[1].top_pad.as_ref().unwrap().corner_radius, 0);

        let dip = &library.footprints[1];
        assert_eq!(dip.description, "");
        assert_eq!(dip.pins().next().unwrap().drill, 800000);
    }

    #[test]
    fn test_unexpected_header_key_reports_line() {
        let text = "name: X\ncolour: red\n";
        let err = Library::from_text("bad", text).unwrap_err();
        assert_eq!(err.to_string(), "bad: line 2: Unexpected key \"colour\"");
    }

    #[test]
    fn test_pin_requires_four_integers() {
        let text = "name: X\nauthor: a\nsource: s\n  units: NM\n  pin: \"1\" 0 0 0\n";
        let err = Library::from_text("bad", text).unwrap_err();
        assert!(err.to_string().contains("line 5"));
        assert!(err.to_string().contains("four integers"));
    }

    #[test]
    fn test_units_must_be_nm() {
        let text = "name: X\nauthor: a\nsource: s\n  units: MIL\n  sel_rect: 0\n  ref_text: 0\n";
        assert!(Library::from_text("bad", text).is_err());
    }

    #[test]
    fn test_merge_rejects_duplicates() {
        let mut library = Library::from_text("a", SAMPLE).unwrap();
        let again = Library::from_text("b", SAMPLE).unwrap();
        let err = library.merge(again).unwrap_err();
        assert!(err.to_string().contains("Duplicate module name \"RESC1005X40N\""));
    }

    #[test]
    fn test_strip_lmn_keeps_module_name_on_pins() {
        let mut library = Library::from_text("a", SAMPLE).unwrap();
        library.strip_lmn();
        assert_eq!(library.footprints[0].name, "RESC1005X40");
        assert_eq!(library.footprints[1].name, "DIP8");
        assert_eq!(library.footprints[0].pins().next().unwrap().module_name, "RESC1005X40N");
    }

    #[test]
    fn test_pin_rotation_swaps_pad_size() {
        let library = Library::from_text("a", SAMPLE).unwrap();
        let pin = library.footprints[1].pins().next().unwrap();
        assert_eq!(pin.pad_size().unwrap(), (1_500_000.0, 1_500_000.0));

        let chip_pin = library.footprints[0].pins().next().unwrap();
        assert_eq!(chip_pin.pad_size().unwrap(), (600_000.0, 500_000.0));
        assert_eq!(
            chip_pin.bounding_box().unwrap(),
            (-700_000.0, -200_000.0, 300_000.0, -300_000.0)
        );
    }

    #[test]
    fn test_courtyard_grows_bounding_box() {
        let mut library = Library::from_text("a", SAMPLE).unwrap();
        let chip = &mut library.footprints[0];
        chip.add_courtyard(0.25).unwrap();

        let courtyard = chip.polylines().last().unwrap();
        assert_eq!(courtyard.layer, "F.CrtYd");
        assert_eq!(courtyard.width_mm, 0.05);
        assert_eq!(courtyard.points[0], (-1_150_000.0, 700_000.0));
        assert_eq!(courtyard.points[2], (1_150_000.0, -700_000.0));
    }
}
