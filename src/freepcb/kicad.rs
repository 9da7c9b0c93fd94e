use crate::domain::model::RoundingMode;
use crate::freepcb::exceptions::PatternList;
use crate::freepcb::library::{nm_to_mm, Footprint, Graphic, Pin, Polyline};
use crate::freepcb::sexp::{list, sym, text, Sexp};
use crate::utils::error::Result;
use sha2::{Digest, Sha256};

/// 決定 SMD 焊盤形狀的規則
#[derive(Debug, Clone, Default)]
pub struct PadRules {
    pub rounding: RoundingMode,
    pub pad_exceptions: PatternList,
    pub center_exceptions: PatternList,
}

impl PadRules {
    pub fn smd_shape(&self, pin: &Pin) -> &'static str {
        let can_round_pads = !self.pad_exceptions.matches(&pin.module_name);
        let can_round_center = !self.center_exceptions.matches(&pin.module_name);

        match self.rounding {
            RoundingMode::None => "rect",
            _ if !can_round_center && pin.is_centered() => "rect",
            RoundingMode::All if can_round_pads => "oval",
            RoundingMode::AllButPin1 if can_round_pads && pin.name != "1" => "oval",
            _ => "rect",
        }
    }
}

fn xy(x: f64, y: f64) -> [Sexp; 2] {
    [Sexp::Float(x), Sexp::Float(y)]
}

fn polyline_sexp(polyline: &Polyline) -> Vec<Sexp> {
    polyline
        .points
        .windows(2)
        .map(|seg| {
            let (start, end) = (seg[0], seg[1]);
            list(
                "fp_line",
                [
                    list("start", xy(nm_to_mm(start.0), nm_to_mm(-start.1))),
                    list("end", xy(nm_to_mm(end.0), nm_to_mm(-end.1))),
                    list("layer", [text(&polyline.layer)]),
                    list("width", [Sexp::Float(polyline.width_mm)]),
                ],
            )
        })
        .collect()
}

fn pin_sexp(pin: &Pin, rules: &PadRules) -> Result<Sexp> {
    let (sx, sy) = pin.pad_size()?;
    let at = list("at", xy(nm_to_mm(pin.x as f64), -nm_to_mm(pin.y as f64)));
    let size = list("size", xy(nm_to_mm(sy), nm_to_mm(sx)));

    let node = if pin.drill == 0 {
        list(
            "pad",
            [
                text(&pin.name),
                sym("smd"),
                sym(rules.smd_shape(pin)),
                at,
                size,
                list("layers", [text("F.Cu"), text("F.Paste"), text("F.Mask")]),
            ],
        )
    } else {
        let shape = if pin.name == "1" { "rect" } else { "circle" };
        list(
            "pad",
            [
                text(&pin.name),
                sym("thru_hole"),
                sym(shape),
                at,
                size,
                list("drill", [Sexp::Float(nm_to_mm(pin.drill as f64))]),
                list("layers", [text("*.Cu"), text("*.Mask")]),
            ],
        )
    };
    Ok(node)
}

fn font(size: f64, thickness: f64) -> Sexp {
    list(
        "effects",
        [list(
            "font",
            [
                list("size", xy(size, size)),
                list("thickness", [Sexp::Float(thickness)]),
            ],
        )],
    )
}

/// 產生單一 footprint 的 `(module ...)` 節點
pub fn footprint_sexp(footprint: &Footprint, rules: &PadRules) -> Result<Sexp> {
    let mut nodes = vec![
        sym("module"),
        text(&footprint.name),
        list("layer", [text("F.Cu")]),
        list("tedit", [text(&format!("{:08X}", footprint.tedit))]),
        list("descr", [text(&footprint.description)]),
        list("attr", [sym("smd")]),
        list(
            "fp_text",
            [
                sym("reference"),
                text("REF**"),
                list("at", [Sexp::Int(0), Sexp::Int(0)]),
                list("layer", [text("F.SilkS")]),
                font(0.8, 0.15),
            ],
        ),
        list(
            "fp_text",
            [
                sym("value"),
                text(&footprint.name),
                list("at", [Sexp::Int(0), Sexp::Int(0)]),
                list("layer", [text("F.Fab")]),
                font(0.5, 0.1),
            ],
        ),
    ];

    for polyline in footprint.polylines() {
        nodes.extend(polyline_sexp(polyline));
    }
    for graphic in &footprint.graphics {
        if let Graphic::Pin(pin) = graphic {
            nodes.push(pin_sexp(pin, rules)?);
        }
    }

    let model = &footprint.model3d;
    if let Some(name) = &model.name {
        let xyz = |v: &[f64; 3]| list("xyz", v.iter().map(|&f| Sexp::Float(f)));
        nodes.push(list(
            "model",
            [
                text(name),
                list("at", [xyz(&model.offset)]),
                list("scale", [xyz(&model.scale)]),
                list("rotate", [xyz(&model.rotate)]),
            ],
        ));
    }

    Ok(Sexp::List(nodes))
}

/// Edit time derived from the footprint contents rendered with `tedit = 0`.
pub fn content_hash_time(footprint: &Footprint, rules: &PadRules) -> Result<u32> {
    let mut zeroed = footprint.clone();
    zeroed.tedit = 0;
    let rendered = footprint_sexp(&zeroed, rules)?.to_string();
    let digest = Sha256::digest(rendered.as_bytes());
    Ok(u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]))
}
