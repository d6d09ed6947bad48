use serde::{Deserialize, Serialize};

/// Canvas-space position, in the producer's coordinate units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: Position,
    pub to: Position,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    pub center: Position,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectShape {
    pub min_corner: Position,
    pub max_corner: Position,
}

/// Colors are packed `0xRRGGBB`; alphas are 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStyle {
    pub color: u32,
    pub alpha: f64,
    pub radius: f64,
    pub border_color: u32,
    pub border_alpha: f64,
    pub border_width: f64,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            color: 0x000000,
            alpha: 1.0,
            radius: 5.0,
            border_color: 0x000000,
            border_alpha: 1.0,
            border_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: u32,
    pub alpha: f64,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: 0x000000,
            alpha: 1.0,
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleStyle {
    pub fill: u32,
    pub fill_alpha: f64,
    pub border: LineStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleStyle {
    pub fill: u32,
    pub fill_alpha: f64,
    pub border: LineStyle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_style_wire_fields_are_camel_case() {
        let style = PointStyle {
            color: 0x112233,
            alpha: 0.5,
            radius: 4.0,
            border_color: 0x445566,
            border_alpha: 0.75,
            border_width: 2.0,
        };
        let value = serde_json::to_value(style).expect("serialize");

        assert_eq!(value["borderColor"], json!(0x445566));
        assert_eq!(value["borderAlpha"], json!(0.75));
        assert_eq!(value["borderWidth"], json!(2.0));
        assert!(value.get("border_color").is_none());
    }

    #[test]
    fn rect_shape_round_trips_through_wire_names() {
        let rect = RectShape {
            min_corner: Position { x: 1.0, y: 2.0 },
            max_corner: Position { x: 3.0, y: 4.0 },
        };
        let value = serde_json::to_value(rect).expect("serialize");
        assert!(value.get("minCorner").is_some());
        assert!(value.get("maxCorner").is_some());

        let decoded: RectShape = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, rect);
    }

    #[test]
    fn circle_style_nests_border_sub_style() {
        let value = json!({
            "fill": 0xff0000,
            "fillAlpha": 0.25,
            "border": { "color": 0x00ff00, "alpha": 1.0, "width": 3.0 },
        });
        let style: CircleStyle = serde_json::from_value(value).expect("deserialize");
        assert_eq!(style.border.color, 0x00ff00);
        assert_eq!(style.border.width, 3.0);
    }
}
