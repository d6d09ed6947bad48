use super::drawable::{
    selection_stroke, Drawable, Paint, Primitive, Shape, Stroke, SELECTION_COLOR,
    SELECTION_HALO_MARGIN,
};
use super::geometry::{
    CircleShape, CircleStyle, LineSegment, LineStyle, PointStyle, Position, RectShape,
    RectangleStyle,
};
use super::store::RenderRecord;

/// Point mirror record. The drawable is a filled disc with a border ring,
/// plus a halo ring when selected.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    position: Position,
    style: PointStyle,
    selected: bool,
    drawable: Drawable,
}

impl PointRecord {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    fn rebuild(&mut self) {
        self.drawable.clear();
        self.drawable.push(Primitive {
            shape: Shape::Disc {
                center: self.position,
                radius: (self.style.radius - self.style.border_width / 2.0).max(0.0),
            },
            fill: Some(Paint {
                color: self.style.color,
                alpha: self.style.alpha,
            }),
            stroke: Some(Stroke {
                color: self.style.border_color,
                alpha: self.style.border_alpha,
                width: self.style.border_width,
            }),
        });
        if self.selected {
            self.drawable.push(Primitive {
                shape: Shape::Disc {
                    center: self.position,
                    radius: self.style.radius
                        + self.style.border_width / 2.0
                        + SELECTION_HALO_MARGIN,
                },
                fill: None,
                stroke: Some(selection_stroke()),
            });
        }
    }
}

impl RenderRecord for PointRecord {
    type Geometry = Position;
    type Style = PointStyle;

    fn new(geometry: Position, style: PointStyle) -> Self {
        let mut record = Self {
            position: geometry,
            style,
            selected: false,
            drawable: Drawable::default(),
        };
        record.rebuild();
        record
    }

    fn set_geometry(&mut self, geometry: Position) {
        self.position = geometry;
        self.rebuild();
    }

    fn set_style(&mut self, style: PointStyle) {
        self.style = style;
        self.rebuild();
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        self.rebuild();
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}

/// Line mirror record. Selection swaps the stroke for the accent color.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    line: LineSegment,
    style: LineStyle,
    selected: bool,
    drawable: Drawable,
}

impl LineRecord {
    pub fn line(&self) -> LineSegment {
        self.line
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    fn rebuild(&mut self) {
        self.drawable.clear();
        let stroke = if self.selected {
            Stroke {
                color: SELECTION_COLOR,
                alpha: self.style.alpha,
                width: self.style.width,
            }
        } else {
            Stroke {
                color: self.style.color,
                alpha: self.style.alpha,
                width: self.style.width,
            }
        };
        self.drawable.push(Primitive {
            shape: Shape::Segment {
                from: self.line.from,
                to: self.line.to,
            },
            fill: None,
            stroke: Some(stroke),
        });
    }
}

impl RenderRecord for LineRecord {
    type Geometry = LineSegment;
    type Style = LineStyle;

    fn new(geometry: LineSegment, style: LineStyle) -> Self {
        let mut record = Self {
            line: geometry,
            style,
            selected: false,
            drawable: Drawable::default(),
        };
        record.rebuild();
        record
    }

    fn set_geometry(&mut self, geometry: LineSegment) {
        self.line = geometry;
        self.rebuild();
    }

    fn set_style(&mut self, style: LineStyle) {
        self.style = style;
        self.rebuild();
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        self.rebuild();
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleRecord {
    circle: CircleShape,
    style: CircleStyle,
    selected: bool,
    drawable: Drawable,
}

impl CircleRecord {
    pub fn circle(&self) -> CircleShape {
        self.circle
    }

    pub fn style(&self) -> &CircleStyle {
        &self.style
    }

    fn rebuild(&mut self) {
        self.drawable.clear();
        let border = if self.selected {
            Stroke {
                color: SELECTION_COLOR,
                alpha: self.style.border.alpha,
                width: self.style.border.width,
            }
        } else {
            Stroke {
                color: self.style.border.color,
                alpha: self.style.border.alpha,
                width: self.style.border.width,
            }
        };
        self.drawable.push(Primitive {
            shape: Shape::Disc {
                center: self.circle.center,
                radius: self.circle.radius,
            },
            fill: Some(Paint {
                color: self.style.fill,
                alpha: self.style.fill_alpha,
            }),
            stroke: Some(border),
        });
    }
}

impl RenderRecord for CircleRecord {
    type Geometry = CircleShape;
    type Style = CircleStyle;

    fn new(geometry: CircleShape, style: CircleStyle) -> Self {
        let mut record = Self {
            circle: geometry,
            style,
            selected: false,
            drawable: Drawable::default(),
        };
        record.rebuild();
        record
    }

    fn set_geometry(&mut self, geometry: CircleShape) {
        self.circle = geometry;
        self.rebuild();
    }

    fn set_style(&mut self, style: CircleStyle) {
        self.style = style;
        self.rebuild();
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        self.rebuild();
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}

/// Rectangle mirror record. Corner ordering is the producer's business; the
/// drawable mirrors whatever corners arrive.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleRecord {
    rect: RectShape,
    style: RectangleStyle,
    selected: bool,
    drawable: Drawable,
}

impl RectangleRecord {
    pub fn rect(&self) -> RectShape {
        self.rect
    }

    pub fn style(&self) -> &RectangleStyle {
        &self.style
    }

    fn rebuild(&mut self) {
        self.drawable.clear();
        let border = if self.selected {
            Stroke {
                color: SELECTION_COLOR,
                alpha: self.style.border.alpha,
                width: self.style.border.width,
            }
        } else {
            Stroke {
                color: self.style.border.color,
                alpha: self.style.border.alpha,
                width: self.style.border.width,
            }
        };
        self.drawable.push(Primitive {
            shape: Shape::Rect {
                min: self.rect.min_corner,
                max: self.rect.max_corner,
            },
            fill: Some(Paint {
                color: self.style.fill,
                alpha: self.style.fill_alpha,
            }),
            stroke: Some(border),
        });
    }
}

impl RenderRecord for RectangleRecord {
    type Geometry = RectShape;
    type Style = RectangleStyle;

    fn new(geometry: RectShape, style: RectangleStyle) -> Self {
        let mut record = Self {
            rect: geometry,
            style,
            selected: false,
            drawable: Drawable::default(),
        };
        record.rebuild();
        record
    }

    fn set_geometry(&mut self, geometry: RectShape) {
        self.rect = geometry;
        self.rebuild();
    }

    fn set_style(&mut self, style: RectangleStyle) {
        self.style = style;
        self.rebuild();
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        self.rebuild();
    }

    fn selected(&self) -> bool {
        self.selected
    }

    fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}
