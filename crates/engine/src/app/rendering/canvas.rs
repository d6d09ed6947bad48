use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::sync::{
    Drawable, DrawableHandle, EntityKey, GeometryKind, Paint, Position, Primitive, RenderRecord,
    SceneAdapter, SceneMirror, Shape, Stroke,
};

/// Matches the original canvas background.
const BACKGROUND_COLOR: [u8; 4] = [255, 255, 255, 255];
/// Sampling step when stamping segments, in canvas units.
const SEGMENT_STEP: f64 = 0.5;
const MIN_STROKE_HALF_WIDTH: f64 = 0.5;

/// Attach-ordered handle lists, one layer per geometry kind. Draw order is
/// rectangles, circles, lines, points, bottom to top.
#[derive(Debug, Default)]
pub(crate) struct SceneLayers {
    rectangles: Vec<EntityKey>,
    circles: Vec<EntityKey>,
    lines: Vec<EntityKey>,
    points: Vec<EntityKey>,
}

impl SceneLayers {
    pub(crate) fn attach(&mut self, handle: DrawableHandle) {
        let layer = self.layer_mut(handle.kind);
        if !layer.contains(&handle.key) {
            layer.push(handle.key);
        }
    }

    pub(crate) fn detach(&mut self, handle: DrawableHandle) {
        self.layer_mut(handle.kind).retain(|key| *key != handle.key);
    }

    fn layer_mut(&mut self, kind: GeometryKind) -> &mut Vec<EntityKey> {
        match kind {
            GeometryKind::Rectangle => &mut self.rectangles,
            GeometryKind::Circle => &mut self.circles,
            GeometryKind::Line => &mut self.lines,
            GeometryKind::Point => &mut self.points,
        }
    }

    fn draw_order(&self) -> impl Iterator<Item = (GeometryKind, &EntityKey)> {
        let rectangles = self
            .rectangles
            .iter()
            .map(|key| (GeometryKind::Rectangle, key));
        let circles = self.circles.iter().map(|key| (GeometryKind::Circle, key));
        let lines = self.lines.iter().map(|key| (GeometryKind::Line, key));
        let points = self.points.iter().map(|key| (GeometryKind::Point, key));
        rectangles.chain(circles).chain(lines).chain(points)
    }
}

/// Software canvas over a `pixels` framebuffer. Implements the scene
/// adapter: the reconciler notifies attach/detach, and each frame this
/// renderer re-reads current drawables from the mirror.
pub struct CanvasRenderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    layers: SceneLayers,
}

impl CanvasRenderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
            layers: SceneLayers::default(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(&mut self, mirror: &SceneMirror) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&BACKGROUND_COLOR);
        }

        for (kind, key) in self.layers.draw_order() {
            if let Some(drawable) = lookup_drawable(mirror, kind, key) {
                draw_drawable(frame, self.width, self.height, drawable);
            }
        }

        self.pixels.render()
    }
}

impl SceneAdapter for CanvasRenderer {
    fn attach(&mut self, handle: DrawableHandle) {
        self.layers.attach(handle);
    }

    fn detach(&mut self, handle: DrawableHandle) {
        self.layers.detach(handle);
    }
}

fn lookup_drawable<'m>(
    mirror: &'m SceneMirror,
    kind: GeometryKind,
    key: &EntityKey,
) -> Option<&'m Drawable> {
    match kind {
        GeometryKind::Point => mirror.points().get(key).map(RenderRecord::drawable),
        GeometryKind::Line => mirror.lines().get(key).map(RenderRecord::drawable),
        GeometryKind::Circle => mirror.circles().get(key).map(RenderRecord::drawable),
        GeometryKind::Rectangle => mirror.rectangles().get(key).map(RenderRecord::drawable),
    }
}

fn draw_drawable(frame: &mut [u8], width: u32, height: u32, drawable: &Drawable) {
    for primitive in drawable.primitives() {
        draw_primitive(frame, width, height, primitive);
    }
}

fn draw_primitive(frame: &mut [u8], width: u32, height: u32, primitive: &Primitive) {
    match primitive.shape {
        Shape::Disc { center, radius } => {
            if let Some(fill) = primitive.fill {
                fill_disc(frame, width, height, center, radius, fill);
            }
            if let Some(stroke) = primitive.stroke {
                stroke_ring(frame, width, height, center, radius, stroke);
            }
        }
        Shape::Segment { from, to } => {
            if let Some(stroke) = primitive.stroke {
                draw_segment(frame, width, height, from, to, stroke);
            }
        }
        Shape::Rect { min, max } => {
            if let Some(fill) = primitive.fill {
                fill_rect(frame, width, height, min, max, fill);
            }
            if let Some(stroke) = primitive.stroke {
                stroke_rect(frame, width, height, min, max, stroke);
            }
        }
    }
}

fn unpack_rgb(color: u32) -> [u8; 3] {
    [
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    ]
}

fn blend_pixel(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, paint: Paint) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let alpha = paint.alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(pixel) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    let src = unpack_rgb(paint.color);
    for channel in 0..3 {
        let dst = f64::from(pixel[channel]);
        pixel[channel] = (f64::from(src[channel]) * alpha + dst * (1.0 - alpha)).round() as u8;
    }
    pixel[3] = 255;
}

fn fill_disc(frame: &mut [u8], width: u32, height: u32, center: Position, radius: f64, fill: Paint) {
    if radius <= 0.0 {
        return;
    }
    let r_squared = radius * radius;
    let min_x = (center.x - radius).floor() as i32;
    let max_x = (center.x + radius).ceil() as i32;
    let min_y = (center.y - radius).floor() as i32;
    let max_y = (center.y + radius).ceil() as i32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - center.x;
            let dy = f64::from(y) - center.y;
            if dx * dx + dy * dy <= r_squared {
                blend_pixel(frame, width, height, x, y, fill);
            }
        }
    }
}

fn stroke_ring(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: Position,
    radius: f64,
    stroke: Stroke,
) {
    if radius <= 0.0 || stroke.width <= 0.0 {
        return;
    }
    let half = (stroke.width / 2.0).max(MIN_STROKE_HALF_WIDTH);
    let outer = radius + half;
    let paint = Paint {
        color: stroke.color,
        alpha: stroke.alpha,
    };
    let min_x = (center.x - outer).floor() as i32;
    let max_x = (center.x + outer).ceil() as i32;
    let min_y = (center.y - outer).floor() as i32;
    let max_y = (center.y + outer).ceil() as i32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - center.x;
            let dy = f64::from(y) - center.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance - radius).abs() <= half {
                blend_pixel(frame, width, height, x, y, paint);
            }
        }
    }
}

fn draw_segment(
    frame: &mut [u8],
    width: u32,
    height: u32,
    from: Position,
    to: Position,
    stroke: Stroke,
) {
    if stroke.width <= 0.0 {
        return;
    }
    let half = (stroke.width / 2.0).max(MIN_STROKE_HALF_WIDTH);
    let paint = Paint {
        color: stroke.color,
        alpha: stroke.alpha,
    };
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = (dx * dx + dy * dy).sqrt();
    let steps = (length / SEGMENT_STEP).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        let stamp = Position {
            x: from.x + dx * t,
            y: from.y + dy * t,
        };
        stamp_dot(frame, width, height, stamp, half, paint);
    }
}

fn stamp_dot(frame: &mut [u8], width: u32, height: u32, center: Position, half: f64, paint: Paint) {
    let min_x = (center.x - half).floor() as i32;
    let max_x = (center.x + half).ceil() as i32;
    let min_y = (center.y - half).floor() as i32;
    let max_y = (center.y + half).ceil() as i32;
    let r_squared = half * half;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - center.x;
            let dy = f64::from(y) - center.y;
            if dx * dx + dy * dy <= r_squared {
                blend_pixel(frame, width, height, x, y, paint);
            }
        }
    }
}

fn fill_rect(frame: &mut [u8], width: u32, height: u32, min: Position, max: Position, fill: Paint) {
    let (left, right) = ordered(min.x, max.x);
    let (top, bottom) = ordered(min.y, max.y);
    for y in top.round() as i32..=bottom.round() as i32 {
        for x in left.round() as i32..=right.round() as i32 {
            blend_pixel(frame, width, height, x, y, fill);
        }
    }
}

fn stroke_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    min: Position,
    max: Position,
    stroke: Stroke,
) {
    let (left, right) = ordered(min.x, max.x);
    let (top, bottom) = ordered(min.y, max.y);
    let corners = [
        Position { x: left, y: top },
        Position { x: right, y: top },
        Position {
            x: right,
            y: bottom,
        },
        Position { x: left, y: bottom },
    ];
    for index in 0..4 {
        draw_segment(
            frame,
            width,
            height,
            corners[index],
            corners[(index + 1) % 4],
            stroke,
        );
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(width: u32, height: u32) -> Vec<u8> {
        let mut frame = vec![0u8; (width * height * 4) as usize];
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&BACKGROUND_COLOR);
        }
        frame
    }

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn unpack_rgb_splits_packed_channels() {
        assert_eq!(unpack_rgb(0xff00ff), [255, 0, 255]);
        assert_eq!(unpack_rgb(0x123456), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn opaque_blend_replaces_destination() {
        let mut frame = blank_frame(4, 4);
        blend_pixel(
            &mut frame,
            4,
            4,
            1,
            1,
            Paint {
                color: 0x102030,
                alpha: 1.0,
            },
        );
        assert_eq!(pixel(&frame, 4, 1, 1), [0x10, 0x20, 0x30, 255]);
    }

    #[test]
    fn zero_alpha_blend_leaves_destination() {
        let mut frame = blank_frame(4, 4);
        blend_pixel(
            &mut frame,
            4,
            4,
            1,
            1,
            Paint {
                color: 0x000000,
                alpha: 0.0,
            },
        );
        assert_eq!(pixel(&frame, 4, 1, 1), BACKGROUND_COLOR);
    }

    #[test]
    fn half_alpha_blend_mixes_toward_source() {
        let mut frame = blank_frame(4, 4);
        blend_pixel(
            &mut frame,
            4,
            4,
            0,
            0,
            Paint {
                color: 0x000000,
                alpha: 0.5,
            },
        );
        let [r, g, b, a] = pixel(&frame, 4, 0, 0);
        assert_eq!((r, g, b, a), (128, 128, 128, 255));
    }

    #[test]
    fn out_of_bounds_blend_is_clipped() {
        let mut frame = blank_frame(4, 4);
        let paint = Paint {
            color: 0x000000,
            alpha: 1.0,
        };
        blend_pixel(&mut frame, 4, 4, -1, 0, paint);
        blend_pixel(&mut frame, 4, 4, 0, -1, paint);
        blend_pixel(&mut frame, 4, 4, 4, 0, paint);
        blend_pixel(&mut frame, 4, 4, 0, 4, paint);
        assert!(frame
            .chunks_exact(4)
            .all(|chunk| chunk == BACKGROUND_COLOR));
    }

    #[test]
    fn fill_disc_paints_center_not_far_corner() {
        let mut frame = blank_frame(16, 16);
        fill_disc(
            &mut frame,
            16,
            16,
            Position { x: 8.0, y: 8.0 },
            3.0,
            Paint {
                color: 0xff0000,
                alpha: 1.0,
            },
        );
        assert_eq!(pixel(&frame, 16, 8, 8), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 16, 0, 0), BACKGROUND_COLOR);
    }

    #[test]
    fn fill_rect_normalizes_swapped_corners() {
        let mut frame = blank_frame(8, 8);
        fill_rect(
            &mut frame,
            8,
            8,
            Position { x: 5.0, y: 5.0 },
            Position { x: 2.0, y: 2.0 },
            Paint {
                color: 0x00ff00,
                alpha: 1.0,
            },
        );
        assert_eq!(pixel(&frame, 8, 3, 3), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 8, 7, 7), BACKGROUND_COLOR);
    }

    #[test]
    fn horizontal_segment_covers_its_span() {
        let mut frame = blank_frame(16, 8);
        draw_segment(
            &mut frame,
            16,
            8,
            Position { x: 2.0, y: 4.0 },
            Position { x: 12.0, y: 4.0 },
            Stroke {
                color: 0x0000ff,
                alpha: 1.0,
                width: 1.0,
            },
        );
        for x in 2..=12 {
            assert_eq!(pixel(&frame, 16, x, 4), [0, 0, 255, 255], "x = {x}");
        }
        assert_eq!(pixel(&frame, 16, 0, 0), BACKGROUND_COLOR);
    }

    #[test]
    fn layers_attach_once_and_detach_by_key() {
        let mut layers = SceneLayers::default();
        let handle = DrawableHandle::new(GeometryKind::Point, EntityKey::from("a"));
        layers.attach(handle.clone());
        layers.attach(handle.clone());
        assert_eq!(layers.draw_order().count(), 1);

        layers.attach(DrawableHandle::new(GeometryKind::Line, EntityKey::from("a")));
        assert_eq!(layers.draw_order().count(), 2);

        layers.detach(handle);
        assert_eq!(layers.draw_order().count(), 1);
    }

    #[test]
    fn draw_order_is_rectangles_circles_lines_points() {
        let mut layers = SceneLayers::default();
        layers.attach(DrawableHandle::new(GeometryKind::Point, "p".into()));
        layers.attach(DrawableHandle::new(GeometryKind::Rectangle, "r".into()));
        layers.attach(DrawableHandle::new(GeometryKind::Line, "l".into()));
        layers.attach(DrawableHandle::new(GeometryKind::Circle, "c".into()));

        let order: Vec<GeometryKind> = layers.draw_order().map(|(kind, _)| kind).collect();
        assert_eq!(
            order,
            vec![
                GeometryKind::Rectangle,
                GeometryKind::Circle,
                GeometryKind::Line,
                GeometryKind::Point,
            ]
        );
    }
}
