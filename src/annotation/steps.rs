use ab_glyph::{Font, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
    draw_text_mut,
};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;

use crate::annotation::RenderContext;
use crate::annotation::geometry::{
    self, EyePoints, MARKER_LANDMARKS, face_label, label_baseline, landmark_points,
    pixelate_block_size,
};
use crate::models::{DetectionInstance, FaceRectangle, Point};

/// Radius of the nose and pupil markers, in pixels
pub const CIRCLE_RADIUS: i32 = 6;

/// Per-canvas drawing parameters, derived once from the canvas height.
pub struct StepContext<'a> {
    pub render: &'a RenderContext,
    pub font_size: f32,
    pub stroke_width: u32,
}

impl<'a> StepContext<'a> {
    pub fn for_canvas(render: &'a RenderContext, canvas: &RgbImage) -> Self {
        Self {
            render,
            font_size: geometry::label_font_size(canvas.height()),
            stroke_width: geometry::stroke_width(canvas.height()),
        }
    }
}

/// One way of drawing a detection onto the canvas.
///
/// Steps must skip an instance silently when the data they need is missing.
pub trait AnnotationStep: Send + Sync {
    fn apply(
        &self,
        canvas: &mut RgbImage,
        instance: &DetectionInstance,
        index: usize,
        context: &StepContext,
    );

    /// Human-readable name for this step (used in debug logs)
    fn name(&self) -> &str;
}

/// Rectangle outline plus a "Face #n" label under it
pub struct BoxLabelStep;

impl AnnotationStep for BoxLabelStep {
    fn apply(
        &self,
        canvas: &mut RgbImage,
        instance: &DetectionInstance,
        index: usize,
        context: &StepContext,
    ) {
        let color = context.render.colors().color_for_index(index);
        draw_thick_rect(canvas, &instance.rectangle, context.stroke_width, color);

        if context.font_size <= 0.0 {
            return;
        }
        let font = context.render.font();
        let scale = PxScale::from(context.font_size);
        let ascent = font.as_scaled(scale).ascent();
        let baseline = label_baseline(&instance.rectangle, context.font_size);
        let (x, y) = pixel(baseline.offset(0.0, -ascent as f64));
        draw_text_mut(canvas, color, x, y, scale, font, &face_label(index));
    }

    fn name(&self) -> &str {
        "Box And Label"
    }
}

/// Nose tip and pupil dots with a line between the mouth corners
pub struct LandmarkStep;

impl AnnotationStep for LandmarkStep {
    fn apply(
        &self,
        canvas: &mut RgbImage,
        instance: &DetectionInstance,
        index: usize,
        context: &StepContext,
    ) {
        let Some([nose, pupil_right, pupil_left, mouth_right, mouth_left]) =
            landmark_points(&MARKER_LANDMARKS, instance.landmarks.as_ref())
        else {
            return;
        };

        let color = context.render.colors().color_for_index(index);
        for p in [nose, pupil_right, pupil_left] {
            draw_filled_circle_mut(canvas, pixel(p), CIRCLE_RADIUS, color);
        }
        draw_thick_line(canvas, mouth_right, mouth_left, context.stroke_width, color);
    }

    fn name(&self) -> &str {
        "Landmark Markers"
    }
}

/// Opaque quadrilateral over both eyes
pub struct EyeMaskStep;

impl AnnotationStep for EyeMaskStep {
    fn apply(
        &self,
        canvas: &mut RgbImage,
        instance: &DetectionInstance,
        _index: usize,
        context: &StepContext,
    ) {
        let Some(eyes) = EyePoints::from_landmarks(instance.landmarks.as_ref()) else {
            return;
        };
        fill_polygon(canvas, &geometry::eye_mask(&eyes), context.render.mask_color());
    }

    fn name(&self) -> &str {
        "Eye Mask"
    }
}

/// Block pixelation of the face rectangle
pub struct PixelateStep;

impl AnnotationStep for PixelateStep {
    fn apply(
        &self,
        canvas: &mut RgbImage,
        instance: &DetectionInstance,
        _index: usize,
        _context: &StepContext,
    ) {
        let rect = &instance.rectangle;
        pixelate(canvas, rect, pixelate_block_size(rect.width));
    }

    fn name(&self) -> &str {
        "Pixelate"
    }
}

/// Drawing coordinates are kept within this distance of the origin.
const COORD_LIMIT: f64 = 1_048_576.0;

fn clamp_point(p: Point) -> Point {
    Point::new(
        p.x.clamp(-COORD_LIMIT, COORD_LIMIT),
        p.y.clamp(-COORD_LIMIT, COORD_LIMIT),
    )
}

fn pixel(p: Point) -> (i32, i32) {
    let p = clamp_point(p);
    (p.x.round() as i32, p.y.round() as i32)
}

/// Outline centered on the rectangle edges, `width` pixels thick.
fn draw_thick_rect(canvas: &mut RgbImage, rect: &FaceRectangle, width: u32, color: Rgb<u8>) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let half = width as i64 / 2;
    for i in 0..width as i64 {
        let grow = i - half;
        let (x0, y0) = (rect.left as i64 - grow, rect.top as i64 - grow);
        let (x1, y1) = (rect.left as i64 + rect.width as i64 + grow, rect.bottom() + grow);
        if x1 < x0 || y1 < y0 {
            continue;
        }
        // Edges off the canvas are parked one pixel outside it.
        let (x0, x1) = (x0.clamp(-1, cw), x1.clamp(-1, cw));
        let (y0, y1) = (y0.clamp(-1, ch), y1.clamp(-1, ch));
        let outline = Rect::at(x0 as i32, y0 as i32)
            .of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        draw_hollow_rect_mut(canvas, outline, color);
    }
}

fn draw_thick_line(canvas: &mut RgbImage, start: Point, end: Point, width: u32, color: Rgb<u8>) {
    let (start, end) = (clamp_point(start), clamp_point(end));
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        draw_filled_circle_mut(canvas, pixel(start), (width / 2) as i32, color);
        return;
    }

    let (nx, ny) = (-dy / len, dx / len);
    let half = width as f64 / 2.0;
    let mut offset = -half;
    while offset <= half {
        draw_line_segment_mut(
            canvas,
            ((start.x + nx * offset) as f32, (start.y + ny * offset) as f32),
            ((end.x + nx * offset) as f32, (end.y + ny * offset) as f32),
            color,
        );
        offset += 0.5;
    }
}

/// Fills a polygon given as an open path of sub-pixel points.
///
/// Points that round to the same pixel as their predecessor are merged; a
/// polygon left with fewer than three vertices is not drawn.
pub fn fill_polygon(canvas: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let (x, y) = pixel(*p);
        let next = PixelPoint::new(x, y);
        if poly.last() != Some(&next) {
            poly.push(next);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    draw_polygon_mut(canvas, &poly, color);
}

/// Replaces each `block`-sized cell of `rect` with its mean color.
///
/// Cells are aligned to the rectangle origin and clipped to the canvas.
pub fn pixelate(canvas: &mut RgbImage, rect: &FaceRectangle, block: u32) {
    let block = block.max(1) as i64;
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (left, top) = (rect.left as i64, rect.top as i64);
    let (right, bottom) = (
        (left + rect.width as i64).min(cw),
        (top + rect.height as i64).min(ch),
    );
    // First cell that reaches the canvas, keeping the rectangle-aligned grid.
    let first = |origin: i64| origin + (-origin).max(0) / block * block;

    let mut y = first(top);
    while y < bottom {
        let mut x = first(left);
        while x < right {
            let x0 = x.max(0);
            let y0 = y.max(0);
            let x1 = (x + block).min(right);
            let y1 = (y + block).min(bottom);
            if x0 < x1 && y0 < y1 {
                let cell = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
                let mean = mean_color(canvas, cell);
                for py in cell.1..cell.3 {
                    for px in cell.0..cell.2 {
                        canvas.put_pixel(px, py, mean);
                    }
                }
            }
            x += block;
        }
        y += block;
    }
}

fn mean_color(canvas: &RgbImage, (x0, y0, x1, y1): (u32, u32, u32, u32)) -> Rgb<u8> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            let p = canvas.get_pixel(x, y);
            for (acc, c) in sum.iter_mut().zip(p.0) {
                *acc += c as u64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return Rgb([0, 0, 0]);
    }
    Rgb(sum.map(|s| ((s + count / 2) / count) as u8))
}
