use crate::detection::domain::face_record::FaceRecord;
use crate::shared::frame::Frame;

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const MARKER_COLOR: [u8; 3] = [255, 0, 0];
const MARKER_RADIUS: i64 = 2;

/// Returns a copy of `frame` with a rectangle at each face's clamped bbox
/// and a small square marker at each landmark point.
///
/// Boxes extending past the frame are clipped; faces entirely outside it are
/// skipped. The input frame is never modified.
pub fn annotate(frame: &Frame, faces: &[FaceRecord]) -> Frame {
    let mut out = frame.clone();
    for face in faces {
        if let Some(rect) = face.bbox().clamped(out.width(), out.height()) {
            draw_rectangle(&mut out, rect.x, rect.y, rect.width, rect.height);
        }
        if let Some(landmarks) = face.landmarks() {
            for &(x, y) in landmarks {
                draw_marker(&mut out, x, y);
            }
        }
    }
    out
}

fn draw_rectangle(frame: &mut Frame, x: u32, y: u32, width: u32, height: u32) {
    let x2 = x + width - 1;
    let y2 = y + height - 1;
    for cx in x..=x2 {
        frame.put_pixel(cx, y, BOX_COLOR);
        frame.put_pixel(cx, y2, BOX_COLOR);
    }
    for cy in y..=y2 {
        frame.put_pixel(x, cy, BOX_COLOR);
        frame.put_pixel(x2, cy, BOX_COLOR);
    }
}

fn draw_marker(frame: &mut Frame, x: f32, y: f32) {
    let cx = x.round() as i64;
    let cy = y.round() as i64;
    for dy in -MARKER_RADIUS..=MARKER_RADIUS {
        for dx in -MARKER_RADIUS..=MARKER_RADIUS {
            let px = cx + dx;
            let py = cy + dy;
            if px >= 0 && py >= 0 {
                // put_pixel ignores coordinates past the right/bottom edges
                frame.put_pixel(px as u32, py as u32, MARKER_COLOR);
            }
        }
    }
}
