use glam::DVec2;

use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Stroke a closed ring of projected points
pub fn draw_ring(canvas: &mut BrailleCanvas, ring: &[DVec2]) {
    if ring.len() < 2 {
        return;
    }
    // Segments spanning most of the surface come from wrapped coordinates
    let max_span = canvas.pixel_width().max(canvas.pixel_height()) as f64 * 0.75;

    for pair in ring.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if (b - a).abs().max_element() > max_span {
            continue;
        }
        draw_line(
            canvas,
            a.x.round() as i32,
            a.y.round() as i32,
            b.x.round() as i32,
            b.y.round() as i32,
        );
    }
}

/// Scanline fill of a polygon (exterior plus holes, even-odd rule).
/// Only pixels on the `stride` lattice are set, which leaves a stippled
/// texture the outline layer stays readable over.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>], stride: usize) {
    let stride = stride.max(1);
    let height = canvas.pixel_height();
    let width = canvas.pixel_width() as i64;

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let first_row = min_y.floor().max(0.0) as usize;
    let last_row = (max_y.ceil().max(0.0) as usize).min(height.saturating_sub(1));

    let mut crossings: Vec<f64> = Vec::new();
    for row in (first_row..=last_row).filter(|r| r % stride == 0) {
        let scan_y = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            for pair in ring.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if (a.y <= scan_y) != (b.y <= scan_y) {
                    let t = (scan_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = (span[0].round() as i64).max(0);
            let end = (span[1].round() as i64).min(width - 1);
            for x in start..=end {
                if x as usize % stride == 0 {
                    canvas.set_pixel(x as usize, row);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
            DVec2::new(x0, y0),
        ]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        for x in 0..10 {
            assert!(canvas.is_set(x, 0));
        }
        assert!(!canvas.is_set(0, 1));
    }

    #[test]
    fn test_ring_is_closed() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_ring(&mut canvas, &square(1.0, 1.0, 6.0, 6.0));
        assert!(canvas.is_set(1, 1));
        assert!(canvas.is_set(6, 6));
        assert!(canvas.is_set(1, 6));
        assert!(!canvas.is_set(3, 3));
    }

    #[test]
    fn test_fill_respects_holes() {
        let mut canvas = BrailleCanvas::new(8, 4);
        let rings = vec![square(0.0, 0.0, 15.0, 15.0), square(5.0, 5.0, 10.0, 10.0)];
        fill_polygon(&mut canvas, &rings, 1);
        assert!(canvas.is_set(2, 2));
        assert!(canvas.is_set(12, 12));
        assert!(!canvas.is_set(7, 7));
    }

    #[test]
    fn test_fill_stride_stipples() {
        let mut canvas = BrailleCanvas::new(4, 2);
        fill_polygon(&mut canvas, &[square(0.0, 0.0, 7.0, 7.0)], 2);
        assert!(canvas.is_set(2, 2));
        assert!(!canvas.is_set(3, 2));
        assert!(!canvas.is_set(2, 3));
    }

    #[test]
    fn test_fill_clips_to_canvas() {
        let mut canvas = BrailleCanvas::new(2, 1);
        fill_polygon(&mut canvas, &[square(-10.0, -10.0, 50.0, 50.0)], 1);
        assert!(canvas.is_set(0, 0));
        assert!(canvas.is_set(3, 3));
    }
}
