use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let Some((x0, y0, x1, y1)) = clip_segment(canvas, (x0, y0), (x1, y1)) else {
        return;
    };

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

/// Liang-Barsky clip against the canvas (one pixel margin). Close zooms
/// project region edges far off screen, and walking those pixel by pixel
/// would stall a frame.
fn clip_segment(canvas: &BrailleCanvas, p0: (i32, i32), p1: (i32, i32)) -> Option<(i32, i32, i32, i32)> {
    let (x0, y0) = (p0.0 as f64, p0.1 as f64);
    let (dx, dy) = (p1.0 as f64 - x0, p1.1 as f64 - y0);
    let (xmin, ymin) = (-1.0, -1.0);
    let (xmax, ymax) = (canvas.pixel_width() as f64, canvas.pixel_height() as f64);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0 - xmin), (dx, xmax - x0), (-dy, y0 - ymin), (dy, ymax - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (x0 + t0 * dx).round() as i32,
        (y0 + t0 * dy).round() as i32,
        (x0 + t1 * dx).round() as i32,
        (y0 + t1 * dy).round() as i32,
    ))
}

/// Outline a closed ring of projected points
pub fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)]) {
    for pair in ring.windows(2) {
        draw_line(canvas, pair[0].0, pair[0].1, pair[1].0, pair[1].1);
    }
}

/// Scanline fill with the even-odd rule, so interior rings punch holes
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>]) {
    let Some((min_y, max_y)) = rings
        .iter()
        .flatten()
        .fold(None, |acc: Option<(i32, i32)>, &(_, y)| match acc {
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            None => Some((y, y)),
        })
    else {
        return;
    };
    let min_y = min_y.max(0);
    let max_y = max_y.min(canvas.pixel_height() as i32 - 1);

    let mut crossings: Vec<f64> = Vec::new();
    for y in min_y..=max_y {
        let scan = y as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            for pair in ring.windows(2) {
                let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
                let (ay, by) = (ay as f64, by as f64);
                if (ay <= scan) != (by <= scan) {
                    let t = (scan - ay) / (by - ay);
                    crossings.push(ax as f64 + t * (bx - ax) as f64);
                }
            }
        }
        crossings.sort_by(f64::total_cmp);
        // Pixel centers strictly inside each span
        for span in crossings.chunks_exact(2) {
            let (start, end) = ((span[0] - 0.5).ceil() as i32, (span[1] - 0.5).floor() as i32);
            if start <= end {
                canvas.fill_span(y, start, end);
            }
        }
    }
}

/// Draw a point marker (small cross)
pub fn draw_marker(canvas: &mut BrailleCanvas, x: i32, y: i32, size: i32) {
    for i in -size..=size {
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}
