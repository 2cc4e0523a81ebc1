//! Stroke expansion over generated polylines

use easel_paint::geometry::{expand_line_strip_stroke, expand_line_stroke};
use easel_paint::{Color, ColorSpec, CornerType, PrimitiveKind, Vertex2};

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }

    /// Polyline whose consecutive points are all distinct
    fn polyline(&mut self, len: usize) -> Vec<Vertex2> {
        let mut points = vec![Vertex2::new(self.next_f32(), self.next_f32())];
        while points.len() < len {
            let step = Vertex2::new(self.next_f32() - 0.5, self.next_f32() - 0.5);
            if step.length() > 1e-3 {
                let last = points[points.len() - 1];
                points.push(last + step);
            }
        }
        points
    }
}

/// Sign of the turn `a -> b -> c`, in f64 so thin strips stay exact enough
fn orientation(a: Vertex2, b: Vertex2, c: Vertex2) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let cross = (b.x as f64 - ax) * (c.y as f64 - ay) - (b.y as f64 - ay) * (c.x as f64 - ax);
    if cross.abs() < 1e-12 {
        0.0
    } else {
        cross.signum()
    }
}

/// Segments cross at a point interior to both
fn properly_intersect(a: Vertex2, b: Vertex2, c: Vertex2, d: Vertex2) -> bool {
    orientation(a, b, c) * orientation(a, b, d) < 0.0
        && orientation(c, d, a) * orientation(c, d, b) < 0.0
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Brushed strips hold two vertices per distinct point
#[test]
fn test_flat_brush_emits_two_vertices_per_point() {
    init_tracing();
    let mut rng = Lcg(7);
    for len in 2..40 {
        let polyline = rng.polyline(len);
        for double_back in [false, true] {
            let stroke = expand_line_strip_stroke(
                &polyline,
                Some(0.05),
                &ColorSpec::solid(Color::RED),
                CornerType::FlatBrush,
                double_back,
            )
            .unwrap();
            assert!(stroke.caps.is_none());
            assert_eq!(stroke.body.kind(), PrimitiveKind::TriangleStrip);
            assert_eq!(stroke.body.len(), 2 * len, "len {} double_back {}", len, double_back);
            assert_eq!(stroke.body.colors().len(), 2 * len);
        }
    }
}

/// Each strip pair straddles its point at half the width
#[test]
fn test_flat_brush_pairs_straddle_points() {
    let mut rng = Lcg(99);
    let polyline = rng.polyline(25);
    let width = 0.2;
    let stroke = expand_line_strip_stroke(
        &polyline,
        Some(width),
        &ColorSpec::none(),
        CornerType::FlatBrush,
        true,
    )
    .unwrap();
    for (point, pair) in polyline.iter().zip(stroke.body.vertices().chunks_exact(2)) {
        let middle = (pair[0] + pair[1]) * 0.5;
        assert!((middle - *point).length() < 1e-4);
        assert!(((pair[0] - pair[1]).length() - width).abs() < 1e-4);
    }
}

/// With double-back on, the two rails of a brushed strip never cross
#[test]
fn test_double_back_strip_is_a_simple_ribbon() {
    init_tracing();
    for seed in [1, 11, 42, 2024] {
        let mut rng = Lcg(seed);
        for len in [3, 8, 20, 60] {
            let polyline = rng.polyline(len);
            for width in [0.001, 0.05, 0.4] {
                let stroke = expand_line_strip_stroke(
                    &polyline,
                    Some(width),
                    &ColorSpec::none(),
                    CornerType::FlatBrush,
                    true,
                )
                .unwrap();
                let strip = stroke.body.vertices();
                for k in 0..strip.len() / 2 - 1 {
                    let (a, b) = (strip[2 * k], strip[2 * k + 2]);
                    let (c, d) = (strip[2 * k + 1], strip[2 * k + 3]);
                    assert!(
                        !properly_intersect(a, b, c, d),
                        "seed {} len {} width {} rails cross at pair {}",
                        seed,
                        len,
                        width,
                        k
                    );
                }
            }
        }
    }
}

/// Repeated points collapse before brushing
#[test]
fn test_flat_brush_skips_repeated_points() {
    let points = [
        Vertex2::new(0.0, 0.0),
        Vertex2::new(0.0, 0.0),
        Vertex2::new(1.0, 0.0),
        Vertex2::new(1.0, 0.0),
        Vertex2::new(1.0, 1.0),
    ];
    let colors = ColorSpec::from(vec![
        Color::RED,
        Color::RED,
        Color::GREEN,
        Color::GREEN,
        Color::BLUE,
    ]);
    let stroke = expand_line_strip_stroke(&points, Some(0.1), &colors, CornerType::FlatBrush, false)
        .unwrap();
    assert_eq!(stroke.body.len(), 6);
    assert_eq!(
        stroke.body.colors(),
        &[Color::RED, Color::RED, Color::GREEN, Color::GREEN, Color::BLUE, Color::BLUE]
    );
}

/// Rounded strips become one quad per segment plus a cap per segment end
#[test]
fn test_rounded_strip_quads_and_caps() {
    init_tracing();
    let mut rng = Lcg(3);
    for len in 2..12 {
        let polyline = rng.polyline(len);
        let stroke = expand_line_strip_stroke(
            &polyline,
            Some(0.1),
            &ColorSpec::solid(Color::BLUE),
            CornerType::Rounded,
            false,
        )
        .unwrap();
        let segments = len - 1;
        assert_eq!(stroke.body.len() % segments, 0);
        let caps = stroke.caps.expect("rounded strokes carry caps");
        assert_eq!(caps.sub_ranges().map(<[_]>::len), Some(2 * segments));
    }
}

/// Per-vertex colors survive segment expansion with zero-length pairs dropped
#[test]
fn test_line_colors_follow_kept_segments() {
    let pairs = [
        Vertex2::new(0.0, 0.0),
        Vertex2::new(1.0, 0.0),
        Vertex2::new(2.0, 2.0),
        Vertex2::new(2.0, 2.0),
        Vertex2::new(0.0, 1.0),
        Vertex2::new(1.0, 1.0),
    ];
    let colors = ColorSpec::from(vec![Color::RED, Color::GREEN, Color::BLUE]);
    let stroke = expand_line_stroke(&pairs, Some(0.1), &colors, CornerType::None).unwrap();
    let body_colors = stroke.body.colors();
    let per_quad = body_colors.len() / 2;
    assert!(body_colors[..per_quad].iter().all(|color| *color == Color::RED));
    assert!(body_colors[per_quad..].iter().all(|color| *color == Color::BLUE));
}
