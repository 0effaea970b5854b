//! Tests for template matching functionality

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::VisionError;
use crate::geometry::{Point, Size};
use crate::loader::ImageSource;
use crate::template_matching::{MatchOptions, ResultDeduplicator, TemplateMatcher};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pseudo-random texture, so shifted copies correlate poorly
fn textured(w: u32, h: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let v = ((x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663) ^ seed.wrapping_mul(83_492_791))
            .wrapping_mul(2_654_435_761)
            >> 24) as u8;
        Rgb([v, v.wrapping_add(90), 255 - v])
    })
}

/// Smooth blob, so neighboring offsets also clear the threshold
fn blob(size: u32) -> RgbImage {
    let c = (size - 1) as f32 / 2.0;
    RgbImage::from_fn(size, size, |x, y| {
        let d2 = (x as f32 - c).powi(2) + (y as f32 - c).powi(2);
        let v = (255.0 * (-d2 / 50.0).exp()) as u8;
        Rgb([v, v, v / 2])
    })
}

fn canvas(w: u32, h: u32, patches: &[(&RgbImage, i64, i64)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(w, h, Rgb([0, 0, 0]));
    for (patch, x, y) in patches {
        image::imageops::replace(&mut img, *patch, *x, *y);
    }
    img
}

#[test]
fn test_find_locates_template() {
    init_logger();
    let template = textured(12, 10, 1);
    let image = canvas(80, 60, &[(&template, 30, 20)]);
    let matcher = TemplateMatcher::new();

    let found = matcher
        .find(&image.into(), &template.into(), &MatchOptions::default())
        .unwrap()
        .expect("template should be found");

    assert_eq!(found.position, Point::new(30, 20));
    assert_eq!(found.size, Size::new(12, 10));
    assert!(found.score > 0.99, "score {}", found.score);
}

#[test]
fn test_find_returns_none_for_absent_template() {
    let image: ImageSource = canvas(80, 60, &[(&textured(12, 10, 1), 30, 20)]).into();
    let matcher = TemplateMatcher::new();
    let found = matcher
        .find(&image, &textured(12, 10, 99).into(), &MatchOptions::default())
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_template_larger_than_image() {
    let matcher = TemplateMatcher::new();
    let found = matcher
        .find(
            &textured(10, 10, 1).into(),
            &textured(20, 20, 1).into(),
            &MatchOptions::default(),
        )
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_find_many_collapses_clusters() {
    init_logger();
    let template = blob(16);
    let image: ImageSource =
        canvas(80, 64, &[(&template, 5, 5), (&template, 45, 5), (&template, 5, 40)]).into();
    let template: ImageSource = template.into();
    let matcher = TemplateMatcher::new();
    let options = MatchOptions::default();

    let raw = matcher.match_template(&template, &image, &options, 0).unwrap();
    assert!(raw.len() > 3, "expected clustered raw candidates, got {}", raw.len());

    let many = matcher.find_many(&image, &template, &options).unwrap();
    let mut positions: Vec<Point> = many.iter().map(|m| m.position).collect();
    positions.sort_by_key(|p| (p.y, p.x));
    assert_eq!(
        positions,
        vec![Point::new(5, 5), Point::new(45, 5), Point::new(5, 40)]
    );

    assert_eq!(matcher.count(&image, &template, &options).unwrap(), many.len());
}

#[test]
fn test_match_template_sorted_and_truncated() {
    let template = blob(16);
    let image: ImageSource = canvas(80, 64, &[(&template, 20, 20)]).into();
    let template: ImageSource = template.into();
    let matcher = TemplateMatcher::new();

    let all = matcher
        .match_template(&template, &image, &MatchOptions::default(), 0)
        .unwrap();
    assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(all[0].position, Point::new(20, 20));

    let top = matcher
        .match_template(&template, &image, &MatchOptions::default(), 2)
        .unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0], all[0]);
}

#[test]
fn test_find_equivalent_to_unlimited_match() {
    let template = blob(16);
    let image: ImageSource = canvas(60, 60, &[(&template, 10, 30)]).into();
    let template: ImageSource = template.into();
    let matcher = TemplateMatcher::new();

    for threshold in [0.3, 0.8, 0.99, 1.01] {
        let options = MatchOptions::default().with_threshold(threshold);
        let found = matcher.find(&image, &template, &options).unwrap();
        let all = matcher.match_template(&template, &image, &options, 0).unwrap();
        assert_eq!(found.is_none(), all.is_empty(), "threshold {threshold}");
    }
}

#[test]
fn test_find_many_threshold_monotonic() {
    let template = blob(16);
    let image: ImageSource =
        canvas(80, 64, &[(&template, 5, 5), (&template, 45, 30)]).into();
    let template: ImageSource = template.into();
    let matcher = TemplateMatcher::new();

    let loose = matcher
        .find_many(&image, &template, &MatchOptions::default().with_threshold(0.6))
        .unwrap();
    let strict = matcher
        .find_many(&image, &template, &MatchOptions::default().with_threshold(0.95))
        .unwrap();
    for m in &strict {
        assert!(loose.iter().any(|l| l.position == m.position), "{m} missing");
    }
}

#[test]
fn test_dedup_of_find_many_is_fixed_point() {
    let template = blob(16);
    let image: ImageSource =
        canvas(80, 64, &[(&template, 5, 5), (&template, 30, 30)]).into();
    let matcher = TemplateMatcher::new();
    let many = matcher
        .find_many(&image, &template.into(), &MatchOptions::default().with_threshold(0.5))
        .unwrap();
    assert_eq!(ResultDeduplicator::dedup(many.clone()), many);
}

/// Left half textured and opaque, right half transparent magenta
fn transparent_template() -> RgbaImage {
    let texture = textured(20, 20, 3);
    RgbaImage::from_fn(20, 20, |x, y| {
        if x < 10 {
            let p = texture.get_pixel(x, y);
            Rgba([p[0], p[1], p[2], 255])
        } else {
            Rgba([255, 0, 255, 0])
        }
    })
}

/// Image holding the opaque half of the template, green where it is transparent
fn transparent_scene(template: &RgbaImage) -> RgbImage {
    let patch = RgbImage::from_fn(20, 20, |x, y| {
        if x < 10 {
            let p = template.get_pixel(x, y);
            Rgb([p[0], p[1], p[2]])
        } else {
            Rgb([0, 255, 0])
        }
    });
    canvas(60, 60, &[(&patch, 20, 20)])
}

#[test]
fn test_transparent_template_ignores_masked_region() {
    init_logger();
    let template = transparent_template();
    let image: ImageSource = transparent_scene(&template).into();
    let template: ImageSource = template.into();
    let matcher = TemplateMatcher::new();

    let masked = matcher
        .find(&image, &template, &MatchOptions::default().with_threshold(0.9).transparent())
        .unwrap()
        .expect("masked match should succeed");
    assert_eq!(masked.position, Point::new(20, 20));
    assert!(masked.score > 0.99);

    let plain = matcher
        .find(&image, &template, &MatchOptions::default().with_threshold(0.9))
        .unwrap();
    assert!(plain.is_none(), "plain match should fail, got {plain:?}");
}

#[test]
fn test_transparent_colored_match_ignores_masked_colors() {
    let template = transparent_template();
    let image: ImageSource = transparent_scene(&template).into();
    let options = MatchOptions::default().with_threshold(0.9).transparent().colored();

    let found = TemplateMatcher::new()
        .find(&image, &template.into(), &options)
        .unwrap()
        .expect("transparent pixels must not count in the color check");
    assert_eq!(found.position, Point::new(20, 20));
}

#[test]
fn test_explicit_mask_matches_like_alpha() {
    let template = transparent_template();
    let image: ImageSource = transparent_scene(&template).into();
    let mask = GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([255]) } else { Luma([0]) });
    let matcher = TemplateMatcher::new();

    let found = matcher
        .find(
            &image,
            &template.into(),
            &MatchOptions::default().with_threshold(0.9).with_mask(mask),
        )
        .unwrap()
        .expect("masked match should succeed");
    assert_eq!(found.position, Point::new(20, 20));
}

#[test]
fn test_mask_and_transparent_conflict() {
    let template = transparent_template();
    let mask = GrayImage::from_pixel(20, 20, Luma([255]));
    let options = MatchOptions::default().with_mask(mask).transparent();
    let err = TemplateMatcher::new()
        .find(&transparent_scene(&template).into(), &template.into(), &options)
        .unwrap_err();
    assert!(matches!(err, VisionError::MaskConflict));
}

#[test]
fn test_mask_size_mismatch() {
    let template = textured(20, 20, 1);
    let options = MatchOptions::default().with_mask(GrayImage::from_pixel(5, 5, Luma([255])));
    let err = TemplateMatcher::new()
        .find(&textured(40, 40, 1).into(), &template.into(), &options)
        .unwrap_err();
    assert!(matches!(err, VisionError::InvalidInput { .. }));
}

#[test]
fn test_find_any_reports_index_of_matching_template() {
    let present = textured(12, 12, 1);
    let absent = textured(12, 12, 7);
    let image: ImageSource = canvas(60, 60, &[(&present, 40, 8)]).into();
    let matcher = TemplateMatcher::new();

    let found = matcher
        .find_any(
            &image,
            &[absent.clone().into(), present.into()],
            &[],
            &MatchOptions::default(),
        )
        .unwrap()
        .expect("second template should match");
    assert_eq!(found.index, 1);
    assert_eq!(found.position, Point::new(40, 8));

    let none = matcher
        .find_any(&image, &[absent.into()], &[None], &MatchOptions::default())
        .unwrap();
    assert!(none.is_none());
}

/// Same pattern on every channel, shifted per channel to recolor it
fn button(offset: [i16; 3]) -> RgbImage {
    RgbImage::from_fn(24, 12, |x, y| {
        let v = 60 + ((x * 7 + y * 13) % 136) as i16;
        Rgb([
            (v + offset[0]) as u8,
            (v + offset[1]) as u8,
            (v + offset[2]) as u8,
        ])
    })
}

#[test]
fn test_colored_rejects_recolored_template() {
    init_logger();
    let enabled = button([0, 0, 0]);
    let disabled = button([60, -60, 0]);
    let image: ImageSource = canvas(60, 40, &[(&enabled, 10, 10)]).into();
    let enabled: ImageSource = enabled.into();
    let disabled: ImageSource = disabled.into();
    let matcher = TemplateMatcher::new();
    let geometric = MatchOptions::default().with_threshold(0.9);
    let colored = geometric.clone().colored();

    // Correlation alone cannot tell the two apart
    let plain = matcher.find(&image, &disabled, &geometric).unwrap();
    assert_eq!(plain.map(|m| m.position), Some(Point::new(10, 10)));

    assert!(matcher.find(&image, &disabled, &colored).unwrap().is_none());
    let found = matcher.find(&image, &enabled, &colored).unwrap();
    assert_eq!(found.map(|m| m.position), Some(Point::new(10, 10)));
    assert_eq!(matcher.count(&image, &disabled, &colored).unwrap(), 0);
}

#[test]
fn test_find_crop_extracts_pixels() {
    let template = textured(10, 8, 5);
    let image: ImageSource = canvas(50, 40, &[(&template, 17, 9)]).into();
    let crops = TemplateMatcher::new()
        .find_crop(&image, &template.clone().into(), &MatchOptions::default())
        .unwrap();
    assert_eq!(crops.len(), 1);
    assert_eq!(crops[0].position, Point::new(17, 9));
    assert_eq!(crops[0].image, template);
}

#[test]
fn test_expect_carries_source_and_template() {
    let image = canvas(40, 40, &[]);
    let err = TemplateMatcher::new()
        .expect(
            &image.clone().into(),
            &textured(8, 8, 2).into(),
            &MatchOptions::strict(),
        )
        .unwrap_err();
    match &err {
        VisionError::TemplateNotFound {
            template,
            template_image,
            image: carried,
        } => {
            assert_eq!(template, "<pixel buffer 8x8>");
            assert_eq!(**template_image, textured(8, 8, 2));
            assert_eq!(**carried, image);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_not_found());
    assert_eq!(err.template_image(), Some(&textured(8, 8, 2)));
}

#[test]
fn test_path_sources_are_loaded() {
    let dir = std::env::temp_dir().join(format!("screen-vision-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let template = textured(10, 10, 4);
    let template_path = dir.join("template.png");
    let image_path = dir.join("screen.png");
    template.save(&template_path).unwrap();
    canvas(40, 30, &[(&template, 12, 6)]).save(&image_path).unwrap();

    let found = TemplateMatcher::new()
        .find(
            &ImageSource::path(&image_path),
            &ImageSource::path(&template_path),
            &MatchOptions::default(),
        )
        .unwrap();
    assert_eq!(found.map(|m| m.position), Some(Point::new(12, 6)));
    let _ = std::fs::remove_dir_all(&dir);
}

#[derive(Default)]
struct RecordingReporter {
    titles: std::sync::Mutex<Vec<String>>,
}

impl crate::debug::DebugReporter for RecordingReporter {
    fn enabled(&self) -> bool {
        true
    }

    fn report(&self, title: &str, images: &[RgbImage], detail: &str) {
        assert_eq!(images.len(), 2);
        assert!(detail.contains("matches: 1"));
        self.titles.lock().unwrap().push(title.to_string());
    }
}

#[test]
fn test_enabled_reporter_receives_results() {
    let reporter = std::sync::Arc::new(RecordingReporter::default());
    let matcher = TemplateMatcher::with_config(
        crate::template_matching::MatchConfig::default(),
        reporter.clone(),
    );
    let template = textured(10, 10, 6);
    let image: ImageSource = canvas(40, 40, &[(&template, 3, 4)]).into();
    let template: ImageSource = template.into();

    matcher.find(&image, &template, &MatchOptions::default()).unwrap();
    matcher.find_many(&image, &template, &MatchOptions::default()).unwrap();
    assert_eq!(
        *reporter.titles.lock().unwrap(),
        vec!["template_match".to_string(), "template_match_many".to_string()]
    );
}
