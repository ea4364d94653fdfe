//! End-to-end scanning of synthetic scoring-key pages.
//!
//! Pages are drawn at the calibrated 850x1100 size: cluttered texture
//! bands top and bottom give the registration stage corners to match, and
//! each section's half-tables carry one marker line per question in the
//! column of its category.

use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use keylift::{
    CaptureProfile, MarkerCriteria, PageScanner, RegistrationSettings, SectionKind, SectionLayout,
    PAGE_HEIGHT, PAGE_WIDTH,
};

// ============================================================
// Page synthesis
// ============================================================

fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, shade: u8) {
    for y in y0..(y0 + h).min(img.height()) {
        for x in x0..(x0 + w).min(img.width()) {
            img.put_pixel(x, y, Luma([shade]));
        }
    }
}

/// Overlapping random dark blocks in the top and bottom margins, clear of
/// every table box. Gives registration distinctive corners to latch onto.
fn draw_texture(img: &mut GrayImage, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for band in [(5u32, 70u32), (1010, 1080)] {
        for _ in 0..80 {
            let w = rng.gen_range(8..26);
            let h = rng.gen_range(6..16);
            let x0 = rng.gen_range(10..PAGE_WIDTH - 40);
            let y0 = rng.gen_range(band.0..band.1);
            let shade = rng.gen_range(0..60);
            fill_rect(img, x0, y0, w, h, shade);
        }
    }
}

/// One marker line per question, in column `(question - 1) % label_count`.
fn draw_section_markers(img: &mut GrayImage, kind: SectionKind) {
    let layout = SectionLayout::of(kind);
    let cols = layout.labels.len() as u32;
    let mut question = 0u32;
    for (half, table) in layout.tables.iter().enumerate() {
        for r in 0..layout.rows_in_half(half) {
            let col = question % cols;
            let x = table.x as u32 + 65 + 30 * col;
            let y = table.y as u32 + 85 + 16 * r;
            fill_rect(img, x, y, 20, 2, 0);
            question += 1;
        }
    }
}

fn synthetic_page(sections: &[SectionKind], seed: u64) -> GrayImage {
    let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
    draw_texture(&mut page, seed);
    for &kind in sections {
        draw_section_markers(&mut page, kind);
    }
    page
}

fn translate(page: &GrayImage, dx: u32, dy: u32) -> GrayImage {
    let (w, h) = page.dimensions();
    let mut out = GrayImage::from_pixel(w, h, Luma([255]));
    for y in 0..h - dy {
        for x in 0..w - dx {
            out.put_pixel(x + dx, y + dy, *page.get_pixel(x, y));
        }
    }
    out
}

/// Enough keypoints that texture corners survive the strongest-first cap.
fn test_profile() -> CaptureProfile {
    CaptureProfile {
        registration: RegistrationSettings {
            max_keypoints: 1200,
            ..RegistrationSettings::default()
        },
        ..CaptureProfile::default()
    }
}

fn expected_label(layout: &SectionLayout, question: u32) -> &'static str {
    layout.labels[(question as usize - 1) % layout.labels.len()]
}

// ============================================================
// Tests
// ============================================================

#[test]
fn scan_identity_capture_recovers_both_sections() {
    let sections = [SectionKind::Reading, SectionKind::Science];
    let page = synthetic_page(&sections, 21);
    let scanner = PageScanner::new(test_profile());

    let grids = scanner.scan_page(&page, &page.clone(), &sections).unwrap();
    assert_eq!(grids.len(), 2);

    for (kind, grid) in &grids {
        let layout = SectionLayout::of(*kind);
        assert_eq!(grid.question_count(), 40);
        assert_eq!(grid.total_marks(), 40, "section {kind:?}");
        for q in [1, 20, 21, 40] {
            assert_eq!(
                grid.categories_for(q),
                &[expected_label(&layout, q)],
                "section {kind:?} question {q}"
            );
        }
    }
}

#[test]
fn scan_translated_capture_recovers_english() {
    let sections = [SectionKind::English];
    let page = synthetic_page(&sections, 33);
    let capture = translate(&page, 6, 4);

    // Warping resamples the capture, so marker lines come back slightly
    // blurred and taller; the profile loosens the height cap accordingly.
    let profile = CaptureProfile {
        marker: MarkerCriteria {
            max_height: 5,
            ..MarkerCriteria::default()
        },
        ..test_profile()
    };
    let scanner = PageScanner::new(profile);

    let grids = scanner.scan_page(&page, &capture, &sections).unwrap();
    let (_, grid) = &grids[0];
    let layout = SectionLayout::of(SectionKind::English);

    assert_eq!(grid.question_count(), 75);
    assert_eq!(grid.total_marks(), 75);
    for q in [1, 38, 39, 75] {
        assert_eq!(grid.categories_for(q), &[expected_label(&layout, q)]);
    }
}

#[test]
fn scan_directory_writes_category_file() {
    let refs = tempfile::tempdir().unwrap();
    let caps = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let pages: [(&str, &[SectionKind]); 3] = [
        ("e.png", &[SectionKind::English]),
        ("m.png", &[SectionKind::Math]),
        ("rs.png", &[SectionKind::Reading, SectionKind::Science]),
    ];
    for (i, (stem, sections)) in pages.iter().enumerate() {
        let page = synthetic_page(sections, 100 + i as u64);
        page.save(refs.path().join(stem)).unwrap();
        page.save(caps.path().join(stem)).unwrap();
    }

    let scanner = PageScanner::new(test_profile());
    let grids = scanner.scan_directory(refs.path(), caps.path()).unwrap();

    let kinds: Vec<SectionKind> = grids.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            SectionKind::English,
            SectionKind::Math,
            SectionKind::Reading,
            SectionKind::Science,
        ]
    );

    let path = keylift::write_category_file(out.path(), "202304", &grids).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(value["test_code"], "202304");
    assert_eq!(value["e"]["q"].as_object().unwrap().len(), 75);
    assert_eq!(value["m"]["q"]["1"]["cat"][0], "n");
    assert_eq!(value["m"]["q"]["2"]["cat"][0], "a");
    let reading = SectionLayout::of(SectionKind::Reading);
    assert_eq!(
        value["r"]["q"]["40"]["cat"][0],
        expected_label(&reading, 40).to_lowercase()
    );
    assert_eq!(value["r"]["q"]["40"]["cat"][0], "kid");
}

#[test]
fn scan_page_with_missing_row_is_rejected() {
    let sections = [SectionKind::Math];
    let mut page = synthetic_page(&sections, 55);

    // Erase question 12's marker: half 0, row 11, column 11 % 7.
    let layout = SectionLayout::of(SectionKind::Math);
    let table = &layout.tables[0];
    let x = table.x as u32 + 65 + 30 * (11 % 7);
    let y = table.y as u32 + 85 + 16 * 11;
    fill_rect(&mut page, x, y, 20, 2, 255);

    let scanner = PageScanner::new(test_profile());
    let err = scanner
        .scan_page(&page, &page.clone(), &sections)
        .unwrap_err();
    assert!(
        matches!(err, keylift::PipelineError::Grid(keylift::GridError::LayoutMismatch { .. })),
        "unexpected error: {err}"
    );
}
