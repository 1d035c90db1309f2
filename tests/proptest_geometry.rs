use proptest::prelude::*;
use yoloprep::geometry::{self, box_to_quad, quad_to_box, rotated_box_to_quad};
use yoloprep::label::{self, LabelFormat, LabelRecord, Shape};

mod proptest_helpers;

use proptest_helpers::EPS_GEOMETRY;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn box_survives_quad_roundtrip(b in proptest_helpers::arb_box()) {
        let back = quad_to_box(&box_to_quad(b).expect("box to quad")).expect("quad to box");
        prop_assert!((back.cx - b.cx).abs() <= EPS_GEOMETRY);
        prop_assert!((back.cy - b.cy).abs() <= EPS_GEOMETRY);
        prop_assert!((back.w - b.w).abs() <= EPS_GEOMETRY);
        prop_assert!((back.h - b.h).abs() <= EPS_GEOMETRY);
    }

    #[test]
    fn bounding_box_covers_rotated_quad(r in proptest_helpers::arb_rotated_box()) {
        let quad = rotated_box_to_quad(r).expect("rotated box to quad");
        let bbox = quad_to_box(&quad).expect("quad to box");
        prop_assert!(bbox.area() + EPS_GEOMETRY >= quad.area());
        prop_assert!((quad.area() - r.w * r.h).abs() <= EPS_GEOMETRY);
    }

    #[test]
    fn converted_quads_stay_in_the_unit_square(r in proptest_helpers::arb_rotated_box()) {
        if let Ok(converted) = geometry::rotated_to_obb(r) {
            for p in converted.value.points {
                prop_assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn boxes_inside_the_image_convert_without_loss(b in proptest_helpers::arb_box_inside()) {
        let obb = geometry::detect_to_obb(b, 0.0).expect("detect to obb");
        prop_assert!(!obb.clamped);
        let detect = geometry::obb_to_detect(&obb.value).expect("obb to detect");
        prop_assert!(!detect.rotation_discarded);
        prop_assert!((detect.value.w - b.w).abs() <= EPS_GEOMETRY);
        prop_assert!((detect.value.h - b.h).abs() <= EPS_GEOMETRY);
    }

    #[test]
    fn rendered_labels_parse_back(
        class_id in 0usize..1000,
        b in proptest_helpers::arb_box_inside()
    ) {
        let records = vec![LabelRecord::new(class_id, Shape::Box(b))];
        let text = label::render_labels(&records);
        let parsed = label::parse_labels(&text, LabelFormat::Detect, std::path::Path::new("p.txt"))
            .expect("rendered text parses");
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(parsed[0].class_id, class_id);
        let Shape::Box(back) = parsed[0].shape else {
            return Err(TestCaseError::fail("expected a box"));
        };
        prop_assert!((back.cx - b.cx).abs() <= 1e-6);
        prop_assert!((back.w - b.w).abs() <= 1e-6);
    }

    #[test]
    fn parser_never_panics(line in "\\PC{0,80}") {
        for format in [LabelFormat::Detect, LabelFormat::Obb, LabelFormat::Xywhr] {
            let _ = label::parse_label_line(&line, format, std::path::Path::new("p.txt"), 1);
        }
    }
}
