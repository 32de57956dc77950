//! Behavioural checks for the public recognizer and gesture-plan API.

use std::time::Duration;

use a11y_core::{
    Gesture, GestureConfig, GesturePathPlan, GesturePathSegment, GestureRecognizer, InjectionConfig,
    InjectionRejection, Point, PointerAction, PointerSample, Stroke, SwipeDirection, Timestamp,
};

fn sample(x: f64, y: f64, ms: u64) -> PointerSample {
    PointerSample::new(1, Point::new(x, y), Timestamp::from_millis(ms))
}

#[test]
fn test_every_small_quick_press_is_a_tap() {
    // Arrange
    let cfg = GestureConfig::default();
    let offsets = [0.0, 1.0, 5.5, cfg.tap_slop - 0.01];
    let durations = [0u64, 1, 150, cfg.long_press_timeout_ms - 1];

    for dx in offsets {
        for ms in durations {
            let r = GestureRecognizer::new(cfg.clone());

            // Act
            let g = r.classify(&[sample(400.0, 400.0, 10), sample(400.0 + dx, 400.0, 10 + ms)]);

            // Assert
            assert_eq!(g, Gesture::Tap, "dx={dx} ms={ms}");
        }
    }
}

#[test]
fn test_eight_directions_from_a_stroke_builder() {
    let cfg = GestureConfig::default();
    let r = GestureRecognizer::new(cfg.clone());

    for dir in SwipeDirection::ALL {
        // Arrange: a 300 px stroke built through the bounded history
        let unit = dir.unit_vector();
        let mut stroke = Stroke::begin(sample(500.0, 500.0, 0), &cfg);
        for step in 1..=10 {
            let p = Point::new(500.0 + unit.x * 30.0 * step as f64, 500.0 + unit.y * 30.0 * step as f64);
            stroke.push(sample(p.x, p.y, step * 10));
        }
        let end = stroke.last();
        stroke.finish(PointerSample::new(1, end.position, Timestamp::from_millis(110)));

        // Act
        let g = r.classify(stroke.samples());

        // Assert
        assert_eq!(g, Gesture::Swipe(vec![dir]), "direction {dir}");
    }
}

#[test]
fn test_plan_over_total_budget_is_rejected_by_default_limits() {
    // Arrange
    let limits = InjectionConfig::default().limits();
    let seg = |x0: f64, x1: f64| {
        GesturePathSegment::new(Point::new(x0, 10.0), Point::new(x1, 10.0), Duration::from_secs(25))
    };
    let plan = GesturePathPlan::new(vec![seg(0.0, 10.0), seg(10.0, 20.0), seg(20.0, 30.0)]).expect("valid");

    // Act
    let verdict = limits.check(&plan);

    // Assert
    assert_eq!(
        verdict,
        Err(InjectionRejection::TotalTooLong {
            total: Duration::from_secs(75),
            max: Duration::from_secs(60)
        })
    );
}

#[test]
fn test_plan_expansion_counts() {
    // N continuous non-degenerate segments → N + 1 events
    for n in 1..=5usize {
        let segments = (0..n)
            .map(|i| {
                GesturePathSegment::new(
                    Point::new(i as f64 * 10.0, 0.0),
                    Point::new((i + 1) as f64 * 10.0, 0.0),
                    Duration::from_millis(20),
                )
            })
            .collect();
        let plan = GesturePathPlan::new(segments).expect("valid");

        let events = plan.expand(Timestamp::ZERO, 1);

        assert_eq!(events.len(), n + 1);
        assert_eq!(events[0].action, PointerAction::Down);
        assert_eq!(events[n].action, PointerAction::Up);
        assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
