use shader_hero::{PagePoint, PointerInput, PointerTracker, Projection, SurfacePoint};

fn approx_eq2(a: SurfacePoint, b: SurfacePoint, eps: f64) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

#[test]
fn projection_matches_formula_across_scales() {
    let heights = [1.0, 600.0, 1080.0, 2160.0];
    let scales = [1.0, 1.25, 1.5, 2.0];
    let samples = [(0.0, 0.0), (100.0, 200.0), (-5.5, 3.25), (1919.0, 1079.0)];

    for &h in &heights {
        for &s in &scales {
            let tracker = PointerTracker::new(s, h);
            for &(x, y) in &samples {
                let got = tracker.project(PagePoint::new(x, y));
                let want = SurfacePoint::new(x * s, h - y * s);
                assert!(approx_eq2(got, want, 1e-9), "got={:?} want={:?}", got, want);
                assert_eq!(got, Projection::new(s, h).project(PagePoint::new(x, y)));
            }
        }
    }
}

#[test]
fn open_contacts_equal_starts_minus_ends() {
    let mut tracker = PointerTracker::new(1.0, 600.0);
    let starts = [3, 8, 1, 42, 7];
    for (i, id) in starts.iter().enumerate() {
        tracker.apply(PointerInput::Start {
            id: *id,
            page: PagePoint::new(i as f64 * 10.0, i as f64 * 20.0),
        });
    }
    assert_eq!(tracker.contact_count(), starts.len());

    let ends = [8, 42, 3, 1];
    for (n, id) in ends.iter().enumerate() {
        tracker.apply(PointerInput::End { id: *id });
        assert_eq!(tracker.contact_count(), starts.len() - n - 1);
    }

    // Only `7` (started at page (40, 80)) is left.
    let last = SurfacePoint::new(40.0, 520.0);
    assert_eq!(tracker.primary_coordinate(), last);
    tracker.apply(PointerInput::Move {
        id: 7,
        page: PagePoint::new(45.0, 85.0),
        movement: (5.0, 5.0),
    });
    tracker.apply(PointerInput::End { id: 7 });
    assert_eq!(tracker.contact_count(), 0);
    assert_eq!(tracker.fallback(), SurfacePoint::new(45.0, 515.0));
    assert_eq!(tracker.primary_coordinate(), SurfacePoint::new(45.0, 515.0));
    assert_eq!(tracker.projected_coordinates(), vec![0.0, 0.0]);
}

#[test]
fn single_contact_scenario() {
    let mut tracker = PointerTracker::new(1.0, 600.0);
    tracker.on_contact_start(1, PagePoint::new(100.0, 200.0));
    assert_eq!(tracker.coordinate(1), Some(SurfacePoint::new(100.0, 400.0)));

    tracker.on_contact_move(1, PagePoint::new(100.0, 200.0), 5.0, -3.0);
    assert_eq!(tracker.cumulative_movement(), [5.0, -3.0]);

    tracker.on_contact_end(1);
    assert_eq!(tracker.fallback(), SurfacePoint::new(100.0, 400.0));
    assert_eq!(tracker.contact_count(), 0);
}

#[test]
fn two_contact_scenario() {
    let mut tracker = PointerTracker::new(1.0, 600.0);
    tracker.on_contact_start(1, PagePoint::new(10.0, 20.0));
    tracker.on_contact_start(2, PagePoint::new(30.0, 40.0));

    assert_eq!(tracker.projected_coordinates(), vec![10.0, 580.0, 30.0, 560.0]);
    assert_eq!(tracker.contact_count(), 2);
}
