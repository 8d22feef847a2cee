use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell as Counter;
use yamc_csg::region::{evaluate_rpn, remove_complements};
use yamc_csg::{BoundingBox, CsgRegion, Surface, SurfaceSet, Token};

/// Surface set that records how often each surface's sense is queried
struct CountingSurfaces {
    surfaces: Vec<Surface>,
    sense_calls: Vec<Counter<usize>>,
}

impl CountingSurfaces {
    fn new(surfaces: Vec<Surface>) -> Self {
        let sense_calls = surfaces.iter().map(|_| Counter::new(0)).collect();
        CountingSurfaces {
            surfaces,
            sense_calls,
        }
    }

    fn calls(&self) -> Vec<usize> {
        self.sense_calls.iter().map(Counter::get).collect()
    }
}

impl SurfaceSet for CountingSurfaces {
    fn sense(&self, index: usize, point: [f64; 3], direction: [f64; 3]) -> bool {
        let counter = &self.sense_calls[index];
        counter.set(counter.get() + 1);
        self.surfaces.sense(index, point, direction)
    }

    fn distance(
        &self,
        index: usize,
        point: [f64; 3],
        direction: [f64; 3],
        coincident: bool,
    ) -> Option<f64> {
        SurfaceSet::distance(&self.surfaces, index, point, direction, coincident)
    }

    fn bounding_box(&self, index: usize, positive: bool) -> BoundingBox {
        SurfaceSet::bounding_box(&self.surfaces, index, positive)
    }
}

fn test_surfaces() -> Vec<Surface> {
    vec![
        Surface::x_plane(-1.5, 1),
        Surface::x_plane(2.0, 2),
        Surface::y_plane(0.5, 3),
        Surface::z_plane(-2.5, 4),
        Surface::new_sphere(0.0, 0.0, 0.0, 3.0, 5),
        Surface::new_sphere(1.0, -1.0, 0.5, 2.0, 6),
        Surface::z_cylinder(-1.0, 1.0, 1.5, 7),
    ]
}

fn random_expression(rng: &mut StdRng, depth: u32, n_surfaces: i32) -> String {
    if depth == 0 || rng.gen_bool(0.25) {
        let s = rng.gen_range(1..=n_surfaces);
        return if rng.gen_bool(0.5) {
            format!("{}", s)
        } else {
            format!("-{}", s)
        };
    }
    let a = random_expression(rng, depth - 1, n_surfaces);
    match rng.gen_range(0..3) {
        0 => format!("({} {})", a, random_expression(rng, depth - 1, n_surfaces)),
        1 => format!("({} | {})", a, random_expression(rng, depth - 1, n_surfaces)),
        _ => format!("~({})", a),
    }
}

fn random_point(rng: &mut StdRng) -> [f64; 3] {
    [
        rng.gen_range(-5.0..5.0),
        rng.gen_range(-5.0..5.0),
        rng.gen_range(-5.0..5.0),
    ]
}

fn random_direction(rng: &mut StdRng) -> [f64; 3] {
    let mu: f64 = rng.gen_range(-1.0..1.0);
    let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let s = (1.0 - mu * mu).sqrt();
    [s * phi.cos(), s * phi.sin(), mu]
}

#[test]
fn simple_containment_short_circuits() {
    let surfaces = CountingSurfaces::new(vec![Surface::x_plane(0.0, 1), Surface::x_plane(5.0, 2)]);
    let region = CsgRegion::parse("1 -2").unwrap();
    assert!(region.is_simple());
    assert_eq!(
        region.rpn(),
        &[Token::Halfspace(1), Token::Halfspace(-2), Token::Intersection]
    );

    assert!(!region.contains([-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0, &surfaces));
    assert_eq!(surfaces.calls(), vec![1, 0]);

    assert!(region.contains([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0, &surfaces));
    assert_eq!(surfaces.calls(), vec![2, 1]);

    // The surface the particle sits on is never queried
    assert!(region.contains([0.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 1, &surfaces));
    assert_eq!(surfaces.calls(), vec![2, 2]);
}

#[test]
fn complement_removal_preserves_membership() {
    let surfaces = test_surfaces();
    let n = surfaces.len() as i32;
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let text = random_expression(&mut rng, 4, n);
        let region = CsgRegion::parse(&text).unwrap();
        let reduced = remove_complements(region.rpn());
        assert!(
            !reduced.contains(&Token::Complement),
            "complement left in {:?} for {}",
            reduced,
            text
        );
        for _ in 0..1000 {
            let r = random_point(&mut rng);
            let u = random_direction(&mut rng);
            assert_eq!(
                evaluate_rpn(region.rpn(), r, u, 0, &surfaces),
                evaluate_rpn(&reduced, r, u, 0, &surfaces),
                "membership changed for {} at {:?}",
                text,
                r
            );
        }
    }
}

#[test]
fn complement_removal_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let text = random_expression(&mut rng, 5, 7);
        let region = CsgRegion::parse(&text).unwrap();
        let once = remove_complements(region.rpn());
        assert_eq!(remove_complements(&once), once, "not idempotent for {}", text);
    }
}

#[test]
fn bounding_box_encloses_region() {
    let surfaces = test_surfaces();
    let n = surfaces.len() as i32;
    let mut rng = StdRng::seed_from_u64(1234);

    for _ in 0..200 {
        let text = random_expression(&mut rng, 4, n);
        let region = CsgRegion::parse(&text).unwrap();
        let bbox = region.bounding_box(&surfaces);
        for _ in 0..500 {
            let r = random_point(&mut rng);
            let u = random_direction(&mut rng);
            if region.contains(r, u, 0, &surfaces) {
                assert!(bbox.contains(r), "{:?} inside {} but outside {:?}", r, text, bbox);
            }
        }
    }
}

#[test]
fn simple_and_complex_paths_agree() {
    let surfaces = test_surfaces();
    let n = surfaces.len() as i32;
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..200 {
        let count = rng.gen_range(1..5);
        let tokens: Vec<i32> = (0..count)
            .map(|_| {
                let s = rng.gen_range(1..=n);
                if rng.gen_bool(0.5) {
                    s
                } else {
                    -s
                }
            })
            .collect();
        let text = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let region = CsgRegion::parse(&text).unwrap();
        assert!(region.is_simple());

        for _ in 0..200 {
            let r = random_point(&mut rng);
            let u = random_direction(&mut rng);
            let on_surface = if rng.gen_bool(0.5) {
                0
            } else {
                tokens[rng.gen_range(0..tokens.len())] * if rng.gen_bool(0.5) { 1 } else { -1 }
            };
            assert_eq!(
                region.contains_simple(r, u, on_surface, &surfaces),
                region.contains_complex(r, u, on_surface, &surfaces),
                "{} at {:?} with on_surface {}",
                text,
                r,
                on_surface
            );
        }
    }
}

#[test]
fn demorgan_example_matches_direct_evaluation() {
    let surfaces = test_surfaces();
    let region = CsgRegion::parse("~(1 | -2)").unwrap();
    assert_eq!(
        remove_complements(region.rpn()),
        vec![Token::Halfspace(-1), Token::Halfspace(2), Token::Intersection]
    );
    let u = [0.0, 0.0, 1.0];
    // Outside both half-spaces only left of x = -1.5 and right of x = 2
    assert!(!region.contains([0.0, 0.0, 0.0], u, 0, &surfaces));
    assert!(!region.contains([-3.0, 0.0, 0.0], u, 0, &surfaces));
    assert!(!region.contains([3.0, 0.0, 0.0], u, 0, &surfaces));

    let region = CsgRegion::parse("~(-1 | 2)").unwrap();
    assert!(region.contains([0.0, 0.0, 0.0], u, 0, &surfaces));
    let bbox = region.bounding_box(&surfaces);
    assert!((bbox.lower_left[0] + 1.5).abs() < 1e-9);
    assert!((bbox.upper_right[0] - 2.0).abs() < 1e-9);
}

#[test]
fn bounding_box_encloses_points_in_coincident_band() {
    let surfaces = test_surfaces();
    let mut rng = StdRng::seed_from_u64(5);
    // x = -1.5 and x = 2 planes, z = -2.5 plane, sphere of radius 3
    let region = CsgRegion::parse("1 -2 4 -5").unwrap();
    let bbox = region.bounding_box(&surfaces);

    let inward = [1.0, 0.0, 0.0];
    let r = [-1.5 - 5e-13, 0.0, 0.0];
    assert!(region.contains(r, inward, 0, &surfaces));
    assert!(bbox.contains(r));

    let single = CsgRegion::parse("1").unwrap();
    assert!(single.contains(r, inward, 0, &surfaces));
    assert!(single.bounding_box(&surfaces).contains(r));

    // Points straddling every face, each nudged by less than FP_COINCIDENT
    for _ in 0..2000 {
        let mut r = random_point(&mut rng);
        let u = random_direction(&mut rng);
        let face = rng.gen_range(0..3);
        let offset = rng.gen_range(-9e-13..9e-13);
        match face {
            0 => r[0] = -1.5 + offset,
            1 => r[0] = 2.0 + offset,
            _ => r[2] = -2.5 + offset,
        }
        if region.contains(r, u, 0, &surfaces) {
            assert!(bbox.contains(r), "{:?} moving {:?} escapes {:?}", r, u, bbox);
        }
    }
}
