//! Unit tests for sr-street.
//!
//! All tests use hand-built or seeded random layers so they run without any
//! network file.

#[cfg(test)]
mod helpers {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use sr_core::{GeoPoint, Mode, VertexId};

    use crate::{
        CostModel, EdgeAttrs, EdgeFlags, PermissionFlags, Street, StreetLayer, StreetLayerBuilder,
        VertexFlags,
    };

    pub fn origin() -> GeoPoint {
        GeoPoint::new(45.0, 7.0)
    }

    pub fn all_modes(speed_ms: f64) -> EdgeAttrs {
        EdgeAttrs::new(
            PermissionFlags::PEDESTRIAN | PermissionFlags::BIKE | PermissionFlags::CAR,
            speed_ms,
        )
    }

    pub fn walk_only() -> EdgeAttrs {
        EdgeAttrs::new(PermissionFlags::PEDESTRIAN, 1.4)
    }

    /// A 100 m square, walk/bike/car everywhere at 1.4 m/s.
    ///
    /// ```text
    ///   v3 ──── v2
    ///   │        │
    ///   v0 ──── v1
    /// ```
    ///
    /// Streets in id order: v0-v1 (e0), v1-v2 (e2), v2-v3 (e4), v3-v0 (e6).
    pub fn square() -> (StreetLayer, [VertexId; 4]) {
        let mut b = StreetLayerBuilder::new();
        let o = origin();
        let v0 = b.add_vertex(o);
        let v1 = b.add_vertex(o.offset_m(0.0, 100.0));
        let v2 = b.add_vertex(o.offset_m(100.0, 100.0));
        let v3 = b.add_vertex(o.offset_m(100.0, 0.0));
        for (from, to) in [(v0, v1), (v1, v2), (v2, v3), (v3, v0)] {
            b.add_street(Street::new(from, to, all_modes(1.4)).length_mm(100_000)).unwrap();
        }
        (b.build(), [v0, v1, v2, v3])
    }

    /// `n` vertices eastward from [`origin`], `spacing_m` apart, joined by
    /// streets with `attrs`.
    pub fn line(n: usize, spacing_m: f64, attrs: EdgeAttrs) -> (StreetLayer, Vec<VertexId>) {
        let mut b = StreetLayerBuilder::new();
        let vs: Vec<VertexId> = (0..n)
            .map(|i| b.add_vertex(origin().offset_m(0.0, spacing_m * i as f64)))
            .collect();
        for w in vs.windows(2) {
            let street = Street::new(w[0], w[1], attrs).length_mm((spacing_m * 1000.0) as u32);
            b.add_street(street).unwrap();
        }
        (b.build(), vs)
    }

    /// Seeded random layer within roughly a kilometre of [`origin`], with
    /// random per-direction permissions, speeds (some zero), stairs, signals
    /// and self-loops.
    pub fn random_layer(seed: u64, vertices: usize, streets: usize) -> StreetLayer {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut b = StreetLayerBuilder::new();
        for _ in 0..vertices {
            let p = origin().offset_m(rng.gen_range(-1000.0..1000.0), rng.gen_range(-1000.0..1000.0));
            let flags = if rng.gen_bool(0.2) { VertexFlags::TRAFFIC_SIGNAL } else { VertexFlags::empty() };
            b.add_vertex_with_flags(p, flags);
        }
        let attrs = |rng: &mut SmallRng| {
            let perms = PermissionFlags::from_bits_truncate(rng.gen_range(0..16u8));
            let flags = if rng.gen_bool(0.1) { EdgeFlags::STAIRS } else { EdgeFlags::empty() };
            EdgeAttrs::new(perms, rng.gen_range(0..30u16) as f64).with_flags(flags)
        };
        for _ in 0..streets {
            let from = VertexId(rng.gen_range(0..vertices as u32));
            let to = VertexId(rng.gen_range(0..vertices as u32));
            let forward = attrs(&mut rng);
            let backward = attrs(&mut rng);
            let street = Street::new(from, to, forward)
                .backward(backward)
                .length_mm(rng.gen_range(1..500_000));
            b.add_street(street).unwrap();
        }
        b.build()
    }

    pub fn random_cost() -> CostModel {
        CostModel { traffic_signal_delay_secs: 5.0, ..CostModel::default() }
    }

    /// Bellman–Ford reference: cheapest weight from `origin` to every vertex.
    pub fn brute_force(
        layer:  &StreetLayer,
        cost:   &CostModel,
        mode:   Mode,
        origin: VertexId,
    ) -> Vec<Option<f64>> {
        let mut dist: Vec<Option<f64>> = vec![None; layer.vertex_count()];
        dist[origin.index()] = Some(0.0);
        loop {
            let mut changed = false;
            for e in layer.edge_store().iter() {
                if !e.allows(mode) {
                    continue;
                }
                let Some(d) = dist[e.from_vertex().index()] else { continue };
                let Some(t) = cost.traverse(&e, mode, e.length_mm()) else { continue };
                let to = layer.vertex(e.to_vertex()).unwrap();
                let w = d + t.weight + cost.vertex_delay_secs(&to, mode);
                let slot = &mut dist[to.id.index()];
                if slot.is_none_or(|cur| w < cur - 1e-9) {
                    *slot = Some(w);
                    changed = true;
                }
            }
            if !changed {
                return dist;
            }
        }
    }
}

// ── Stores & layer structure ──────────────────────────────────────────────────

#[cfg(test)]
mod stores {
    use sr_core::{EdgeId, FixedPoint, GeoPoint, VertexId};

    use crate::{
        EdgeAttrs, EdgeStore, PermissionFlags, Street, StreetError, StreetLayer,
        StreetLayerBuilder, VertexStore,
    };

    #[test]
    fn empty_build() {
        let layer = StreetLayer::empty();
        assert_eq!(layer.vertex_count(), 0);
        assert_eq!(layer.edge_count(), 0);
        assert!(layer.is_empty());
        assert!(layer.envelope().is_none());
    }

    #[test]
    fn street_allocates_a_pair() {
        let (layer, [v0, v1, ..]) = super::helpers::square();
        assert_eq!(layer.edge_count(), 8);
        let fwd = layer.edge(EdgeId(0)).unwrap();
        let back = layer.edge(EdgeId(1)).unwrap();
        assert!(fwd.is_forward());
        assert!(!back.is_forward());
        assert_eq!((fwd.from_vertex(), fwd.to_vertex()), (v0, v1));
        assert_eq!((back.from_vertex(), back.to_vertex()), (v1, v0));
        assert_eq!(fwd.length_mm(), back.length_mm());
    }

    #[test]
    fn edge_pairing_holds_everywhere() {
        let layer = super::helpers::random_layer(7, 40, 120);
        for e in layer.edge_store().forward_edges() {
            let id = e.id();
            assert_eq!(id.0 % 2, 0);
            assert_eq!(id.partner(), EdgeId(id.0 + 1));
            assert_eq!(id.partner().partner(), id);
            let p = e.partner();
            assert_eq!(e.from_vertex(), p.to_vertex());
            assert_eq!(e.to_vertex(), p.from_vertex());
        }
    }

    #[test]
    fn one_way_backward_is_closed() {
        let mut b = StreetLayerBuilder::new();
        let a = b.add_vertex(GeoPoint::new(45.0, 7.0));
        let c = b.add_vertex(GeoPoint::new(45.0, 7.001));
        let fwd = b.add_street(Street::new(a, c, super::helpers::all_modes(10.0)).one_way()).unwrap();
        let layer = b.build();

        let e = layer.edge(fwd).unwrap();
        assert_eq!(e.permissions_string(), "PEDESTRIAN|BIKE|CAR");
        assert_eq!(e.partner().permissions(), PermissionFlags::empty());
        assert_eq!(e.partner().permissions_string(), "");
        assert_eq!(e.speed_cm_s(), 1000);
        assert_eq!(e.speed_ms(), 10.0);
    }

    #[test]
    fn backward_geometry_is_reversed() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex(o.offset_m(0.0, 100.0));
        let bend = o.offset_m(20.0, 50.0);
        let fwd = b.add_street(Street::new(a, c, super::helpers::walk_only()).via([bend])).unwrap();
        let layer = b.build();

        let e = layer.edge(fwd).unwrap();
        let forward = e.geometry();
        let mut backward = e.partner().geometry();
        assert_eq!(forward.len(), 3);
        assert_eq!(forward[1], bend.to_fixed());
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(e.envelope(), e.partner().envelope());
    }

    #[test]
    fn derived_length_matches_geometry() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex(o.offset_m(100.0, 0.0));
        let fwd = b.add_street(Street::new(a, c, super::helpers::walk_only())).unwrap();
        let layer = b.build();
        let len = layer.edge(fwd).unwrap().length_mm() as i64;
        assert!((len - 100_000).abs() < 50, "length {len} mm");
    }

    #[test]
    fn out_of_range_ids_are_errors() {
        let (layer, _) = super::helpers::square();
        assert!(matches!(
            layer.vertex(VertexId(99)),
            Err(StreetError::VertexOutOfRange { count: 4, .. })
        ));
        assert!(matches!(
            layer.edge(EdgeId(8)),
            Err(StreetError::EdgeOutOfRange { count: 8, .. })
        ));
        assert!(layer.outgoing_edges(VertexId(4)).is_err());
        assert!(matches!(
            layer.out_degree(VertexId(4)),
            Err(StreetError::VertexOutOfRange { count: 4, .. })
        ));
    }

    #[test]
    fn add_street_rejects_unknown_vertex() {
        let mut b = StreetLayerBuilder::new();
        let a = b.add_vertex(GeoPoint::new(45.0, 7.0));
        let res = b.add_street(Street::new(a, VertexId(3), super::helpers::walk_only()));
        assert!(matches!(res, Err(StreetError::VertexOutOfRange { .. })));
        assert_eq!(b.edge_count(), 0);
    }

    #[test]
    fn push_pair_rejects_degenerate_geometry() {
        let mut edges = EdgeStore::new();
        let p = FixedPoint::new(450_000_000, 70_000_000);
        let attrs = EdgeAttrs::new(PermissionFlags::CAR, 10.0);
        let res = edges.push_pair(VertexId(0), VertexId(1), 1000, &[p], attrs, attrs);
        assert!(matches!(res, Err(StreetError::InvalidGeometry { .. })));
        assert!(edges.is_empty());
    }

    #[test]
    fn from_stores_validates_endpoints() {
        let mut vertices = VertexStore::new();
        let a = vertices.push_floating(GeoPoint::new(45.0, 7.0));
        let mut edges = EdgeStore::new();
        let p = FixedPoint::new(450_000_000, 70_000_000);
        let attrs = EdgeAttrs::new(PermissionFlags::CAR, 10.0);
        edges.push_pair(a, VertexId(5), 1000, &[p, p], attrs, attrs).unwrap();
        assert!(matches!(
            StreetLayer::from_stores(vertices, edges),
            Err(StreetError::VertexOutOfRange { .. })
        ));
    }

    #[test]
    fn csr_outgoing_edges() {
        let (layer, [v0, v1, v2, v3]) = super::helpers::square();
        for v in [v0, v1, v2, v3] {
            assert_eq!(layer.out_degree(v).unwrap(), 2);
            let out = layer.outgoing_edges(v).unwrap();
            assert!(out.windows(2).all(|w| w[0] < w[1]), "ascending");
            for &e in out {
                assert_eq!(layer.edge(e).unwrap().from_vertex(), v);
            }
        }
        // v0 leaves along e0 (v0→v1) and e7 (backward of v3→v0).
        assert_eq!(layer.outgoing_edges(v0).unwrap().to_vec(), vec![EdgeId(0), EdgeId(7)]);
    }
}

// ── Spatial index ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod spatial {
    use sr_core::{EdgeId, Envelope, GeoPoint};

    use crate::StreetError;

    #[test]
    fn index_holds_forward_edges_only() {
        let (layer, _) = super::helpers::square();
        assert_eq!(layer.spatial_index().len(), 4);
        let env = layer.envelope().unwrap();
        let ids = layer.spatial_index().query(&env);
        assert_eq!(ids, vec![EdgeId(0), EdgeId(2), EdgeId(4), EdgeId(6)]);
    }

    #[test]
    fn query_near_one_side() {
        let (layer, _) = super::helpers::square();
        // 30 m around the middle of the bottom side touches only v0-v1.
        let p = super::helpers::origin().offset_m(0.0, 50.0);
        let ids = layer.spatial_index().query(&Envelope::around(p, 30.0));
        assert_eq!(ids, vec![EdgeId(0)]);
    }

    #[test]
    fn query_far_away_is_empty() {
        let (layer, _) = super::helpers::square();
        let env = Envelope::around(GeoPoint::new(10.0, 10.0), 500.0);
        assert!(layer.spatial_index().query(&env).is_empty());
    }

    #[test]
    fn result_cap_refuses_large_queries() {
        let (layer, _) = super::helpers::square();
        let env = layer.envelope().unwrap();
        assert!(matches!(
            layer.edges_in_envelope(&env, 2),
            Err(StreetError::ResultTooLarge { count: 4, cap: 2 })
        ));
        assert_eq!(layer.edges_in_envelope(&env, 4).unwrap().len(), 4);
    }
}

// ── Split resolution ──────────────────────────────────────────────────────────

#[cfg(test)]
mod split {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use sr_core::{EdgeId, GeoPoint, Mode};

    use crate::{EdgeAttrs, PermissionFlags, Street, StreetLayerBuilder, find_split};

    #[test]
    fn point_fifty_metres_off_an_edge() {
        let (layer, vs) = super::helpers::line(2, 200.0, super::helpers::walk_only());
        let p = super::helpers::origin().offset_m(50.0, 100.0);

        let split = layer.find_split(p.lat, p.lon, 200.0, Mode::Walk).unwrap();
        assert_eq!(split.edge, EdgeId(0));
        assert_eq!((split.vertex0, split.vertex1), (vs[0], vs[1]));
        assert_eq!(split.distance0_mm + split.distance1_mm, 200_000);
        assert!((split.distance0_mm as i64 - 100_000).abs() < 500, "{split:?}");
        // The split point sits on the edge, not at the query point.
        assert!(split.point().to_floating().distance_m(p) > 49.0);

        assert!(layer.find_split(p.lat, p.lon, 10.0, Mode::Walk).is_none());
    }

    #[test]
    fn split_at_endpoints_clamps() {
        let (layer, _) = super::helpers::line(2, 200.0, super::helpers::walk_only());
        // 30 m west of the first vertex: projection clamps to vertex0.
        let p = super::helpers::origin().offset_m(0.0, -30.0);
        let split = layer.find_split(p.lat, p.lon, 200.0, Mode::Walk).unwrap();
        assert_eq!(split.distance0_mm, 0);
        assert_eq!(split.distance1_mm, 200_000);
    }

    #[test]
    fn completeness_on_random_points() {
        let layer = super::helpers::random_layer(11, 60, 150);
        let mut rng = SmallRng::seed_from_u64(99);
        let mut found = 0;
        for _ in 0..300 {
            let p = super::helpers::origin()
                .offset_m(rng.gen_range(-1200.0..1200.0), rng.gen_range(-1200.0..1200.0));
            for mode in Mode::ALL {
                let Some(split) = find_split(&layer, p, 300.0, mode) else { continue };
                found += 1;
                let edge = layer.edge(split.edge).unwrap();
                assert!(edge.is_forward());
                assert!(edge.allows(mode) || edge.partner().allows(mode));
                assert_eq!(split.distance0_mm + split.distance1_mm, edge.length_mm());
                assert!(split.distance0_mm <= edge.length_mm());
                assert_eq!(split.vertex0, edge.from_vertex());
                assert_eq!(split.vertex1, edge.to_vertex());
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn ties_go_to_the_lowest_edge_id() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex(o.offset_m(0.0, 100.0));
        let walk = super::helpers::walk_only();
        b.add_street(Street::new(a, c, walk)).unwrap();
        b.add_street(Street::new(a, c, walk)).unwrap();
        let layer = b.build();

        let p = o.offset_m(10.0, 50.0);
        let split = layer.find_split(p.lat, p.lon, 100.0, Mode::Walk).unwrap();
        assert_eq!(split.edge, EdgeId(0));
    }

    #[test]
    fn mode_filter_skips_forbidden_edges() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        // Footpath 10 m south of the query point, road 40 m north of it.
        let a = b.add_vertex(o.offset_m(-10.0, 0.0));
        let c = b.add_vertex(o.offset_m(-10.0, 100.0));
        let d = b.add_vertex(o.offset_m(40.0, 0.0));
        let e = b.add_vertex(o.offset_m(40.0, 100.0));
        b.add_street(Street::new(a, c, super::helpers::walk_only())).unwrap();
        let road = b
            .add_street(Street::new(d, e, EdgeAttrs::new(PermissionFlags::CAR, 10.0)))
            .unwrap();
        let layer = b.build();

        let p = o.offset_m(0.0, 50.0);
        assert_eq!(layer.find_split(p.lat, p.lon, 200.0, Mode::Walk).unwrap().edge, EdgeId(0));
        assert_eq!(layer.find_split(p.lat, p.lon, 200.0, Mode::Car).unwrap().edge, road);
        assert!(layer.find_split(p.lat, p.lon, 200.0, Mode::Bike).is_none());
    }

    #[test]
    fn one_way_pair_is_a_candidate_in_either_direction() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex(o.offset_m(0.0, 100.0));
        let car = EdgeAttrs::new(PermissionFlags::CAR, 10.0);
        // Only the backward direction is open.
        b.add_street(Street::new(a, c, EdgeAttrs::closed()).backward(car)).unwrap();
        let layer = b.build();

        let p = o.offset_m(5.0, 50.0);
        assert!(layer.find_split(p.lat, p.lon, 50.0, Mode::Car).is_some());
    }

    #[test]
    fn invalid_radius_finds_nothing() {
        let (layer, _) = super::helpers::square();
        let p = super::helpers::origin();
        assert!(layer.find_split(p.lat, p.lon, -1.0, Mode::Walk).is_none());
        assert!(layer.find_split(p.lat, p.lon, f64::NAN, Mode::Walk).is_none());
        assert!(find_split(&layer, GeoPoint::new(0.0, 0.0), 200.0, Mode::Walk).is_none());
    }

    #[test]
    fn non_finite_coordinates_find_nothing() {
        // An edge at (0, 0), where a non-finite point lands once converted
        // to fixed point.
        let mut b = StreetLayerBuilder::new();
        let a = b.add_vertex(GeoPoint::new(0.0, 0.0));
        let c = b.add_vertex(GeoPoint::new(0.0, 0.001));
        b.add_street(Street::new(a, c, super::helpers::walk_only())).unwrap();
        let layer = b.build();

        assert!(layer.find_split(0.0, 0.0005, 200.0, Mode::Walk).is_some());
        assert!(layer.find_split(f64::NAN, f64::NAN, 200.0, Mode::Walk).is_none());
        assert!(layer.find_split(0.0, f64::NAN, 200.0, Mode::Walk).is_none());
        assert!(layer.find_split(f64::INFINITY, 0.0, 200.0, Mode::Walk).is_none());
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use sr_core::{EdgeId, Mode, VertexId};

    use crate::{
        CostModel, EdgeAttrs, EdgeFlags, PermissionFlags, RouterError, SearchLimits, SearchStatus,
        Street, StreetLayerBuilder, StreetRouter, TraceKind, TraceVisitor, VertexFlags,
    };

    const EPS: f64 = 0.05;

    #[test]
    fn square_corner_to_corner() {
        let (layer, [v0, _, v2, _]) = super::helpers::square();
        let mut router = StreetRouter::new(&layer, Mode::Walk);
        router.set_origin_vertex(v0).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::Exhausted);
        assert_eq!(summary.settled, 4);

        let state = *router.best_state(v2).unwrap();
        assert!((state.weight - 200.0 / 1.4).abs() < 1e-9);
        assert_eq!(router.path(&state).len(), 2);
        // Each leg rounds to whole milliseconds.
        assert_eq!(state.time_ms, 2 * 71_429);
    }

    #[test]
    fn square_between_mid_edge_points() {
        let (layer, _) = super::helpers::square();
        let o = super::helpers::origin();
        let from = o.offset_m(0.0, 50.0);
        let to = o.offset_m(100.0, 50.0);

        let mut router = StreetRouter::new(&layer, Mode::Walk);
        assert!(router.set_origin(from.lat, from.lon));
        let dest = layer.find_split(to.lat, to.lon, 200.0, Mode::Walk).unwrap();
        assert_eq!(dest.edge, EdgeId(4));
        router.route().unwrap();

        let state = router.get_state(&dest).unwrap();
        assert!((state.weight - 200.0 / 1.4).abs() < EPS, "weight {}", state.weight);
        let path = router.path(&state);
        assert_eq!(path.len(), 3);
        assert_eq!(path.last().map(|e| e.forward()), Some(EdgeId(4)));
    }

    #[test]
    fn walk_only_connector_blocks_cars() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let vs: Vec<VertexId> =
            (0..4).map(|i| b.add_vertex(o.offset_m(0.0, 100.0 * i as f64))).collect();
        let road = super::helpers::all_modes(10.0);
        b.add_street(Street::new(vs[0], vs[1], road).length_mm(100_000)).unwrap();
        b.add_street(Street::new(vs[1], vs[2], super::helpers::walk_only()).length_mm(100_000))
            .unwrap();
        b.add_street(Street::new(vs[2], vs[3], road).length_mm(100_000)).unwrap();
        let layer = b.build();

        let from = o.offset_m(0.0, 50.0);
        let to = o.offset_m(0.0, 250.0);
        for (mode, reachable) in [(Mode::Car, false), (Mode::Walk, true)] {
            let mut router = StreetRouter::new(&layer, mode);
            assert!(router.set_origin(from.lat, from.lon));
            let dest = layer.find_split(to.lat, to.lon, 200.0, mode).unwrap();
            router.route().unwrap();
            assert_eq!(router.get_state(&dest).is_some(), reachable, "{mode}");
        }
    }

    #[test]
    fn shared_edge_goes_direct() {
        let (layer, _) = super::helpers::line(2, 200.0, super::helpers::walk_only());
        let o = super::helpers::origin();
        let a = o.offset_m(0.0, 50.0);
        let c = o.offset_m(0.0, 150.0);

        for (from, to) in [(a, c), (c, a)] {
            let mut router = StreetRouter::new(&layer, Mode::Walk);
            assert!(router.set_origin(from.lat, from.lon));
            let dest = layer.find_split(to.lat, to.lon, 200.0, Mode::Walk).unwrap();
            router.route().unwrap();
            let state = router.get_state(&dest).unwrap();
            assert!((state.weight - 100.0 / 1.4).abs() < EPS, "weight {}", state.weight);
            assert_eq!(router.path(&state).len(), 1);
            assert!(state.back_state.is_none());
        }
    }

    #[test]
    fn one_way_blocks_return() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex(o.offset_m(0.0, 100.0));
        b.add_street(Street::new(a, c, super::helpers::all_modes(10.0)).one_way()).unwrap();
        let layer = b.build();
        let near_a = layer.find_split(o.lat, o.lon, 50.0, Mode::Car).unwrap();
        let p = o.offset_m(0.0, 100.0);
        let near_c = layer.find_split(p.lat, p.lon, 50.0, Mode::Car).unwrap();

        let mut router = StreetRouter::new(&layer, Mode::Car);
        router.set_origin_vertex(a).unwrap();
        router.route().unwrap();
        assert!(router.get_state(&near_c).is_some());

        let mut router = StreetRouter::new(&layer, Mode::Car);
        router.set_origin_vertex(c).unwrap();
        router.route().unwrap();
        assert!(router.get_state(&near_a).is_none());
        assert!(!router.is_settled(a));
    }

    #[test]
    fn route_without_origin_fails() {
        let (layer, _) = super::helpers::square();
        let mut router = StreetRouter::new(&layer, Mode::Walk);
        assert!(matches!(router.route(), Err(RouterError::OriginNotSet)));

        // A failed snap clears the origin.
        assert!(!router.set_origin(10.0, 10.0));
        assert!(matches!(router.route(), Err(RouterError::OriginNotSet)));
        assert!(router.origin_split().is_none());
    }

    #[test]
    fn matches_brute_force() {
        let cost = super::helpers::random_cost();
        for seed in 0..20 {
            let layer = super::helpers::random_layer(seed, 30, 70);
            for mode in Mode::ALL {
                let expected = super::helpers::brute_force(&layer, &cost, mode, VertexId(0));
                let mut router = StreetRouter::new(&layer, mode).with_cost(cost.clone());
                router.set_origin_vertex(VertexId(0)).unwrap();
                let summary = router.route().unwrap();
                assert_eq!(summary.status, SearchStatus::Exhausted);

                for (i, want) in expected.iter().enumerate() {
                    let v = VertexId(i as u32);
                    assert_eq!(router.is_settled(v), want.is_some(), "seed {seed} {mode} {v}");
                    if let Some(want) = want {
                        let got = router.best_state(v).unwrap().weight;
                        assert!((got - want).abs() < 1e-6, "seed {seed} {mode} {v}: {got} vs {want}");
                    }
                }
            }
        }
    }

    #[test]
    fn back_chain_is_monotonic() {
        let cost = super::helpers::random_cost();
        for seed in 0..10 {
            let layer = super::helpers::random_layer(seed, 30, 70);
            let mut router = StreetRouter::new(&layer, Mode::Bike).with_cost(cost.clone());
            router.set_origin_vertex(VertexId(0)).unwrap();
            router.route().unwrap();
            for v in router.settled_vertices().collect::<Vec<_>>() {
                let chain = router.chain(router.best_state(v).unwrap());
                assert_eq!(chain[0].vertex, VertexId(0));
                assert!(chain[0].back_edge.is_none());
                for w in chain.windows(2) {
                    assert!(w[0].weight <= w[1].weight);
                    assert!(w[0].time_ms <= w[1].time_ms);
                    let e = layer.edge(w[1].back_edge.unwrap()).unwrap();
                    assert_eq!(e.from_vertex(), w[0].vertex);
                    assert_eq!(e.to_vertex(), w[1].vertex);
                }
            }
        }
    }

    #[test]
    fn repeated_and_concurrent_runs_agree() {
        let layer = super::helpers::random_layer(3, 50, 140);
        let run = || {
            let mut router = StreetRouter::new(&layer, Mode::Walk);
            router.set_origin_vertex(VertexId(0)).unwrap();
            router.route().unwrap();
            (0..layer.vertex_count())
                .map(|i| {
                    router.best_state(VertexId(i as u32)).map(|s| (s.weight, router.path(s)))
                })
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(run)).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in results {
            assert_eq!(r, first);
        }
    }

    #[test]
    fn visitor_observes_without_changing_results() {
        let layer = super::helpers::random_layer(5, 40, 100);
        let mut plain = StreetRouter::new(&layer, Mode::Car);
        plain.set_origin_vertex(VertexId(0)).unwrap();
        let a = plain.route().unwrap();

        let mut traced = StreetRouter::new(&layer, Mode::Car);
        traced.set_origin_vertex(VertexId(0)).unwrap();
        let mut trace = TraceVisitor::new();
        let b = traced.route_observed(&mut trace).unwrap();

        assert_eq!(a, b);
        for v in plain.settled_vertices() {
            assert_eq!(plain.best_state(v), traced.best_state(v));
        }
        assert_eq!(trace.settled().count(), b.settled);
        let frontier = trace.events().iter().filter(|e| e.kind == TraceKind::Frontier).count();
        assert_eq!(frontier, b.states);
        let weights: Vec<f64> = trace.settled().map(|e| e.weight).collect();
        assert!(weights.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn settled_limit_stops_early() {
        let (layer, vs) = super::helpers::line(5, 100.0, super::helpers::walk_only());
        let limits = SearchLimits { max_settled: Some(2), ..SearchLimits::default() };
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_limits(limits);
        router.set_origin_vertex(vs[0]).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::SettledLimit);
        assert!(!summary.status.is_complete());
        assert_eq!(router.settled_count(), 2);
        assert!(!router.is_settled(vs[2]));
    }

    #[test]
    fn weight_limit_prunes() {
        let (layer, vs) = super::helpers::line(5, 100.0, super::helpers::walk_only());
        let limits = SearchLimits { max_weight: Some(150.0), ..SearchLimits::default() };
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_limits(limits);
        router.set_origin_vertex(vs[0]).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::WeightLimit);
        assert_eq!(summary.settled, 3);
        assert!(router.is_settled(vs[2]));
        assert!(router.best_state(vs[3]).is_none());
    }

    #[test]
    fn settled_limit_ignores_stale_queue_entries() {
        // v0→v1 directly is 100 m, via v2 only 60 m, so the direct label
        // for v1 is left behind in the queue once v1 settles.
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let v0 = b.add_vertex(o);
        let v1 = b.add_vertex(o.offset_m(0.0, 100.0));
        let v2 = b.add_vertex(o.offset_m(30.0, 50.0));
        let walk = super::helpers::walk_only();
        b.add_street(Street::new(v0, v1, walk).length_mm(100_000).one_way()).unwrap();
        b.add_street(Street::new(v0, v2, walk).length_mm(50_000).one_way()).unwrap();
        b.add_street(Street::new(v2, v1, walk).length_mm(10_000).one_way()).unwrap();
        let layer = b.build();

        let limits = SearchLimits { max_settled: Some(3), ..SearchLimits::default() };
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_limits(limits);
        router.set_origin_vertex(v0).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::Exhausted);
        assert!(summary.status.is_complete());
        assert_eq!(summary.settled, 3);
        assert!((router.best_state(v1).unwrap().weight - 60.0 / 1.4).abs() < EPS);
    }

    #[test]
    fn weight_limit_only_when_something_is_cut_off() {
        // v1 is offered once over the limit along v0→v1 but is reached more
        // cheaply via v2, so nothing is lost.
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let v0 = b.add_vertex(o);
        let v1 = b.add_vertex(o.offset_m(0.0, 100.0));
        let v2 = b.add_vertex(o.offset_m(30.0, 50.0));
        let walk = super::helpers::walk_only();
        b.add_street(Street::new(v0, v1, walk).length_mm(300_000).one_way()).unwrap();
        b.add_street(Street::new(v0, v2, walk).length_mm(50_000).one_way()).unwrap();
        b.add_street(Street::new(v2, v1, walk).length_mm(50_000).one_way()).unwrap();
        let layer = b.build();

        let limits = SearchLimits { max_weight: Some(150.0), ..SearchLimits::default() };
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_limits(limits);
        router.set_origin_vertex(v0).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::Exhausted);
        assert_eq!(summary.settled, 3);

        // A bound that really cuts v1 off is still reported.
        let limits = SearchLimits { max_weight: Some(50.0), ..SearchLimits::default() };
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_limits(limits);
        router.set_origin_vertex(v0).unwrap();
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::WeightLimit);
        assert!(router.best_state(v1).is_none());
    }

    #[test]
    fn destination_ends_search_early() {
        let (layer, vs) = super::helpers::line(10, 100.0, super::helpers::walk_only());
        let p = super::helpers::origin().offset_m(0.0, 150.0);
        let dest = layer.find_split(p.lat, p.lon, 50.0, Mode::Walk).unwrap();
        assert_eq!(dest.edge, EdgeId(2));

        let mut router = StreetRouter::new(&layer, Mode::Walk);
        router.set_origin_vertex(vs[0]).unwrap();
        router.set_destination(dest);
        let summary = router.route().unwrap();
        assert_eq!(summary.status, SearchStatus::ReachedDestination);
        assert_eq!(summary.settled, 3);
        let state = router.get_state(&dest).unwrap();
        assert!((state.weight - 150.0 / 1.4).abs() < EPS);
    }

    #[test]
    fn traffic_signals_delay_cars_not_walkers() {
        let mut b = StreetLayerBuilder::new();
        let o = super::helpers::origin();
        let a = b.add_vertex(o);
        let c = b.add_vertex_with_flags(o.offset_m(0.0, 100.0), VertexFlags::TRAFFIC_SIGNAL);
        b.add_street(Street::new(a, c, super::helpers::all_modes(10.0)).length_mm(100_000))
            .unwrap();
        let layer = b.build();
        let cost = CostModel { traffic_signal_delay_secs: 30.0, ..CostModel::default() };

        let mut car = StreetRouter::new(&layer, Mode::Car).with_cost(cost.clone());
        car.set_origin_vertex(a).unwrap();
        car.route().unwrap();
        let s = car.best_state(c).unwrap();
        assert!((s.weight - 40.0).abs() < 1e-9);
        assert_eq!(s.time_ms, 40_000);

        let mut walk = StreetRouter::new(&layer, Mode::Walk).with_cost(cost);
        walk.set_origin_vertex(a).unwrap();
        walk.route().unwrap();
        assert!((walk.best_state(c).unwrap().weight - 100.0 / 1.4).abs() < 1e-9);
    }

    #[test]
    fn stairs_cost_weight_not_time() {
        let stairs = EdgeAttrs::new(PermissionFlags::PEDESTRIAN, 1.4).with_flags(EdgeFlags::STAIRS);
        let (layer, vs) = super::helpers::line(2, 14.0, stairs);
        let mut router = StreetRouter::new(&layer, Mode::Walk).with_start_time_ms(1_000);
        router.set_origin_vertex(vs[0]).unwrap();
        router.route().unwrap();
        let s = router.best_state(vs[1]).unwrap();
        assert!((s.weight - 30.0).abs() < 1e-9);
        assert_eq!(s.time_ms, 11_000);
    }

    #[test]
    fn zero_speed_edges_are_impassable_by_car() {
        let (layer, vs) = super::helpers::line(2, 100.0, super::helpers::all_modes(0.0));
        let mut router = StreetRouter::new(&layer, Mode::Car);
        router.set_origin_vertex(vs[0]).unwrap();
        router.route().unwrap();
        assert!(!router.is_settled(vs[1]));
    }
}
