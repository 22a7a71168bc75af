//! Interactive map canvas: feature layer, boundary layer and boundary drawing.
//!
//! Layers are rebuilt from scratch whenever their source changes. Errors
//! raised by the surface are presentation problems only; they are logged and
//! dropped so the caller never sees them.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{ClusterOptions, build_point_layer},
    draw::{DrawState, boundary_collection, empty_collection},
    geometry::{BoundingBox, LngLat, bounding_box_of},
    surface::{MapSurface, Padding, SurfaceError},
};

/// Receives the drawn boundary: one polygon on finish, nothing on clear.
pub type DrawListener = Box<dyn FnMut(FeatureCollection) + Send>;

/// A renderable feature with an optional precomputed centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFeature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Vec<f64>>,
}

impl MapFeature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            centroid: None,
        }
    }

    pub fn point(lng: f64, lat: f64) -> Self {
        Self::new(Geometry::new(Value::Point(vec![lng, lat])))
    }

    fn is_point(&self) -> bool {
        matches!(
            self.geometry.as_ref().map(|g| &g.value),
            Some(Value::Point(_))
        )
    }

    /// Marker position of a point feature, falling back to the centroid when
    /// the point coordinates are unusable.
    fn marker_position(&self) -> Option<LngLat> {
        let from_geometry = match self.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(position)) => LngLat::from_position(position),
            _ => None,
        };
        from_geometry.or_else(|| {
            self.centroid
                .as_deref()
                .and_then(LngLat::from_position)
        })
    }
}

/// Canvas options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasOptions {
    pub padding: Padding,
    pub cluster: ClusterOptions,
}

/// Map canvas driving a [`MapSurface`].
pub struct MapCanvas<S: MapSurface> {
    surface: S,
    options: CanvasOptions,
    draw: DrawState,
    rendered_boundary: Option<FeatureCollection>,
    on_draw_change: Option<DrawListener>,
}

impl<S: MapSurface> MapCanvas<S> {
    pub fn new(surface: S, options: CanvasOptions) -> Self {
        Self {
            surface,
            options,
            draw: DrawState::new(),
            rendered_boundary: None,
            on_draw_change: None,
        }
    }

    /// Register the callback receiving finished and cleared boundaries.
    pub fn with_draw_listener(mut self, listener: DrawListener) -> Self {
        self.on_draw_change = Some(listener);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    /// Boundary currently shown on the boundary layer.
    pub fn rendered_boundary(&self) -> Option<&FeatureCollection> {
        self.rendered_boundary.as_ref()
    }

    /// Replace the feature layer with `features`.
    ///
    /// Non-point geometries become polygons; points become markers, clustered
    /// when the surface supports it and there are enough of them. An empty
    /// slice just clears the layer.
    pub fn set_features(&mut self, features: &[MapFeature]) {
        let cleared = self.surface.clear_features();
        log_surface_error("clear features", cleared);

        let (points, shapes): (Vec<&MapFeature>, Vec<&MapFeature>) =
            features.iter().partition(|f| f.is_point());

        let polygons: Vec<Feature> = shapes
            .into_iter()
            .filter_map(|f| f.geometry.clone())
            .map(feature_of)
            .collect();
        if !polygons.is_empty() {
            let collection = collection_of(polygons);
            let added = self.surface.add_polygons(&collection);
            log_surface_error("add polygons", added);
        }

        let positions: Vec<LngLat> = points
            .into_iter()
            .filter_map(MapFeature::marker_position)
            .collect();
        if !positions.is_empty() {
            let layer = build_point_layer(
                positions,
                self.surface.zoom(),
                self.surface.supports_clustering(),
                &self.options.cluster,
            );
            tracing::debug!("Rendering {} point markers", layer.point_count());
            let added = self.surface.add_markers(&layer);
            log_surface_error("add markers", added);
        }
    }

    /// Replace the boundary overlay and frame the camera on it.
    pub fn set_boundary(&mut self, boundary: Option<GeoJson>) {
        let Some(boundary) = boundary else {
            self.clear_boundary_layer();
            return;
        };
        let bbox = bounding_box_of(&boundary);
        self.render_boundary(into_collection(boundary));
        if let Some(bbox) = bbox {
            self.fit_to_bounds(bbox);
        }
    }

    /// Frame the camera on `bbox` with the configured padding.
    ///
    /// Does nothing until the surface is ready.
    pub fn fit_to_bounds(&mut self, bbox: BoundingBox) {
        if !self.surface.is_ready() {
            tracing::debug!("Skipping fit to bounds: surface not ready");
            return;
        }
        let fitted = self.surface.fit_bounds(bbox, self.options.padding);
        log_surface_error("fit bounds", fitted);
    }

    /// Toggle drawing mode. Returns whether drawing is now active.
    pub fn toggle_draw(&mut self) -> bool {
        let active = self.draw.toggle();
        tracing::debug!("Drawing {}", if active { "enabled" } else { "disabled" });
        active
    }

    /// Handle a pointer click at `point`. Ignored unless drawing is active.
    pub fn pointer_click(&mut self, point: LngLat) {
        if !self.draw.is_active() {
            return;
        }
        self.draw.push(point);
        self.render_preview();
    }

    /// Close the drawn ring, show it as the boundary, notify the listener and
    /// stop drawing.
    ///
    /// Returns `false` without touching anything when fewer than three
    /// distinct vertices were drawn.
    pub fn finish_drawing(&mut self) -> bool {
        if !self.draw.can_finish() {
            return false;
        }
        let collection = self.draw.to_collection(true);
        self.render_boundary(collection.clone());
        self.draw.set_active(false);
        self.draw.clear();
        self.emit(collection);
        true
    }

    /// Remove the most recent vertex. Returns `false` when there was none.
    pub fn undo_last_vertex(&mut self) -> bool {
        if self.draw.pop().is_none() {
            return false;
        }
        self.render_preview();
        true
    }

    /// Drop the drawn vertices and the boundary, and notify the listener with
    /// an empty collection.
    pub fn clear_boundary(&mut self) {
        self.draw.clear();
        self.clear_boundary_layer();
        self.emit(empty_collection());
    }

    fn render_preview(&mut self) {
        let preview = boundary_collection(self.draw.vertices(), false);
        if preview.features.is_empty() {
            self.clear_boundary_layer();
        } else {
            self.render_boundary(preview);
        }
    }

    fn render_boundary(&mut self, collection: FeatureCollection) {
        let rendered = self.surface.set_preview_geometry(&collection);
        log_surface_error("set boundary", rendered);
        self.rendered_boundary = Some(collection);
    }

    fn clear_boundary_layer(&mut self) {
        let cleared = self.surface.clear_preview_geometry();
        log_surface_error("clear boundary", cleared);
        self.rendered_boundary = None;
    }

    fn emit(&mut self, collection: FeatureCollection) {
        if let Some(listener) = self.on_draw_change.as_mut() {
            listener(collection);
        }
    }
}

fn log_surface_error(operation: &str, result: Result<(), SurfaceError>) {
    if let Err(e) = result {
        tracing::debug!("Ignoring surface error during {}: {}", operation, e);
    }
}

fn feature_of(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(Default::default()),
        foreign_members: None,
    }
}

fn collection_of(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn into_collection(geojson: GeoJson) -> FeatureCollection {
    match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => collection_of(vec![feature]),
        GeoJson::Geometry(geometry) => collection_of(vec![feature_of(geometry)]),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        cluster::PointLayer,
        surface::MockMapSurface,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fit(BoundingBox),
        SetPreview(FeatureCollection),
        ClearPreview,
        ClearFeatures,
        AddPolygons(usize),
        AddMarkers(PointLayer),
    }

    /// Surface that records every call.
    struct RecordingSurface {
        ready: bool,
        clustering: bool,
        calls: Vec<Call>,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                ready: true,
                clustering: true,
                calls: Vec::new(),
            }
        }
    }

    impl MapSurface for RecordingSurface {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn zoom(&self) -> f64 {
            5.0
        }

        fn supports_clustering(&self) -> bool {
            self.clustering
        }

        fn fit_bounds(&mut self, bbox: BoundingBox, _padding: Padding) -> Result<(), SurfaceError> {
            self.calls.push(Call::Fit(bbox));
            Ok(())
        }

        fn set_preview_geometry(&mut self, boundary: &FeatureCollection) -> Result<(), SurfaceError> {
            self.calls.push(Call::SetPreview(boundary.clone()));
            Ok(())
        }

        fn clear_preview_geometry(&mut self) -> Result<(), SurfaceError> {
            self.calls.push(Call::ClearPreview);
            Ok(())
        }

        fn clear_features(&mut self) -> Result<(), SurfaceError> {
            self.calls.push(Call::ClearFeatures);
            Ok(())
        }

        fn add_polygons(&mut self, polygons: &FeatureCollection) -> Result<(), SurfaceError> {
            self.calls.push(Call::AddPolygons(polygons.features.len()));
            Ok(())
        }

        fn add_markers(&mut self, markers: &PointLayer) -> Result<(), SurfaceError> {
            self.calls.push(Call::AddMarkers(markers.clone()));
            Ok(())
        }
    }

    type Emitted = Arc<Mutex<Vec<FeatureCollection>>>;

    fn create_test_canvas() -> (MapCanvas<RecordingSurface>, Emitted) {
        let emitted: Emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();
        let canvas = MapCanvas::new(RecordingSurface::new(), CanvasOptions::default())
            .with_draw_listener(Box::new(move |fc| sink.lock().unwrap().push(fc)));
        (canvas, emitted)
    }

    fn draw(canvas: &mut MapCanvas<RecordingSurface>, vertices: &[(f64, f64)]) {
        if !canvas.draw_state().is_active() {
            canvas.toggle_draw();
        }
        for &(lng, lat) in vertices {
            canvas.pointer_click(LngLat::new(lng, lat));
        }
    }

    fn polygon_ring(collection: &FeatureCollection) -> Vec<Vec<f64>> {
        match &collection.features[0].geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings[0].clone(),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_finish_drawing_closes_ring() {
        // テスト項目: 3 頂点で確定すると閉じた Polygon が描画・通知される
        // given (前提条件):
        let (mut canvas, emitted) = create_test_canvas();
        draw(&mut canvas, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);

        // when (操作):
        let finished = canvas.finish_drawing();

        // then (期待する結果):
        assert!(finished);
        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        let ring = polygon_ring(&emitted[0]);
        assert_eq!(
            ring,
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]]
        );
        assert_eq!(canvas.rendered_boundary(), Some(&emitted[0]));
        assert!(!canvas.draw_state().is_active());
        assert!(canvas.draw_state().is_empty());
    }

    #[test]
    fn test_finish_drawing_ring_has_one_extra_coordinate() {
        // テスト項目: n 頂点から確定したリングは n + 1 座標で先頭と末尾が一致する
        // given (前提条件):
        let (mut canvas, emitted) = create_test_canvas();
        let vertices: Vec<(f64, f64)> = (0..7)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 7.0;
                (angle.cos(), angle.sin())
            })
            .collect();
        draw(&mut canvas, &vertices);

        // when (操作):
        canvas.finish_drawing();

        // then (期待する結果):
        let ring = polygon_ring(&emitted.lock().unwrap()[0]);
        assert_eq!(ring.len(), vertices.len() + 1);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_finish_drawing_below_threshold_is_noop() {
        // テスト項目: 3 頂点未満では確定しても状態・描画・通知が変化しない
        // given (前提条件):
        let (mut canvas, emitted) = create_test_canvas();
        draw(&mut canvas, &[(0.0, 0.0), (1.0, 0.0)]);
        let state_before = canvas.draw_state().clone();
        let boundary_before = canvas.rendered_boundary().cloned();
        let calls_before = canvas.surface().calls.len();

        // when (操作):
        let finished = canvas.finish_drawing();

        // then (期待する結果):
        assert!(!finished);
        assert_eq!(canvas.draw_state(), &state_before);
        assert_eq!(canvas.rendered_boundary().cloned(), boundary_before);
        assert_eq!(canvas.surface().calls.len(), calls_before);
        assert!(emitted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clicks_ignored_while_not_drawing() {
        // テスト項目: 描画モードでないときのクリックは頂点を追加しない
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();

        // when (操作):
        canvas.pointer_click(LngLat::new(1.0, 1.0));

        // then (期待する結果):
        assert!(canvas.draw_state().is_empty());
        assert!(canvas.surface().calls.is_empty());
    }

    #[test]
    fn test_preview_follows_clicks_and_undo() {
        // テスト項目: クリックごとに開いたプレビューが更新され、undo で戻る
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();
        draw(&mut canvas, &[(0.0, 0.0), (2.0, 0.0)]);

        // when (操作):
        let undone = canvas.undo_last_vertex();

        // then (期待する結果):
        assert!(undone);
        assert_eq!(canvas.draw_state().len(), 1);
        let calls = &canvas.surface().calls;
        assert_eq!(calls[0], Call::ClearPreview);
        assert!(matches!(&calls[1], Call::SetPreview(fc) if fc.features.len() == 1));
        assert_eq!(calls[2], Call::ClearPreview);
        assert_eq!(canvas.rendered_boundary(), None);
    }

    #[test]
    fn test_undo_without_vertices_is_noop() {
        // テスト項目: 頂点がない状態での undo は何もしない
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();

        // when (操作):
        let undone = canvas.undo_last_vertex();

        // then (期待する結果):
        assert!(!undone);
        assert!(canvas.surface().calls.is_empty());
    }

    #[test]
    fn test_clear_boundary_emits_empty_collection() {
        // テスト項目: clear で頂点と境界が消え、空のコレクションが通知される
        // given (前提条件):
        let (mut canvas, emitted) = create_test_canvas();
        draw(&mut canvas, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);

        // when (操作):
        canvas.clear_boundary();

        // then (期待する結果):
        assert!(canvas.draw_state().is_empty());
        assert_eq!(canvas.rendered_boundary(), None);
        assert_eq!(canvas.surface().calls.last(), Some(&Call::ClearPreview));
        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].features.is_empty());
    }

    #[test]
    fn test_set_boundary_renders_and_fits_camera() {
        // テスト項目: 境界を設定すると描画され、その bbox にカメラが合わせられる
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();
        let geometry = Geometry::new(Value::Polygon(vec![vec![
            vec![77.23, 28.62],
            vec![77.26, 28.62],
            vec![77.26, 28.65],
            vec![77.23, 28.62],
        ]]));

        // when (操作):
        canvas.set_boundary(Some(GeoJson::Geometry(geometry)));

        // then (期待する結果):
        let calls = &canvas.surface().calls;
        assert!(matches!(&calls[0], Call::SetPreview(fc) if fc.features.len() == 1));
        assert_eq!(
            calls[1],
            Call::Fit(BoundingBox::from_array([77.23, 28.62, 77.26, 28.65]))
        );
    }

    #[test]
    fn test_set_boundary_none_clears_layer() {
        // テスト項目: None を設定すると境界レイヤーがクリアされ、カメラは動かない
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();

        // when (操作):
        canvas.set_boundary(None);

        // then (期待する結果):
        assert_eq!(canvas.surface().calls, vec![Call::ClearPreview]);
    }

    #[test]
    fn test_set_features_partitions_points_and_polygons() {
        // テスト項目: 点とポリゴンが別々に描画され、少数の点は通常マーカーになる
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();
        let polygon = MapFeature::new(Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]])));
        let broken_point = MapFeature {
            geometry: Some(Geometry::new(Value::Point(vec![]))),
            centroid: Some(vec![5.0, 6.0]),
        };
        let features = vec![MapFeature::point(1.0, 2.0), polygon, broken_point];

        // when (操作):
        canvas.set_features(&features);

        // then (期待する結果):
        assert_eq!(
            canvas.surface().calls,
            vec![
                Call::ClearFeatures,
                Call::AddPolygons(1),
                Call::AddMarkers(PointLayer::Plain(vec![
                    LngLat::new(1.0, 2.0),
                    LngLat::new(5.0, 6.0)
                ])),
            ]
        );
    }

    #[test]
    fn test_set_features_clusters_dense_points() {
        // テスト項目: 多数の点はクラスタ化されて描画される
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();
        let features: Vec<MapFeature> = (0..120)
            .map(|i| MapFeature::point(77.0 + (i % 10) as f64 * 0.001, 28.0))
            .collect();

        // when (操作):
        canvas.set_features(&features);

        // then (期待する結果):
        match canvas.surface().calls.last() {
            Some(Call::AddMarkers(PointLayer::Clustered(clusters))) => {
                assert_eq!(clusters.len(), 1);
                assert_eq!(clusters[0].count(), 120);
            }
            other => panic!("expected clustered markers, got {:?}", other),
        }
    }

    #[test]
    fn test_set_features_empty_clears_layer() {
        // テスト項目: 空のコレクションはレイヤーをクリアするだけ
        // given (前提条件):
        let (mut canvas, _emitted) = create_test_canvas();

        // when (操作):
        canvas.set_features(&[]);

        // then (期待する結果):
        assert_eq!(canvas.surface().calls, vec![Call::ClearFeatures]);
    }

    #[test]
    fn test_fit_to_bounds_is_noop_until_ready() {
        // テスト項目: サーフェス未初期化の間は fit_to_bounds が何もしない
        // given (前提条件):
        let mut surface = MockMapSurface::new();
        surface.expect_is_ready().return_const(false);
        surface.expect_fit_bounds().never();
        let mut canvas = MapCanvas::new(surface, CanvasOptions::default());

        // when (操作):
        canvas.fit_to_bounds(BoundingBox::from_array([0.0, 0.0, 1.0, 1.0]));

        // then (期待する結果): never() の期待が満たされる
    }

    #[test]
    fn test_surface_errors_are_swallowed() {
        // テスト項目: サーフェスのエラーは呼び出し側に伝播しない
        // given (前提条件):
        let mut surface = MockMapSurface::new();
        surface.expect_is_ready().return_const(true);
        surface
            .expect_fit_bounds()
            .withf(|_, padding| *padding == Padding::default())
            .times(1)
            .returning(|_, _| Err(SurfaceError::Rejected("zero-size container".to_string())));
        surface
            .expect_clear_features()
            .times(1)
            .returning(|| Err(SurfaceError::NotReady));
        let mut canvas = MapCanvas::new(surface, CanvasOptions::default());

        // when (操作):
        canvas.fit_to_bounds(BoundingBox::from_array([0.0, 0.0, 1.0, 1.0]));
        canvas.set_features(&[]);

        // then (期待する結果): パニックせずに完了する
    }
}
