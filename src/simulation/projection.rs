use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::simulation::drivers::{generate_drivers, random_driver_count};
use crate::utils::geo::{Coordinate, FALLBACK_PICKUP};

/// Half-width of the visible window around the user, in degrees. Flat
/// approximation; breaks down near the antimeridian and the poles.
pub const VIEWPORT_HALF_SPAN_DEG: f64 = 0.01;

/// Longitude jitter applied to the route midpoint so the line isn't perfectly straight
pub const ROUTE_JITTER_DEG: f64 = 0.002;

pub const DEFAULT_ZOOM: u8 = 15;

const OSM_EMBED_URL: &str = "https://www.openstreetmap.org/export/embed.html";
const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Renderer {
    Tile,
    #[default]
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    User,
    Destination,
    Driver,
}

/// Position inside the overlay box, in percent of its width/height
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPosition {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub coordinate: Coordinate,
    /// Only set by the overlay renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<ScreenPosition>,
}

/// A straight line anchored at the user marker, sized in overlay percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSegment {
    pub origin: ScreenPosition,
    pub length: f64,
    pub angle_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutePath {
    Polyline { points: Vec<Coordinate> },
    Segment(RouteSegment),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub center: Coordinate,
    pub zoom: u8,
    pub bbox: BoundingBox,
    pub embed_url: String,
    pub tile_url: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub renderer: Renderer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<TileView>,
    pub markers: Vec<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RoutePath>,
}

#[derive(Debug, Clone, Copy)]
pub struct MapRequest {
    pub user: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub show_drivers: bool,
    /// Fixed driver count; a random count in [5, 8] when unset
    pub driver_count: Option<usize>,
    pub renderer: Renderer,
    pub zoom: u8,
}

impl Default for MapRequest {
    fn default() -> Self {
        Self {
            user: None,
            destination: None,
            show_drivers: true,
            driver_count: None,
            renderer: Renderer::Overlay,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Overlay position of `point` relative to `user`
pub fn project(user: &Coordinate, point: &Coordinate) -> ScreenPosition {
    let span = VIEWPORT_HALF_SPAN_DEG * 2.0;
    let lat_offset = point.lat - user.lat;
    let lng_offset = point.lng - user.lng;

    ScreenPosition {
        left: ((lng_offset + VIEWPORT_HALF_SPAN_DEG) / span) * 100.0,
        top: (1.0 - (lat_offset + VIEWPORT_HALF_SPAN_DEG) / span) * 100.0,
    }
}

/// Five-point route: start, 25%, 50% (jittered east), 75%, end
pub fn route_points(start: Option<&Coordinate>, end: Option<&Coordinate>) -> Vec<Coordinate> {
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };

    vec![
        *start,
        start.lerp(end, 0.25),
        start.lerp(end, 0.5).offset(0.0, ROUTE_JITTER_DEG),
        start.lerp(end, 0.75),
        *end,
    ]
}

/// Straight segment from the user marker to the destination marker.
/// Length and angle are computed on the projected deltas, not the geodesic.
pub fn route_segment(user: &Coordinate, destination: &Coordinate) -> RouteSegment {
    let span = VIEWPORT_HALF_SPAN_DEG * 2.0;
    let dx = (destination.lng - user.lng) / span * 100.0;
    let dy = (destination.lat - user.lat) / span * 100.0;

    RouteSegment {
        origin: project(user, user),
        length: dx.hypot(dy),
        angle_deg: (-dy).atan2(dx).to_degrees(),
    }
}

pub fn tile_view(center: &Coordinate, zoom: u8) -> TileView {
    let bbox = BoundingBox {
        min_lng: center.lng - VIEWPORT_HALF_SPAN_DEG,
        min_lat: center.lat - VIEWPORT_HALF_SPAN_DEG,
        max_lng: center.lng + VIEWPORT_HALF_SPAN_DEG,
        max_lat: center.lat + VIEWPORT_HALF_SPAN_DEG,
    };

    let embed_url = format!(
        "{}?bbox={}%2C{}%2C{}%2C{}&layer=mapnik&marker={}%2C{}",
        OSM_EMBED_URL,
        bbox.min_lng,
        bbox.min_lat,
        bbox.max_lng,
        bbox.max_lat,
        center.lat,
        center.lng
    );

    TileView {
        center: *center,
        zoom,
        bbox,
        embed_url,
        tile_url: OSM_TILE_URL,
    }
}

/// Build a render-ready map. Missing coordinates simply produce fewer markers
/// and no route; driver positions are drawn fresh from `rng` on every call.
pub fn render<R: Rng>(request: &MapRequest, rng: &mut R) -> MapView {
    let mut markers = Vec::new();

    let drivers = match (&request.user, request.show_drivers) {
        (Some(user), true) => {
            let count = request
                .driver_count
                .unwrap_or_else(|| random_driver_count(rng));
            generate_drivers(rng, user, count)
        }
        _ => Vec::new(),
    };

    match request.renderer {
        Renderer::Tile => {
            let center = request.user.unwrap_or(FALLBACK_PICKUP);
            let place = |kind, coordinate| Marker {
                kind,
                coordinate,
                position: None,
            };

            markers.extend(request.user.map(|c| place(MarkerKind::User, c)));
            markers.extend(request.destination.map(|c| place(MarkerKind::Destination, c)));
            markers.extend(drivers.into_iter().map(|c| place(MarkerKind::Driver, c)));

            let points = route_points(request.user.as_ref(), request.destination.as_ref());
            let route = (!points.is_empty()).then_some(RoutePath::Polyline { points });

            MapView {
                renderer: Renderer::Tile,
                tile: Some(tile_view(&center, request.zoom)),
                markers,
                route,
            }
        }
        Renderer::Overlay => {
            // Everything on the overlay is positioned relative to the user
            let Some(user) = request.user else {
                return MapView {
                    renderer: Renderer::Overlay,
                    tile: None,
                    markers,
                    route: None,
                };
            };

            let place = |kind, coordinate: Coordinate| Marker {
                kind,
                coordinate,
                position: Some(project(&user, &coordinate)),
            };

            markers.push(place(MarkerKind::User, user));
            markers.extend(request.destination.map(|c| place(MarkerKind::Destination, c)));
            markers.extend(drivers.into_iter().map(|c| place(MarkerKind::Driver, c)));

            let route = request
                .destination
                .map(|dest| RoutePath::Segment(route_segment(&user, &dest)));

            MapView {
                renderer: Renderer::Overlay,
                tile: None,
                markers,
                route,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_project_corner() {
        let pos = project(&Coordinate::new(0.0, 0.0), &Coordinate::new(0.01, 0.01));
        assert!(approx(pos.left, 100.0));
        assert!(approx(pos.top, 0.0));
    }

    #[test]
    fn test_project_user_is_centered() {
        let user = Coordinate::new(37.7749, -122.4194);
        let pos = project(&user, &user);
        assert!(approx(pos.left, 50.0));
        assert!(approx(pos.top, 50.0));
    }

    #[test]
    fn test_route_points_count() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.01, 0.01);

        assert_eq!(route_points(Some(&a), Some(&b)).len(), 5);
        assert!(route_points(Some(&a), None).is_empty());
        assert!(route_points(None, Some(&b)).is_empty());
        assert!(route_points(None, None).is_empty());
    }

    #[test]
    fn test_route_points_shape() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.04, 0.08);
        let points = route_points(Some(&a), Some(&b));

        assert_eq!(points[0], a);
        assert_eq!(points[4], b);
        assert!(approx(points[1].lat, 0.01) && approx(points[1].lng, 0.02));
        assert!(approx(points[2].lat, 0.02) && approx(points[2].lng, 0.04 + ROUTE_JITTER_DEG));
        assert!(approx(points[3].lat, 0.03) && approx(points[3].lng, 0.06));
    }

    #[test]
    fn test_route_segment_diagonal() {
        let seg = route_segment(&Coordinate::new(0.0, 0.0), &Coordinate::new(0.01, 0.01));
        assert!(approx(seg.length, 50.0 * 2f64.sqrt()));
        // Up and to the right on screen
        assert!(approx(seg.angle_deg, -45.0));
        assert!(approx(seg.origin.left, 50.0) && approx(seg.origin.top, 50.0));
    }

    #[test]
    fn test_route_segment_due_west() {
        let seg = route_segment(&Coordinate::new(0.0, 0.0), &Coordinate::new(0.0, -0.01));
        assert!(approx(seg.length, 50.0));
        assert!(approx(seg.angle_deg.abs(), 180.0));
    }

    #[test]
    fn test_tile_view_bbox_and_url() {
        let view = tile_view(&Coordinate::new(1.0, 2.0), 15);
        assert!(approx(view.bbox.min_lng, 1.99));
        assert!(approx(view.bbox.max_lat, 1.01));
        assert!(view.embed_url.starts_with(OSM_EMBED_URL));
        assert!(view.embed_url.ends_with("&layer=mapnik&marker=1%2C2"));
    }

    #[test]
    fn test_render_overlay_without_user_is_empty() {
        let request = MapRequest {
            destination: Some(Coordinate::new(0.01, 0.01)),
            ..Default::default()
        };
        let view = render(&request, &mut StdRng::seed_from_u64(1));

        assert!(view.markers.is_empty());
        assert!(view.route.is_none());
    }

    #[test]
    fn test_render_overlay_full() {
        let request = MapRequest {
            user: Some(Coordinate::new(0.0, 0.0)),
            destination: Some(Coordinate::new(0.01, 0.01)),
            driver_count: Some(6),
            ..Default::default()
        };
        let view = render(&request, &mut StdRng::seed_from_u64(1));

        assert_eq!(view.markers.len(), 8);
        let dest = view
            .markers
            .iter()
            .find(|m| m.kind == MarkerKind::Destination)
            .and_then(|m| m.position)
            .unwrap();
        assert!(approx(dest.left, 100.0) && approx(dest.top, 0.0));

        for driver in view.markers.iter().filter(|m| m.kind == MarkerKind::Driver) {
            let pos = driver.position.unwrap();
            assert!((25.0..=75.0).contains(&pos.left));
            assert!((25.0..=75.0).contains(&pos.top));
        }
        assert!(matches!(view.route, Some(RoutePath::Segment(_))));
    }

    #[test]
    fn test_render_hides_drivers() {
        let request = MapRequest {
            user: Some(Coordinate::new(0.0, 0.0)),
            show_drivers: false,
            ..Default::default()
        };
        let view = render(&request, &mut StdRng::seed_from_u64(1));

        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].kind, MarkerKind::User);
    }

    #[test]
    fn test_render_tile_defaults_center() {
        let request = MapRequest {
            renderer: Renderer::Tile,
            ..Default::default()
        };
        let view = render(&request, &mut StdRng::seed_from_u64(1));

        assert_eq!(view.tile.unwrap().center, FALLBACK_PICKUP);
        assert!(view.markers.is_empty());
        assert!(view.route.is_none());
    }

    #[test]
    fn test_render_tile_polyline() {
        let request = MapRequest {
            user: Some(Coordinate::new(0.0, 0.0)),
            destination: Some(Coordinate::new(0.01, 0.01)),
            renderer: Renderer::Tile,
            ..Default::default()
        };
        let view = render(&request, &mut StdRng::seed_from_u64(9));

        let drivers = view.markers.iter().filter(|m| m.kind == MarkerKind::Driver).count();
        assert!((5..=8).contains(&drivers));
        assert!(view.markers.iter().all(|m| m.position.is_none()));
        match view.route {
            Some(RoutePath::Polyline { points }) => assert_eq!(points.len(), 5),
            other => panic!("expected polyline, got {:?}", other),
        }
    }
}
