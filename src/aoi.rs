//! AOI overlay resolution: in-memory geometry, then remote path, then a plain view.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DashResult;
use crate::geo::AoiGeometry;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::EventMeta;
use crate::ui::{HostUi, LayerHandle, MapSurface, Notice};

pub const EPICENTER_ZOOM: u8 = 5;
pub const WORLD_VIEW: (f64, f64, u8) = (0.0, -75.0, 3);
pub const FIT_PADDING_PX: u32 = 10;

/// Fetches a geometry document by path or URL.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    async fn fetch_geometry(&self, path: &str) -> DashResult<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AoiOutcome {
    InMemory,
    Remote,
    Epicenter,
    World,
}

/// Owns the host layers it created so the next resolve can clear them.
#[derive(Debug, Default)]
pub struct AoiResolver {
    aoi_layer: Option<LayerHandle>,
    marker: Option<LayerHandle>,
}

impl AoiResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_layers(&self) -> usize {
        self.aoi_layer.iter().count() + self.marker.iter().count()
    }

    fn clear(&mut self, map: &mut dyn MapSurface) {
        if let Some(layer) = self.aoi_layer.take() {
            map.remove_layer(layer);
        }
        if let Some(marker) = self.marker.take() {
            map.remove_layer(marker);
        }
    }

    fn draw(&mut self, map: &mut dyn MapSurface, value: &Value) -> DashResult<()> {
        let geometry = AoiGeometry::from_value(value)?;
        let layer = map.add_geometry(&geometry)?;
        self.aoi_layer = Some(layer);
        map.fit_bounds(geometry.bounds, FIT_PADDING_PX);
        Ok(())
    }

    pub async fn resolve(
        &mut self,
        meta: &EventMeta,
        map: &mut dyn MapSurface,
        ui: &mut dyn HostUi,
        source: &dyn GeometrySource,
    ) -> AoiOutcome {
        self.clear(map);

        if let Some((lat, lon)) = meta.epicenter() {
            let label = if meta.name.is_empty() { "Event" } else { meta.name.as_str() };
            self.marker = Some(map.add_marker(lat, lon, label));
        }

        let outcome = self.resolve_overlay(meta, map, ui, source).await;
        log(
            Level::Debug,
            Domain::Map,
            "aoi_resolved",
            obj(&[("event_name", v_str(&meta.name)), ("outcome", v_str(&format!("{:?}", outcome)))]),
        );
        outcome
    }

    async fn resolve_overlay(
        &mut self,
        meta: &EventMeta,
        map: &mut dyn MapSurface,
        ui: &mut dyn HostUi,
        source: &dyn GeometrySource,
    ) -> AoiOutcome {
        if let Some(geo) = &meta.aoi_geo {
            match self.draw(map, geo) {
                Ok(()) => return AoiOutcome::InMemory,
                Err(err) => ui.notify(Notice::Warn, &format!("Invalid local AOI: {}", err)),
            }
        }

        if let Some(path) = &meta.aoi_path {
            match source.fetch_geometry(path).await {
                Ok(value) => match self.draw(map, &value) {
                    Ok(()) => return AoiOutcome::Remote,
                    Err(err) => ui.notify(Notice::Warn, &format!("Invalid AOI {}: {}", path, err)),
                },
                Err(err) => ui.notify(Notice::Warn, &format!("Could not load AOI: {}", err)),
            }
        }

        match meta.epicenter() {
            Some((lat, lon)) if self.marker.is_some() => {
                map.set_view(lat, lon, EPICENTER_ZOOM);
                AoiOutcome::Epicenter
            }
            _ => {
                let (lat, lon, zoom) = WORLD_VIEW;
                map.set_view(lat, lon, zoom);
                AoiOutcome::World
            }
        }
    }
}
