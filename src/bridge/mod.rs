//! Command dispatch from the host tree to a map surface.

pub mod args;
pub mod callback;
pub mod camera;
pub mod command;
pub mod query;
pub mod surface;

use std::time::Duration;

use serde_json::Value;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

pub use callback::{BridgeEvent, CallbackRegistry, CallbackToken, EventReceiver, PendingCallback};
pub use camera::{CameraState, CameraUpdate, CoordinateBounds, EdgeInsets};
pub use command::{commands_map, AnnotationSpec, Command, CommandId};
pub use query::{FeatureQuery, QueryGeometry, ScreenPoint, ScreenRect};
pub use surface::{Completion, MapSurface};

/// Decodes host commands, runs them against a surface and routes results
/// back through the callback event channel.
///
/// One bridge serves every surface; the surface is passed per call and must
/// only be touched from its owning thread.
pub struct CommandBridge {
    callbacks: CallbackRegistry,
    animation_duration: Duration,
}

impl CommandBridge {
    pub fn new(config: &BridgeConfig) -> (Self, EventReceiver) {
        let (callbacks, events) = CallbackRegistry::new(&config.callback_event);
        let bridge = Self {
            callbacks,
            animation_duration: config.animation_duration(),
        };
        (bridge, events)
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn dispatch(
        &self,
        surface: &mut dyn MapSurface,
        command_id: u32,
        args: &[Value],
    ) -> BridgeResult<()> {
        let id = CommandId::from_raw(command_id).ok_or(BridgeError::UnknownCommand(command_id))?;
        self.execute(surface, Command::decode(id, args)?)
    }

    pub fn dispatch_named(
        &self,
        surface: &mut dyn MapSurface,
        name: &str,
        args: &[Value],
    ) -> BridgeResult<()> {
        let id = CommandId::from_name(name)
            .ok_or_else(|| BridgeError::UnknownCommandName(name.to_string()))?;
        self.execute(surface, Command::decode(id, args)?)
    }

    /// Run an already decoded command. The callback token, if any, is
    /// reserved before the surface is touched.
    pub fn execute(&self, surface: &mut dyn MapSurface, command: Command) -> BridgeResult<()> {
        log::debug!("[bridge] {} (token {:?})", command.id().name(), command.token());

        match command {
            Command::GetDirection { token } => {
                let pending = self.callbacks.register(token)?;
                pending.resolve(vec![Value::from(surface.camera().bearing)])
            }
            Command::GetPitch { token } => {
                let pending = self.callbacks.register(token)?;
                pending.resolve(vec![Value::from(surface.camera().pitch)])
            }
            Command::GetCenterCoordinateZoomLevel { token } => {
                let pending = self.callbacks.register(token)?;
                pending.resolve(vec![surface.camera().center_zoom_json()])
            }
            Command::GetBounds { token } => {
                let pending = self.callbacks.register(token)?;
                pending.resolve(vec![surface.visible_bounds().to_json()])
            }
            Command::EaseTo {
                update,
                animated,
                token,
            } => {
                let pending = self.callbacks.register(token)?;
                let camera = surface.camera().merged(&update);
                let on_settled: Completion = Box::new(move || {
                    if let Err(err) = pending.resolve(Vec::new()) {
                        log::warn!("[bridge] easeTo callback {token} not delivered: {err}");
                    }
                });
                surface.set_camera(camera, self.duration(animated), Some(on_settled));
                Ok(())
            }
            Command::QueryRenderedFeatures { query, token } => {
                let pending = self.callbacks.register(token)?;
                let Some(geometry) = query.geometry else {
                    let error = query::encode_query_error(query::POINT_OR_RECT_REQUIRED);
                    return pending.resolve(error);
                };
                let features = surface.query_rendered_features(&geometry, query.layers.as_deref());
                pending.resolve(query::encode_features(&features))
            }
            Command::SetVisibleCoordinateBounds {
                bounds,
                padding,
                animated,
            } => {
                surface.fit_bounds(bounds, padding, self.duration(animated));
                Ok(())
            }
            Command::SelectAnnotation { id, animated } => {
                surface.select_annotation(&id, animated);
                Ok(())
            }
            Command::SpliceAnnotations {
                remove_all,
                remove,
                add,
            } => {
                if remove_all {
                    surface.remove_all_annotations();
                } else {
                    for id in &remove {
                        surface.remove_annotation(id);
                    }
                }
                for annotation in &add {
                    surface.set_annotation(annotation);
                }
                Ok(())
            }
            Command::DeselectAnnotation => {
                surface.deselect_annotation();
                Ok(())
            }
        }
    }

    /// Deliver `payload` for `token` on the outbound channel.
    pub fn resolve(&self, token: CallbackToken, payload: Vec<Value>) -> BridgeResult<()> {
        self.callbacks.resolve(token, payload)
    }

    fn duration(&self, animated: bool) -> Duration {
        if animated {
            self.animation_duration
        } else {
            Duration::ZERO
        }
    }
}
