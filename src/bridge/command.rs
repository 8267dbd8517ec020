use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::args::{describe, ArgReader};
use super::callback::CallbackToken;
use super::camera::{CameraUpdate, CoordinateBounds, EdgeInsets};
use super::query::FeatureQuery;
use crate::error::BridgeResult;

/// Wire identifiers of the host-visible commands. Id 5 is unassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum CommandId {
    GetDirection = 0,
    GetPitch = 1,
    GetCenterCoordinateZoomLevel = 2,
    GetBounds = 3,
    EaseTo = 4,
    SetVisibleCoordinateBounds = 6,
    SelectAnnotation = 7,
    SpliceAnnotations = 8,
    DeselectAnnotation = 9,
    QueryRenderedFeatures = 10,
}

impl CommandId {
    pub const ALL: [CommandId; 10] = [
        CommandId::GetDirection,
        CommandId::GetPitch,
        CommandId::GetCenterCoordinateZoomLevel,
        CommandId::GetBounds,
        CommandId::EaseTo,
        CommandId::SetVisibleCoordinateBounds,
        CommandId::SelectAnnotation,
        CommandId::SpliceAnnotations,
        CommandId::DeselectAnnotation,
        CommandId::QueryRenderedFeatures,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.raw() == raw)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandId::GetDirection => "getDirection",
            CommandId::GetPitch => "getPitch",
            CommandId::GetCenterCoordinateZoomLevel => "getCenterCoordinateZoomLevel",
            CommandId::GetBounds => "getBounds",
            CommandId::EaseTo => "easeTo",
            CommandId::SetVisibleCoordinateBounds => "setVisibleCoordinateBounds",
            CommandId::SelectAnnotation => "selectAnnotation",
            CommandId::SpliceAnnotations => "spliceAnnotations",
            CommandId::DeselectAnnotation => "deselectAnnotation",
            CommandId::QueryRenderedFeatures => "queryRenderedFeatures",
        }
    }

    /// Whether the command resolves its callback token.
    pub fn owes_result(self) -> bool {
        matches!(
            self,
            CommandId::GetDirection
                | CommandId::GetPitch
                | CommandId::GetCenterCoordinateZoomLevel
                | CommandId::GetBounds
                | CommandId::EaseTo
                | CommandId::QueryRenderedFeatures
        )
    }

    /// Shape of the resolved payload, for documentation and the CLI.
    pub fn result_shape(self) -> &'static str {
        match self {
            CommandId::GetDirection => "[bearing]",
            CommandId::GetPitch => "[pitch]",
            CommandId::GetCenterCoordinateZoomLevel => "[{latitude, longitude, zoomLevel}]",
            CommandId::GetBounds => "[[south, west, north, east]]",
            CommandId::EaseTo => "[] once settled",
            CommandId::QueryRenderedFeatures => "[errorOrNull, featuresOrNull]",
            CommandId::SetVisibleCoordinateBounds
            | CommandId::SelectAnnotation
            | CommandId::SpliceAnnotations
            | CommandId::DeselectAnnotation => "none",
        }
    }
}

/// Name to id table handed to the host runtime.
pub fn commands_map() -> BTreeMap<&'static str, u32> {
    CommandId::ALL
        .into_iter()
        .map(|id| (id.name(), id.raw()))
        .collect()
}

/// An annotation to add: its `id` plus the surface-specific options.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationSpec {
    pub id: String,
    pub options: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    GetDirection {
        token: CallbackToken,
    },
    GetPitch {
        token: CallbackToken,
    },
    GetCenterCoordinateZoomLevel {
        token: CallbackToken,
    },
    GetBounds {
        token: CallbackToken,
    },
    EaseTo {
        update: CameraUpdate,
        animated: bool,
        token: CallbackToken,
    },
    SetVisibleCoordinateBounds {
        bounds: CoordinateBounds,
        padding: EdgeInsets,
        animated: bool,
    },
    SelectAnnotation {
        id: String,
        animated: bool,
    },
    SpliceAnnotations {
        remove_all: bool,
        remove: Vec<String>,
        add: Vec<AnnotationSpec>,
    },
    DeselectAnnotation,
    QueryRenderedFeatures {
        query: FeatureQuery,
        token: CallbackToken,
    },
}

impl Command {
    /// Decode the positional arguments for `id`. Nothing is executed here,
    /// so a failure leaves both sides of the bridge untouched.
    pub fn decode(id: CommandId, args: &[Value]) -> BridgeResult<Command> {
        let reader = ArgReader::new(id.name(), args);
        let command = match id {
            CommandId::GetDirection => Command::GetDirection {
                token: reader.token(0)?,
            },
            CommandId::GetPitch => Command::GetPitch {
                token: reader.token(0)?,
            },
            CommandId::GetCenterCoordinateZoomLevel => Command::GetCenterCoordinateZoomLevel {
                token: reader.token(0)?,
            },
            CommandId::GetBounds => Command::GetBounds {
                token: reader.token(0)?,
            },
            CommandId::EaseTo => {
                let update = serde_json::from_value(Value::Object(reader.map(0)?.clone()))
                    .map_err(|err| reader.malformed(format!("argument 0: {err}")))?;
                Command::EaseTo {
                    update,
                    animated: reader.boolean(1)?,
                    token: reader.token(2)?,
                }
            }
            CommandId::SetVisibleCoordinateBounds => Command::SetVisibleCoordinateBounds {
                bounds: CoordinateBounds {
                    south: reader.double(0)?,
                    west: reader.double(1)?,
                    north: reader.double(2)?,
                    east: reader.double(3)?,
                },
                // Padding arrives as doubles; the surface works in whole pixels.
                padding: EdgeInsets {
                    top: reader.double(4)? as i32,
                    right: reader.double(5)? as i32,
                    bottom: reader.double(6)? as i32,
                    left: reader.double(7)? as i32,
                },
                animated: reader.boolean(8)?,
            },
            CommandId::SelectAnnotation => Command::SelectAnnotation {
                id: reader.string(0)?.to_string(),
                animated: reader.boolean(1)?,
            },
            CommandId::SpliceAnnotations => Command::SpliceAnnotations {
                remove_all: reader.boolean(0)?,
                remove: reader.strings(1)?,
                add: decode_annotations(&reader, 2)?,
            },
            CommandId::DeselectAnnotation => Command::DeselectAnnotation,
            CommandId::QueryRenderedFeatures => Command::QueryRenderedFeatures {
                query: FeatureQuery::from_options(reader.map(0)?)?,
                token: reader.token(1)?,
            },
        };
        Ok(command)
    }

    pub fn id(&self) -> CommandId {
        match self {
            Command::GetDirection { .. } => CommandId::GetDirection,
            Command::GetPitch { .. } => CommandId::GetPitch,
            Command::GetCenterCoordinateZoomLevel { .. } => CommandId::GetCenterCoordinateZoomLevel,
            Command::GetBounds { .. } => CommandId::GetBounds,
            Command::EaseTo { .. } => CommandId::EaseTo,
            Command::SetVisibleCoordinateBounds { .. } => CommandId::SetVisibleCoordinateBounds,
            Command::SelectAnnotation { .. } => CommandId::SelectAnnotation,
            Command::SpliceAnnotations { .. } => CommandId::SpliceAnnotations,
            Command::DeselectAnnotation => CommandId::DeselectAnnotation,
            Command::QueryRenderedFeatures { .. } => CommandId::QueryRenderedFeatures,
        }
    }

    pub fn token(&self) -> Option<CallbackToken> {
        match self {
            Command::GetDirection { token }
            | Command::GetPitch { token }
            | Command::GetCenterCoordinateZoomLevel { token }
            | Command::GetBounds { token }
            | Command::EaseTo { token, .. }
            | Command::QueryRenderedFeatures { token, .. } => Some(*token),
            Command::SetVisibleCoordinateBounds { .. }
            | Command::SelectAnnotation { .. }
            | Command::SpliceAnnotations { .. }
            | Command::DeselectAnnotation => None,
        }
    }
}

fn decode_annotations(reader: &ArgReader<'_>, index: usize) -> BridgeResult<Vec<AnnotationSpec>> {
    reader
        .array(index)?
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let Some(options) = item.as_object() else {
                return Err(reader.malformed(format!(
                    "argument {index}[{position}]: expected map, found {}",
                    describe(item)
                )));
            };
            let id = options
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    reader.malformed(format!("argument {index}[{position}]: missing string `id`"))
                })?;
            Ok(AnnotationSpec {
                id: id.to_string(),
                options: options.clone(),
            })
        })
        .collect()
}
