//! Scripted sessions against headless collaborators.
//!
//! A script is a JSON array of steps. Each step either mutates a surface's
//! child list, sends a command, or lets running animations finish. The
//! transcript collects every listener notification, emitted callback event
//! and rejected step, followed by the final scene graph of each surface.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::bridge::{CameraState, CommandBridge, EventReceiver};
use crate::composer::{ChildComposer, ChildKind, ChildListener, SurfaceId};
use crate::config::BridgeConfig;
use crate::headless::{HeadlessMap, HeadlessSceneGraph, RenderedFeature};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    /// Create (or reset) a surface with an initial camera and rendered features.
    Surface {
        surface: SurfaceId,
        #[serde(default)]
        camera: CameraState,
        #[serde(default)]
        features: Vec<RenderedFeature>,
    },
    Attach {
        surface: SurfaceId,
        element: String,
        kind: ChildKind,
        index: usize,
    },
    Detach {
        surface: SurfaceId,
        index: usize,
    },
    Dispose {
        surface: SurfaceId,
    },
    Command {
        surface: SurfaceId,
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Settle {
        surface: SurfaceId,
    },
    Interrupt {
        surface: SurfaceId,
    },
}

pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse replay script {}", path.display()))
}

struct TranscriptListener {
    lines: Rc<RefCell<Vec<Value>>>,
}

impl ChildListener<String> for TranscriptListener {
    fn child_added(&self, element: &String) {
        self.lines.borrow_mut().push(json!({ "childAdded": element }));
    }

    fn child_removed(&self, element: &String) {
        self.lines.borrow_mut().push(json!({ "childRemoved": element }));
    }
}

pub struct Session {
    composer: ChildComposer<String, HeadlessSceneGraph<String>>,
    bridge: CommandBridge,
    events: EventReceiver,
    maps: BTreeMap<SurfaceId, HeadlessMap>,
    transcript: Rc<RefCell<Vec<Value>>>,
}

impl Session {
    pub fn new(config: &BridgeConfig) -> Self {
        let transcript = Rc::new(RefCell::new(Vec::new()));
        let mut composer = ChildComposer::new(HeadlessSceneGraph::new());
        composer.add_listener(Rc::new(TranscriptListener {
            lines: transcript.clone(),
        }));
        let (bridge, events) = CommandBridge::new(config);
        Self {
            composer,
            bridge,
            events,
            maps: BTreeMap::new(),
            transcript,
        }
    }

    pub fn run(&mut self, step: Step) {
        let outcome = match step {
            Step::Surface {
                surface,
                camera,
                features,
            } => {
                self.maps
                    .insert(surface, HeadlessMap::new(camera).with_features(features));
                Ok(())
            }
            Step::Attach {
                surface,
                element,
                kind,
                index,
            } => self.composer.attach(surface, element, kind, index),
            Step::Detach { surface, index } => self.composer.detach(surface, index).map(drop),
            Step::Dispose { surface } => {
                self.composer.dispose(surface);
                self.maps.remove(&surface);
                Ok(())
            }
            Step::Command {
                surface,
                name,
                args,
            } => {
                let map = self.maps.entry(surface).or_default();
                self.bridge.dispatch_named(map, &name, &args)
            }
            Step::Settle { surface } => {
                if let Some(map) = self.maps.get_mut(&surface) {
                    map.settle();
                }
                Ok(())
            }
            Step::Interrupt { surface } => {
                if let Some(map) = self.maps.get_mut(&surface) {
                    map.interrupt();
                }
                Ok(())
            }
        };
        if let Err(err) = outcome {
            log::warn!("[replay] step rejected: {err}");
            self.transcript
                .borrow_mut()
                .push(json!({ "error": err.to_string() }));
        }
        self.drain_events();
    }

    /// Transcript so far plus one `scene` line per surface still holding children.
    pub fn finish(mut self) -> Vec<Value> {
        self.drain_events();
        let mut lines = self.transcript.take();
        let mut surfaces: Vec<SurfaceId> = self.composer.surfaces().collect();
        surfaces.sort();
        for surface in surfaces {
            let annotations: Vec<&String> = self.composer.annotations(surface);
            lines.push(json!({
                "surface": surface.0,
                "scene": self.composer.graph().children(surface),
                "annotations": annotations,
            }));
        }
        lines
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.transcript
                .borrow_mut()
                .push(json!({ "event": event.name, "payload": event.payload }));
        }
    }
}

pub fn replay(steps: Vec<Step>, config: &BridgeConfig) -> Vec<Value> {
    let mut session = Session::new(config);
    for step in steps {
        session.run(step);
    }
    session.finish()
}
