use std::cell::RefCell;
use std::rc::Rc;

use mapbridge::headless::HeadlessSceneGraph;
use mapbridge::{BridgeError, ChildComposer, ChildKind, ChildListener, SurfaceId};

const MAP: SurfaceId = SurfaceId(1);

struct Recorder {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl ChildListener<&'static str> for Recorder {
    fn child_added(&self, element: &&'static str) {
        self.log.borrow_mut().push(format!("{} added {}", self.name, element));
    }

    fn child_removed(&self, element: &&'static str) {
        self.log.borrow_mut().push(format!("{} removed {}", self.name, element));
    }
}

fn composer() -> ChildComposer<&'static str, HeadlessSceneGraph<&'static str>> {
    ChildComposer::new(HeadlessSceneGraph::new())
}

/// Structural position recomputed from scratch over the logical list.
fn expected_translation(
    composer: &ChildComposer<&'static str, HeadlessSceneGraph<&'static str>>,
    index: usize,
) -> usize {
    (0..index)
        .filter(|&i| composer.at(MAP, i).unwrap().kind == ChildKind::Structural)
        .count()
}

#[test]
fn overlay_between_structural_children_is_transparent() {
    let mut composer = composer();
    composer.attach(MAP, "A", ChildKind::Structural, 0).unwrap();
    composer.attach(MAP, "B", ChildKind::Overlay, 1).unwrap();
    composer.attach(MAP, "C", ChildKind::Structural, 2).unwrap();
    assert_eq!(composer.translate(MAP, 2).unwrap(), 1);
    assert_eq!(composer.graph().children(MAP), &["A", "C"]);

    assert_eq!(composer.detach(MAP, 1).unwrap(), "B");
    assert_eq!(composer.at(MAP, 1).unwrap().element, "C");
    assert_eq!(composer.translate(MAP, 1).unwrap(), 1);
    assert_eq!(composer.graph().children(MAP), &["A", "C"]);
}

#[test]
fn overlays_never_shift_structural_positions() {
    let mut composer = composer();
    composer.attach(MAP, "A", ChildKind::Structural, 0).unwrap();
    composer.attach(MAP, "B", ChildKind::Structural, 1).unwrap();
    let before: Vec<usize> = (0..=2).map(|i| composer.translate(MAP, i).unwrap()).collect();

    composer.attach(MAP, "pin", ChildKind::Overlay, 2).unwrap();
    let after: Vec<usize> = (0..=2).map(|i| composer.translate(MAP, i).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(composer.graph().children(MAP), &["A", "B"]);
}

#[test]
fn translation_holds_across_mixed_mutations() {
    let mut composer = composer();
    let plan: [(&'static str, ChildKind, usize); 7] = [
        ("s1", ChildKind::Structural, 0),
        ("o1", ChildKind::Overlay, 0),
        ("s2", ChildKind::Structural, 1),
        ("o2", ChildKind::Overlay, 3),
        ("s3", ChildKind::Structural, 2),
        ("o3", ChildKind::Overlay, 5),
        ("s4", ChildKind::Structural, 0),
    ];
    for (element, kind, index) in plan {
        composer.attach(MAP, element, kind, index).unwrap();
        let len = composer.count(MAP).unwrap();
        for i in 0..=len {
            assert_eq!(composer.translate(MAP, i).unwrap(), expected_translation(&composer, i));
        }
    }

    for index in [3, 0, 2] {
        composer.detach(MAP, index).unwrap();
        let len = composer.count(MAP).unwrap();
        for i in 0..=len {
            assert_eq!(composer.translate(MAP, i).unwrap(), expected_translation(&composer, i));
        }
    }

    let structural: Vec<&str> = (0..composer.count(MAP).unwrap())
        .map(|i| composer.at(MAP, i).unwrap())
        .filter(|entry| entry.kind == ChildKind::Structural)
        .map(|entry| entry.element)
        .collect();
    assert_eq!(composer.graph().children(MAP), structural.as_slice());
}

#[test]
fn emptied_surface_is_released() {
    let mut composer = composer();
    composer.attach(MAP, "only", ChildKind::Structural, 0).unwrap();
    composer.detach(MAP, 0).unwrap();
    assert_eq!(composer.count(MAP), Err(BridgeError::UnknownSurface(MAP)));
    assert_eq!(composer.detach(MAP, 0), Err(BridgeError::UnknownSurface(MAP)));
}

#[test]
fn listeners_fire_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let first: Rc<dyn ChildListener<&'static str>> = Rc::new(Recorder {
        name: "L1",
        log: log.clone(),
    });
    let second: Rc<dyn ChildListener<&'static str>> = Rc::new(Recorder {
        name: "L2",
        log: log.clone(),
    });

    let mut composer = composer();
    composer.add_listener(first.clone());
    composer.add_listener(second.clone());
    composer.attach(MAP, "pin", ChildKind::Overlay, 0).unwrap();
    assert_eq!(*log.borrow(), vec!["L1 added pin", "L2 added pin"]);

    assert!(composer.remove_listener(&first));
    composer.detach(MAP, 0).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["L1 added pin", "L2 added pin", "L2 removed pin"]
    );
}

#[test]
fn failed_operations_do_not_notify() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut composer = composer();
    composer.add_listener(Rc::new(Recorder {
        name: "L",
        log: log.clone(),
    }));
    assert!(composer.attach(MAP, "x", ChildKind::Structural, 1).is_err());
    assert!(composer.detach(MAP, 0).is_err());
    assert!(log.borrow().is_empty());
}

#[test]
fn dispose_releases_children_and_owned_listeners() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut composer = composer();
    composer.add_surface_listener(
        MAP,
        Rc::new(Recorder {
            name: "owned",
            log: log.clone(),
        }),
    );
    composer.attach(MAP, "A", ChildKind::Structural, 0).unwrap();
    composer.attach(MAP, "pin", ChildKind::Overlay, 1).unwrap();

    assert_eq!(composer.dispose(MAP), 2);
    assert_eq!(composer.listener_count(), 0);
    assert!(composer.graph().children(MAP).is_empty());
    assert_eq!(
        *log.borrow(),
        vec!["owned added A", "owned added pin", "owned removed pin", "owned removed A"]
    );
}

#[test]
fn surfaces_are_independent() {
    let other = SurfaceId(2);
    let mut composer = composer();
    composer.attach(MAP, "A", ChildKind::Structural, 0).unwrap();
    composer.attach(other, "pin", ChildKind::Overlay, 0).unwrap();
    composer.attach(other, "B", ChildKind::Structural, 1).unwrap();
    assert_eq!(composer.translate(MAP, 1).unwrap(), 1);
    assert_eq!(composer.translate(other, 1).unwrap(), 0);
    assert_eq!(composer.annotations(other), vec![&"pin"]);
    assert!(composer.annotations(MAP).is_empty());
    assert!(composer.annotations(SurfaceId(3)).is_empty());
}

#[test]
fn lookup_errors_leave_composer_and_scene_untouched() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut composer = composer();
    composer.attach(MAP, "A", ChildKind::Structural, 0).unwrap();
    composer.attach(MAP, "pin", ChildKind::Overlay, 1).unwrap();
    composer.add_listener(Rc::new(Recorder {
        name: "L",
        log: log.clone(),
    }));
    let unknown = SurfaceId(9);

    assert_eq!(
        composer.at(MAP, 2),
        Err(BridgeError::IndexOutOfRange {
            surface: MAP,
            index: 2,
            len: 2
        })
    );
    assert_eq!(composer.at(unknown, 0), Err(BridgeError::UnknownSurface(unknown)));
    assert_eq!(composer.translate(unknown, 0), Err(BridgeError::UnknownSurface(unknown)));
    assert_eq!(
        composer.detach(MAP, 2),
        Err(BridgeError::IndexOutOfRange {
            surface: MAP,
            index: 2,
            len: 2
        })
    );
    assert_eq!(composer.detach(unknown, 0), Err(BridgeError::UnknownSurface(unknown)));

    assert_eq!(composer.count(MAP), Ok(2));
    assert_eq!(composer.at(MAP, 0).unwrap().element, "A");
    assert_eq!(composer.at(MAP, 1).unwrap().element, "pin");
    assert_eq!(composer.annotations(MAP), vec![&"pin"]);
    assert_eq!(composer.graph().children(MAP), &["A"]);
    assert!(composer.graph().children(unknown).is_empty());
    assert_eq!(composer.surfaces().collect::<Vec<_>>(), vec![MAP]);
    assert!(log.borrow().is_empty());
}
