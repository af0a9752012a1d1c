//! Store behaviour: dirty tracking, order cache, document replacement,
//! consume-once channels, tools and render batching

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tessera_document::{Document, Geometry, Shape, Snapshot, Transform};
use tessera_editor::{
    diff_documents, Action, AddShape, DeleteShape, EditorConfig, EditorError, ErrorKind,
    StaleUndoPolicy, Store, ToolContext, ToolEvent, ToolRegistry, ToolResponse, ToolRuntime,
    PointerPhase, UpdateShapeFill, UpdateShapeTransform, UpdateShapeZIndex, DEFAULT_CONFIG_NAME,
};

fn boxed(action: impl Action + 'static) -> Box<dyn Action> {
    Box::new(action)
}

fn two_shapes() -> Document {
    Document::from_shapes([
        Shape::rect("s1", 10.0, 10.0).with_z_index("a0"),
        Shape::rect("s2", 10.0, 10.0).with_z_index("a1"),
    ])
}

fn edited(doc: &Snapshot, f: impl FnOnce(&mut Document)) -> Snapshot {
    let mut next = Document::clone(doc);
    f(&mut next);
    next.version += 1;
    next.into_snapshot()
}

#[test]
fn test_same_snapshot_diff_is_empty() {
    let store = Store::new(two_shapes());
    let diff = diff_documents(store.document(), store.document());
    assert!(diff.added.is_empty() && diff.removed.is_empty() && diff.changed.is_empty());
    assert!(!diff.requires_full_invalidation);
}

#[test]
fn test_dirty_state_tracks_actions() {
    let mut store = Store::new(two_shapes());

    store
        .mutate_document(boxed(UpdateShapeFill::new("s1", Some("blue".into()))))
        .unwrap();
    store.mutate_document(boxed(DeleteShape::new("s2"))).unwrap();

    let dirty = store.consume_dirty_state();
    assert!(dirty.dirty.contains("s1"));
    assert!(dirty.deleted.contains("s2"));
    assert!(!dirty.dirty.contains("s2"));

    // Consumed once
    assert!(store.consume_dirty_state().is_empty());

    // Undo of the delete moves s2 back to dirty
    store.undo().unwrap();
    let dirty = store.consume_dirty_state();
    assert!(dirty.dirty.contains("s2"));
    assert!(dirty.deleted.is_empty());
}

#[test]
fn test_order_cache_reused_across_property_edits() {
    let mut store = Store::new(two_shapes());
    let first = store.ordered_shape_ids();

    store
        .mutate_document(boxed(UpdateShapeTransform::new("s1", Transform::translate(1.0, 1.0))))
        .unwrap();
    store
        .mutate_document(boxed(UpdateShapeFill::new("s2", Some("green".into()))))
        .unwrap();
    let second = store.ordered_shape_ids();
    assert!(Arc::ptr_eq(&first, &second));

    // Resolved shapes still reflect the edit
    let shapes = store.ordered_shapes();
    assert_eq!(shapes[0].transform.x, 1.0);

    store
        .mutate_document(boxed(UpdateShapeZIndex::new("s1", "a2".into())))
        .unwrap();
    let third = store.ordered_shape_ids();
    assert!(!Arc::ptr_eq(&second, &third));
    assert_eq!(&*third, ["s2".to_string(), "s1".to_string()]);

    store
        .mutate_document(boxed(AddShape::new(Shape::rect("s3", 1.0, 1.0))))
        .unwrap();
    let fourth = store.ordered_shape_ids();
    assert!(!Arc::ptr_eq(&third, &fourth));
    assert_eq!(fourth.last().map(String::as_str), Some("s3"));
}

#[test]
fn test_apply_document_diff_consumed_once() {
    let mut store = Store::new(two_shapes());
    assert!(store.consume_apply_document_diff().is_none());

    let next = edited(store.document(), |d| {
        d.remove_shape("s2");
    });
    store.apply_document(next);

    let pending = store.consume_apply_document_diff().unwrap();
    assert!(pending.diff.removed.contains("s2"));
    assert!(store.consume_apply_document_diff().is_none());
}

#[test]
fn test_apply_document_coalesces_interval() {
    let mut store = Store::new(two_shapes());
    let before = Arc::clone(store.document());

    let a = edited(&before, |d| {
        d.insert_shape(Arc::new(Shape::rect("s3", 1.0, 1.0).with_z_index("a2")));
    });
    let b = edited(&a, |d| {
        d.update_shape("s1", |s| s.style.opacity = 0.5);
    });

    store.apply_document(Arc::clone(&a));
    store.apply_document(Arc::clone(&b));

    let pending = store.consume_apply_document_diff().unwrap();
    assert!(Arc::ptr_eq(&pending.prev_doc, &before));
    assert!(Arc::ptr_eq(&pending.next_doc, &b));
    assert!(pending.diff.added.contains("s3"));
    assert!(pending.diff.changed.contains("s1"));
}

#[test]
fn test_channels_are_independent() {
    let mut store = Store::new(two_shapes());

    let next = edited(store.document(), |d| {
        d.update_shape("s1", |s| s.style.opacity = 0.5);
    });
    store.apply_document(next);

    // Replacement also marks dirty ids
    let dirty = store.consume_dirty_state();
    assert!(dirty.dirty.contains("s1"));

    // ...but consuming them leaves the diff alone
    assert!(store.consume_apply_document_diff().is_some());

    store
        .mutate_document(boxed(UpdateShapeFill::new("s2", None)))
        .unwrap();
    assert!(store.consume_apply_document_diff().is_none());
    assert!(store.consume_dirty_state().dirty.contains("s2"));
}

#[test]
fn test_apply_document_invalidates_order_only_when_needed() {
    let mut store = Store::new(two_shapes());
    let first = store.ordered_shape_ids();

    let restyled = edited(store.document(), |d| {
        d.update_shape("s1", |s| s.style.fill = Some("red".into()));
    });
    store.apply_document(restyled);
    assert!(Arc::ptr_eq(&first, &store.ordered_shape_ids()));

    let reordered = edited(store.document(), |d| {
        d.update_shape("s1", |s| s.z_index = "a5".into());
    });
    store.apply_document(reordered);
    let second = store.ordered_shape_ids();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(&*second, ["s2".to_string(), "s1".to_string()]);
}

#[test]
fn test_remote_temporal_order_change_refreshes_visible_order() {
    let mut s1 = Shape::rect("s1", 1.0, 1.0);
    s1.temporal_order = Some(1);
    let mut marker = Shape::clear_marker("clear-1");
    marker.temporal_order = Some(2);
    let mut store = Store::new(Document::from_shapes([s1, marker]));

    let cleared = store.ordered_shape_ids();
    assert!(cleared.is_empty());

    let next = edited(store.document(), |d| {
        d.update_shape("s1", |s| s.temporal_order = Some(3));
    });
    store.apply_document(next);

    let visible = store.ordered_shape_ids();
    assert!(!Arc::ptr_eq(&cleared, &visible));
    assert_eq!(&*visible, ["s1".to_string()]);
}

#[test]
fn test_add_into_layer_with_foreign_keys() {
    let mut store = Store::new(Document::from_shapes([
        Shape::rect("s1", 1.0, 1.0).with_z_index("b0")
    ]));

    store.mutate_document(boxed(AddShape::new(Shape::rect("s2", 1.0, 1.0)))).unwrap();
    store.mutate_document(boxed(AddShape::new(Shape::rect("s3", 1.0, 1.0)))).unwrap();
    assert_eq!(
        &*store.ordered_shape_ids(),
        ["s1".to_string(), "s2".to_string(), "s3".to_string()]
    );
}

#[test]
fn test_topology_drives_full_invalidation() {
    let mut store = Store::new(two_shapes());

    // New layer gains its first shape
    let next = edited(store.document(), |d| {
        d.insert_shape(Arc::new(Shape::rect("s3", 1.0, 1.0).with_layer("overlay")));
    });
    store.apply_document(next);
    let pending = store.consume_apply_document_diff().unwrap();
    assert!(pending.diff.layer_topology_changed);
    assert!(pending.requires_full_invalidation());

    // Layer loses its last shape
    let next = edited(store.document(), |d| {
        d.remove_shape("s3");
    });
    store.apply_document(next);
    assert!(store.consume_apply_document_diff().unwrap().requires_full_invalidation());

    // Reordering inside an already-referenced layer does not
    let next = edited(store.document(), |d| {
        d.update_shape("s2", |s| s.z_index = "Zzz".into());
    });
    store.apply_document(next);
    let pending = store.consume_apply_document_diff().unwrap();
    assert!(!pending.diff.layer_topology_changed);
    assert!(!pending.requires_full_invalidation());
    assert!(pending.diff.z_order_changed_layers.contains("default"));
}

#[test]
fn test_z_index_then_layer_move_scenario() {
    let mut store = Store::new(Document::from_shapes([Shape::rect("S1", 1.0, 1.0)
        .with_z_index("a0")
        .with_layer("default")]));
    let before = Arc::clone(store.document());

    store
        .mutate_document(boxed(UpdateShapeZIndex::new("S1", "b0".into())))
        .unwrap();
    let local = diff_documents(&before, store.document());
    assert_eq!(local.z_order_changed_layers.len(), 1);
    assert!(local.z_order_changed_layers.contains("default"));
    assert!(!local.layer_topology_changed);

    let remote = edited(store.document(), |d| {
        d.update_shape("S1", |s| s.layer_id = Some("stickers".into()));
    });
    store.apply_document(remote);

    let pending = store.consume_apply_document_diff().unwrap();
    assert_eq!(pending.diff.changed.len(), 1);
    assert!(pending.diff.changed.contains("S1"));
    assert!(pending.diff.layer_topology_changed);
    assert!(pending.requires_full_invalidation());
}

#[test]
fn test_reset_to_document_drops_local_state() {
    let tools = rect_tools(Arc::new(AtomicUsize::new(0)));
    let mut store = Store::new(two_shapes()).with_tools(tools);

    store
        .mutate_document(boxed(UpdateShapeFill::new("s1", None)))
        .unwrap();
    store.activate_tool("rect").unwrap();
    store.dispatch(ToolEvent::down(0.0, 0.0)).unwrap();
    store.ui_mut().selection.insert("s1".into());
    store.ui_mut().hover = Some("s2".into());
    assert!(store.ui().drafts.contains_key("rect"));

    // Same shape set, so only the forced flag can ask for a repaint
    let same = edited(store.document(), |_| {});
    store.reset_to_document(same);

    assert!(!store.can_undo());
    assert!(store.ui().selection.is_empty());
    assert!(store.ui().hover.is_none());
    assert!(store.ui().drafts.is_empty());
    assert_eq!(store.active_tool(), Some("rect"));

    let pending = store.consume_apply_document_diff().unwrap();
    assert!(pending.diff.changed.is_empty());
    assert!(pending.requires_full_invalidation());
}

#[test]
fn test_clear_canvas_and_undo() {
    let mut store = Store::new(Document::new());
    store.mutate_document(boxed(AddShape::new(Shape::rect("s1", 1.0, 1.0)))).unwrap();
    store.mutate_document(boxed(AddShape::new(Shape::rect("s2", 1.0, 1.0)))).unwrap();

    let summary = store.clear_canvas().unwrap();
    assert!(summary.affects_z_order);
    assert!(store.ordered_shapes().is_empty());
    assert_eq!(store.document().shape_count(), 3);

    // Drawn after the clear: visible
    store.mutate_document(boxed(AddShape::new(Shape::rect("s3", 1.0, 1.0)))).unwrap();
    assert_eq!(&*store.ordered_shape_ids(), ["s3".to_string()]);

    store.undo().unwrap();
    store.undo().unwrap();
    assert_eq!(store.ordered_shapes().len(), 2);
}

#[test]
fn test_export_json_uses_visible_order() {
    let mut store = Store::new(two_shapes());
    store
        .mutate_document(boxed(UpdateShapeZIndex::new("s1", "a2".into())))
        .unwrap();

    let exported = store.export_json().unwrap();
    let ids: Vec<&str> = exported["shapes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|shape| shape["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s2", "s1"]);
    assert_eq!(exported["size"]["width"], 1920.0);
}

#[test]
fn test_undo_failure_reaches_callback() {
    let mut store = Store::new(two_shapes());
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    store.on_undo_failure(move |error, action| {
        sink.lock().unwrap().push((error.kind(), action.name));
    });

    store
        .mutate_document(boxed(UpdateShapeFill::new("s1", Some("red".into()))))
        .unwrap();

    let remote = edited(store.document(), |d| {
        d.remove_shape("s1");
    });
    store.apply_document(remote);

    let outcome = store.undo().unwrap();
    assert!(outcome.document().is_none());
    assert!(!store.document().contains_shape("s1"));
    assert!(store.can_undo());
    assert_eq!(
        *failures.lock().unwrap(),
        vec![(ErrorKind::Recoverable, "update_shape_fill")]
    );
}

#[test]
fn test_overwrite_policy_writes_over_remote_change() {
    let config = EditorConfig {
        stale_undo_policy: StaleUndoPolicy::Overwrite,
        ..EditorConfig::default()
    };
    let mut store = Store::with_config(config, two_shapes());

    store
        .mutate_document(boxed(UpdateShapeFill::new("s1", Some("red".into()))))
        .unwrap();
    let remote = edited(store.document(), |d| {
        d.update_shape("s1", |s| s.transform = Transform::translate(4.0, 0.0));
    });
    store.apply_document(remote);

    assert!(store.undo().unwrap().is_applied());
    let s1 = store.document().shape("s1").unwrap();
    assert_eq!(s1.style.fill, None);
    assert_eq!(s1.transform.x, 4.0);
}

#[test]
fn test_config_loaded_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_NAME),
        r#"{ "historyLimit": 1, "sessionSeed": "bob" }"#,
    )
    .unwrap();

    let config = EditorConfig::load(dir.path()).unwrap();
    let mut store = Store::with_config(config, Document::new());
    store.clear_canvas().unwrap();
    store.clear_canvas().unwrap();

    assert_eq!(store.history().undo_levels(), 1);
    let markers: Vec<&String> = store.document().shapes().keys().collect();
    assert_eq!(markers.len(), 2);
    assert!(markers.iter().all(|id| id.starts_with("clear-")));
}

// --- Tools ---

/// Drags out a rectangle: draft on down/move, real shape on up
struct RectTool {
    origin: Option<(f64, f64)>,
}

impl ToolRuntime for RectTool {
    fn handle_event(&mut self, event: &ToolEvent, cx: &mut ToolContext<'_>) -> ToolResponse {
        let (x, y) = (event.position.x, event.position.y);
        match event.phase {
            PointerPhase::Down => {
                self.origin = Some((x, y));
                cx.set_draft(Shape::rect("draft", 0.0, 0.0).with_transform(Transform::translate(x, y)));
                ToolResponse::render()
            }
            PointerPhase::Move => {
                let Some((ox, oy)) = self.origin else {
                    return ToolResponse::none();
                };
                if let Some(draft) = cx.draft_mut() {
                    draft.geometry = Geometry::Rect {
                        width: x - ox,
                        height: y - oy,
                    };
                }
                ToolResponse::render()
            }
            PointerPhase::Up => {
                self.origin = None;
                match cx.take_draft() {
                    Some(mut shape) => {
                        shape.id = cx.ids.new_id("rect");
                        ToolResponse::action(AddShape::new(shape))
                    }
                    None => ToolResponse::none(),
                }
            }
        }
    }
}

fn rect_tools(created: Arc<AtomicUsize>) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register("rect", move || {
        created.fetch_add(1, Ordering::SeqCst);
        RectTool { origin: None }
    });
    tools.register("select", || RectTool { origin: None });
    tools
}

#[test]
fn test_tool_runtime_created_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let mut store = Store::new(Document::new()).with_tools(rect_tools(Arc::clone(&created)));

    assert_eq!(store.active_tool(), None);
    store.activate_tool("rect").unwrap();
    store.activate_tool("rect").unwrap();
    store.activate_tool("select").unwrap();
    store.activate_tool("rect").unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(store.active_tool(), Some("rect"));
}

#[test]
fn test_unknown_tool_is_configuration_error() {
    let mut store = Store::new(Document::new()).with_tools(rect_tools(Arc::new(AtomicUsize::new(0))));
    store.activate_tool("rect").unwrap();

    let err = store.activate_tool("lasso").unwrap_err();
    assert!(matches!(err, EditorError::UnknownTool(ref id) if id == "lasso"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    // The current tool stays active
    assert_eq!(store.active_tool(), Some("rect"));
}

#[test]
fn test_switching_tools_clears_draft_and_transient_ui() {
    let mut store = Store::new(Document::new()).with_tools(rect_tools(Arc::new(AtomicUsize::new(0))));
    store.activate_tool("rect").unwrap();
    store.dispatch(ToolEvent::down(1.0, 1.0)).unwrap();
    store.ui_mut().handles.insert("s1".into());
    store.ui_mut().selection.insert("s1".into());

    store.activate_tool("select").unwrap();
    assert!(!store.ui().drafts.contains_key("rect"));
    assert!(store.ui().handles.is_empty());
    assert!(store.ui().selection.contains("s1"));

    store.deactivate_tool();
    assert_eq!(store.active_tool(), None);
    assert!(store.dispatch(ToolEvent::down(0.0, 0.0)).unwrap().is_none());
}

#[test]
fn test_gesture_batch_renders_once_and_commits_shape() {
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&renders);

    let mut store = Store::new(Document::new()).with_tools(rect_tools(Arc::new(AtomicUsize::new(0))));
    store.on_render(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    store.activate_tool("rect").unwrap();
    let before = renders.load(Ordering::SeqCst);

    let applied = store
        .dispatch_batch([
            ToolEvent::down(0.0, 0.0),
            ToolEvent::moved(5.0, 5.0),
            ToolEvent::moved(10.0, 8.0),
            ToolEvent::up(10.0, 8.0),
        ])
        .unwrap();

    assert_eq!(renders.load(Ordering::SeqCst) - before, 1);
    assert_eq!(applied.len(), 1);

    let id = &applied[0].affected_shape_ids[0];
    let shape = store.document().shape(id).unwrap();
    assert_eq!(shape.geometry, Geometry::Rect { width: 10.0, height: 8.0 });
    assert!(store.ui().drafts.is_empty());
    assert!(store.can_undo());
}

#[test]
fn test_nested_batches_render_once() {
    let mut store = Store::new(two_shapes());
    let before = store.render_signals();

    store.batch(|store| {
        store
            .mutate_document(boxed(UpdateShapeFill::new("s1", None)))
            .unwrap();
        store.batch(|store| {
            store
                .mutate_document(boxed(UpdateShapeFill::new("s2", None)))
                .unwrap();
        });
        store.undo().unwrap();
    });

    assert_eq!(store.render_signals() - before, 1);
}
