//! Replays a short editing session against a local store and prints what a
//! renderer would see after each step.
//!
//! Run with `RUST_LOG=tessera_editor=debug` to watch the store's tracing.

use anyhow::Result;
use tessera_document::{Document, Shape, Stroke, Transform};
use tessera_editor::{
    AddShape, DeleteShape, Store, UpdateShapeFill, UpdateShapeStroke, UpdateShapeTransform,
    UpdateShapeZIndex,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut store = Store::new(Document::new());

    store.mutate_document(Box::new(AddShape::new(Shape::rect("card", 200.0, 120.0))))?;
    store.mutate_document(Box::new(AddShape::new(Shape::ellipse("dot", 12.0, 12.0))))?;
    report(&mut store, "drew two shapes");

    store.mutate_batch(vec![
        Box::new(UpdateShapeTransform::new("card", Transform::translate(40.0, 40.0))),
        Box::new(UpdateShapeFill::new("card", Some("#ffd166".into()))),
        Box::new(UpdateShapeStroke::new(
            "card",
            Some(Stroke {
                color: "#073b4c".into(),
                width: 2.0,
            }),
        )),
    ])?;
    report(&mut store, "styled the card");

    let below_card = tessera_document::key_between(None, Some("a0"))?;
    store.mutate_document(Box::new(UpdateShapeZIndex::new("dot", below_card)))?;
    report(&mut store, "sent the dot to the back");

    // A collaborator deletes the dot
    let mut remote = Document::clone(store.document());
    remote.remove_shape("dot");
    remote.version += 1;
    store.apply_document(remote.into_snapshot());
    if let Some(pending) = store.consume_apply_document_diff() {
        println!(
            "remote update: removed {:?}, full repaint: {}",
            pending.diff.removed,
            pending.requires_full_invalidation()
        );
    }
    report(&mut store, "applied remote snapshot");

    // Reordering a shape that is gone cannot be undone
    let outcome = store.undo()?;
    if let Some(error) = outcome.error() {
        println!("undo skipped: {error}");
    }

    store.mutate_document(Box::new(DeleteShape::new("card")))?;
    store.clear_canvas()?;
    report(&mut store, "deleted the card and cleared");

    while store.can_undo() {
        if !store.undo()?.is_applied() {
            break;
        }
    }
    report(&mut store, "undid what could be undone");

    println!("{}", serde_json::to_string_pretty(&store.export_json()?)?);
    Ok(())
}

fn report(store: &mut Store, step: &str) {
    let dirty = store.consume_dirty_state();
    let order = store.ordered_shape_ids();
    println!(
        "{step}: v{} order={:?} dirty={:?} deleted={:?}",
        store.document().version,
        order,
        dirty.dirty,
        dirty.deleted
    );
}
