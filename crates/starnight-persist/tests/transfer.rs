use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use starnight_persist::{
    FileTransport, MemoryTransport, PersistError, TransferOutcome, export, export_to, import,
    import_from,
};
use starnight_store::{ScopeName, Store};
use starnight_test_support::fixtures::{Scratch, seeded_store};

#[test]
fn round_trip_reproduces_every_transferable_scope() -> anyhow::Result<()> {
    let source = seeded_store()?;
    let token = export(&source)?;

    let target = Store::new();
    import(&target, &token)?;

    let (expected, actual) = (source.snapshot(), target.snapshot());
    for scope in ScopeName::ALL.into_iter().filter(|scope| scope.is_transferable()) {
        assert_eq!(actual.scope(scope), expected.scope(scope), "scope {scope}");
    }
    assert_eq!(actual.system, Store::new().snapshot().system);
    Ok(())
}

#[test]
fn importing_another_device_keeps_local_system_state() -> anyhow::Result<()> {
    let device_a = seeded_store()?;
    let device_b = Store::new();
    device_b.system().set("pending", "waiting 500ms")?;
    let before = device_b.snapshot().system;

    import(&device_b, &export(&device_a)?)?;

    assert_eq!(device_b.snapshot().system, before);
    Ok(())
}

#[test]
fn import_notifies_existing_subscribers() -> anyhow::Result<()> {
    let source = Store::new();
    source.config().set("language", "en")?;
    let target = Store::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = target
        .config()
        .signal("language")?
        .subscribe(move |value| sink.borrow_mut().push(value.clone()));

    import(&target, &export(&source)?)?;

    assert_eq!(*seen.borrow(), vec![json!("en")]);
    Ok(())
}

#[test]
fn file_transport_moves_tokens_between_stores() -> anyhow::Result<()> {
    let scratch = Scratch::new()?;
    let mut carrier = FileTransport::new(scratch.path("token.txt"));
    let source = seeded_store()?;

    let outcome = export_to(&source, &mut carrier);
    assert!(matches!(outcome, TransferOutcome::Exported { .. }));

    let target = Store::new();
    let outcome = import_from(&target, &mut carrier);
    assert!(outcome.is_success(), "{}", outcome.message());
    assert_eq!(target.config().get::<String>("language")?, "ja");
    Ok(())
}

#[test]
fn garbage_is_rejected_without_changes() -> anyhow::Result<()> {
    let store = seeded_store()?;
    let before = store.snapshot();

    assert!(matches!(import(&store, "garbage"), Err(PersistError::BadFormat)));
    let outcome = import_from(&store, &mut MemoryTransport::with_token("SL://not-base64!"));
    assert!(!outcome.is_success());

    assert_eq!(store.snapshot(), before);
    Ok(())
}
