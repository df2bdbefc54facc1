use resource_factory::{
    FactoryError, FactoryFlags, FactoryParams, LoadContext, ResourceCodec, ResourceFactory, Result,
    TextCodec,
};
use std::any::Any;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

/// Codec storing the byte length, counting recreate invocations
struct LenCodec {
    recreates: Arc<AtomicUsize>,
}

impl ResourceCodec for LenCodec {
    fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(ctx.bytes.len()))
    }

    fn recreate(&self, ctx: LoadContext, payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
        self.recreates.fetch_add(1, Ordering::Relaxed);
        *payload.downcast_mut::<usize>().unwrap() = ctx.bytes.len();
        Ok(())
    }

    fn supports_reload(&self) -> bool {
        true
    }
}

fn len_codec() -> (LenCodec, Arc<AtomicUsize>) {
    let recreates = Arc::new(AtomicUsize::new(0));
    (
        LenCodec {
            recreates: recreates.clone(),
        },
        recreates,
    )
}

fn reloadable_factory(dir: &Path) -> ResourceFactory {
    ResourceFactory::new(
        FactoryParams {
            flags: FactoryFlags::RELOAD_SUPPORT,
            ..Default::default()
        },
        dir.to_str().unwrap(),
    )
}

/// Pin a file's mtime so the seconds-resolution gate is deterministic
fn set_mtime(path: &Path, secs: u64) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

#[test]
fn reload_refreshes_changed_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.txt");
    std::fs::write(&file, "hi").unwrap();
    set_mtime(&file, 1_000_000);

    let mut factory = reloadable_factory(dir.path());
    let (codec, recreates) = len_codec();
    let type_id = factory.register("txt", codec).unwrap();

    let payload = factory.get("s.txt").unwrap();
    assert_eq!(*payload.read().downcast_ref::<usize>().unwrap(), 2);
    assert_eq!(factory.get_descriptor("s.txt").unwrap().mtime(), 1_000_000);

    std::fs::write(&file, "hello").unwrap();
    set_mtime(&file, 1_000_100);

    factory.reload_type(type_id).unwrap();
    assert_eq!(recreates.load(Ordering::Relaxed), 1);

    // Same handle, refreshed contents
    assert_eq!(*payload.read().downcast_ref::<usize>().unwrap(), 5);
    assert_eq!(factory.get_type(&payload).unwrap(), type_id);
    assert_eq!(factory.get_descriptor("s.txt").unwrap().mtime(), 1_000_100);
    assert_eq!(factory.stats().reloads, 1);

    factory.release(&payload).unwrap();
}

#[test]
fn reload_skips_unchanged_mtime() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.txt");
    std::fs::write(&file, "hi").unwrap();
    set_mtime(&file, 1_000_000);

    let mut factory = reloadable_factory(dir.path());
    let (codec, recreates) = len_codec();
    let type_id = factory.register("txt", codec).unwrap();

    let payload = factory.get("s.txt").unwrap();

    // Content changed but mtime pinned back: the gate must not fire
    std::fs::write(&file, "hello").unwrap();
    set_mtime(&file, 1_000_000);

    factory.reload_type(type_id).unwrap();
    assert_eq!(recreates.load(Ordering::Relaxed), 0);
    assert_eq!(*payload.read().downcast_ref::<usize>().unwrap(), 2);

    factory.release(&payload).unwrap();
}

#[test]
fn reload_touches_only_the_requested_type() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("a.txt");
    let data = dir.path().join("b.dat");
    std::fs::write(&text, "aa").unwrap();
    std::fs::write(&data, "bb").unwrap();
    set_mtime(&text, 1_000_000);
    set_mtime(&data, 1_000_000);

    let mut factory = reloadable_factory(dir.path());
    let (txt_codec, txt_recreates) = len_codec();
    let (dat_codec, dat_recreates) = len_codec();
    let txt_type = factory.register("txt", txt_codec).unwrap();
    factory.register("dat", dat_codec).unwrap();

    let a = factory.get("a.txt").unwrap();
    let b = factory.get("b.dat").unwrap();

    std::fs::write(&text, "aaaa").unwrap();
    std::fs::write(&data, "bbbb").unwrap();
    set_mtime(&text, 1_000_100);
    set_mtime(&data, 1_000_100);

    factory.reload_type(txt_type).unwrap();
    assert_eq!(txt_recreates.load(Ordering::Relaxed), 1);
    assert_eq!(dat_recreates.load(Ordering::Relaxed), 0);
    assert_eq!(*a.read().downcast_ref::<usize>().unwrap(), 4);
    assert_eq!(*b.read().downcast_ref::<usize>().unwrap(), 2);

    factory.release(&a).unwrap();
    factory.release(&b).unwrap();
}

#[test]
fn reload_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.txt");
    std::fs::write(&file, "hi").unwrap();

    let mut factory = reloadable_factory(dir.path());
    let (codec, _) = len_codec();
    let type_id = factory.register("txt", codec).unwrap();

    let payload = factory.get("s.txt").unwrap();
    std::fs::remove_file(&file).unwrap();

    assert!(matches!(
        factory.reload_type(type_id).unwrap_err(),
        FactoryError::ResourceNotFound(_)
    ));

    factory.release(&payload).unwrap();
}

#[test]
fn reload_reports_stat_failure_for_replaced_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.txt");
    std::fs::write(&file, "hi").unwrap();

    let mut factory = reloadable_factory(dir.path());
    let (codec, recreates) = len_codec();
    let type_id = factory.register("txt", codec).unwrap();
    let payload = factory.get("s.txt").unwrap();

    // The path now stats as a directory, not a loadable file
    std::fs::remove_file(&file).unwrap();
    std::fs::create_dir(&file).unwrap();

    assert!(matches!(
        factory.reload_type(type_id).unwrap_err(),
        FactoryError::ResourceNotFound(_)
    ));
    assert_eq!(recreates.load(Ordering::Relaxed), 0);
    assert_eq!(*payload.read().downcast_ref::<usize>().unwrap(), 2);

    factory.release(&payload).unwrap();
}

#[test]
fn reload_propagates_codec_failure() {
    struct FailingReload;
    impl ResourceCodec for FailingReload {
        fn create(&self, ctx: LoadContext) -> Result<Box<dyn Any + Send + Sync>> {
            Ok(Box::new(ctx.bytes.len()))
        }
        fn recreate(&self, _ctx: LoadContext, _payload: &mut (dyn Any + Send + Sync)) -> Result<()> {
            Err(FactoryError::CodecFailure("corrupt header".to_string()))
        }
        fn supports_reload(&self) -> bool {
            true
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.txt");
    std::fs::write(&file, "hi").unwrap();
    set_mtime(&file, 1_000_000);

    let mut factory = reloadable_factory(dir.path());
    let type_id = factory.register("txt", FailingReload).unwrap();
    let payload = factory.get("s.txt").unwrap();

    std::fs::write(&file, "hello").unwrap();
    set_mtime(&file, 1_000_100);

    let err = factory.reload_type(type_id).unwrap_err();
    assert_eq!(err, FactoryError::CodecFailure("corrupt header".to_string()));
    // The failed entry keeps its old mtime, so a later reload retries it
    assert_eq!(factory.get_descriptor("s.txt").unwrap().mtime(), 1_000_000);

    factory.release(&payload).unwrap();
}

#[test]
fn builtin_text_codec_reloads_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("motd.txt");
    std::fs::write(&file, "welcome").unwrap();
    set_mtime(&file, 1_000_000);

    let mut factory = reloadable_factory(dir.path());
    let type_id = factory.register("txt", TextCodec).unwrap();

    let payload = factory.get("motd.txt").unwrap();
    assert_eq!(payload.read().downcast_ref::<String>().unwrap(), "welcome");

    std::fs::write(&file, "maintenance").unwrap();
    set_mtime(&file, 1_000_100);

    factory.reload_type(type_id).unwrap();
    assert_eq!(
        payload.read().downcast_ref::<String>().unwrap(),
        "maintenance"
    );

    factory.release(&payload).unwrap();
}
